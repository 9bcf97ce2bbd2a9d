use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{EmailError, EmailMessage, SendEmail};
use crate::config::EmailConfig;

/// Envoi réel via un relais SMTP (STARTTLS)
pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| EmailError::InvalidAddress(format!("{}: {e}", config.from)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| EmailError::RelayConnectionFailed(e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }

    pub async fn test_connection(&self) -> Result<bool, EmailError> {
        self.transport
            .test_connection()
            .await
            .map_err(|e| EmailError::RelayConnectionFailed(e.to_string()))
    }
}

#[async_trait]
impl SendEmail for SmtpSender {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        let to = message
            .to
            .parse::<Mailbox>()
            .map_err(|e| EmailError::InvalidAddress(format!("{}: {e}", message.to)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html_body)
            .map_err(|e| EmailError::InvalidMessage(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| EmailError::FailedToSend(e.to_string()))?;

        Ok(())
    }
}

/// Utilisé quand EMAIL_ENABLED=false: le message est seulement loggé
#[derive(Default)]
pub struct MockSender {}

impl MockSender {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl SendEmail for MockSender {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        log::info!(
            "Email disabled, not sending \"{}\" to {}:\n{}",
            message.subject,
            message.to,
            message.html_body
        );
        Ok(())
    }
}
