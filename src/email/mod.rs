pub mod senders;
pub mod templates;

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("EmailError: Relay connection failed: {0}")]
    RelayConnectionFailed(String),
    #[error("EmailError: Invalid address {0}")]
    InvalidAddress(String),
    #[error("EmailError: Invalid message {0}")]
    InvalidMessage(String),
    #[error("EmailError: Failed to send: {0}")]
    FailedToSend(String),
}

/// Notification sortante: l'adresse d'expédition appartient à l'expéditeur configuré
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait SendEmail: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

pub type EmailSender = Arc<dyn SendEmail>;
