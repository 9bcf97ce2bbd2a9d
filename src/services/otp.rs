use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::email::{EmailSender, templates};
use crate::models::otps::{self, OtpPurpose};
use crate::models::users;
use crate::store::{OtpStore, StoreError};
use crate::utils::clock::Clock;
use crate::utils::otp_code;

pub const OTP_CODE_LENGTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error("no pending one-time passcode for this token and purpose")]
    NotFound,
    #[error("one-time passcode expired")]
    Expired,
    #[error("one-time passcode mismatch")]
    Mismatch,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Résultat d'une émission. Le code ne sort jamais par l'API, seul `otp_token` est renvoyé au client.
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub code: String,
    pub otp_token: String,
}

/// Cycle de vie des OTP: émission, validation (usage unique), expiration paresseuse
#[derive(Clone)]
pub struct OtpService {
    otps: Arc<dyn OtpStore>,
    mailer: EmailSender,
    clock: Arc<dyn Clock>,
    lifetime: Duration,
}

impl OtpService {
    pub fn new(
        otps: Arc<dyn OtpStore>,
        mailer: EmailSender,
        clock: Arc<dyn Clock>,
        lifetime: Duration,
    ) -> Self {
        Self {
            otps,
            mailer,
            clock,
            lifetime,
        }
    }

    /// Crée un OTP pour `user` et envoie le code à son adresse email.
    /// Un échec d'envoi est loggé mais ne fait pas échouer l'émission.
    pub async fn issue(&self, user: &users::Model, purpose: OtpPurpose) -> Result<IssuedOtp, OtpError> {
        let code = otp_code::generate(OTP_CODE_LENGTH);
        let otp_token = Uuid::new_v4().to_string();

        self.otps
            .insert(otps::Model {
                id: Uuid::new_v4(),
                user_id: user.id,
                code: code.clone(),
                otp_token: otp_token.clone(),
                purpose,
                created_at: self.clock.now(),
            })
            .await?;

        let message = templates::otp_message(&user.email, purpose, &code, self.lifetime);
        if let Err(e) = self.mailer.send(message).await {
            log::error!("Failed to send {} OTP to user {}: {e}", purpose.as_str(), user.id);
        }

        Ok(IssuedOtp { code, otp_token })
    }

    /// Valide (otp_token, purpose, code) et retourne l'id du propriétaire.
    ///
    /// 1. Recherche par (otp_token, purpose): absent => `NotFound`
    /// 2. Âge > durée de vie => suppression puis `Expired`
    /// 3. Code différent => `Mismatch`, l'OTP reste utilisable jusqu'à expiration
    /// 4. Code correct => suppression puis succès
    pub async fn validate(
        &self,
        otp_token: &str,
        purpose: OtpPurpose,
        submitted_code: &str,
    ) -> Result<Uuid, OtpError> {
        let record = self
            .otps
            .find_by_token(otp_token, purpose)
            .await?
            .ok_or(OtpError::NotFound)?;

        let age = self.clock.now() - record.created_at;
        if age > self.lifetime {
            self.otps.delete(record.id).await?;
            log::info!("Expired {} OTP discarded for user {}", purpose.as_str(), record.user_id);
            return Err(OtpError::Expired);
        }

        if !otp_code::constant_time_eq(submitted_code.as_bytes(), record.code.as_bytes()) {
            log::warn!("OTP mismatch on {} for user {}", purpose.as_str(), record.user_id);
            return Err(OtpError::Mismatch);
        }

        // Une validation concurrente a pu consommer l'OTP entre la lecture et ici
        if !self.otps.delete(record.id).await? {
            return Err(OtpError::NotFound);
        }

        Ok(record.user_id)
    }

    pub async fn purge_for_user(&self, user_id: Uuid) -> Result<u64, OtpError> {
        Ok(self.otps.delete_for_user(user_id).await?)
    }

    /// Supprime les OTP plus vieux que la durée de vie (jamais validés)
    pub async fn sweep_expired(&self) -> Result<u64, OtpError> {
        let cutoff = self.clock.now() - self.lifetime;
        Ok(self.otps.delete_created_before(cutoff).await?)
    }

    /// Balayage périodique optionnel. L'expiration reste évaluée à la validation.
    pub fn spawn_reaper(self, every: std::time::Duration) -> tokio::task::JoinHandle<()> {
        actix_web::rt::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                match self.sweep_expired().await {
                    Ok(0) => {}
                    Ok(n) => log::info!("OTP reaper removed {n} expired passcode(s)"),
                    Err(e) => log::error!("OTP reaper failed: {e}"),
                }
            }
        })
    }
}
