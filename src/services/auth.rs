use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::otps::OtpPurpose;
use crate::models::users::{self, Role};
use crate::services::otp::OtpService;
use crate::store::{ProduitStore, StoreError, UserStore};
use crate::utils::clock::Clock;
use crate::utils::jwt::{SessionClaims, SessionKeys};
use crate::utils::password::PasswordHasher;

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub struct Registration {
    pub user: users::Model,
    pub otp_token: String,
}

pub struct LoginOutcome {
    pub token: String,
    pub user: users::Model,
}

/// Les emails sont comparés après trim + minuscules
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    produits: Arc<dyn ProduitStore>,
    otp: OtpService,
    hasher: PasswordHasher,
    sessions: SessionKeys,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        produits: Arc<dyn ProduitStore>,
        otp: OtpService,
        hasher: PasswordHasher,
        sessions: SessionKeys,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            produits,
            otp,
            hasher,
            sessions,
            clock,
        }
    }

    /// Crée le compte (non vérifié) et émet un OTP `verify-email`.
    /// Le code part par email, seul le jeton opaque est retourné.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Registration, AppError> {
        let email = normalize_email(email);
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Name is required".to_string()));
        }
        if password.is_empty() {
            return Err(AppError::InvalidInput("Password is required".to_string()));
        }

        // 1. Vérifier si l'email existe déjà
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        // 2. Hasher le mot de passe
        let password_hash = self.hash_password(password).await?;

        // 3. Créer l'utilisateur (l'index unique sur email tranche les courses)
        let user = self
            .users
            .insert(users::Model {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email,
                password_hash,
                is_email_verified: false,
                role: Role::User,
                created_at: self.clock.now(),
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => AppError::Conflict("Email already registered".to_string()),
                other => other.into(),
            })?;

        // 4. OTP de vérification + email
        let issued = self.otp.issue(&user, OtpPurpose::VerifyEmail).await?;

        log::info!("Registered user {}", user.id);

        Ok(Registration {
            user,
            otp_token: issued.otp_token,
        })
    }

    /// Consomme l'OTP `verify-email` et marque l'email comme vérifié
    pub async fn verify_email(&self, otp_token: &str, code: &str) -> Result<users::Model, AppError> {
        let user_id = self.otp.validate(otp_token, OtpPurpose::VerifyEmail, code).await?;

        let user = self
            .users
            .mark_email_verified(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        log::info!("Email verified for user {}", user.id);
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !self.verify_password(password, &user.password_hash).await? {
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        if !user.is_email_verified {
            return Err(AppError::Forbidden("Email not verified".to_string()));
        }

        let token = self.sessions.issue(&user, self.clock.now())?;

        Ok(LoginOutcome { token, user })
    }

    pub fn decode_session(&self, token: &str) -> Result<SessionClaims, AppError> {
        self.sessions.decode(token)
    }

    pub async fn update_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        ensure_password_length(new_password)?;

        let user = self.find_user(user_id).await?;

        if !self.verify_password(old_password, &user.password_hash).await? {
            return Err(AppError::Unauthorized("Current password is incorrect".to_string()));
        }

        let password_hash = self.hash_password(new_password).await?;
        if !self.users.set_password_hash(user.id, password_hash).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        log::info!("Password updated for user {}", user.id);
        Ok(())
    }

    /// Émet un OTP `reset-password` et retourne son jeton opaque
    pub async fn forgot_password(&self, email: &str) -> Result<String, AppError> {
        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let issued = self.otp.issue(&user, OtpPurpose::ResetPassword).await?;
        Ok(issued.otp_token)
    }

    pub async fn reset_password(
        &self,
        otp_token: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        // Avant la validation: un mot de passe refusé ne doit pas consommer l'OTP
        ensure_password_length(new_password)?;

        let user_id = self.otp.validate(otp_token, OtpPurpose::ResetPassword, code).await?;

        let password_hash = self.hash_password(new_password).await?;
        if !self.users.set_password_hash(user_id, password_hash).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        log::info!("Password reset for user {user_id}");
        Ok(())
    }

    /// Supprime le compte après confirmation du mot de passe, avec ses OTP et ses produits
    pub async fn delete_account(&self, user_id: Uuid, password: &str) -> Result<(), AppError> {
        let user = self.find_user(user_id).await?;

        if !self.verify_password(password, &user.password_hash).await? {
            return Err(AppError::Unauthorized("Incorrect password".to_string()));
        }

        let otps_removed = self.otp.purge_for_user(user.id).await?;
        let produits_removed = self.produits.delete_for_owner(user.id).await?;
        if !self.users.delete(user.id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        log::info!(
            "Deleted user {} ({otps_removed} OTP(s), {produits_removed} produit(s))",
            user.id
        );
        Ok(())
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<users::Model, AppError> {
        self.find_user(user_id).await
    }

    /// Met à jour nom et/ou email. Un email pris par un autre compte => `Conflict`.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<users::Model, AppError> {
        let name = match name.map(str::trim) {
            Some("") => return Err(AppError::InvalidInput("Name cannot be empty".to_string())),
            other => other.map(str::to_string),
        };
        let email = email.map(normalize_email);

        if let Some(email) = &email {
            if let Some(existing) = self.users.find_by_email(email).await? {
                if existing.id != user_id {
                    return Err(AppError::Conflict(
                        "This email is already used by another account".to_string(),
                    ));
                }
            }
        }

        self.users
            .update_profile(user_id, name, email)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => {
                    AppError::Conflict("This email is already used by another account".to_string())
                }
                other => other.into(),
            })?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn find_user(&self, user_id: Uuid) -> Result<users::Model, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    // PBKDF2 est coûteux: hors du thread de l'exécuteur
    async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let hasher = self.hasher;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await?
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
    }

    async fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, AppError> {
        let hasher = self.hasher;
        let password = password.to_string();
        let stored_hash = stored_hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await?
            .map_err(|e| AppError::Internal(format!("Password verification error: {e}")))
    }
}

fn ensure_password_length(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "The new password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}
