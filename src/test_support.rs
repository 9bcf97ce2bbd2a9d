//! Fixtures partagées par les tests: stores en mémoire, horloge manuelle,
//! expéditeur d'emails qui enregistre les messages au lieu de les envoyer.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::email::{EmailError, EmailMessage, SendEmail};
use crate::middleware::AuthUser;
use crate::models::users::{self, Role};
use crate::models::produits;
use crate::services::auth::AuthService;
use crate::services::otp::OtpService;
use crate::services::produit::ProduitService;
use crate::state::AppState;
use crate::store::memory::{MemoryOtpStore, MemoryProduitStore, MemoryUserStore};
use crate::store::{ProduitStore, UserStore};
use crate::utils::clock::Clock;
use crate::utils::jwt::SessionKeys;
use crate::utils::password::PasswordHasher;

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_PASSWORD: &str = "Secret123";

/// Horloge figée qui n'avance que via `advance`
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    // Part de l'heure réelle: jsonwebtoken valide `exp` contre l'horloge système
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<EmailMessage>>,
    failing: Mutex<bool>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_next_sends(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    /// Code OTP du dernier email envoyé à `to`
    pub fn last_code_for(&self, to: &str) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let message = sent.iter().rev().find(|m| m.to == to)?;
        let start = message.html_body.find("<strong>")? + "<strong>".len();
        let end = message.html_body[start..].find("</strong>")? + start;
        Some(message.html_body[start..end].to_string())
    }
}

#[async_trait]
impl SendEmail for RecordingSender {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if *self.failing.lock().unwrap() {
            return Err(EmailError::FailedToSend("relay unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub struct TestContext {
    pub users: Arc<MemoryUserStore>,
    pub otps: Arc<MemoryOtpStore>,
    pub produits: Arc<MemoryProduitStore>,
    pub mailer: Arc<RecordingSender>,
    pub clock: Arc<ManualClock>,
    pub hasher: PasswordHasher,
    pub sessions: SessionKeys,
    pub otp: OtpService,
    pub auth: AuthService,
    pub produit: ProduitService,
}

impl TestContext {
    pub fn new() -> Self {
        let users = Arc::new(MemoryUserStore::default());
        let otps = Arc::new(MemoryOtpStore::default());
        let produits = Arc::new(MemoryProduitStore::default());
        let mailer = Arc::new(RecordingSender::default());
        let clock = Arc::new(ManualClock::new());
        // Peu d'itérations: les tests n'ont pas besoin d'un hash coûteux
        let hasher = PasswordHasher::new(1_000);
        let sessions = SessionKeys::new(TEST_SECRET, Duration::hours(24));

        let otp = OtpService::new(otps.clone(), mailer.clone(), clock.clone(), Duration::minutes(15));
        let auth = AuthService::new(
            users.clone(),
            produits.clone(),
            otp.clone(),
            hasher,
            sessions.clone(),
            clock.clone(),
        );
        let produit = ProduitService::new(produits.clone(), users.clone(), clock.clone());

        Self {
            users,
            otps,
            produits,
            mailer,
            clock,
            hasher,
            sessions,
            otp,
            auth,
            produit,
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            auth: self.auth.clone(),
            produits: self.produit.clone(),
        }
    }

    /// Compte vérifié, mot de passe `TEST_PASSWORD`
    pub async fn seed_user(&self, email: &str) -> users::Model {
        self.users
            .insert(users::Model {
                id: Uuid::new_v4(),
                name: "Test User".to_string(),
                email: email.to_string(),
                password_hash: self.hasher.hash(TEST_PASSWORD).unwrap(),
                is_email_verified: true,
                role: Role::User,
                created_at: self.clock.now(),
            })
            .await
            .unwrap()
    }

    pub async fn caller(&self, email: &str, role: Role) -> AuthUser {
        let user = self.seed_user(email).await;
        self.users.set_role(user.id, role);
        AuthUser {
            user_id: user.id,
            email: user.email,
            role,
        }
    }

    pub async fn seed_produit(&self, owner: Uuid, titre: &str) -> produits::Model {
        let now = self.clock.now();
        self.produits
            .insert(produits::Model {
                id: Uuid::new_v4(),
                titre: titre.to_string(),
                prix: 1.0,
                quantite: 1,
                description: String::new(),
                status: false,
                user_id: owner,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
    }

    pub fn bearer(&self, user: &users::Model) -> String {
        format!("Bearer {}", self.sessions.issue(user, self.clock.now()).unwrap())
    }
}
