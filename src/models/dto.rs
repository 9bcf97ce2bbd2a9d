//pour les requêtes et réponses structurées
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::models::{produits, users};

// ── Auth ──

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email is not a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub otp: String,
    pub otp_token: String,
    pub purpose: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub otp: String,
    pub otp_token: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "email is not a valid address"))]
    pub email: Option<String>,
}

/// Vue publique d'un compte (ce que renvoient register / login)
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&users::Model> for UserSummary {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub otp_token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub message: String,
    pub otp_token: String,
}

// ── Produits ──

/// `prix` et `quantite` restent en JSON brut: la coercition (nombre ou chaîne)
/// est faite par le service
#[derive(Debug, Default, Deserialize)]
pub struct CreateProduitRequest {
    pub titre: Option<String>,
    pub prix: Option<Value>,
    pub quantite: Option<Value>,
    pub description: Option<String>,
    pub status: Option<bool>,
}

/// Mise à jour partielle: seuls les champs présents sont modifiés
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProduitRequest {
    pub titre: Option<String>,
    pub prix: Option<Value>,
    pub quantite: Option<Value>,
    pub description: Option<String>,
    pub status: Option<bool>,
}

/// Paramètres de `GET /produits`, gardés en texte (valeurs invalides => défauts)
#[derive(Debug, Default, Deserialize)]
pub struct ListProduitsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OwnerSummary {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ProduitDetail {
    #[serde(flatten)]
    pub produit: produits::Model,
    pub owner: Option<OwnerSummary>,
}

#[derive(Debug, Serialize)]
pub struct ProduitPage {
    pub items: Vec<produits::Model>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub time: DateTime<Utc>,
    pub version: &'static str,
}
