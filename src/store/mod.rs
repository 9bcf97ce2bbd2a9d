//! Persistance: un trait par collection, les services ne voient que ces traits.
//!
//! `sea` contient l'implémentation PostgreSQL (SeaORM), `memory` une
//! implémentation en mémoire pour les tests.

#[cfg(test)]
pub mod memory;
pub mod sea;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DbErr, SqlErr};
use uuid::Uuid;

use crate::models::otps::{self, OtpPurpose};
use crate::models::{produits, users};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Violation d'une contrainte d'unicité (email, couple titre/propriétaire, ...)
    #[error("duplicate value: {0}")]
    Duplicate(String),
    #[error("database error: {0}")]
    Database(String),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::Duplicate(detail),
            _ => StoreError::Database(err.to_string()),
        }
    }
}

/// Filtre et fenêtre de `ProduitStore::list`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProduitQuery {
    /// Sous-chaîne recherchée dans le titre, insensible à la casse
    pub search: Option<String>,
    pub offset: u64,
    pub limit: u64,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: users::Model) -> Result<users::Model, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, StoreError>;

    async fn mark_email_verified(&self, id: Uuid) -> Result<Option<users::Model>, StoreError>;

    /// `false` si l'utilisateur n'existe pas
    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<bool, StoreError>;

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<Option<users::Model>, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn insert(&self, otp: otps::Model) -> Result<otps::Model, StoreError>;

    async fn find_by_token(
        &self,
        otp_token: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<otps::Model>, StoreError>;

    /// `false` si l'OTP avait déjà été supprimé (par une validation concurrente par exemple)
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, StoreError>;

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait ProduitStore: Send + Sync {
    async fn insert(&self, produit: produits::Model) -> Result<produits::Model, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<produits::Model>, StoreError>;

    async fn find_by_owner_and_titre(
        &self,
        owner: Uuid,
        titre: &str,
    ) -> Result<Option<produits::Model>, StoreError>;

    /// Retourne la page demandée et le nombre total de produits correspondant au filtre
    async fn list(&self, query: &ProduitQuery) -> Result<(Vec<produits::Model>, u64), StoreError>;

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<produits::Model>, StoreError>;

    /// Remplace l'enregistrement existant (même id). `None` s'il a été supprimé entre-temps.
    async fn update(&self, produit: produits::Model) -> Result<Option<produits::Model>, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn delete_for_owner(&self, owner: Uuid) -> Result<u64, StoreError>;
}
