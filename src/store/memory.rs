//! Stores en mémoire utilisés par les tests. Ils reproduisent les contraintes
//! d'unicité du schéma SQL (email, couple titre/propriétaire).

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{OtpStore, ProduitQuery, ProduitStore, StoreError, UserStore};
use crate::models::otps::{self, OtpPurpose};
use crate::models::users::Role;
use crate::models::{produits, users};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<users::Model>>,
}

impl MemoryUserStore {
    /// Promotion hors-bande (pas d'endpoint pour ça)
    pub fn set_role(&self, id: Uuid, role: Role) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.role = role;
        }
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: users::Model) -> Result<users::Model, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("users.email".into()));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, StoreError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn mark_email_verified(&self, id: Uuid) -> Result<Option<users::Model>, StoreError> {
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            u.is_email_verified = true;
            u.clone()
        }))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<bool, StoreError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<Option<users::Model>, StoreError> {
        let mut users = self.users.lock().unwrap();
        if let Some(email) = &email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Duplicate("users.email".into()));
            }
        }

        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            if let Some(name) = name {
                u.name = name;
            }
            if let Some(email) = email {
                u.email = email;
            }
            u.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryOtpStore {
    otps: Mutex<Vec<otps::Model>>,
}

impl MemoryOtpStore {
    pub fn len(&self) -> usize {
        self.otps.lock().unwrap().len()
    }

    pub fn count_for_user(&self, user_id: Uuid) -> usize {
        self.otps
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn insert(&self, otp: otps::Model) -> Result<otps::Model, StoreError> {
        let mut otps = self.otps.lock().unwrap();
        if otps.iter().any(|o| o.otp_token == otp.otp_token) {
            return Err(StoreError::Duplicate("otps.otp_token".into()));
        }
        otps.push(otp.clone());
        Ok(otp)
    }

    async fn find_by_token(
        &self,
        otp_token: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<otps::Model>, StoreError> {
        Ok(self
            .otps
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.otp_token == otp_token && o.purpose == purpose)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut otps = self.otps.lock().unwrap();
        let before = otps.len();
        otps.retain(|o| o.id != id);
        Ok(otps.len() < before)
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut otps = self.otps.lock().unwrap();
        let before = otps.len();
        otps.retain(|o| o.user_id != user_id);
        Ok((before - otps.len()) as u64)
    }

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut otps = self.otps.lock().unwrap();
        let before = otps.len();
        otps.retain(|o| o.created_at >= cutoff);
        Ok((before - otps.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryProduitStore {
    produits: Mutex<Vec<produits::Model>>,
}

impl MemoryProduitStore {
    pub fn len(&self) -> usize {
        self.produits.lock().unwrap().len()
    }
}

fn titre_taken(produits: &[produits::Model], candidate: &produits::Model) -> bool {
    produits
        .iter()
        .any(|p| p.id != candidate.id && p.user_id == candidate.user_id && p.titre == candidate.titre)
}

#[async_trait]
impl ProduitStore for MemoryProduitStore {
    async fn insert(&self, produit: produits::Model) -> Result<produits::Model, StoreError> {
        let mut produits = self.produits.lock().unwrap();
        if titre_taken(&produits, &produit) {
            return Err(StoreError::Duplicate("produits (titre, user_id)".into()));
        }
        produits.push(produit.clone());
        Ok(produit)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<produits::Model>, StoreError> {
        Ok(self
            .produits
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn find_by_owner_and_titre(
        &self,
        owner: Uuid,
        titre: &str,
    ) -> Result<Option<produits::Model>, StoreError> {
        Ok(self
            .produits
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.user_id == owner && p.titre == titre)
            .cloned())
    }

    async fn list(&self, query: &ProduitQuery) -> Result<(Vec<produits::Model>, u64), StoreError> {
        // Même limite que le binding Postgres (LIMIT/OFFSET en BIGINT)
        if i64::try_from(query.offset).is_err() || i64::try_from(query.limit).is_err() {
            return Err(StoreError::Database("LIMIT/OFFSET out of BIGINT range".into()));
        }

        let produits = self.produits.lock().unwrap();
        let needle = query.search.as_ref().map(|s| s.to_lowercase());
        let matching: Vec<&produits::Model> = produits
            .iter()
            .filter(|p| match &needle {
                Some(needle) => p.titre.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .collect();

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok((items, total))
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<produits::Model>, StoreError> {
        Ok(self
            .produits
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == owner)
            .cloned()
            .collect())
    }

    async fn update(&self, produit: produits::Model) -> Result<Option<produits::Model>, StoreError> {
        let mut produits = self.produits.lock().unwrap();
        if titre_taken(&produits, &produit) {
            return Err(StoreError::Duplicate("produits (titre, user_id)".into()));
        }
        Ok(produits.iter_mut().find(|p| p.id == produit.id).map(|existing| {
            *existing = produit.clone();
            produit
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut produits = self.produits.lock().unwrap();
        let before = produits.len();
        produits.retain(|p| p.id != id);
        Ok(produits.len() < before)
    }

    async fn delete_for_owner(&self, owner: Uuid) -> Result<u64, StoreError> {
        let mut produits = self.produits.lock().unwrap();
        let before = produits.len();
        produits.retain(|p| p.user_id != owner);
        Ok((before - produits.len()) as u64)
    }
}
