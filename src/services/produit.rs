use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{
    CreateProduitRequest, ListProduitsQuery, OwnerSummary, ProduitDetail, ProduitPage,
    UpdateProduitRequest,
};
use crate::models::produits;
use crate::services::policy;
use crate::store::{ProduitQuery, ProduitStore, StoreError, UserStore};
use crate::utils::clock::Clock;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;
pub const DEFAULT_QUANTITE: i32 = 1;

const MAX_OFFSET: u64 = i64::MAX as u64;

const DUPLICATE_TITRE: &str = "A produit with this titre already exists";

/// CRUD du catalogue, chaque accès à un produit existant passe par la règle propriétaire-ou-admin
#[derive(Clone)]
pub struct ProduitService {
    produits: Arc<dyn ProduitStore>,
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
}

impl ProduitService {
    pub fn new(produits: Arc<dyn ProduitStore>, users: Arc<dyn UserStore>, clock: Arc<dyn Clock>) -> Self {
        Self { produits, users, clock }
    }

    pub async fn create(&self, caller: &AuthUser, body: CreateProduitRequest) -> Result<produits::Model, AppError> {
        // 1. Champs obligatoires
        let titre = match body.titre.as_deref().map(str::trim) {
            Some(titre) if !titre.is_empty() => titre.to_string(),
            _ => return Err(AppError::InvalidInput("titre and prix are required".to_string())),
        };
        let prix = match &body.prix {
            Some(value) => parse_prix(value)?,
            None => return Err(AppError::InvalidInput("titre and prix are required".to_string())),
        };
        let quantite = match &body.quantite {
            Some(value) => coerce_quantite(value)?,
            None => DEFAULT_QUANTITE,
        };

        // 2. Vérification rapide du doublon (l'index unique reste l'arbitre)
        if self
            .produits
            .find_by_owner_and_titre(caller.user_id, &titre)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(DUPLICATE_TITRE.to_string()));
        }

        let now = self.clock.now();
        let produit = self
            .produits
            .insert(produits::Model {
                id: Uuid::new_v4(),
                titre,
                prix,
                quantite,
                description: body.description.unwrap_or_default(),
                status: body.status.unwrap_or(false),
                user_id: caller.user_id,
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(duplicate_titre)?;

        log::info!("Produit {} created by user {}", produit.id, caller.user_id);
        Ok(produit)
    }

    /// Liste globale paginée, filtrée sur le titre si `search` est fourni
    pub async fn list(&self, query: &ListProduitsQuery) -> Result<ProduitPage, AppError> {
        let page = parse_positive(query.page.as_deref()).unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive(query.limit.as_deref())
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        // Postgres lie OFFSET en i64: au-delà la page est forcément vide, le total reste calculé
        let offset = (page - 1)
            .checked_mul(limit)
            .filter(|offset| *offset <= MAX_OFFSET)
            .unwrap_or(MAX_OFFSET);

        let (items, total) = self
            .produits
            .list(&ProduitQuery {
                search,
                offset,
                limit,
            })
            .await?;

        Ok(ProduitPage {
            items,
            total,
            page,
            limit,
            pages: total.div_ceil(limit),
        })
    }

    pub async fn get_by_id(&self, caller: &AuthUser, id: &str) -> Result<ProduitDetail, AppError> {
        let produit = self.find_produit(id).await?;
        policy::ensure_access(produit.user_id, caller, "Not authorized to access this produit")?;

        let owner = self
            .users
            .find_by_id(produit.user_id)
            .await?
            .map(|user| OwnerSummary {
                name: user.name,
                email: user.email,
            });

        Ok(ProduitDetail { produit, owner })
    }

    /// Mise à jour partielle. Tous les champs fournis sont validés avant l'écriture.
    pub async fn update(
        &self,
        caller: &AuthUser,
        id: &str,
        body: UpdateProduitRequest,
    ) -> Result<produits::Model, AppError> {
        let mut produit = self.find_produit(id).await?;
        policy::ensure_access(produit.user_id, caller, "Not authorized to update this produit")?;

        if let Some(titre) = body.titre {
            let titre = titre.trim();
            if titre.is_empty() {
                return Err(AppError::InvalidInput("titre cannot be empty".to_string()));
            }
            produit.titre = titre.to_string();
        }
        if let Some(prix) = &body.prix {
            produit.prix = parse_prix(prix)?;
        }
        if let Some(quantite) = &body.quantite {
            produit.quantite = parse_quantite(quantite)?;
        }
        if let Some(description) = body.description {
            produit.description = description;
        }
        if let Some(status) = body.status {
            produit.status = status;
        }

        if let Some(existing) = self
            .produits
            .find_by_owner_and_titre(produit.user_id, &produit.titre)
            .await?
        {
            if existing.id != produit.id {
                return Err(AppError::Conflict(DUPLICATE_TITRE.to_string()));
            }
        }

        produit.updated_at = self.clock.now();
        let updated = self
            .produits
            .update(produit)
            .await
            .map_err(duplicate_titre)?
            .ok_or_else(|| AppError::NotFound("Produit not found".to_string()))?;

        log::info!("Produit {} updated by user {}", updated.id, caller.user_id);
        Ok(updated)
    }

    pub async fn delete(&self, caller: &AuthUser, id: &str) -> Result<(), AppError> {
        let produit = self.find_produit(id).await?;
        policy::ensure_access(produit.user_id, caller, "Not authorized to delete this produit")?;

        if !self.produits.delete(produit.id).await? {
            return Err(AppError::NotFound("Produit not found".to_string()));
        }

        log::info!("Produit {} deleted by user {}", produit.id, caller.user_id);
        Ok(())
    }

    pub async fn list_by_owner(&self, caller: &AuthUser, owner: &str) -> Result<Vec<produits::Model>, AppError> {
        let owner = parse_id(owner, "Invalid user id")?;
        policy::ensure_access(owner, caller, "Not authorized to list this user's produits")?;

        Ok(self.produits.list_by_owner(owner).await?)
    }

    async fn find_produit(&self, id: &str) -> Result<produits::Model, AppError> {
        let id = parse_id(id, "Invalid produit id")?;
        self.produits
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Produit not found".to_string()))
    }
}

fn duplicate_titre(err: StoreError) -> AppError {
    match err {
        StoreError::Duplicate(_) => AppError::Conflict(DUPLICATE_TITRE.to_string()),
        other => other.into(),
    }
}

fn parse_id(raw: &str, message: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidInput(message.to_string()))
}

/// Entier strictement positif, sinon `None` (le défaut s'applique)
fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok()).filter(|n| *n >= 1)
}

/// Nombre JSON ou chaîne numérique, fini et >= 0
fn parse_prix(value: &Value) -> Result<f64, AppError> {
    let prix = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match prix {
        Some(prix) if prix.is_finite() && prix >= 0.0 => Ok(prix),
        _ => Err(AppError::InvalidInput("prix must be a non-negative number".to_string())),
    }
}

fn numeric_quantite(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

/// À la création: une quantité illisible ou nulle retombe sur 1, une quantité négative est refusée
fn coerce_quantite(value: &Value) -> Result<i32, AppError> {
    match numeric_quantite(value) {
        None | Some(0) => Ok(DEFAULT_QUANTITE),
        Some(n) if n < 0 => Err(AppError::InvalidInput("quantite must be a non-negative integer".to_string())),
        Some(n) => Ok(i32::try_from(n).unwrap_or(DEFAULT_QUANTITE)),
    }
}

/// À la mise à jour la valeur fournie doit être un entier >= 0
fn parse_quantite(value: &Value) -> Result<i32, AppError> {
    numeric_quantite(value)
        .filter(|n| *n >= 0)
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| AppError::InvalidInput("quantite must be a non-negative integer".to_string()))
}
