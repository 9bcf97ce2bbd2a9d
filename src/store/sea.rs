use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::{OtpStore, ProduitQuery, ProduitStore, StoreError, UserStore};
use crate::models::otps::{self, OtpPurpose};
use crate::models::{produits, users};

pub struct SeaUserStore {
    db: DatabaseConnection,
}

impl SeaUserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for SeaUserStore {
    async fn insert(&self, user: users::Model) -> Result<users::Model, StoreError> {
        let new_user = users::ActiveModel {
            id: Set(user.id),
            name: Set(user.name),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            is_email_verified: Set(user.is_email_verified),
            role: Set(user.role),
            created_at: Set(user.created_at),
        };

        Ok(new_user.insert(&self.db).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, StoreError> {
        Ok(users::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, StoreError> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }

    async fn mark_email_verified(&self, id: Uuid) -> Result<Option<users::Model>, StoreError> {
        let Some(user) = users::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut active_model: users::ActiveModel = user.into();
        active_model.is_email_verified = Set(true);

        vanished_as_none(active_model.update(&self.db).await)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<bool, StoreError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .filter(users::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<Option<users::Model>, StoreError> {
        let Some(user) = users::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        if name.is_none() && email.is_none() {
            return Ok(Some(user));
        }

        let mut active_model: users::ActiveModel = user.into();
        if let Some(name) = name {
            active_model.name = Set(name);
        }
        if let Some(email) = email {
            active_model.email = Set(email);
        }

        vanished_as_none(active_model.update(&self.db).await)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = users::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}

pub struct SeaOtpStore {
    db: DatabaseConnection,
}

impl SeaOtpStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OtpStore for SeaOtpStore {
    async fn insert(&self, otp: otps::Model) -> Result<otps::Model, StoreError> {
        let new_otp = otps::ActiveModel {
            id: Set(otp.id),
            user_id: Set(otp.user_id),
            code: Set(otp.code),
            otp_token: Set(otp.otp_token),
            purpose: Set(otp.purpose),
            created_at: Set(otp.created_at),
        };

        Ok(new_otp.insert(&self.db).await?)
    }

    async fn find_by_token(
        &self,
        otp_token: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<otps::Model>, StoreError> {
        Ok(otps::Entity::find()
            .filter(otps::Column::OtpToken.eq(otp_token))
            .filter(otps::Column::Purpose.eq(purpose))
            .one(&self.db)
            .await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = otps::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = otps::Entity::delete_many()
            .filter(otps::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = otps::Entity::delete_many()
            .filter(otps::Column::CreatedAt.lt(cutoff))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

pub struct SeaProduitStore {
    db: DatabaseConnection,
}

impl SeaProduitStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProduitStore for SeaProduitStore {
    async fn insert(&self, produit: produits::Model) -> Result<produits::Model, StoreError> {
        let new_produit = produits::ActiveModel {
            id: Set(produit.id),
            titre: Set(produit.titre),
            prix: Set(produit.prix),
            quantite: Set(produit.quantite),
            description: Set(produit.description),
            status: Set(produit.status),
            user_id: Set(produit.user_id),
            created_at: Set(produit.created_at),
            updated_at: Set(produit.updated_at),
        };

        // L'index unique (titre, user_id) lève StoreError::Duplicate en cas de course
        Ok(new_produit.insert(&self.db).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<produits::Model>, StoreError> {
        Ok(produits::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_by_owner_and_titre(
        &self,
        owner: Uuid,
        titre: &str,
    ) -> Result<Option<produits::Model>, StoreError> {
        Ok(produits::Entity::find()
            .filter(produits::Column::UserId.eq(owner))
            .filter(produits::Column::Titre.eq(titre))
            .one(&self.db)
            .await?)
    }

    async fn list(&self, query: &ProduitQuery) -> Result<(Vec<produits::Model>, u64), StoreError> {
        let mut select = produits::Entity::find();

        if let Some(search) = &query.search {
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            select = select
                .filter(Expr::expr(Func::lower(Expr::col(produits::Column::Titre))).like(pattern));
        }

        let total = select.clone().count(&self.db).await?;
        let items = select
            .order_by_asc(produits::Column::CreatedAt)
            .order_by_asc(produits::Column::Id)
            .offset(query.offset)
            .limit(query.limit)
            .all(&self.db)
            .await?;

        Ok((items, total))
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<produits::Model>, StoreError> {
        Ok(produits::Entity::find()
            .filter(produits::Column::UserId.eq(owner))
            .order_by_asc(produits::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    async fn update(&self, produit: produits::Model) -> Result<Option<produits::Model>, StoreError> {
        let active_model = produits::ActiveModel {
            id: ActiveValue::Unchanged(produit.id),
            titre: Set(produit.titre),
            prix: Set(produit.prix),
            quantite: Set(produit.quantite),
            description: Set(produit.description),
            status: Set(produit.status),
            user_id: Set(produit.user_id),
            created_at: Set(produit.created_at),
            updated_at: Set(produit.updated_at),
        };

        vanished_as_none(active_model.update(&self.db).await)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = produits::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_for_owner(&self, owner: Uuid) -> Result<u64, StoreError> {
        let result = produits::Entity::delete_many()
            .filter(produits::Column::UserId.eq(owner))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

/// Ligne supprimée entre la lecture et l'UPDATE: sea-orm renvoie `RecordNotUpdated`
fn vanished_as_none<M>(result: Result<M, DbErr>) -> Result<Option<M>, StoreError> {
    match result {
        Ok(model) => Ok(Some(model)),
        Err(DbErr::RecordNotUpdated) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Échappe les métacaractères de LIKE (`\` est le caractère d'échappement par défaut de PostgreSQL)
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vanished_row_is_not_an_error() {
        assert_eq!(vanished_as_none::<()>(Err(DbErr::RecordNotUpdated)), Ok(None));
        assert_eq!(vanished_as_none(Ok(7)), Ok(Some(7)));
        assert!(matches!(
            vanished_as_none::<()>(Err(DbErr::Custom("boom".into()))),
            Err(StoreError::Database(_))
        ));
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("book"), "book");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
