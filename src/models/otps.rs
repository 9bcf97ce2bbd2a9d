// ============================================================================
// MODÈLE : OTPS
// ============================================================================
//
// Colonnes de la table otps:
//   - id (UUID, PRIMARY KEY)
//   - user_id (UUID, NOT NULL, FK vers users, ON DELETE CASCADE)
//   - code (TEXT, NOT NULL) - code numérique envoyé par email
//   - otp_token (TEXT, UNIQUE, NOT NULL) - UUID v4, poignée de recherche
//   - purpose (TEXT, NOT NULL) - 'verify-email' ou 'reset-password'
//   - created_at (TIMESTAMPTZ, NOT NULL)
//
// Workflow:
//   1. Inscription ou forgot-password: un OTP est créé, le code part par email,
//      le otp_token est renvoyé au client
//   2. Le client renvoie (otp_token, code)
//   3. Recherche par (otp_token, purpose), puis expiration (15 min), puis code
//   4. Succès ou expiration: l'OTP est supprimé (usage unique)
//
// Points d'attention:
//   - Jamais mis à jour, seulement créé puis supprimé
//   - Un mauvais code ne consomme pas l'OTP
//   - Expiration paresseuse: rien ne supprime un OTP périmé tant qu'on ne le
//     valide pas (sauf le balayage optionnel, voir services::otp)
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "kebab-case")]
pub enum OtpPurpose {
    #[sea_orm(string_value = "verify-email")]
    VerifyEmail,
    #[sea_orm(string_value = "reset-password")]
    ResetPassword,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::VerifyEmail => "verify-email",
            OtpPurpose::ResetPassword => "reset-password",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "otps")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    pub code: String,

    #[sea_orm(unique)]
    pub otp_token: String,

    pub purpose: OtpPurpose,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
