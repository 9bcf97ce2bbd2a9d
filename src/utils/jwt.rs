use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::users::{self, Role};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // user_id
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,      // expiration timestamp
}

/// Claims relues sans présumer de leur présence: un champ manquant
/// est un jeton mal formé, pas une signature invalide
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<String>,
    email: Option<String>,
    role: Option<Role>,
}

/// Identité portée par un jeton de session valide
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Clés HS256 et durée de vie des jetons de session
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        }
    }

    /// Génère un JWT embarquant {userId, email, role}. Le rôle est figé
    /// pour toute la durée de vie du jeton.
    pub fn issue(&self, user: &users::Model, now: DateTime<Utc>) -> Result<String, AppError> {
        let expiration = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| AppError::Internal("Failed to calculate expiration".to_string()))?;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {e}")))
    }

    /// Vérifie et décode un jeton de session
    pub fn decode(&self, token: &str) -> Result<SessionClaims, AppError> {
        // En-tête illisible: ce n'est pas un de nos jetons
        decode_header(token).map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

        // Signature vérifiée avant les claims: une erreur JSON ici vient d'un jeton signé incomplet
        let data = decode::<RawClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::Unauthorized("Session expired".to_string()),
                ErrorKind::MissingRequiredClaim(claim) => {
                    AppError::MalformedToken(format!("Token is missing the '{claim}' claim"))
                }
                ErrorKind::Json(_) => AppError::MalformedToken("Token claims are malformed".to_string()),
                _ => AppError::Unauthorized("Invalid token".to_string()),
            }
        })?;

        let claims = data.claims;
        let (Some(sub), Some(email)) = (claims.sub, claims.email) else {
            return Err(AppError::MalformedToken("Incomplete token".to_string()));
        };

        let user_id = Uuid::parse_str(&sub)
            .map_err(|_| AppError::MalformedToken("Token subject is not a user id".to_string()))?;

        Ok(SessionClaims {
            user_id,
            email,
            role: claims.role.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: String::new(),
            is_email_verified: true,
            role,
            created_at: Utc::now(),
        }
    }

    fn keys() -> SessionKeys {
        SessionKeys::new("test-secret", Duration::hours(24))
    }

    #[test]
    fn test_generate_and_verify_token() {
        let user = user(Role::Admin);
        let token = keys().issue(&user, Utc::now()).unwrap();
        let claims = keys().decode(&token).unwrap();

        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_invalid_token() {
        let result = keys().decode("invalid.token.here");
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = SessionKeys::new("other-secret", Duration::hours(24))
            .issue(&user(Role::User), Utc::now())
            .unwrap();

        assert!(matches!(keys().decode(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token() {
        let token = keys()
            .issue(&user(Role::User), Utc::now() - Duration::hours(25))
            .unwrap();

        assert!(matches!(keys().decode(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_missing_claims_are_malformed() {
        #[derive(Serialize)]
        struct Partial {
            sub: String,
            exp: i64,
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &Partial {
                sub: Uuid::new_v4().to_string(),
                exp: (Utc::now() + Duration::hours(1)).timestamp(),
            },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(keys().decode(&token), Err(AppError::MalformedToken(_))));
    }

    #[test]
    fn test_missing_role_defaults_to_user() {
        #[derive(Serialize)]
        struct Legacy {
            sub: String,
            email: String,
            exp: i64,
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &Legacy {
                sub: Uuid::new_v4().to_string(),
                email: "legacy@x.com".to_string(),
                exp: (Utc::now() + Duration::hours(1)).timestamp(),
            },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert_eq!(keys().decode(&token).unwrap().role, Role::User);
    }
}
