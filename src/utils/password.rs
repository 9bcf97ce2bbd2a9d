use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;

use crate::utils::otp_code::constant_time_eq;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_ITERATIONS: u32 = 260_000;
const KEY_LENGTH: usize = 32;
const SALT_LENGTH: usize = 16;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("invalid hash format")]
    InvalidFormat,
    #[error("PBKDF2 derivation failed")]
    Derivation,
}

/// Hash à sens unique des mots de passe: PBKDF2-HMAC-SHA256
/// Format stocké: pbkdf2:sha256:iterations$salt$hash (salt et hash en base64 URL-safe sans padding)
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }

    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        // Générer un salt aléatoire de 16 bytes
        let mut salt = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);

        let mut key = [0u8; KEY_LENGTH];
        pbkdf2::<HmacSha256>(password.as_bytes(), &salt, self.iterations, &mut key)
            .map_err(|_| PasswordError::Derivation)?;

        let salt_b64 = URL_SAFE_NO_PAD.encode(salt);
        let hash_b64 = URL_SAFE_NO_PAD.encode(key);

        Ok(format!("pbkdf2:sha256:{}${}${}", self.iterations, salt_b64, hash_b64))
    }

    /// Vérifie un mot de passe contre un hash stocké.
    /// Les itérations viennent du hash, pas de la config (les anciens hashs restent valides).
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        let parts: Vec<&str> = stored_hash.split('$').collect();
        if parts.len() != 3 {
            return Err(PasswordError::InvalidFormat);
        }

        let header_parts: Vec<&str> = parts[0].split(':').collect();
        if header_parts.len() != 3 || header_parts[0] != "pbkdf2" || header_parts[1] != "sha256" {
            return Err(PasswordError::InvalidFormat);
        }

        let iterations = header_parts[2]
            .parse::<u32>()
            .map_err(|_| PasswordError::InvalidFormat)?;

        let salt = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|_| PasswordError::InvalidFormat)?;
        let expected_hash = URL_SAFE_NO_PAD
            .decode(parts[2])
            .map_err(|_| PasswordError::InvalidFormat)?;
        if expected_hash.is_empty() {
            return Err(PasswordError::InvalidFormat);
        }

        let mut computed = vec![0u8; expected_hash.len()];
        pbkdf2::<HmacSha256>(password.as_bytes(), &salt, iterations, &mut computed)
            .map_err(|_| PasswordError::Derivation)?;

        Ok(constant_time_eq(&computed, &expected_hash))
    }
}
