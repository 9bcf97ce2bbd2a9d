use once_cell::sync::OnceCell;
use std::env;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::utils::password;

/// Positionné une seule fois au démarrage, lu par les réponses d'erreur 500
static EXPOSE_ERROR_DETAILS: OnceCell<bool> = OnceCell::new();

pub fn set_expose_error_details(expose: bool) {
    let _ = EXPOSE_ERROR_DETAILS.set(expose);
}

pub fn expose_error_details() -> bool {
    EXPOSE_ERROR_DETAILS.get().copied().unwrap_or(false)
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set (environment or .env file)")]
    Missing(&'static str),
    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub from: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
}

/// Configuration de l'application, chargée depuis les variables d'environnement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_address: String,
    pub port: u16,
    pub development: bool,
    pub log_level: String,
    pub otp_lifetime: Duration,
    pub session_lifetime: Duration,
    pub password_hash_iterations: u32,
    pub otp_sweep_interval: Option<StdDuration>,
    /// `None` quand les emails sont désactivés (les messages sont alors juste loggés)
    pub email: Option<EmailConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let bind_address = lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parsed(&lookup, "PORT")?.unwrap_or(8080);
        let development = lookup("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("development"))
            .unwrap_or(false);
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let otp_lifetime_mins: i64 = parsed(&lookup, "OTP_LIFETIME_MINS")?.unwrap_or(15);
        let session_lifetime_hours: i64 = parsed(&lookup, "SESSION_LIFETIME_HOURS")?.unwrap_or(24);
        if otp_lifetime_mins <= 0 {
            return Err(invalid("OTP_LIFETIME_MINS", otp_lifetime_mins));
        }
        if session_lifetime_hours <= 0 {
            return Err(invalid("SESSION_LIFETIME_HOURS", session_lifetime_hours));
        }

        let password_hash_iterations =
            parsed(&lookup, "PASSWORD_HASH_ITERATIONS")?.unwrap_or(password::DEFAULT_ITERATIONS);
        if password_hash_iterations == 0 {
            return Err(invalid("PASSWORD_HASH_ITERATIONS", password_hash_iterations));
        }

        let otp_sweep_interval = match parsed::<u64, _>(&lookup, "OTP_SWEEP_INTERVAL_SECS")? {
            Some(0) => return Err(invalid("OTP_SWEEP_INTERVAL_SECS", 0)),
            Some(secs) => Some(StdDuration::from_secs(secs)),
            None => None,
        };

        let email_enabled = parsed(&lookup, "EMAIL_ENABLED")?.unwrap_or(false);
        let email = if email_enabled {
            Some(EmailConfig {
                from: required("EMAIL_FROM")?,
                smtp_host: required("SMTP_HOST")?,
                smtp_port: parsed(&lookup, "SMTP_PORT")?.unwrap_or(587),
                smtp_username: required("SMTP_USERNAME")?,
                smtp_password: required("SMTP_PASSWORD")?,
            })
        } else {
            None
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_address,
            port,
            development,
            log_level,
            otp_lifetime: Duration::minutes(otp_lifetime_mins),
            session_lifetime: Duration::hours(session_lifetime_hours),
            password_hash_iterations,
            otp_sweep_interval,
            email,
        })
    }
}

fn parsed<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}

fn invalid(var: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/catalog"),
            ("JWT_SECRET", "secret"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.otp_lifetime, Duration::minutes(15));
        assert_eq!(config.session_lifetime, Duration::hours(24));
        assert_eq!(config.password_hash_iterations, password::DEFAULT_ITERATIONS);
        assert!(!config.development);
        assert!(config.otp_sweep_interval.is_none());
        assert!(config.email.is_none());
    }

    #[test]
    fn missing_secret_is_reported() {
        let err = load(&[("DATABASE_URL", "postgres://localhost/catalog")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/catalog"),
            ("JWT_SECRET", "secret"),
            ("PORT", "eighty"),
        ])
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
    }

    #[test]
    fn email_settings_are_required_once_enabled() {
        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/catalog"),
            ("JWT_SECRET", "secret"),
            ("EMAIL_ENABLED", "true"),
            ("EMAIL_FROM", "noreply@catalog.test"),
        ])
        .unwrap_err();

        assert_eq!(err, ConfigError::Missing("SMTP_HOST"));
    }

    #[test]
    fn development_mode_and_sweeper_are_read() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/catalog"),
            ("JWT_SECRET", "secret"),
            ("APP_ENV", "Development"),
            ("OTP_SWEEP_INTERVAL_SECS", "300"),
        ])
        .unwrap();

        assert!(config.development);
        assert_eq!(config.otp_sweep_interval, Some(StdDuration::from_secs(300)));
    }
}
