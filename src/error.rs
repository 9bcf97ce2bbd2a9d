use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::config;
use crate::services::otp::OtpError;
use crate::store::StoreError;

/// Taxonomie d'erreurs exposée par l'API. Chaque handler retourne `Result<_, AppError>`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // 400
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("malformed token: {0}")]
    MalformedToken(String),

    // 401
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    // 403
    #[error("forbidden: {0}")]
    Forbidden(String),

    // 404
    #[error("not found: {0}")]
    NotFound(String),

    // 406
    #[error("not acceptable: {0}")]
    NotAcceptable(String),

    // 409
    #[error("conflict: {0}")]
    Conflict(String),

    // 410
    #[error("gone: {0}")]
    Gone(String),

    // 422
    #[error("unprocessable: {0}")]
    UnprocessableEntity(String),

    // 500
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message renvoyé au client (les détails internes ne sortent jamais d'ici)
    pub fn public_message(&self) -> &str {
        match self {
            AppError::InvalidInput(msg)
            | AppError::MalformedToken(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::NotAcceptable(msg)
            | AppError::Conflict(msg)
            | AppError::Gone(msg)
            | AppError::UnprocessableEntity(msg) => msg,
            AppError::Internal(_) => "Internal server error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::MalformedToken(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Gone(_) => StatusCode::GONE,
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = serde_json::json!({
            "success": false,
            "error": self.public_message(),
        });

        if let AppError::Internal(details) = self {
            log::error!("{details}");
            if config::expose_error_details() {
                body["details"] = serde_json::Value::String(details.clone());
            }
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(detail) => {
                AppError::Conflict(format!("A record with the same unique value already exists ({detail})"))
            }
            StoreError::Database(detail) => AppError::Internal(detail),
        }
    }
}

impl From<OtpError> for AppError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::NotFound => {
                AppError::NotFound("Verification request not found or already used".to_string())
            }
            OtpError::Expired => AppError::Gone("The one-time passcode has expired".to_string()),
            OtpError::Mismatch => AppError::NotAcceptable(
                "Invalid one-time passcode, check the code or request a new one".to_string(),
            ),
            OtpError::Store(e) => e.into(),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Background task failed: {err}"))
    }
}
