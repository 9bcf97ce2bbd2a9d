pub mod auth;
pub mod health;
pub mod produits;

use actix_web::{error, web};
use validator::Validate;

use crate::error::AppError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(health::health_check)
        .configure(auth::auth_routes)
        .configure(produits::produits_routes);
}

/// Un corps JSON illisible devient un 400 dans le format d'erreur habituel
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = match &err {
            error::JsonPayloadError::ContentType => "Expected a JSON body".to_string(),
            other => format!("Invalid JSON body: {other}"),
        };
        AppError::InvalidInput(message).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::InvalidInput(format!("Invalid query string: {err}")).into())
}

/// Règles `validator` déclarées sur les DTO, erreurs ramenées à `InvalidInput`
pub(crate) fn validate<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate().map_err(|errors| {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();
        messages.sort();
        AppError::InvalidInput(messages.join(", "))
    })
}
