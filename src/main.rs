mod config;
mod db;
mod email;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod store;
mod utils;

#[cfg(test)]
mod test_support;

use std::io::Write;
use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use flexi_logger::Logger as FlexiLogger;

use crate::config::Config;
use crate::email::EmailSender;
use crate::email::senders::{MockSender, SmtpSender};
use crate::services::auth::AuthService;
use crate::services::otp::OtpService;
use crate::services::produit::ProduitService;
use crate::state::AppState;
use crate::store::sea::{SeaOtpStore, SeaProduitStore, SeaUserStore};
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::jwt::SessionKeys;
use crate::utils::password::PasswordHasher;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = Config::from_env().expect("Invalid configuration");

    let _logger = FlexiLogger::try_with_str(&config.log_level)
        .expect(
            "Invalid log level. Options: ERROR, WARN, INFO, DEBUG, TRACE. \
             Example: `info, catalog_api::services=debug`",
        )
        .log_to_stdout()
        .format(|writer, now, record| {
            write!(
                writer,
                "{:5} | {} | {}:{} | {}",
                record.level(),
                now.format("%Y-%m-%dT%H:%M:%S%.6fZ"),
                record.module_path().unwrap_or("<unknown>"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .use_utc()
        .start()
        .expect("Failed to start logger");

    config::set_expose_error_details(config.development);

    log::info!("Connecting to database...");
    let db = db::establish_connection(&config.database_url)
        .await
        .expect("Failed to connect to database");
    db::ensure_schema(&db).await.expect("Failed to apply database schema");
    log::info!("Database connected");

    let mailer: EmailSender = match &config.email {
        Some(email_config) => {
            let sender = SmtpSender::new(email_config).expect("Invalid SMTP configuration");
            match sender.test_connection().await {
                Ok(true) => log::info!("SMTP relay {} reachable", email_config.smtp_host),
                Ok(false) | Err(_) => log::warn!(
                    "SMTP relay {} not reachable, emails may not be delivered",
                    email_config.smtp_host
                ),
            }
            Arc::new(sender)
        }
        None => {
            log::info!("Email sending disabled, messages will only be logged");
            Arc::new(MockSender::new())
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let users = Arc::new(SeaUserStore::new(db.clone()));
    let otps = Arc::new(SeaOtpStore::new(db.clone()));
    let produits = Arc::new(SeaProduitStore::new(db.clone()));

    let otp = OtpService::new(otps, mailer, clock.clone(), config.otp_lifetime);
    let auth = AuthService::new(
        users.clone(),
        produits.clone(),
        otp.clone(),
        PasswordHasher::new(config.password_hash_iterations),
        SessionKeys::new(&config.jwt_secret, config.session_lifetime),
        clock.clone(),
    );
    let produit = ProduitService::new(produits, users, clock);

    if let Some(every) = config.otp_sweep_interval {
        log::info!("OTP reaper enabled, sweeping every {}s", every.as_secs());
        otp.spawn_reaper(every);
    }

    let state = web::Data::new(AppState {
        auth,
        produits: produit,
    });

    log::info!("Starting server on http://{}:{}", config.bind_address, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes::configure_routes)
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await
}
