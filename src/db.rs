// connexion BD

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use std::time::Duration;

const SCHEMA: &str = include_str!("../sql/schema.sql");

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    Database::connect(options).await
}

/// Applique le schéma (idempotent, `IF NOT EXISTS` partout)
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        db.execute_unprepared(statement).await?;
    }

    Ok(())
}
