//! Subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::SqlitePool;
use thiserror::Error;

use mycoflora_web::db;

/// Errors opening the site database.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Missing environment variable: MYCO_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the database named by `MYCO_DATABASE_URL`, falling back to
/// `DATABASE_URL`.
pub async fn connect() -> Result<SqlitePool, ConnectError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("MYCO_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConnectError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}
