//! Database migration command.
//!
//! Applies the embedded site migrations from `crates/web/migrations/` and
//! creates the session table used by the web server.
//!
//! # Environment Variables
//!
//! - `MYCO_DATABASE_URL` - `SQLite` connection string (falls back to `DATABASE_URL`)

use thiserror::Error;

use mycoflora_web::{db, middleware};

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Session store error: {0}")]
    SessionStore(#[from] sqlx::Error),
}

/// Run every pending migration.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running site migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Creating session table...");
    middleware::session_store(&pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
