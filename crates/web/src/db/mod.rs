//! Database operations for the Mycoflora `SQLite` database.
//!
//! ## Tables
//!
//! - `users` - Site accounts, with the persistent `admin` attribute and locale preference
//! - `observations`, `names`, `namings` - Sightings and the names proposed for them
//! - `notifications`, `queued_emails` - Name tracking and its outgoing mail queue
//! - `projects`, `field_slips` - Printed slip codes linking specimens to observations
//! - `donations` - Submitted donations awaiting review
//! - `contest_entries`, `contest_votes` - The photo contest ballot
//! - `licenses` - Image licenses offered to contributors
//! - `tower_sessions` - Session storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and embedded into the
//! binary. Run them via:
//! ```bash
//! cargo run -p mycoflora-cli -- migrate
//! ```

pub mod contest;
pub mod donations;
pub mod field_slips;
pub mod licenses;
pub mod names;
pub mod notifications;
pub mod observations;
pub mod stats;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

pub use contest::ContestRepository;
pub use donations::DonationRepository;
pub use field_slips::{FieldSlipRepository, ProjectRepository};
pub use licenses::LicenseRepository;
pub use names::NameRepository;
pub use notifications::NotificationRepository;
pub use observations::ObservationRepository;
pub use users::UserRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate field slip code).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_insert(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `SQLite` connection pool, creating the database file if needed.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is malformed or the connection cannot be
/// established.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Create a single-connection in-memory pool.
///
/// The connection is never recycled, so the database lives as long as the pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if `SQLite` cannot open the database.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if a migration fails or the applied history diverges.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use sqlx::SqlitePool;

    use mycoflora_core::UserId;

    /// Migrated in-memory pool for repository tests.
    #[allow(clippy::expect_used)]
    pub async fn pool() -> SqlitePool {
        let pool = super::create_memory_pool().await.expect("memory pool");
        super::run_migrations(&pool).await.expect("migrations");
        pool
    }

    /// Insert a bare user row and return its id.
    #[allow(clippy::expect_used)]
    pub async fn user(pool: &SqlitePool, login: &str, admin: bool) -> UserId {
        sqlx::query_scalar(
            "INSERT INTO users (login, email, password_hash, admin, created_at)
             VALUES (?, ?, 'x', ?, ?) RETURNING id",
        )
        .bind(login)
        .bind(format!("{login}@example.org"))
        .bind(admin)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .expect("insert user")
    }
}
