//! Observations and the namings proposed for them.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use mycoflora_core::{NameId, NamingId, ObservationId, UserId};

use super::RepositoryError;

/// A recorded sighting.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Observation {
    pub id: ObservationId,
    pub user_id: UserId,
    /// Free-text description of what was seen.
    pub what: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
    /// Login of the observer.
    pub observer: String,
}

/// A name proposed for an observation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Naming {
    pub id: NamingId,
    pub observation_id: ObservationId,
    pub name_id: NameId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A naming joined with its name text and proposer, for display.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct NamingSummary {
    pub id: NamingId,
    pub name_id: NameId,
    pub text_name: String,
    pub user_login: String,
    pub created_at: DateTime<Utc>,
}

const OBSERVATION_SELECT: &str = "SELECT o.id, o.user_id, o.what, o.location, o.created_at,
            u.login AS observer
     FROM observations o
     JOIN users u ON u.id = o.user_id";

/// Repository for observations and namings.
pub struct ObservationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ObservationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Most recent observations first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Observation>, RepositoryError> {
        let rows = sqlx::query_as::<_, Observation>(&format!(
            "{OBSERVATION_SELECT} ORDER BY o.created_at DESC, o.id DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Get an observation by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ObservationId) -> Result<Option<Observation>, RepositoryError> {
        let row = sqlx::query_as::<_, Observation>(&format!("{OBSERVATION_SELECT} WHERE o.id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row)
    }

    /// Whether an observation with this ID exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: ObservationId) -> Result<bool, RepositoryError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM observations WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Record a new observation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        what: &str,
        location: &str,
    ) -> Result<ObservationId, RepositoryError> {
        let id = sqlx::query_scalar(
            "INSERT INTO observations (user_id, what, location, created_at)
             VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(user_id)
        .bind(what.trim())
        .bind(location.trim())
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Namings proposed for an observation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn namings_for(
        &self,
        observation_id: ObservationId,
    ) -> Result<Vec<NamingSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, NamingSummary>(
            "SELECT g.id, g.name_id, n.text_name, u.login AS user_login, g.created_at
             FROM namings g
             JOIN names n ON n.id = g.name_id
             JOIN users u ON u.id = g.user_id
             WHERE g.observation_id = ?
             ORDER BY g.id",
        )
        .bind(observation_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Get a naming by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_naming(&self, id: NamingId) -> Result<Option<Naming>, RepositoryError> {
        let row = sqlx::query_as::<_, Naming>(
            "SELECT id, observation_id, name_id, user_id, created_at FROM namings WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Propose a name for an observation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_naming(
        &self,
        observation_id: ObservationId,
        name_id: NameId,
        user_id: UserId,
    ) -> Result<Naming, RepositoryError> {
        let naming = sqlx::query_as::<_, Naming>(
            "INSERT INTO namings (observation_id, name_id, user_id, created_at)
             VALUES (?, ?, ?, ?)
             RETURNING id, observation_id, name_id, user_id, created_at",
        )
        .bind(observation_id)
        .bind(name_id)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(naming)
    }

    /// Number of namings that proposed a given name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_namings_of(&self, name_id: NameId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM namings WHERE name_id = ?")
            .bind(name_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
