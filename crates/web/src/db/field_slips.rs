//! Field slips and the projects that issue them.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use mycoflora_core::{FieldSlipId, ObservationId, ProjectId, UserId};

use super::RepositoryError;

/// A printed slip whose code ties a physical specimen to an observation.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct FieldSlip {
    pub id: FieldSlipId,
    /// Normalized `PREFIX-NNNN` code.
    pub code: String,
    pub observation_id: Option<ObservationId>,
    pub project_id: Option<ProjectId>,
    /// Creator; may edit and delete the slip.
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated field slip attributes, used for both create and update.
#[derive(Debug, Clone)]
pub struct FieldSlipFields {
    pub code: String,
    pub observation_id: Option<ObservationId>,
    pub project_id: Option<ProjectId>,
}

/// A project that prints its own field slips.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    /// Code prefix reserved for this project's slips.
    pub field_slip_prefix: String,
    pub user_id: UserId,
}

const FIELD_SLIP_COLUMNS: &str =
    "id, code, observation_id, project_id, user_id, created_at, updated_at";

/// Repository for field slips.
pub struct FieldSlipRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FieldSlipRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All slips ordered by code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<FieldSlip>, RepositoryError> {
        let rows = sqlx::query_as::<_, FieldSlip>(&format!(
            "SELECT {FIELD_SLIP_COLUMNS} FROM field_slips ORDER BY code"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Get a slip by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: FieldSlipId) -> Result<Option<FieldSlip>, RepositoryError> {
        let row = sqlx::query_as::<_, FieldSlip>(&format!(
            "SELECT {FIELD_SLIP_COLUMNS} FROM field_slips WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Whether `code` is used by a slip other than `except`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn code_taken(
        &self,
        code: &str,
        except: Option<FieldSlipId>,
    ) -> Result<bool, RepositoryError> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM field_slips WHERE code = ? AND id IS NOT ?")
                .bind(code)
                .bind(except)
                .fetch_optional(self.pool)
                .await?;

        Ok(found.is_some())
    }

    /// Insert a slip.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is already taken.
    pub async fn create(
        &self,
        fields: &FieldSlipFields,
        user_id: UserId,
    ) -> Result<FieldSlip, RepositoryError> {
        let now = Utc::now();
        sqlx::query_as::<_, FieldSlip>(&format!(
            "INSERT INTO field_slips
                 (code, observation_id, project_id, user_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {FIELD_SLIP_COLUMNS}"
        ))
        .bind(&fields.code)
        .bind(fields.observation_id)
        .bind(fields.project_id)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "field slip code already exists"))
    }

    /// Replace a slip's attributes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the slip is gone and
    /// `RepositoryError::Conflict` if the new code is taken.
    pub async fn update(
        &self,
        id: FieldSlipId,
        fields: &FieldSlipFields,
    ) -> Result<FieldSlip, RepositoryError> {
        sqlx::query_as::<_, FieldSlip>(&format!(
            "UPDATE field_slips
             SET code = ?, observation_id = ?, project_id = ?, updated_at = ?
             WHERE id = ?
             RETURNING {FIELD_SLIP_COLUMNS}"
        ))
        .bind(&fields.code)
        .bind(fields.observation_id)
        .bind(fields.project_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "field slip code already exists"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a slip. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: FieldSlipId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM field_slips WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Repository for projects.
pub struct ProjectRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProjectRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a project by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        let row = sqlx::query_as::<_, Project>(
            "SELECT id, title, field_slip_prefix, user_id FROM projects WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Find the project that owns a slip code prefix.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_prefix(&self, prefix: &str) -> Result<Option<Project>, RepositoryError> {
        let row = sqlx::query_as::<_, Project>(
            "SELECT id, title, field_slip_prefix, user_id FROM projects
             WHERE field_slip_prefix = ?",
        )
        .bind(prefix)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a project.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the prefix is already reserved.
    pub async fn create(
        &self,
        title: &str,
        field_slip_prefix: &str,
        user_id: UserId,
    ) -> Result<Project, RepositoryError> {
        sqlx::query_as::<_, Project>(
            "INSERT INTO projects (title, field_slip_prefix, user_id) VALUES (?, ?, ?)
             RETURNING id, title, field_slip_prefix, user_id",
        )
        .bind(title.trim())
        .bind(field_slip_prefix.trim().to_ascii_uppercase())
        .bind(user_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "field slip prefix already reserved"))
    }
}
