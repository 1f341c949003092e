//! Image licenses.

use sqlx::SqlitePool;

use mycoflora_core::LicenseId;

use super::RepositoryError;

/// A license contributors can attach to their images.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct License {
    pub id: LicenseId,
    pub display_name: String,
    /// Short identifier used in upload forms.
    pub form_name: String,
    pub url: String,
    pub deprecated: bool,
}

/// Fields for a new license.
#[derive(Debug, Clone)]
pub struct NewLicense {
    pub display_name: String,
    pub form_name: String,
    pub url: String,
    pub deprecated: bool,
}

/// Repository for licenses.
pub struct LicenseRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LicenseRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All licenses, current ones first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<License>, RepositoryError> {
        let rows = sqlx::query_as::<_, License>(
            "SELECT id, display_name, form_name, url, deprecated FROM licenses
             ORDER BY deprecated, display_name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Get a license by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: LicenseId) -> Result<Option<License>, RepositoryError> {
        let row = sqlx::query_as::<_, License>(
            "SELECT id, display_name, form_name, url, deprecated FROM licenses WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Add a license.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the form name is taken.
    pub async fn create(&self, new: &NewLicense) -> Result<License, RepositoryError> {
        sqlx::query_as::<_, License>(
            "INSERT INTO licenses (display_name, form_name, url, deprecated)
             VALUES (?, ?, ?, ?)
             RETURNING id, display_name, form_name, url, deprecated",
        )
        .bind(new.display_name.trim())
        .bind(new.form_name.trim())
        .bind(new.url.trim())
        .bind(new.deprecated)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "license form name already exists"))
    }

    /// Delete a license. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: LicenseId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM licenses WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
