//! Taxon names.

use sqlx::SqlitePool;

use mycoflora_core::NameId;

use super::RepositoryError;

/// A scientific name that can be proposed for observations.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Name {
    pub id: NameId,
    pub text_name: String,
    pub author: String,
}

/// Repository for names.
pub struct NameRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> NameRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a name by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: NameId) -> Result<Option<Name>, RepositoryError> {
        let name = sqlx::query_as::<_, Name>(
            "SELECT id, text_name, author FROM names WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(name)
    }

    /// Find a name by its exact text, creating it if it does not exist yet.
    ///
    /// Whitespace runs in `text_name` are collapsed first so `Amanita  muscaria`
    /// and `Amanita muscaria` resolve to the same row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either statement fails.
    pub async fn find_or_create(&self, text_name: &str) -> Result<Name, RepositoryError> {
        let text_name = text_name.split_whitespace().collect::<Vec<_>>().join(" ");

        sqlx::query("INSERT INTO names (text_name) VALUES (?) ON CONFLICT (text_name) DO NOTHING")
            .bind(&text_name)
            .execute(self.pool)
            .await?;

        let name = sqlx::query_as::<_, Name>(
            "SELECT id, text_name, author FROM names WHERE text_name = ?",
        )
        .bind(&text_name)
        .fetch_one(self.pool)
        .await?;

        Ok(name)
    }

    /// Create a name with an author citation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    pub async fn create(&self, text_name: &str, author: &str) -> Result<Name, RepositoryError> {
        sqlx::query_as::<_, Name>(
            "INSERT INTO names (text_name, author) VALUES (?, ?)
             RETURNING id, text_name, author",
        )
        .bind(text_name.trim())
        .bind(author.trim())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "name already exists"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support;

    #[tokio::test]
    async fn test_find_or_create_is_stable() {
        let pool = test_support::pool().await;
        let repo = NameRepository::new(&pool);

        let first = repo.find_or_create("Amanita muscaria").await.unwrap();
        let second = repo.find_or_create("  Amanita   muscaria ").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.text_name, "Amanita muscaria");
    }

    #[tokio::test]
    async fn test_create_with_author() {
        let pool = test_support::pool().await;
        let repo = NameRepository::new(&pool);

        let name = repo.create("Boletus edulis", "Bull.").await.unwrap();
        assert_eq!(repo.get(name.id).await.unwrap().unwrap().author, "Bull.");
        assert!(matches!(
            repo.create("Boletus edulis", "").await,
            Err(RepositoryError::Conflict(_))
        ));
    }
}
