//! Contest entries and per-user votes.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use mycoflora_core::{ContestEntryId, ContestVoteId, UserId};

use super::RepositoryError;

/// A photo submitted to the contest.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct ContestEntry {
    pub id: ContestEntryId,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// One line of a user's ballot: their vote on one entry.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, serde::Serialize)]
pub struct BallotLine {
    pub vote_id: ContestVoteId,
    pub entry_id: ContestEntryId,
    pub title: String,
    /// Rank, `1` being the favourite.
    pub vote: i32,
}

/// Which votes a ballot changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BallotOutcome {
    pub updated: Vec<ContestVoteId>,
    pub unchanged: Vec<ContestVoteId>,
}

/// Repository for the contest tables.
pub struct ContestRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ContestRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All entries in submission order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_entries(&self) -> Result<Vec<ContestEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, ContestEntry>(
            "SELECT id, title, description, created_at FROM contest_entries ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Get an entry by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_entry(
        &self,
        id: ContestEntryId,
    ) -> Result<Option<ContestEntry>, RepositoryError> {
        let row = sqlx::query_as::<_, ContestEntry>(
            "SELECT id, title, description, created_at FROM contest_entries WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Add an entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_entry(
        &self,
        title: &str,
        description: &str,
    ) -> Result<ContestEntry, RepositoryError> {
        let row = sqlx::query_as::<_, ContestEntry>(
            "INSERT INTO contest_entries (title, description, created_at) VALUES (?, ?, ?)
             RETURNING id, title, description, created_at",
        )
        .bind(title.trim())
        .bind(description.trim())
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Delete an entry and every vote cast on it. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_entry(&self, id: ContestEntryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM contest_entries WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of entries, which is also the highest valid rank.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_entries(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM contest_entries")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// A user's ballot ordered by rank.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ballot_for(&self, user_id: UserId) -> Result<Vec<BallotLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, BallotLine>(
            "SELECT v.id AS vote_id, e.id AS entry_id, e.title, v.vote
             FROM contest_votes v
             JOIN contest_entries e ON e.id = v.contest_entry_id
             WHERE v.user_id = ?
             ORDER BY v.vote, e.id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Insert votes for entries the user has not voted on yet.
    ///
    /// Pairs that already have a vote are left alone, so concurrent callers
    /// cannot create a second vote for the same entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; none are kept.
    pub async fn insert_missing_votes(
        &self,
        user_id: UserId,
        assignments: &[(ContestEntryId, i32)],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for (entry_id, vote) in assignments {
            sqlx::query(
                "INSERT OR IGNORE INTO contest_votes (user_id, contest_entry_id, vote)
                 VALUES (?, ?, ?)",
            )
            .bind(user_id)
            .bind(*entry_id)
            .bind(*vote)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Apply rank changes to a user's own votes in one transaction.
    ///
    /// A vote is reported unchanged when it is not the user's or already holds
    /// the requested rank. Callers validate ranks before calling.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails; no vote
    /// changes in that case.
    pub async fn apply_votes(
        &self,
        user_id: UserId,
        changes: &[(ContestVoteId, i32)],
    ) -> Result<BallotOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut outcome = BallotOutcome::default();

        for &(vote_id, vote) in changes {
            let result = sqlx::query(
                "UPDATE contest_votes SET vote = ? WHERE id = ? AND user_id = ? AND vote <> ?",
            )
            .bind(vote)
            .bind(vote_id)
            .bind(user_id)
            .bind(vote)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                outcome.updated.push(vote_id);
            } else {
                outcome.unchanged.push(vote_id);
            }
        }

        tx.commit().await?;
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support;

    #[tokio::test]
    async fn test_votes_are_unique_per_entry() {
        let pool = test_support::pool().await;
        let mary = test_support::user(&pool, "mary", false).await;
        let repo = ContestRepository::new(&pool);
        let entry = repo.create_entry("Chanterelles at dawn", "").await.unwrap();

        repo.insert_missing_votes(mary, &[(entry.id, 1)]).await.unwrap();
        repo.insert_missing_votes(mary, &[(entry.id, 2)]).await.unwrap();

        let ballot = repo.ballot_for(mary).await.unwrap();
        assert_eq!(ballot.len(), 1);
        assert_eq!(ballot[0].vote, 1);
    }

    #[tokio::test]
    async fn test_apply_votes_only_touches_own_changed_votes() {
        let pool = test_support::pool().await;
        let mary = test_support::user(&pool, "mary", false).await;
        let rolf = test_support::user(&pool, "rolf", false).await;
        let repo = ContestRepository::new(&pool);
        let first = repo.create_entry("One", "").await.unwrap();
        let second = repo.create_entry("Two", "").await.unwrap();
        repo.insert_missing_votes(mary, &[(first.id, 1), (second.id, 2)])
            .await
            .unwrap();
        repo.insert_missing_votes(rolf, &[(first.id, 1)]).await.unwrap();

        let mine = repo.ballot_for(mary).await.unwrap();
        let theirs = repo.ballot_for(rolf).await.unwrap();
        let (one, two) = (mine[0].vote_id, mine[1].vote_id);

        let outcome = repo
            .apply_votes(mary, &[(one, 2), (two, 2), (theirs[0].vote_id, 2)])
            .await
            .unwrap();
        assert_eq!(outcome.updated, vec![one]);
        assert_eq!(outcome.unchanged, vec![two, theirs[0].vote_id]);
        assert_eq!(repo.ballot_for(rolf).await.unwrap()[0].vote, 1);
    }

    #[tokio::test]
    async fn test_delete_entry_cascades_votes() {
        let pool = test_support::pool().await;
        let mary = test_support::user(&pool, "mary", false).await;
        let repo = ContestRepository::new(&pool);
        let entry = repo.create_entry("Gone", "").await.unwrap();
        repo.insert_missing_votes(mary, &[(entry.id, 1)]).await.unwrap();

        assert!(repo.delete_entry(entry.id).await.unwrap());
        assert!(repo.ballot_for(mary).await.unwrap().is_empty());
        assert_eq!(repo.count_entries().await.unwrap(), 0);
    }
}
