//! Donation records.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use mycoflora_core::{DonationAmount, DonationId, UserId};

use super::RepositoryError;

/// A submitted donation.
#[derive(Debug, Clone)]
pub struct Donation {
    pub id: DonationId,
    pub amount: DonationAmount,
    pub who: String,
    pub email: String,
    pub anonymous: bool,
    pub recurring: bool,
    /// Set by staff once the payment has been matched.
    pub reviewed: bool,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new donation. New donations are never reviewed.
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub amount: DonationAmount,
    pub who: String,
    pub email: String,
    pub anonymous: bool,
    pub recurring: bool,
    pub user_id: Option<UserId>,
}

/// Public donor list entry.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Donor {
    pub who: String,
    pub donations: i64,
}

#[derive(sqlx::FromRow)]
struct DonationRow {
    id: DonationId,
    amount: String,
    who: String,
    email: String,
    anonymous: bool,
    recurring: bool,
    reviewed: bool,
    user_id: Option<UserId>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DonationRow> for Donation {
    type Error = RepositoryError;

    fn try_from(row: DonationRow) -> Result<Self, Self::Error> {
        let amount = Decimal::from_str(&row.amount)
            .ok()
            .and_then(|d| DonationAmount::new(d).ok())
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "invalid donation amount in database: {}",
                    row.amount
                ))
            })?;

        Ok(Self {
            id: row.id,
            amount,
            who: row.who,
            email: row.email,
            anonymous: row.anonymous,
            recurring: row.recurring,
            reviewed: row.reviewed,
            user_id: row.user_id,
            created_at: row.created_at,
        })
    }
}

const DONATION_COLUMNS: &str =
    "id, amount, who, email, anonymous, recurring, reviewed, user_id, created_at";

/// Repository for donations.
pub struct DonationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DonationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a donation as unreviewed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewDonation) -> Result<Donation, RepositoryError> {
        let row = sqlx::query_as::<_, DonationRow>(&format!(
            "INSERT INTO donations
                 (amount, who, email, anonymous, recurring, reviewed, user_id, created_at)
             VALUES (?, ?, ?, ?, ?, 0, ?, ?)
             RETURNING {DONATION_COLUMNS}"
        ))
        .bind(new.amount.to_string())
        .bind(new.who.trim())
        .bind(new.email.trim())
        .bind(new.anonymous)
        .bind(new.recurring)
        .bind(new.user_id)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// All donations, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored amount is invalid.
    pub async fn list(&self) -> Result<Vec<Donation>, RepositoryError> {
        sqlx::query_as::<_, DonationRow>(&format!(
            "SELECT {DONATION_COLUMNS} FROM donations ORDER BY id DESC"
        ))
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Donation::try_from)
        .collect()
    }

    /// Reviewed donors who agreed to be listed, most frequent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn public_donors(&self) -> Result<Vec<Donor>, RepositoryError> {
        let rows = sqlx::query_as::<_, Donor>(
            "SELECT who, COUNT(*) AS donations FROM donations
             WHERE reviewed = 1 AND anonymous = 0 AND TRIM(who) <> ''
             GROUP BY who
             ORDER BY donations DESC, who",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Mark a donation as reviewed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the donation does not exist.
    pub async fn mark_reviewed(&self, id: DonationId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE donations SET reviewed = 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support;

    fn donation(amount: &str, who: &str, anonymous: bool) -> NewDonation {
        NewDonation {
            amount: DonationAmount::parse(amount).unwrap(),
            who: who.to_string(),
            email: format!("{who}@example.org"),
            anonymous,
            recurring: false,
            user_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_is_unreviewed() {
        let pool = test_support::pool().await;
        let repo = DonationRepository::new(&pool);

        let created = repo.create(&donation("12.50", "Bob", false)).await.unwrap();
        assert!(!created.reviewed);
        assert_eq!(created.amount.to_string(), "12.5");

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_public_donors_hide_anonymous_and_unreviewed() {
        let pool = test_support::pool().await;
        let repo = DonationRepository::new(&pool);

        let shown = repo.create(&donation("10", "Bob", false)).await.unwrap();
        let hidden = repo.create(&donation("10", "Ann", true)).await.unwrap();
        repo.create(&donation("10", "Cy", false)).await.unwrap();
        repo.mark_reviewed(shown.id).await.unwrap();
        repo.mark_reviewed(hidden.id).await.unwrap();

        let donors = repo.public_donors().await.unwrap();
        assert_eq!(donors.len(), 1);
        assert_eq!(donors[0].who, "Bob");
    }

    #[tokio::test]
    async fn test_corrupt_amount_is_reported() {
        let pool = test_support::pool().await;
        sqlx::query(
            "INSERT INTO donations (amount, created_at) VALUES ('lots', '2026-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let err = DonationRepository::new(&pool).list().await.unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
