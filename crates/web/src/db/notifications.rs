//! Name-tracking notifications and the queued emails they produce.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use mycoflora_core::{NameId, NamingId, NotificationId, QueuedEmailId, UserId};

use super::RepositoryError;
use super::observations::Naming;

/// Notification flavor for tracking a name.
pub const FLAVOR_NAME: &str = "name";

/// Queued email flavor produced by name tracking.
pub const EMAIL_FLAVOR_NAME_TRACKING: &str = "name_tracking";

/// A user's request to hear about new namings of a name.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Notification {
    pub id: NotificationId,
    /// Owner.
    pub user_id: UserId,
    pub flavor: String,
    /// Tracked object; a name for the `name` flavor.
    pub obj_id: i32,
    /// Optional note sent to the proposer, with `:observer`, `:observation`
    /// and `:name` placeholders.
    pub note_template: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A notification joined with the tracked name, for listing.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct NotificationSummary {
    pub id: NotificationId,
    pub name_id: NameId,
    pub text_name: String,
    pub note_template: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A row in the outgoing mail queue.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueuedEmail {
    pub id: QueuedEmailId,
    pub flavor: String,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub notification_id: Option<NotificationId>,
    pub naming_id: Option<NamingId>,
    pub queued_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Everything needed to render one name-tracking email.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingNameTrackingEmail {
    pub id: QueuedEmailId,
    pub to_email: String,
    pub to_login: String,
    pub from_login: String,
    pub text_name: String,
    pub observation_id: i32,
    pub note_template: Option<String>,
}

const NOTIFICATION_COLUMNS: &str = "id, user_id, flavor, obj_id, note_template, created_at";

/// Repository for notifications and queued emails.
pub struct NotificationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> NotificationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// A user's name-tracking notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<NotificationSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, NotificationSummary>(
            "SELECT t.id, n.id AS name_id, n.text_name, t.note_template, t.created_at
             FROM notifications t
             JOIN names n ON n.id = t.obj_id
             WHERE t.user_id = ? AND t.flavor = ?
             ORDER BY t.id DESC",
        )
        .bind(user_id)
        .bind(FLAVOR_NAME)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Get a notification by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: NotificationId) -> Result<Option<Notification>, RepositoryError> {
        let row = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Start tracking a name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_name_tracker(
        &self,
        user_id: UserId,
        name_id: NameId,
        note_template: Option<&str>,
    ) -> Result<Notification, RepositoryError> {
        let row = sqlx::query_as::<_, Notification>(&format!(
            "INSERT INTO notifications (user_id, flavor, obj_id, note_template, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(FLAVOR_NAME)
        .bind(name_id.as_i32())
        .bind(note_template)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Delete a notification if `user_id` owns it. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_owned(
        &self,
        id: NotificationId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// A user's trackers on the name proposed by `naming` that carry a note template.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn templated_trackers_for(
        &self,
        user_id: UserId,
        naming: &Naming,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE user_id = ? AND flavor = ? AND obj_id = ?
               AND note_template IS NOT NULL AND TRIM(note_template) <> ''
             ORDER BY id"
        ))
        .bind(user_id)
        .bind(FLAVOR_NAME)
        .bind(naming.name_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Queue one name-tracking email per tracker of the naming's name whose
    /// owner is not the proposer. All rows are written in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// queued in that case.
    pub async fn enqueue_name_tracking(
        &self,
        naming: &Naming,
    ) -> Result<Vec<QueuedEmailId>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let trackers: Vec<(NotificationId, UserId)> = sqlx::query_as(
            "SELECT id, user_id FROM notifications
             WHERE flavor = ? AND obj_id = ? AND user_id <> ?
             ORDER BY id",
        )
        .bind(FLAVOR_NAME)
        .bind(naming.name_id.as_i32())
        .bind(naming.user_id)
        .fetch_all(&mut *tx)
        .await?;

        let now = Utc::now();
        let mut queued = Vec::with_capacity(trackers.len());
        for (notification_id, owner) in trackers {
            let id: QueuedEmailId = sqlx::query_scalar(
                "INSERT INTO queued_emails
                     (flavor, from_user_id, to_user_id, notification_id, naming_id, queued_at)
                 VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
            )
            .bind(EMAIL_FLAVOR_NAME_TRACKING)
            .bind(naming.user_id)
            .bind(owner)
            .bind(notification_id)
            .bind(naming.id)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            queued.push(id);
        }

        tx.commit().await?;
        Ok(queued)
    }

    /// Load a queued name-tracking email with its recipient and naming details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn pending_name_tracking(
        &self,
        id: QueuedEmailId,
    ) -> Result<Option<PendingNameTrackingEmail>, RepositoryError> {
        let row = sqlx::query_as::<_, PendingNameTrackingEmail>(
            "SELECT q.id, rcpt.email AS to_email, rcpt.login AS to_login,
                    sender.login AS from_login, n.text_name, g.observation_id,
                    t.note_template
             FROM queued_emails q
             JOIN users rcpt ON rcpt.id = q.to_user_id
             JOIN users sender ON sender.id = q.from_user_id
             JOIN namings g ON g.id = q.naming_id
             JOIN names n ON n.id = g.name_id
             LEFT JOIN notifications t ON t.id = q.notification_id
             WHERE q.id = ? AND q.sent_at IS NULL",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Mark a queued email as delivered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_sent(&self, id: QueuedEmailId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE queued_emails SET sent_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Emails queued for a recipient, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn queued_for(&self, to_user_id: UserId) -> Result<Vec<QueuedEmail>, RepositoryError> {
        let rows = sqlx::query_as::<_, QueuedEmail>(
            "SELECT id, flavor, from_user_id, to_user_id, notification_id, naming_id,
                    queued_at, sent_at
             FROM queued_emails WHERE to_user_id = ? ORDER BY id",
        )
        .bind(to_user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{NameRepository, ObservationRepository, test_support};

    #[tokio::test]
    async fn test_enqueue_skips_the_proposer() {
        let pool = test_support::pool().await;
        let mary = test_support::user(&pool, "mary", false).await;
        let rolf = test_support::user(&pool, "rolf", false).await;
        let dick = test_support::user(&pool, "dick", false).await;

        let name = NameRepository::new(&pool)
            .find_or_create("Coprinus comatus")
            .await
            .unwrap();
        let repo = NotificationRepository::new(&pool);
        repo.create_name_tracker(mary, name.id, Some("Please send :name to me"))
            .await
            .unwrap();
        repo.create_name_tracker(rolf, name.id, None).await.unwrap();

        let observations = ObservationRepository::new(&pool);
        let obs = observations.create(dick, "Shaggy mane", "").await.unwrap();
        let naming = observations.create_naming(obs, name.id, rolf).await.unwrap();

        let queued = repo.enqueue_name_tracking(&naming).await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(repo.queued_for(mary).await.unwrap().len(), 1);
        assert!(repo.queued_for(rolf).await.unwrap().is_empty());

        let pending = repo.pending_name_tracking(queued[0]).await.unwrap().unwrap();
        assert_eq!(pending.to_login, "mary");
        assert_eq!(pending.from_login, "rolf");
        assert_eq!(pending.text_name, "Coprinus comatus");

        repo.mark_sent(queued[0]).await.unwrap();
        assert!(repo.pending_name_tracking(queued[0]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_requires_owner() {
        let pool = test_support::pool().await;
        let mary = test_support::user(&pool, "mary", false).await;
        let rolf = test_support::user(&pool, "rolf", false).await;
        let name = NameRepository::new(&pool)
            .find_or_create("Morchella esculenta")
            .await
            .unwrap();
        let repo = NotificationRepository::new(&pool);
        let tracker = repo.create_name_tracker(mary, name.id, None).await.unwrap();

        assert!(!repo.delete_owned(tracker.id, rolf).await.unwrap());
        assert!(repo.delete_owned(tracker.id, mary).await.unwrap());
        assert!(repo.get(tracker.id).await.unwrap().is_none());
    }
}
