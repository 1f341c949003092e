//! Live row counts for the site statistics page.

use serde::Serialize;
use sqlx::SqlitePool;

use super::RepositoryError;

/// Headline counts shown on `/info/site_stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SiteStats {
    pub users: i64,
    pub observations: i64,
    pub names: i64,
    pub namings: i64,
    pub field_slips: i64,
    pub contest_entries: i64,
}

/// Count the rows behind each headline statistic.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn site_stats(pool: &SqlitePool) -> Result<SiteStats, RepositoryError> {
    let stats = sqlx::query_as::<_, SiteStats>(
        "SELECT
             (SELECT COUNT(*) FROM users)           AS users,
             (SELECT COUNT(*) FROM observations)    AS observations,
             (SELECT COUNT(*) FROM names)           AS names,
             (SELECT COUNT(*) FROM namings)         AS namings,
             (SELECT COUNT(*) FROM field_slips)     AS field_slips,
             (SELECT COUNT(*) FROM contest_entries) AS contest_entries",
    )
    .fetch_one(pool)
    .await?;

    Ok(stats)
}
