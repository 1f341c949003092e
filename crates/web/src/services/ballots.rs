//! Contest ballots.
//!
//! A vote holds a rank in `1..=n` where `n` is the number of contest entries.
//! Votes are created lazily the first time a user opens the ballot.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use sqlx::SqlitePool;
use thiserror::Error;

use mycoflora_core::{ContestEntryId, ContestVoteId, UserId};

use crate::db::ContestRepository;
use crate::db::RepositoryError;
use crate::db::contest::{BallotLine, BallotOutcome};

/// Form field that must be present for a ballot to count.
pub const CONFIRMED_FIELD: &str = "confirmed";

/// Prefix of per-vote form fields: `vote_<vote id>`.
pub const VOTE_FIELD_PREFIX: &str = "vote_";

/// Errors casting a ballot.
#[derive(Debug, Error)]
pub enum BallotError {
    /// The `confirmed` field was missing; nothing was changed.
    #[error("ballot was not confirmed")]
    NotConfirmed,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Make sure the user has one vote per contest entry and return the ballot.
///
/// New votes take the ranks not already used on the ballot, shuffled, so a
/// fresh ballot never starts with two entries tied.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn find_or_create_votes(
    pool: &SqlitePool,
    user_id: UserId,
) -> Result<Vec<BallotLine>, RepositoryError> {
    let repo = ContestRepository::new(pool);
    let entries = repo.list_entries().await?;
    let ballot = repo.ballot_for(user_id).await?;

    let voted: HashSet<ContestEntryId> = ballot.iter().map(|line| line.entry_id).collect();
    let missing: Vec<ContestEntryId> = entries
        .iter()
        .map(|entry| entry.id)
        .filter(|id| !voted.contains(id))
        .collect();

    if missing.is_empty() {
        return Ok(ballot);
    }

    let used: HashSet<i32> = ballot.iter().map(|line| line.vote).collect();
    let max_rank = rank_limit(entries.len());
    let assignments = assign_ranks(&missing, &used, max_rank);

    repo.insert_missing_votes(user_id, &assignments).await?;
    tracing::debug!(user_id = %user_id, created = assignments.len(), "Created contest votes");

    repo.ballot_for(user_id).await
}

/// Pair each entry with an unused rank, in random order.
fn assign_ranks(
    missing: &[ContestEntryId],
    used: &HashSet<i32>,
    max_rank: i32,
) -> Vec<(ContestEntryId, i32)> {
    let mut free: Vec<i32> = (1..=max_rank).filter(|r| !used.contains(r)).collect();
    free.shuffle(&mut rand::rng());

    // Ranks only run short when stored votes already collide; reuse the top rank.
    missing
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, free.get(i).copied().unwrap_or(max_rank)))
        .collect()
}

fn rank_limit(entries: usize) -> i32 {
    i32::try_from(entries).unwrap_or(i32::MAX)
}

/// Apply a submitted ballot to the user's own votes.
///
/// Every `vote_<id>` field is considered. A value that is not a rank in
/// `1..=n`, or a field naming a vote that is not the user's, leaves the vote
/// unchanged and is reported as such.
///
/// # Errors
///
/// Returns `BallotError::NotConfirmed` when the `confirmed` field is absent,
/// or `BallotError::Repository` if the update fails.
pub async fn cast_ballot(
    pool: &SqlitePool,
    user_id: UserId,
    fields: &HashMap<String, String>,
) -> Result<BallotOutcome, BallotError> {
    if !fields.contains_key(CONFIRMED_FIELD) {
        return Err(BallotError::NotConfirmed);
    }

    let repo = ContestRepository::new(pool);
    let max_rank = rank_limit(usize::try_from(repo.count_entries().await?).unwrap_or(0));

    let mut changes = Vec::new();
    let mut rejected = Vec::new();
    for (field, value) in fields {
        let Some(vote_id) = parse_vote_field(field) else {
            continue;
        };
        match parse_rank(value, max_rank) {
            Some(rank) => changes.push((vote_id, rank)),
            None => rejected.push(vote_id),
        }
    }
    changes.sort_unstable();

    let mut outcome = repo.apply_votes(user_id, &changes).await?;
    outcome.unchanged.extend(rejected);
    outcome.unchanged.sort_unstable();

    tracing::info!(
        user_id = %user_id,
        updated = outcome.updated.len(),
        unchanged = outcome.unchanged.len(),
        "Ballot cast"
    );
    Ok(outcome)
}

fn parse_vote_field(field: &str) -> Option<ContestVoteId> {
    field.strip_prefix(VOTE_FIELD_PREFIX)?.parse().ok()
}

fn parse_rank(value: &str, max_rank: i32) -> Option<i32> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|rank| (1..=max_rank).contains(rank))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::db::test_support;

    async fn contest(pool: &SqlitePool, n: usize) {
        let repo = ContestRepository::new(pool);
        for i in 0..n {
            repo.create_entry(&format!("Entry {i}"), "").await.unwrap();
        }
    }

    fn ballot_fields(pairs: &[(String, &str)], confirmed: bool) -> HashMap<String, String> {
        let mut fields: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.clone(), (*v).to_string()))
            .collect();
        if confirmed {
            fields.insert(CONFIRMED_FIELD.to_string(), "1".to_string());
        }
        fields
    }

    #[test]
    fn test_parse_rank_bounds() {
        assert_eq!(parse_rank("2", 3), Some(2));
        assert_eq!(parse_rank(" 3 ", 3), Some(3));
        assert_eq!(parse_rank("0", 3), None);
        assert_eq!(parse_rank("4", 3), None);
        assert_eq!(parse_rank("first", 3), None);
    }

    #[test]
    fn test_parse_vote_field() {
        assert_eq!(parse_vote_field("vote_12"), Some(ContestVoteId::new(12)));
        assert_eq!(parse_vote_field("vote_"), None);
        assert_eq!(parse_vote_field("confirmed"), None);
    }

    #[tokio::test]
    async fn test_initial_votes_are_distinct_ranks() {
        let pool = test_support::pool().await;
        let mary = test_support::user(&pool, "mary", false).await;
        contest(&pool, 4).await;

        let ballot = find_or_create_votes(&pool, mary).await.unwrap();
        let mut ranks: Vec<i32> = ballot.iter().map(|l| l.vote).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, vec![1, 2, 3, 4]);

        // Second call creates nothing new.
        let again = find_or_create_votes(&pool, mary).await.unwrap();
        assert_eq!(again.len(), 4);
    }

    #[tokio::test]
    async fn test_new_entry_gets_the_free_rank() {
        let pool = test_support::pool().await;
        let mary = test_support::user(&pool, "mary", false).await;
        contest(&pool, 2).await;
        find_or_create_votes(&pool, mary).await.unwrap();

        ContestRepository::new(&pool)
            .create_entry("Late entry", "")
            .await
            .unwrap();
        let ballot = find_or_create_votes(&pool, mary).await.unwrap();
        let late = ballot.iter().find(|l| l.title == "Late entry").unwrap();
        assert_eq!(late.vote, 3);
    }

    #[tokio::test]
    async fn test_cast_ballot_updates_then_is_idempotent() {
        let pool = test_support::pool().await;
        let mary = test_support::user(&pool, "mary", false).await;
        contest(&pool, 2).await;
        let ballot = find_or_create_votes(&pool, mary).await.unwrap();
        let vote = &ballot[0];
        let other_rank = if vote.vote == 1 { "2" } else { "1" };
        let field = format!("vote_{}", vote.vote_id);

        let outcome = cast_ballot(&pool, mary, &ballot_fields(&[(field.clone(), other_rank)], true))
            .await
            .unwrap();
        assert_eq!(outcome.updated, vec![vote.vote_id]);

        let outcome = cast_ballot(&pool, mary, &ballot_fields(&[(field, other_rank)], true))
            .await
            .unwrap();
        assert!(outcome.updated.is_empty());
        assert_eq!(outcome.unchanged, vec![vote.vote_id]);
    }

    #[tokio::test]
    async fn test_invalid_token_leaves_vote_unchanged() {
        let pool = test_support::pool().await;
        let mary = test_support::user(&pool, "mary", false).await;
        contest(&pool, 2).await;
        let ballot = find_or_create_votes(&pool, mary).await.unwrap();
        let vote = &ballot[0];
        let field = format!("vote_{}", vote.vote_id);

        for bad in ["bogus", "0", "3"] {
            let outcome = cast_ballot(&pool, mary, &ballot_fields(&[(field.clone(), bad)], true))
                .await
                .unwrap();
            assert_eq!(outcome.unchanged, vec![vote.vote_id]);
        }
        let after = ContestRepository::new(&pool).ballot_for(mary).await.unwrap();
        assert_eq!(
            after.iter().find(|l| l.vote_id == vote.vote_id).unwrap().vote,
            vote.vote
        );
    }

    #[tokio::test]
    async fn test_unconfirmed_ballot_is_ignored() {
        let pool = test_support::pool().await;
        let mary = test_support::user(&pool, "mary", false).await;
        contest(&pool, 2).await;
        let ballot = find_or_create_votes(&pool, mary).await.unwrap();
        let vote = &ballot[0];
        let other_rank = if vote.vote == 1 { "2" } else { "1" };

        let result = cast_ballot(
            &pool,
            mary,
            &ballot_fields(&[(format!("vote_{}", vote.vote_id), other_rank)], false),
        )
        .await;
        assert!(matches!(result, Err(BallotError::NotConfirmed)));

        let after = ContestRepository::new(&pool).ballot_for(mary).await.unwrap();
        assert_eq!(after, ballot);
    }

    #[tokio::test]
    async fn test_cannot_change_someone_elses_vote() {
        let pool = test_support::pool().await;
        let mary = test_support::user(&pool, "mary", false).await;
        let rolf = test_support::user(&pool, "rolf", false).await;
        contest(&pool, 2).await;
        let marys = find_or_create_votes(&pool, mary).await.unwrap();
        let vote = &marys[0];
        let other_rank = if vote.vote == 1 { "2" } else { "1" };

        let outcome = cast_ballot(
            &pool,
            rolf,
            &ballot_fields(&[(format!("vote_{}", vote.vote_id), other_rank)], true),
        )
        .await
        .unwrap();
        assert!(outcome.updated.is_empty());
        assert_eq!(outcome.unchanged, vec![vote.vote_id]);
    }
}
