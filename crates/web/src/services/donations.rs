//! Donation submission.

use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;

use mycoflora_core::{AmountError, DonationAmount, UserId};

use crate::db::RepositoryError;
use crate::db::donations::{Donation, DonationRepository, NewDonation};

/// Errors submitting a donation.
#[derive(Debug, Error)]
pub enum DonationError {
    /// The selected amount is missing, not a number, or not positive.
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Donation form fields, named `donation[...]` on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonationForm {
    #[serde(rename = "donation[amount]", default)]
    pub amount: String,
    #[serde(rename = "donation[other_amount]")]
    pub other_amount: Option<String>,
    #[serde(rename = "donation[who]", default)]
    pub who: String,
    #[serde(rename = "donation[email]", default)]
    pub email: String,
    #[serde(rename = "donation[anonymous]")]
    pub anonymous: Option<String>,
    #[serde(rename = "donation[recurring]")]
    pub recurring: Option<String>,
}

/// Checkbox truthiness: `1`, `true`, `on` or `yes`.
#[must_use]
pub fn checked(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "on" | "yes"
        )
    })
}

/// Validate the form and record one unreviewed donation.
///
/// Nothing is written when the amount is rejected.
///
/// # Errors
///
/// Returns `DonationError::InvalidAmount` for a bad amount and
/// `DonationError::Repository` if the insert fails.
pub async fn submit_donation(
    pool: &SqlitePool,
    form: &DonationForm,
    user_id: Option<UserId>,
) -> Result<Donation, DonationError> {
    let amount = DonationAmount::resolve(&form.amount, form.other_amount.as_deref())?;

    let donation = DonationRepository::new(pool)
        .create(&NewDonation {
            amount,
            who: form.who.trim().to_string(),
            email: form.email.trim().to_string(),
            anonymous: checked(form.anonymous.as_deref()),
            recurring: checked(form.recurring.as_deref()),
            user_id,
        })
        .await?;

    tracing::info!(
        donation_id = %donation.id,
        amount = %donation.amount,
        recurring = donation.recurring,
        "Donation recorded"
    );
    Ok(donation)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support;

    fn form(amount: &str, other: Option<&str>) -> DonationForm {
        DonationForm {
            amount: amount.to_string(),
            other_amount: other.map(str::to_string),
            who: "  Mary Smith ".to_string(),
            email: "mary@example.org".to_string(),
            anonymous: Some("on".to_string()),
            recurring: None,
        }
    }

    #[test]
    fn test_checkbox_values() {
        for yes in ["1", "true", "on", "yes", "TRUE"] {
            assert!(checked(Some(yes)), "{yes}");
        }
        for no in ["0", "false", "off", "", "maybe"] {
            assert!(!checked(Some(no)), "{no}");
        }
        assert!(!checked(None));
    }

    #[tokio::test]
    async fn test_other_amount_is_used() {
        let pool = test_support::pool().await;
        let donation = submit_donation(&pool, &form("other", Some("30")), None)
            .await
            .unwrap();

        assert_eq!(donation.amount.to_string(), "30");
        assert_eq!(donation.who, "Mary Smith");
        assert!(donation.anonymous);
        assert!(!donation.recurring);
        assert!(!donation.reviewed);
        assert_eq!(donation.user_id, None);
    }

    #[tokio::test]
    async fn test_rejected_amount_writes_nothing() {
        let pool = test_support::pool().await;

        for (amount, other) in [("0", None), ("-5", None), ("other", Some("0")), ("abc", None)] {
            assert!(matches!(
                submit_donation(&pool, &form(amount, other), None).await,
                Err(DonationError::InvalidAmount(_))
            ));
        }
        assert!(DonationRepository::new(&pool).list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logged_in_donor_is_recorded() {
        let pool = test_support::pool().await;
        let mary = test_support::user(&pool, "mary", false).await;

        let donation = submit_donation(&pool, &form("25", None), Some(mary))
            .await
            .unwrap();
        assert_eq!(donation.user_id, Some(mary));
    }
}
