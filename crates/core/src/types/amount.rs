//! Donation amounts using decimal arithmetic.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Selector value in the amount field that defers to the free-form amount.
pub const OTHER_AMOUNT: &str = "other";

/// Errors that can occur when resolving a [`DonationAmount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// No amount was supplied.
    #[error("amount is missing")]
    Missing,
    /// The amount is not a number.
    #[error("amount is not a number: {0}")]
    NotANumber(String),
    /// The amount is zero or negative.
    #[error("amount must be positive")]
    NotPositive,
}

/// A strictly positive donation amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct DonationAmount(Decimal);

impl DonationAmount {
    /// Wrap a decimal, rejecting zero and negative values.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::NotPositive` for values `<= 0`.
    pub fn new(amount: Decimal) -> Result<Self, AmountError> {
        if amount > Decimal::ZERO {
            Ok(Self(amount.normalize()))
        } else {
            Err(AmountError::NotPositive)
        }
    }

    /// Parse a user-entered amount. A leading `$` and surrounding whitespace
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is blank, not a decimal, or not positive.
    pub fn parse(s: &str) -> Result<Self, AmountError> {
        let s = s.trim();
        let s = s.strip_prefix('$').unwrap_or(s).trim();
        if s.is_empty() {
            return Err(AmountError::Missing);
        }
        let amount = Decimal::from_str(s).map_err(|_| AmountError::NotANumber(s.to_owned()))?;
        Self::new(amount)
    }

    /// Resolve the amount from the pair of donation form fields.
    ///
    /// When `amount` is the literal `other`, `other_amount` is used instead.
    ///
    /// ```
    /// use mycoflora_core::DonationAmount;
    ///
    /// let amount = DonationAmount::resolve("other", Some("30")).unwrap();
    /// assert_eq!(amount.to_string(), "30");
    /// assert!(DonationAmount::resolve("0", Some("0")).is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the selected field does not hold a positive number.
    pub fn resolve(amount: &str, other_amount: Option<&str>) -> Result<Self, AmountError> {
        if amount.trim().eq_ignore_ascii_case(OTHER_AMOUNT) {
            Self::parse(other_amount.unwrap_or_default())
        } else {
            Self::parse(amount)
        }
    }

    /// The underlying decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for DonationAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for DonationAmount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DonationAmount> for Decimal {
    fn from(amount: DonationAmount) -> Self {
        amount.0
    }
}
