//! Core types for Mycoflora.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod amount;
pub mod email;
pub mod id;
pub mod locale;

pub use amount::{AmountError, DonationAmount};
pub use email::{Email, EmailError};
pub use id::*;
pub use locale::{Locale, LocaleError};
