//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password registration and login
//! - `ballots` - Lazy contest vote creation and ballot casting
//! - `donations` - Donation form validation and recording
//! - `email` - SMTP delivery with templated bodies
//! - `field_slips` - Field slip code and reference validation
//! - `notifications` - Name tracking: queued emails and note templates
//! - `ontology` - Remote ontology lookups

pub mod auth;
pub mod ballots;
pub mod donations;
pub mod email;
pub mod field_slips;
pub mod notifications;
pub mod ontology;
