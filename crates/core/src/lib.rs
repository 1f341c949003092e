//! Mycoflora Core - Shared types library.
//!
//! This crate provides common types used across all Mycoflora components:
//! - `web` - The community site (observations, namings, donations, contest)
//! - `cli` - Command-line tools for migrations, users and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP. Database encodings are available behind the `sqlite`
//! feature so the web crate can bind these types directly in queries.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, locale codes and donation amounts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
