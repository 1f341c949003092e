//! Request-level models.
//!
//! Persisted records live next to their repositories in [`crate::db`].

pub mod context;
pub mod session;

pub use context::{Actor, CurrentUser, RequestContext, RobotClass};
pub use session::{FlashKind, FlashMessage, JsOverride, keys as session_keys};
