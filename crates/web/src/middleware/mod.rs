//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, bind a hub per request)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `SQLite` store)
//! 5. Request context (actor, admin mode, locale scope, robot class)
//!
//! Authorization happens per action through the extractors in [`auth`].

pub mod auth;
pub mod context;
pub mod flash;
pub mod request_id;
pub mod robots;
pub mod session;

pub use auth::{
    Access, Context, Decision, Denial, HumansOnly, RequireAdminMode, RequireLogin, RobotFriendly,
    authorize,
};
pub use context::request_context_middleware;
pub use request_id::request_id_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer, session_store};
