//! The per-request view of who is asking and how to answer them.

use mycoflora_core::{Locale, UserId};

use super::session::JsOverride;
use crate::db::users::User;

/// The logged-in user, as far as request handling needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub login: String,
    /// Persistent admin attribute.
    pub admin: bool,
    /// Stored locale preference.
    pub locale: Option<String>,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            login: user.login,
            admin: user.admin,
            locale: user.locale,
        }
    }
}

/// Who is making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User(CurrentUser),
}

/// User-agent classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotClass {
    Human,
    /// A crawler on the configured allowlist.
    AllowedRobot,
    DisallowedRobot,
}

impl RobotClass {
    #[must_use]
    pub const fn is_robot(self) -> bool {
        !matches!(self, Self::Human)
    }
}

/// Immutable per-request context built by
/// [`request_context_middleware`](crate::middleware::request_context_middleware)
/// and read by extractors and handlers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub actor: Actor,
    /// Effective admin mode: the session asked for it and the user is an admin.
    pub admin_mode: bool,
    pub js_override: Option<JsOverride>,
    pub locale: Locale,
    pub robot: RobotClass,
    /// Request came from in-page script (`X-Requested-With: XMLHttpRequest`).
    pub ajax: bool,
}

impl RequestContext {
    /// A context for an anonymous human with the given locale.
    #[must_use]
    pub const fn anonymous(locale: Locale) -> Self {
        Self {
            actor: Actor::Anonymous,
            admin_mode: false,
            js_override: None,
            locale,
            robot: RobotClass::Human,
            ajax: false,
        }
    }

    /// The logged-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&CurrentUser> {
        match &self.actor {
            Actor::User(user) => Some(user),
            Actor::Anonymous => None,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user().map(|u| u.id)
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self.actor, Actor::User(_))
    }

    /// Whether the actor may modify a record owned by `owner`.
    #[must_use]
    pub fn can_edit(&self, owner: UserId) -> bool {
        self.admin_mode || self.user_id() == Some(owner)
    }
}
