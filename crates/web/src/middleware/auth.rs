//! Authorization gate and the extractors that apply it.
//!
//! Every action declares an [`Access`] class by taking one of the extractors
//! below. A denial never errors: it becomes a redirect with a flash message
//! or, for robots, a 403.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use super::flash;
use crate::error::AppError;
use crate::i18n;
use crate::models::{CurrentUser, FlashMessage, RequestContext};

/// Login page, target of `LoginRequired` denials.
pub const LOGIN_PATH: &str = "/account/login";

/// Access class of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    LoggedIn,
    AdminMode,
    /// Open to humans and allowlisted crawlers.
    RobotFriendly,
    /// Logged-in humans only; every robot is refused.
    HumansOnly,
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    LoginRequired,
    PermissionDenied,
    RobotForbidden,
}

/// Result of [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

/// Decide whether `context` may perform an action of class `access`.
#[must_use]
pub const fn authorize(context: &RequestContext, access: Access) -> Decision {
    use crate::models::RobotClass;

    match access {
        Access::Public => Decision::Allow,
        Access::LoggedIn => {
            if context.is_logged_in() {
                Decision::Allow
            } else {
                Decision::Deny(Denial::LoginRequired)
            }
        }
        Access::AdminMode => {
            if context.admin_mode {
                Decision::Allow
            } else {
                Decision::Deny(Denial::PermissionDenied)
            }
        }
        Access::RobotFriendly => match context.robot {
            RobotClass::DisallowedRobot => Decision::Deny(Denial::RobotForbidden),
            RobotClass::Human | RobotClass::AllowedRobot => Decision::Allow,
        },
        Access::HumansOnly => {
            if context.robot.is_robot() {
                Decision::Deny(Denial::RobotForbidden)
            } else if context.is_logged_in() {
                Decision::Allow
            } else {
                Decision::Deny(Denial::LoginRequired)
            }
        }
    }
}

impl Denial {
    /// Turn the denial into a response, queueing a flash when redirecting.
    pub async fn respond(self, session: Option<&Session>) -> Response {
        let (key, fallback, target) = match self {
            Self::RobotForbidden => {
                let body = i18n::localize("robot_forbidden", "Forbidden");
                return (StatusCode::FORBIDDEN, body).into_response();
            }
            Self::LoginRequired => ("login_please", "Please log in.", LOGIN_PATH),
            Self::PermissionDenied => ("permission_denied", "Permission denied.", "/"),
        };

        if let Some(session) = session {
            let message = FlashMessage::error(i18n::localize(key, fallback));
            if let Err(e) = flash::push(session, message).await {
                return AppError::from(e).into_response();
            }
        }
        Redirect::to(target).into_response()
    }
}

async fn enforce(parts: &Parts, access: Access) -> Result<RequestContext, Response> {
    let context = parts
        .extensions
        .get::<RequestContext>()
        .cloned()
        .ok_or_else(|| {
            AppError::Internal("request context missing".to_string()).into_response()
        })?;

    match authorize(&context, access) {
        Decision::Allow => Ok(context),
        Decision::Deny(denial) => {
            tracing::debug!(path = %parts.uri.path(), ?denial, "Request denied");
            Err(denial.respond(parts.extensions.get::<Session>()).await)
        }
    }
}

fn logged_in_user(context: &RequestContext) -> Result<CurrentUser, Response> {
    context.user().cloned().ok_or_else(|| {
        AppError::Internal("authorized request without user".to_string()).into_response()
    })
}

/// Public access: just the context.
pub struct Context(pub RequestContext);

/// Requires a logged-in user.
pub struct RequireLogin(pub RequestContext, pub CurrentUser);

/// Requires admin mode to be on.
pub struct RequireAdminMode(pub RequestContext);

/// Refuses crawlers that are not on the allowlist.
pub struct RobotFriendly(pub RequestContext);

/// Requires a logged-in human.
pub struct HumansOnly(pub RequestContext, pub CurrentUser);

impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        enforce(parts, Access::Public).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireLogin
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = enforce(parts, Access::LoggedIn).await?;
        let user = logged_in_user(&context)?;
        Ok(Self(context, user))
    }
}

impl<S> FromRequestParts<S> for RequireAdminMode
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        enforce(parts, Access::AdminMode).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RobotFriendly
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        enforce(parts, Access::RobotFriendly).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for HumansOnly
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = enforce(parts, Access::HumansOnly).await?;
        let user = logged_in_user(&context)?;
        Ok(Self(context, user))
    }
}
