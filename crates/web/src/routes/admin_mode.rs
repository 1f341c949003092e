//! Admin mode toggle.
//!
//! Admin mode is a session flag that only takes effect for users with the
//! persistent `admin` attribute. Turning it on for anyone else is silently
//! ignored; turning it off always succeeds.

use axum::{
    extract::Query,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::Context;
use crate::models::session_keys;
use crate::views::back_target;

/// `?turn_on=1` or `?turn_off=1`.
#[derive(Debug, Default, Deserialize)]
pub struct AdminModeQuery {
    pub turn_on: Option<String>,
    pub turn_off: Option<String>,
}

/// Toggle admin mode and go back.
#[instrument(skip_all)]
pub async fn toggle(
    Context(ctx): Context,
    session: Session,
    headers: HeaderMap,
    Query(query): Query<AdminModeQuery>,
) -> Result<Response> {
    if query.turn_off.is_some() {
        session.insert(session_keys::ADMIN, false).await?;
        tracing::debug!("Admin mode off");
    } else if query.turn_on.is_some() {
        match ctx.user() {
            Some(user) if user.admin => {
                session.insert(session_keys::ADMIN, true).await?;
                tracing::info!(user_id = %user.id, "Admin mode on");
            }
            _ => tracing::debug!("Ignoring admin mode request from non-admin"),
        }
    }

    Ok(Redirect::to(&back_target(&headers)).into_response())
}
