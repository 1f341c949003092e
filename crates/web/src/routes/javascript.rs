//! Per-session JavaScript override.

use axum::{
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::Result;
use crate::middleware::Context;
use crate::models::{JsOverride, session_keys};
use crate::views::back_target;

async fn set(session: &Session, headers: &HeaderMap, value: Option<JsOverride>) -> Result<Response> {
    match value {
        Some(value) => session.insert(session_keys::JS_OVERRIDE, value).await?,
        None => {
            session
                .remove::<JsOverride>(session_keys::JS_OVERRIDE)
                .await?;
        }
    }
    Ok(Redirect::to(&back_target(headers)).into_response())
}

/// Force JavaScript on.
pub async fn turn_on(_: Context, session: Session, headers: HeaderMap) -> Result<Response> {
    set(&session, &headers, Some(JsOverride::On)).await
}

/// Force JavaScript off.
pub async fn turn_off(_: Context, session: Session, headers: HeaderMap) -> Result<Response> {
    set(&session, &headers, Some(JsOverride::Off)).await
}

/// Let the browser decide again.
pub async fn turn_nil(_: Context, session: Session, headers: HeaderMap) -> Result<Response> {
    set(&session, &headers, None).await
}
