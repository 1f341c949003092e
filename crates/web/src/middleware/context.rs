//! Builds the [`RequestContext`] for every request.
//!
//! The context is assembled once from the session, the user record and the
//! request headers, inserted into the request extensions, and the handler
//! runs inside [`i18n::scope`] with the resolved locale.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use mycoflora_core::UserId;

use super::robots;
use crate::db::UserRepository;
use crate::error::AppError;
use crate::i18n::{self, LocaleSource, LocaleSources};
use crate::models::{Actor, CurrentUser, JsOverride, RequestContext, session_keys};
use crate::state::AppState;

/// Query parameter that switches the locale.
pub const LOCALE_PARAM: &str = "user_locale";

/// Header set by in-page script.
pub const AJAX_HEADER: &str = "x-requested-with";

/// Middleware: resolve actor and locale, then run the handler in a locale scope.
pub async fn request_context_middleware(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let param = locale_param(request.uri().query());
    let context = match build_context(&state, &session, request.headers(), param.as_deref()).await
    {
        Ok(context) => context,
        Err(e) => {
            let locale = state.config().i18n.default_locale.clone();
            return i18n::scope(locale, state.catalog().clone(), async {
                e.into_response()
            })
            .await;
        }
    };

    let locale = context.locale.clone();
    request.extensions_mut().insert(context);

    i18n::scope(locale, state.catalog().clone(), next.run(request)).await
}

async fn build_context(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    param: Option<&str>,
) -> Result<RequestContext, AppError> {
    let user = current_user(state, session).await?;
    let admin_requested = session
        .get::<bool>(session_keys::ADMIN)
        .await?
        .unwrap_or(false);
    let js_override = session
        .get::<JsOverride>(session_keys::JS_OVERRIDE)
        .await?;
    let session_locale = session.get::<String>(session_keys::LOCALE).await?;
    let ajax = is_ajax(headers);

    let resolution = i18n::resolve(
        &LocaleSources {
            param,
            ajax,
            user: user.as_ref().and_then(|u| u.locale.as_deref()),
            session: session_locale.as_deref(),
        },
        &state.config().i18n,
    );

    if resolution.source == LocaleSource::Param
        && session_locale.as_deref() != Some(resolution.locale.as_str())
    {
        session
            .insert(session_keys::LOCALE, resolution.locale.as_str())
            .await?;
    }

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok());
    let robot = robots::classify(user_agent, &state.config().robot_allowlist);

    let admin_mode = admin_requested && user.as_ref().is_some_and(|u| u.admin);
    let actor = user.map_or(Actor::Anonymous, Actor::User);

    Ok(RequestContext {
        actor,
        admin_mode,
        js_override,
        locale: resolution.locale,
        robot,
        ajax,
    })
}

/// The logged-in user, or `None` when the session has no user or names one
/// that no longer exists.
async fn current_user(
    state: &AppState,
    session: &Session,
) -> Result<Option<CurrentUser>, AppError> {
    let Some(user_id) = session.get::<UserId>(session_keys::USER_ID).await? else {
        return Ok(None);
    };

    match UserRepository::new(state.pool()).get_by_id(user_id).await? {
        Some(user) => Ok(Some(CurrentUser::from(user))),
        None => {
            tracing::debug!(user_id = %user_id, "Session user no longer exists");
            session.remove::<UserId>(session_keys::USER_ID).await?;
            Ok(None)
        }
    }
}

fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get(AJAX_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

fn locale_param(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == LOCALE_PARAM)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_locale_param() {
        assert_eq!(
            locale_param(Some("a=1&user_locale=pt")),
            Some("pt".to_string())
        );
        assert_eq!(locale_param(Some("a=1")), None);
        assert_eq!(locale_param(None), None);
    }

    #[test]
    fn test_is_ajax() {
        let mut headers = HeaderMap::new();
        assert!(!is_ajax(&headers));
        headers.insert(AJAX_HEADER, HeaderValue::from_static("XMLHttpRequest"));
        assert!(is_ajax(&headers));
        headers.insert(AJAX_HEADER, HeaderValue::from_static("fetch"));
        assert!(!is_ajax(&headers));
    }
}
