//! Shared view plumbing: the page context every template receives, response
//! format negotiation and redirect helpers.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use mycoflora_core::Locale;

use crate::error::Result;
use crate::i18n::Catalog;
use crate::middleware::flash;
use crate::models::{FlashMessage, RequestContext};
use crate::state::AppState;

/// Media type of a Turbo Stream fragment.
pub const TURBO_STREAM_MIME: &str = "text/vnd.turbo-stream.html";

/// What every page template needs to render the layout.
pub struct PageContext {
    pub locale: Locale,
    pub user_login: Option<String>,
    pub admin_mode: bool,
    /// The user may switch admin mode on.
    pub is_admin: bool,
    pub js_override: Option<&'static str>,
    /// Messages queued by the previous request, already removed from the session.
    pub flash: Vec<FlashMessage>,
    pub title: String,
    catalog: Catalog,
}

impl PageContext {
    /// Build the context for a page titled by the catalog key `title_key`,
    /// draining the session's flash queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn new(
        state: &AppState,
        context: &RequestContext,
        session: &Session,
        title_key: &str,
    ) -> Result<Self> {
        let mut page = Self::base(state, context, title_key);
        page.flash = flash::take(session).await?;
        Ok(page)
    }

    fn base(state: &AppState, context: &RequestContext, title_key: &str) -> Self {
        let catalog = state.catalog().clone();
        let title = catalog.t(&context.locale, title_key);
        Self {
            locale: context.locale.clone(),
            user_login: context.user().map(|u| u.login.clone()),
            admin_mode: context.admin_mode,
            is_admin: context.user().is_some_and(|u| u.admin),
            js_override: context.js_override.map(|js| js.as_str()),
            flash: Vec::new(),
            title,
            catalog,
        }
    }

    /// Add a message to show on this page.
    pub fn push_flash(&mut self, message: FlashMessage) {
        self.flash.push(message);
    }

    /// Replace the title with already-localized text.
    #[must_use]
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Translate a key.
    #[must_use]
    pub fn t(&self, key: &str) -> String {
        self.catalog.t(&self.locale, key)
    }

    /// Translate a key with one `{name}` placeholder.
    #[must_use]
    pub fn t1(&self, key: &str, name: &str, value: impl std::fmt::Display) -> String {
        self.catalog
            .t_with(&self.locale, key, &[(name, &value.to_string())])
    }

    /// Value for the `lang` attribute.
    #[must_use]
    pub fn lang(&self) -> &str {
        self.locale.as_str()
    }

    /// Value for the `data-js` attribute: the forced setting, or `auto`.
    #[must_use]
    pub fn js_mode(&self) -> &'static str {
        self.js_override.unwrap_or("auto")
    }
}

/// Representation requested through the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Html,
    Json,
    TurboStream,
}

impl ResponseFormat {
    /// Pick a format from the `Accept` header. HTML when nothing better matches.
    #[must_use]
    pub fn negotiate(headers: &HeaderMap) -> Self {
        let accept = headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if accept.contains(TURBO_STREAM_MIME) {
            Self::TurboStream
        } else if accept.contains("application/json") && !accept.contains("text/html") {
            Self::Json
        } else {
            Self::Html
        }
    }
}

impl<S> FromRequestParts<S> for ResponseFormat
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(Self::negotiate(&parts.headers))
    }
}

/// Queue a flash message and redirect.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn redirect_with_flash(
    session: &Session,
    message: FlashMessage,
    to: &str,
) -> Result<Response> {
    flash::push(session, message).await?;
    Ok(Redirect::to(to).into_response())
}

/// Where to send the user back to: the `Referer` when it points into this
/// site, otherwise `/`.
#[must_use]
pub fn back_target(headers: &HeaderMap) -> String {
    let Some(referer) = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
    else {
        return "/".to_string();
    };

    if referer.starts_with('/') && !referer.starts_with("//") && !referer.starts_with("/\\") {
        return referer.to_string();
    }

    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
    match (url::Url::parse(referer), host) {
        (Ok(url), Some(host)) if url_authority(&url) == host => {
            let mut target = url.path().to_string();
            if let Some(query) = url.query() {
                target.push('?');
                target.push_str(query);
            }
            target
        }
        _ => "/".to_string(),
    }
}

fn url_authority(url: &url::Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

/// Parse an id from a path segment. Garbage is treated like a missing record.
#[must_use]
pub fn parse_id<T: std::str::FromStr>(raw: &str) -> Option<T> {
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_negotiate() {
        assert_eq!(ResponseFormat::negotiate(&HeaderMap::new()), ResponseFormat::Html);
        assert_eq!(
            ResponseFormat::negotiate(&headers(&[(header::ACCEPT, "application/json")])),
            ResponseFormat::Json
        );
        assert_eq!(
            ResponseFormat::negotiate(&headers(&[(
                header::ACCEPT,
                "text/vnd.turbo-stream.html, text/html, application/xhtml+xml"
            )])),
            ResponseFormat::TurboStream
        );
        assert_eq!(
            ResponseFormat::negotiate(&headers(&[(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/json;q=0.9"
            )])),
            ResponseFormat::Html
        );
    }

    #[test]
    fn test_back_target() {
        assert_eq!(back_target(&HeaderMap::new()), "/");
        assert_eq!(
            back_target(&headers(&[(header::REFERER, "/observations/3")])),
            "/observations/3"
        );
        assert_eq!(
            back_target(&headers(&[(header::REFERER, "//evil.example/")])),
            "/"
        );
        assert_eq!(
            back_target(&headers(&[(header::REFERER, "/\\evil.example/")])),
            "/"
        );
        assert_eq!(
            back_target(&headers(&[
                (header::REFERER, "https://mycoflora.org/licenses?page=2"),
                (header::HOST, "mycoflora.org"),
            ])),
            "/licenses?page=2"
        );
        assert_eq!(
            back_target(&headers(&[
                (header::REFERER, "https://evil.example/licenses"),
                (header::HOST, "mycoflora.org"),
            ])),
            "/"
        );
    }
}
