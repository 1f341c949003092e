//! Integration test harness for Mycoflora.
//!
//! [`TestApp`] builds the full router over a fresh in-memory database and
//! drives it in-process with `tower::ServiceExt::oneshot`, carrying the
//! session cookie between requests like a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mycoflora-integration-tests
//! ```

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use sqlx::SqlitePool;
use tower::ServiceExt;

use mycoflora_core::UserId;
use mycoflora_web::config::{I18nConfig, SiteConfig};
use mycoflora_web::middleware::{SESSION_COOKIE_NAME, create_session_layer, session_store};
use mycoflora_web::services::auth::AuthService;
use mycoflora_web::state::AppState;
use mycoflora_web::{app, db};

/// Password given to every fixture user.
pub const PASSWORD: &str = "correct horse battery staple";

/// User agent of a crawler on the default allowlist.
pub const ALLOWED_BOT: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

/// User agent of a crawler that is not allowlisted.
pub const OTHER_BOT: &str = "Mozilla/5.0 (compatible; AhrefsBot/7.0; +http://ahrefs.com/robot/)";

/// Site configuration for tests: no SMTP, and an ontology URL nothing listens on.
#[must_use]
pub fn test_config() -> SiteConfig {
    SiteConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: [127, 0, 0, 1].into(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        i18n: I18nConfig::default(),
        robot_allowlist: vec!["googlebot".to_string()],
        ontology_url: Some(url::Url::parse("http://127.0.0.1:1/").unwrap()),
        email: None,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A response with its body collected.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The `Location` header of a redirect.
    #[must_use]
    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("response body is not JSON")
    }
}

/// The application under test plus a one-cookie jar.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    cookie: Option<String>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: SiteConfig) -> Self {
        let pool = db::create_memory_pool().await.expect("memory pool");
        db::run_migrations(&pool).await.expect("migrations");
        let store = session_store(&pool);
        store.migrate().await.expect("session table");

        let session_layer = create_session_layer(store, &config);
        let state = AppState::new(config, pool).expect("app state");
        let router = app(state.clone(), session_layer);

        Self {
            router,
            state,
            cookie: None,
        }
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        self.state.pool()
    }

    /// Forget the session, as if the browser was closed.
    pub fn clear_cookies(&mut self) {
        self.cookie = None;
    }

    /// Send a request, attaching and then updating the session cookie.
    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let raw = value.to_str().unwrap();
            let pair = raw.split(';').next().unwrap_or_default().trim();
            if let Some(session_value) = pair.strip_prefix(&format!("{SESSION_COOKIE_NAME}=")) {
                self.cookie = if session_value.is_empty() || raw.contains("Max-Age=0") {
                    None
                } else {
                    Some(pair.to_string())
                };
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.get_with(path, &[]).await
    }

    pub async fn get_with(&mut self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.send(build(Method::GET, path, headers, Body::empty()))
            .await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        self.post_form_with(path, fields, &[]).await
    }

    pub async fn post_form_with(
        &mut self,
        path: &str,
        fields: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut request = build(Method::POST, path, headers, Body::from(body));
        request.headers_mut().insert(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded".parse().unwrap(),
        );
        self.send(request).await
    }

    pub async fn delete_with(&mut self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.send(build(Method::DELETE, path, headers, Body::empty()))
            .await
    }

    /// Follow a redirect with a GET.
    pub async fn follow(&mut self, response: &TestResponse) -> TestResponse {
        assert!(
            response.status.is_redirection(),
            "expected a redirect, got {}",
            response.status
        );
        let location = response.location().to_string();
        self.get(&location).await
    }

    /// Register a user with [`PASSWORD`].
    pub async fn create_user(&self, login: &str, admin: bool) -> UserId {
        AuthService::new(self.pool())
            .register(login, &format!("{login}@example.org"), PASSWORD, admin)
            .await
            .expect("register user")
            .id
    }

    /// Log in through the form and assert it worked.
    pub async fn login(&mut self, login: &str) {
        let response = self
            .post_form("/account/login", &[("login", login), ("password", PASSWORD)])
            .await;
        assert!(
            response.status.is_redirection(),
            "login as {login} failed: {}",
            response.status
        );
    }

    /// Log in as a new admin and switch admin mode on.
    pub async fn login_admin(&mut self, login: &str) -> UserId {
        let id = self.create_user(login, true).await;
        self.login(login).await;
        let response = self.get("/admin_mode?turn_on=1").await;
        assert!(response.status.is_redirection());
        id
    }
}

fn build(method: Method, path: &str, headers: &[(&str, &str)], body: Body) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::HOST, "localhost:3000");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(body).unwrap()
}
