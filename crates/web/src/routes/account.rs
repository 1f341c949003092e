//! Account route handlers: login, logout and preferences.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::UserRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::i18n::resolver;
use crate::middleware::{Context, RequireLogin};
use crate::models::{FlashMessage, session_keys};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;
use crate::views::{PageContext, redirect_with_flash};

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub login: String,
    pub password: String,
}

/// Preferences form data.
#[derive(Debug, Deserialize)]
pub struct PreferencesForm {
    #[serde(default)]
    pub locale: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub login: String,
}

/// Preferences page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/preferences.html")]
pub struct PreferencesTemplate {
    pub page: PageContext,
    pub current: String,
    pub choices: Vec<String>,
}

impl PreferencesTemplate {
    fn selected(&self, choice: &str) -> &'static str {
        if self.current == choice { "selected" } else { "" }
    }
}

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    Context(ctx): Context,
    session: Session,
) -> Result<Response> {
    let page = PageContext::new(&state, &ctx, &session, "title_login").await?;
    Ok(LoginTemplate {
        page,
        login: String::new(),
    }
    .into_response())
}

/// Check credentials and start a session.
#[instrument(skip(state, ctx, session, form), fields(login = %form.login))]
pub async fn login(
    State(state): State<AppState>,
    Context(ctx): Context,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .login(&form.login, &form.password)
        .await
    {
        Ok(user) => {
            session.cycle_id().await?;
            // Admin mode belongs to the previous login, never the new one.
            session.remove::<bool>(session_keys::ADMIN).await?;
            session.insert(session_keys::USER_ID, user.id).await?;
            set_sentry_user(&user.id, &user.login);
            tracing::info!(user_id = %user.id, "User logged in");

            let text = state
                .catalog()
                .t_with(&ctx.locale, "login_success", &[("login", &user.login)]);
            redirect_with_flash(&session, FlashMessage::notice(text), "/").await
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Login failed");
            let mut page = PageContext::new(&state, &ctx, &session, "title_login").await?;
            page.push_flash(FlashMessage::error(
                state.catalog().t(&ctx.locale, "login_failed"),
            ));
            Ok((
                StatusCode::UNAUTHORIZED,
                LoginTemplate {
                    page,
                    login: form.login,
                },
            )
                .into_response())
        }
        Err(e) => Err(AppError::Auth(e)),
    }
}

/// End the session.
#[instrument(skip(state, ctx, session))]
pub async fn logout(
    State(state): State<AppState>,
    Context(ctx): Context,
    session: Session,
) -> Result<Response> {
    session.flush().await?;
    clear_sentry_user();

    let text = state.catalog().t(&ctx.locale, "logout_success");
    redirect_with_flash(&session, FlashMessage::notice(text), "/").await
}

/// Show the locale preference.
pub async fn preferences_page(
    State(state): State<AppState>,
    RequireLogin(ctx, user): RequireLogin,
    session: Session,
) -> Result<Response> {
    let page = PageContext::new(&state, &ctx, &session, "title_preferences").await?;
    Ok(PreferencesTemplate {
        page,
        current: user.locale.unwrap_or_default(),
        choices: supported_codes(&state),
    }
    .into_response())
}

/// Store or clear the locale preference.
#[instrument(skip(state, ctx, user, session, form), fields(user_id = %user.id))]
pub async fn update_preferences(
    State(state): State<AppState>,
    RequireLogin(ctx, user): RequireLogin,
    session: Session,
    Form(form): Form<PreferencesForm>,
) -> Result<Response> {
    let raw = form.locale.trim();
    let locale = if raw.is_empty() {
        None
    } else {
        let Some(locale) = resolver::supported(raw, &state.config().i18n) else {
            let mut page = PageContext::new(&state, &ctx, &session, "title_preferences").await?;
            page.push_flash(FlashMessage::error(state.catalog().t_with(
                &ctx.locale,
                "preferences_invalid_locale",
                &[("locale", raw)],
            )));
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                PreferencesTemplate {
                    page,
                    current: user.locale.unwrap_or_default(),
                    choices: supported_codes(&state),
                },
            )
                .into_response());
        };
        Some(locale)
    };

    UserRepository::new(state.pool())
        .set_locale(user.id, locale.as_ref())
        .await?;

    let text = state.catalog().t(&ctx.locale, "preferences_saved");
    redirect_with_flash(&session, FlashMessage::notice(text), "/account/preferences").await
}

fn supported_codes(state: &AppState) -> Vec<String> {
    state
        .config()
        .i18n
        .supported
        .iter()
        .map(|l| l.as_str().to_string())
        .collect()
}

/// Redirect `GET /account` to the preferences page.
pub async fn index() -> Redirect {
    Redirect::to("/account/preferences")
}
