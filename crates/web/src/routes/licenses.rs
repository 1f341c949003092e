//! License administration. Every action requires admin mode.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use url::Url;

use mycoflora_core::LicenseId;

use crate::db::licenses::{License, NewLicense};
use crate::db::{LicenseRepository, RepositoryError};
use crate::error::Result;
use crate::middleware::RequireAdminMode;
use crate::models::{FlashMessage, RequestContext};
use crate::services::donations::checked;
use crate::state::AppState;
use crate::views::{PageContext, parse_id, redirect_with_flash};

const INDEX_PATH: &str = "/licenses";

/// New license form data.
#[derive(Debug, Default, Deserialize)]
pub struct LicenseForm {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub form_name: String,
    #[serde(default)]
    pub url: String,
    pub deprecated: Option<String>,
}

impl LicenseForm {
    fn to_new(&self) -> Option<NewLicense> {
        let display_name = self.display_name.trim();
        let form_name = self.form_name.trim();
        if display_name.is_empty() || form_name.is_empty() {
            return None;
        }
        let url = Url::parse(self.url.trim()).ok()?;

        Some(NewLicense {
            display_name: display_name.to_string(),
            form_name: form_name.to_string(),
            url: url.to_string(),
            deprecated: checked(self.deprecated.as_deref()),
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "licenses/index.html")]
pub struct IndexTemplate {
    pub page: PageContext,
    pub licenses: Vec<License>,
}

#[derive(Template, WebTemplate)]
#[template(path = "licenses/show.html")]
pub struct ShowTemplate {
    pub page: PageContext,
    pub license: License,
}

#[derive(Template, WebTemplate)]
#[template(path = "licenses/new.html")]
pub struct NewTemplate {
    pub page: PageContext,
    pub form: LicenseForm,
}

pub async fn index(
    State(state): State<AppState>,
    RequireAdminMode(ctx): RequireAdminMode,
    session: Session,
) -> Result<Response> {
    let page = PageContext::new(&state, &ctx, &session, "title_licenses").await?;
    let licenses = LicenseRepository::new(state.pool()).list().await?;
    Ok(IndexTemplate { page, licenses }.into_response())
}

pub async fn show(
    State(state): State<AppState>,
    RequireAdminMode(ctx): RequireAdminMode,
    session: Session,
    Path(raw_id): Path<String>,
) -> Result<Response> {
    let Some(license) = find(&state, &raw_id).await? else {
        return not_found(&state, &ctx, &session, &raw_id).await;
    };

    let page = PageContext::new(&state, &ctx, &session, "title_licenses")
        .await?
        .titled(license.display_name.clone());
    Ok(ShowTemplate { page, license }.into_response())
}

pub async fn new(
    State(state): State<AppState>,
    RequireAdminMode(ctx): RequireAdminMode,
    session: Session,
) -> Result<Response> {
    let page = PageContext::new(&state, &ctx, &session, "title_license_new").await?;
    Ok(NewTemplate {
        page,
        form: LicenseForm::default(),
    }
    .into_response())
}

#[instrument(skip(state, ctx, session, form), fields(form_name = %form.form_name))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminMode(ctx): RequireAdminMode,
    session: Session,
    Form(form): Form<LicenseForm>,
) -> Result<Response> {
    let catalog = state.catalog();
    let problem = match form.to_new() {
        None => catalog.t(&ctx.locale, "license_invalid"),
        Some(new) => match LicenseRepository::new(state.pool()).create(&new).await {
            Ok(license) => {
                tracing::info!(license_id = %license.id, "License created");
                let text = catalog.t_with(
                    &ctx.locale,
                    "license_created",
                    &[("name", &license.display_name)],
                );
                return redirect_with_flash(
                    &session,
                    FlashMessage::notice(text),
                    &format!("{INDEX_PATH}/{}", license.id),
                )
                .await;
            }
            Err(RepositoryError::Conflict(_)) => catalog.t_with(
                &ctx.locale,
                "license_form_name_taken",
                &[("name", &new.form_name)],
            ),
            Err(e) => return Err(e.into()),
        },
    };

    let mut page = PageContext::new(&state, &ctx, &session, "title_license_new").await?;
    page.push_flash(FlashMessage::error(problem));
    Ok((StatusCode::UNPROCESSABLE_ENTITY, NewTemplate { page, form }).into_response())
}

#[instrument(skip(state, ctx, session))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdminMode(ctx): RequireAdminMode,
    session: Session,
    Path(raw_id): Path<String>,
) -> Result<Response> {
    let Some(license) = find(&state, &raw_id).await? else {
        return not_found(&state, &ctx, &session, &raw_id).await;
    };

    LicenseRepository::new(state.pool())
        .delete(license.id)
        .await?;
    tracing::info!(license_id = %license.id, "License deleted");

    let text = state.catalog().t_with(
        &ctx.locale,
        "license_destroyed",
        &[("name", &license.display_name)],
    );
    redirect_with_flash(&session, FlashMessage::notice(text), INDEX_PATH).await
}

async fn find(state: &AppState, raw_id: &str) -> Result<Option<License>> {
    match parse_id::<LicenseId>(raw_id) {
        Some(id) => Ok(LicenseRepository::new(state.pool()).get(id).await?),
        None => Ok(None),
    }
}

async fn not_found(
    state: &AppState,
    ctx: &RequestContext,
    session: &Session,
    raw_id: &str,
) -> Result<Response> {
    let text = state.catalog().t_with(
        &ctx.locale,
        "runtime_object_not_found",
        &[("type", "license"), ("id", raw_id)],
    );
    redirect_with_flash(session, FlashMessage::error(text), INDEX_PATH).await
}
