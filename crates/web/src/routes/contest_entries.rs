//! Contest entry administration. Every action requires admin mode.

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

use mycoflora_core::ContestEntryId;

use crate::db::ContestRepository;
use crate::db::contest::ContestEntry;
use crate::error::Result;
use crate::middleware::RequireAdminMode;
use crate::models::{FlashMessage, RequestContext};
use crate::state::AppState;
use crate::views::{PageContext, parse_id, redirect_with_flash};

const INDEX_PATH: &str = "/contest_entries";

/// New entry form data.
#[derive(Debug, Default, Deserialize)]
pub struct ContestEntryForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "contest_entries/index.html")]
pub struct IndexTemplate {
    pub page: PageContext,
    pub entries: Vec<ContestEntry>,
}

#[derive(Template, WebTemplate)]
#[template(path = "contest_entries/show.html")]
pub struct ShowTemplate {
    pub page: PageContext,
    pub entry: ContestEntry,
}

#[derive(Template, WebTemplate)]
#[template(path = "contest_entries/new.html")]
pub struct NewTemplate {
    pub page: PageContext,
    pub form: ContestEntryForm,
}

pub async fn index(
    State(state): State<AppState>,
    RequireAdminMode(ctx): RequireAdminMode,
    session: Session,
) -> Result<Response> {
    let page = PageContext::new(&state, &ctx, &session, "title_contest_entries").await?;
    let entries = ContestRepository::new(state.pool()).list_entries().await?;
    Ok(IndexTemplate { page, entries }.into_response())
}

pub async fn show(
    State(state): State<AppState>,
    RequireAdminMode(ctx): RequireAdminMode,
    session: Session,
    Path(raw_id): Path<String>,
) -> Result<Response> {
    let entry = match parse_id::<ContestEntryId>(&raw_id) {
        Some(id) => ContestRepository::new(state.pool()).get_entry(id).await?,
        None => None,
    };
    let Some(entry) = entry else {
        return not_found(&state, &ctx, &session, &raw_id).await;
    };

    let page = PageContext::new(&state, &ctx, &session, "title_contest_entries")
        .await?
        .titled(entry.title.clone());
    Ok(ShowTemplate { page, entry }.into_response())
}

pub async fn new(
    State(state): State<AppState>,
    RequireAdminMode(ctx): RequireAdminMode,
    session: Session,
) -> Result<Response> {
    let page = PageContext::new(&state, &ctx, &session, "title_contest_entry_new").await?;
    Ok(NewTemplate {
        page,
        form: ContestEntryForm::default(),
    }
    .into_response())
}

#[instrument(skip(state, ctx, session, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminMode(ctx): RequireAdminMode,
    session: Session,
    Form(form): Form<ContestEntryForm>,
) -> Result<Response> {
    let title = form.title.trim();
    if title.is_empty() {
        let mut page = PageContext::new(&state, &ctx, &session, "title_contest_entry_new").await?;
        page.push_flash(FlashMessage::error(
            state.catalog().t(&ctx.locale, "contest_entry_invalid"),
        ));
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, NewTemplate { page, form }).into_response());
    }

    let entry = ContestRepository::new(state.pool())
        .create_entry(title, form.description.trim())
        .await?;
    tracing::info!(contest_entry_id = %entry.id, "Contest entry created");

    let text = state
        .catalog()
        .t_with(&ctx.locale, "contest_entry_created", &[("title", &entry.title)]);
    redirect_with_flash(
        &session,
        FlashMessage::notice(text),
        &format!("{INDEX_PATH}/{}", entry.id),
    )
    .await
}

#[instrument(skip(state, ctx, session))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdminMode(ctx): RequireAdminMode,
    session: Session,
    Path(raw_id): Path<String>,
) -> Result<Response> {
    let repo = ContestRepository::new(state.pool());
    let entry = match parse_id::<ContestEntryId>(&raw_id) {
        Some(id) => repo.get_entry(id).await?,
        None => None,
    };
    let Some(entry) = entry else {
        return not_found(&state, &ctx, &session, &raw_id).await;
    };

    repo.delete_entry(entry.id).await?;
    tracing::info!(contest_entry_id = %entry.id, "Contest entry deleted");

    let text = state
        .catalog()
        .t_with(&ctx.locale, "contest_entry_destroyed", &[("title", &entry.title)]);
    redirect_with_flash(&session, FlashMessage::notice(text), INDEX_PATH).await
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
        &[("type", "contest entry"), ("id", raw_id)],
    );
    redirect_with_flash(session, FlashMessage::error(text), INDEX_PATH).await
}
