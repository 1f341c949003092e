//! Field slip CRUD.
//!
//! Every action requires a login; edit, update and destroy also require
//! ownership or admin mode. Responses negotiate HTML, JSON or a Turbo Stream
//! fragment from the `Accept` header.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use mycoflora_core::FieldSlipId;

use crate::db::FieldSlipRepository;
use crate::db::field_slips::FieldSlip;
use crate::error::{AppError, Result};
use crate::middleware::{Denial, RequireLogin, flash};
use crate::models::{FlashMessage, RequestContext};
use crate::services::field_slips::{
    FieldSlipError, FieldSlipForm, FieldSlipProblem, create_field_slip, update_field_slip,
};
use crate::state::AppState;
use crate::views::{PageContext, ResponseFormat, TURBO_STREAM_MIME, parse_id, redirect_with_flash};

const INDEX_PATH: &str = "/field_slips";

#[derive(Template, WebTemplate)]
#[template(path = "field_slips/index.html")]
pub struct IndexTemplate {
    pub page: PageContext,
    pub slips: Vec<FieldSlip>,
}

#[derive(Template, WebTemplate)]
#[template(path = "field_slips/show.html")]
pub struct ShowTemplate {
    pub page: PageContext,
    pub slip: FieldSlip,
    pub can_edit: bool,
}

/// New and edit form; `slip_id` is set when editing.
#[derive(Template, WebTemplate)]
#[template(path = "field_slips/form.html")]
pub struct FormTemplate {
    pub page: PageContext,
    pub form: FieldSlipForm,
    pub slip_id: Option<FieldSlipId>,
    pub problems: Vec<String>,
}

/// A single `<turbo-stream>` element.
#[derive(Template)]
#[template(path = "field_slips/stream.html")]
pub struct StreamTemplate<'a> {
    pub action: &'a str,
    pub target: String,
    pub slip: Option<&'a FieldSlip>,
    pub problems: &'a [String],
}

fn turbo_stream(template: &StreamTemplate<'_>, status: StatusCode) -> Result<Response> {
    let body = template.render()?;
    Ok((status, [(header::CONTENT_TYPE, TURBO_STREAM_MIME)], body).into_response())
}

fn dom_id(id: FieldSlipId) -> String {
    format!("field_slip_{id}")
}

pub async fn index(
    State(state): State<AppState>,
    RequireLogin(ctx, _user): RequireLogin,
    session: Session,
    format: ResponseFormat,
) -> Result<Response> {
    let slips = FieldSlipRepository::new(state.pool()).list().await?;
    if format == ResponseFormat::Json {
        return Ok(Json(slips).into_response());
    }

    let page = PageContext::new(&state, &ctx, &session, "title_field_slips").await?;
    Ok(IndexTemplate { page, slips }.into_response())
}

pub async fn show(
    State(state): State<AppState>,
    RequireLogin(ctx, _user): RequireLogin,
    session: Session,
    format: ResponseFormat,
    Path(raw_id): Path<String>,
) -> Result<Response> {
    let Some(slip) = find(&state, &raw_id).await? else {
        return not_found(&state, &ctx, &session, format, &raw_id).await;
    };

    match format {
        ResponseFormat::Json => Ok(Json(slip).into_response()),
        ResponseFormat::TurboStream => turbo_stream(
            &StreamTemplate {
                action: "replace",
                target: dom_id(slip.id),
                slip: Some(&slip),
                problems: &[],
            },
            StatusCode::OK,
        ),
        ResponseFormat::Html => {
            let can_edit = ctx.can_edit(slip.user_id);
            let page = PageContext::new(&state, &ctx, &session, "title_field_slips")
                .await?
                .titled(slip.code.clone());
            Ok(ShowTemplate {
                page,
                slip,
                can_edit,
            }
            .into_response())
        }
    }
}

pub async fn new(
    State(state): State<AppState>,
    RequireLogin(ctx, _user): RequireLogin,
    session: Session,
) -> Result<Response> {
    let page = PageContext::new(&state, &ctx, &session, "title_field_slip_new").await?;
    Ok(FormTemplate {
        page,
        form: FieldSlipForm::default(),
        slip_id: None,
        problems: Vec::new(),
    }
    .into_response())
}

#[instrument(skip(state, ctx, user, session, form), fields(user_id = %user.id, code = %form.code))]
pub async fn create(
    State(state): State<AppState>,
    RequireLogin(ctx, user): RequireLogin,
    session: Session,
    format: ResponseFormat,
    Form(form): Form<FieldSlipForm>,
) -> Result<Response> {
    match create_field_slip(state.pool(), &form, user.id).await {
        Ok(slip) => {
            let created = StatusCode::CREATED;
            saved(&state, &ctx, &session, format, &slip, created, "field_slip_created").await
        }
        Err(FieldSlipError::Invalid(problems)) => {
            rejected(&state, &ctx, &session, format, form, None, &problems).await
        }
        Err(FieldSlipError::Repository(e)) => Err(AppError::Database(e)),
    }
}

pub async fn edit(
    State(state): State<AppState>,
    RequireLogin(ctx, _user): RequireLogin,
    session: Session,
    format: ResponseFormat,
    Path(raw_id): Path<String>,
) -> Result<Response> {
    let Some(slip) = find(&state, &raw_id).await? else {
        return not_found(&state, &ctx, &session, format, &raw_id).await;
    };
    if !ctx.can_edit(slip.user_id) {
        return Ok(Denial::PermissionDenied.respond(Some(&session)).await);
    }

    let page = PageContext::new(&state, &ctx, &session, "title_field_slip_edit").await?;
    Ok(FormTemplate {
        page,
        form: FieldSlipForm::from(&slip),
        slip_id: Some(slip.id),
        problems: Vec::new(),
    }
    .into_response())
}

#[instrument(skip(state, ctx, session, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireLogin(ctx, _user): RequireLogin,
    session: Session,
    format: ResponseFormat,
    Path(raw_id): Path<String>,
    Form(form): Form<FieldSlipForm>,
) -> Result<Response> {
    let Some(slip) = find(&state, &raw_id).await? else {
        return not_found(&state, &ctx, &session, format, &raw_id).await;
    };
    if !ctx.can_edit(slip.user_id) {
        return Ok(Denial::PermissionDenied.respond(Some(&session)).await);
    }

    match update_field_slip(state.pool(), slip.id, &form).await {
        Ok(slip) => {
            let ok = StatusCode::OK;
            saved(&state, &ctx, &session, format, &slip, ok, "field_slip_updated").await
        }
        Err(FieldSlipError::Invalid(problems)) => {
            rejected(&state, &ctx, &session, format, form, Some(slip.id), &problems).await
        }
        Err(FieldSlipError::Repository(e)) => Err(AppError::Database(e)),
    }
}

#[instrument(skip(state, ctx, session))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireLogin(ctx, _user): RequireLogin,
    session: Session,
    format: ResponseFormat,
    Path(raw_id): Path<String>,
) -> Result<Response> {
    let Some(slip) = find(&state, &raw_id).await? else {
        return not_found(&state, &ctx, &session, format, &raw_id).await;
    };
    if !ctx.can_edit(slip.user_id) {
        return Ok(Denial::PermissionDenied.respond(Some(&session)).await);
    }

    FieldSlipRepository::new(state.pool()).delete(slip.id).await?;
    tracing::info!(field_slip_id = %slip.id, code = %slip.code, "Field slip deleted");

    match format {
        ResponseFormat::Json => Ok(StatusCode::NO_CONTENT.into_response()),
        ResponseFormat::TurboStream => turbo_stream(
            &StreamTemplate {
                action: "remove",
                target: dom_id(slip.id),
                slip: None,
                problems: &[],
            },
            StatusCode::OK,
        ),
        ResponseFormat::Html => {
            let text = state
                .catalog()
                .t_with(&ctx.locale, "field_slip_destroyed", &[("code", &slip.code)]);
            redirect_with_flash(&session, FlashMessage::notice(text), INDEX_PATH).await
        }
    }
}

async fn find(state: &AppState, raw_id: &str) -> Result<Option<FieldSlip>> {
    match parse_id::<FieldSlipId>(raw_id) {
        Some(id) => Ok(FieldSlipRepository::new(state.pool()).get(id).await?),
        None => Ok(None),
    }
}

async fn saved(
    state: &AppState,
    ctx: &RequestContext,
    session: &Session,
    format: ResponseFormat,
    slip: &FieldSlip,
    json_status: StatusCode,
    message_key: &str,
) -> Result<Response> {
    match format {
        ResponseFormat::Json => Ok((json_status, Json(slip)).into_response()),
        ResponseFormat::TurboStream => turbo_stream(
            &StreamTemplate {
                action: "replace",
                target: dom_id(slip.id),
                slip: Some(slip),
                problems: &[],
            },
            StatusCode::OK,
        ),
        ResponseFormat::Html => {
            let text = state
                .catalog()
                .t_with(&ctx.locale, message_key, &[("code", &slip.code)]);
            flash::push(session, FlashMessage::notice(text)).await?;
            Ok(Redirect::to(&format!("{INDEX_PATH}/{}", slip.id)).into_response())
        }
    }
}

async fn rejected(
    state: &AppState,
    ctx: &RequestContext,
    session: &Session,
    format: ResponseFormat,
    form: FieldSlipForm,
    slip_id: Option<FieldSlipId>,
    problems: &[FieldSlipProblem],
) -> Result<Response> {
    let messages: Vec<String> = problems
        .iter()
        .map(|p| p.message(state.catalog(), &ctx.locale))
        .collect();
    tracing::info!(problems = ?problems, "Field slip rejected");

    match format {
        ResponseFormat::Json => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": messages })),
        )
            .into_response()),
        ResponseFormat::TurboStream => turbo_stream(
            &StreamTemplate {
                action: "replace",
                target: "field_slip_errors".to_string(),
                slip: None,
                problems: &messages,
            },
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        ResponseFormat::Html => {
            let title = if slip_id.is_some() {
                "title_field_slip_edit"
            } else {
                "title_field_slip_new"
            };
            let page = PageContext::new(state, ctx, session, title).await?;
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                FormTemplate {
                    page,
                    form,
                    slip_id,
                    problems: messages,
                },
            )
                .into_response())
        }
    }
}

async fn not_found(
    state: &AppState,
    ctx: &RequestContext,
    session: &Session,
    format: ResponseFormat,
    raw_id: &str,
) -> Result<Response> {
    let text = state.catalog().t_with(
        &ctx.locale,
        "runtime_object_not_found",
        &[("type", "field slip"), ("id", raw_id)],
    );
    if format == ResponseFormat::Json {
        return Ok((StatusCode::NOT_FOUND, Json(json!({ "error": text }))).into_response());
    }
    redirect_with_flash(session, FlashMessage::error(text), INDEX_PATH).await
}
