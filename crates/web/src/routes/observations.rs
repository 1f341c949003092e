//! Observations and the names proposed for them.

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

use mycoflora_core::ObservationId;

use crate::db::observations::{NamingSummary, Observation};
use crate::db::{NameRepository, ObservationRepository};
use crate::error::Result;
use crate::middleware::{Context, HumansOnly, RequireLogin, RobotFriendly};
use crate::models::{FlashMessage, RequestContext};
use crate::services::notifications::track_naming;
use crate::state::AppState;
use crate::views::{PageContext, parse_id, redirect_with_flash};

const INDEX_PATH: &str = "/observations";

/// How many observations the index shows.
const RECENT_LIMIT: i64 = 50;

/// New observation form data.
#[derive(Debug, Default, Deserialize)]
pub struct ObservationForm {
    #[serde(default)]
    pub what: String,
    #[serde(default)]
    pub location: String,
}

/// Propose-a-name form data.
#[derive(Debug, Default, Deserialize)]
pub struct NamingForm {
    #[serde(default)]
    pub name: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "observations/index.html")]
pub struct IndexTemplate {
    pub page: PageContext,
    pub observations: Vec<Observation>,
}

#[derive(Template, WebTemplate)]
#[template(path = "observations/show.html")]
pub struct ShowTemplate {
    pub page: PageContext,
    pub observation: Observation,
    pub namings: Vec<NamingSummary>,
    pub can_propose: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "observations/new.html")]
pub struct NewTemplate {
    pub page: PageContext,
    pub form: ObservationForm,
}

#[derive(Template, WebTemplate)]
#[template(path = "observations/new_naming.html")]
pub struct NewNamingTemplate {
    pub page: PageContext,
    pub observation: Observation,
    pub form: NamingForm,
}

/// Home page: the most recent observations.
pub async fn home(
    State(state): State<AppState>,
    Context(ctx): Context,
    session: Session,
) -> Result<Response> {
    let page = PageContext::new(&state, &ctx, &session, "title_home").await?;
    let observations = ObservationRepository::new(state.pool())
        .list_recent(RECENT_LIMIT)
        .await?;
    Ok(IndexTemplate { page, observations }.into_response())
}

pub async fn index(
    State(state): State<AppState>,
    RobotFriendly(ctx): RobotFriendly,
    session: Session,
) -> Result<Response> {
    let page = PageContext::new(&state, &ctx, &session, "title_home").await?;
    let observations = ObservationRepository::new(state.pool())
        .list_recent(RECENT_LIMIT)
        .await?;
    Ok(IndexTemplate { page, observations }.into_response())
}

pub async fn show(
    State(state): State<AppState>,
    RobotFriendly(ctx): RobotFriendly,
    session: Session,
    Path(raw_id): Path<String>,
) -> Result<Response> {
    let Some(observation) = find(&state, &raw_id).await? else {
        return not_found(&state, &ctx, &session, &raw_id).await;
    };

    let namings = ObservationRepository::new(state.pool())
        .namings_for(observation.id)
        .await?;
    let page = PageContext::new(&state, &ctx, &session, "title_home")
        .await?
        .titled(observation.what.clone());
    let can_propose = ctx.is_logged_in() && !ctx.robot.is_robot();

    Ok(ShowTemplate {
        page,
        observation,
        namings,
        can_propose,
    }
    .into_response())
}

pub async fn new(
    State(state): State<AppState>,
    RequireLogin(ctx, _user): RequireLogin,
    session: Session,
) -> Result<Response> {
    let page = PageContext::new(&state, &ctx, &session, "title_observation_new").await?;
    Ok(NewTemplate {
        page,
        form: ObservationForm::default(),
    }
    .into_response())
}

#[instrument(skip(state, ctx, user, session, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireLogin(ctx, user): RequireLogin,
    session: Session,
    Form(form): Form<ObservationForm>,
) -> Result<Response> {
    if form.what.trim().is_empty() {
        let mut page = PageContext::new(&state, &ctx, &session, "title_observation_new").await?;
        page.push_flash(FlashMessage::error(
            state.catalog().t(&ctx.locale, "observation_what_blank"),
        ));
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, NewTemplate { page, form }).into_response());
    }

    let id = ObservationRepository::new(state.pool())
        .create(user.id, &form.what, &form.location)
        .await?;
    tracing::info!(observation_id = %id, "Observation created");

    let text = state
        .catalog()
        .t_with(&ctx.locale, "observation_created", &[("id", &id.to_string())]);
    redirect_with_flash(
        &session,
        FlashMessage::notice(text),
        &format!("{INDEX_PATH}/{id}"),
    )
    .await
}

pub async fn new_naming(
    State(state): State<AppState>,
    HumansOnly(ctx, _user): HumansOnly,
    session: Session,
    Path(raw_id): Path<String>,
) -> Result<Response> {
    let Some(observation) = find(&state, &raw_id).await? else {
        return not_found(&state, &ctx, &session, &raw_id).await;
    };

    let page = PageContext::new(&state, &ctx, &session, "title_naming_new").await?;
    Ok(NewNamingTemplate {
        page,
        observation,
        form: NamingForm::default(),
    }
    .into_response())
}

/// Propose a name, then notify everyone tracking it.
#[instrument(skip(state, ctx, user, session, form), fields(user_id = %user.id))]
pub async fn create_naming(
    State(state): State<AppState>,
    HumansOnly(ctx, user): HumansOnly,
    session: Session,
    Path(raw_id): Path<String>,
    Form(form): Form<NamingForm>,
) -> Result<Response> {
    let Some(observation) = find(&state, &raw_id).await? else {
        return not_found(&state, &ctx, &session, &raw_id).await;
    };

    if form.name.trim().is_empty() {
        let mut page = PageContext::new(&state, &ctx, &session, "title_naming_new").await?;
        page.push_flash(FlashMessage::error(
            state.catalog().t(&ctx.locale, "naming_name_blank"),
        ));
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            NewNamingTemplate {
                page,
                observation,
                form,
            },
        )
            .into_response());
    }

    let name = NameRepository::new(state.pool())
        .find_or_create(&form.name)
        .await?;
    let naming = ObservationRepository::new(state.pool())
        .create_naming(observation.id, name.id, user.id)
        .await?;
    tracing::info!(naming_id = %naming.id, name_id = %name.id, "Name proposed");

    track_naming(&state, &naming).await;

    let text = state
        .catalog()
        .t_with(&ctx.locale, "naming_created", &[("name", &name.text_name)]);
    redirect_with_flash(
        &session,
        FlashMessage::notice(text),
        &format!("{INDEX_PATH}/{}", observation.id),
    )
    .await
}

async fn find(state: &AppState, raw_id: &str) -> Result<Option<Observation>> {
    match parse_id::<ObservationId>(raw_id) {
        Some(id) => Ok(ObservationRepository::new(state.pool()).get(id).await?),
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
        &[("type", "observation"), ("id", raw_id)],
    );
    redirect_with_flash(session, FlashMessage::error(text), INDEX_PATH).await
}
