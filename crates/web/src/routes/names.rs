//! Name pages and the remote ontology lookup.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use mycoflora_core::NameId;

use crate::db::names::Name;
use crate::db::{NameRepository, ObservationRepository};
use crate::error::Result;
use crate::middleware::RobotFriendly;
use crate::models::{FlashMessage, RequestContext};
use crate::state::AppState;
use crate::views::{PageContext, parse_id, redirect_with_flash};

#[derive(Template, WebTemplate)]
#[template(path = "names/show.html")]
pub struct ShowTemplate {
    pub page: PageContext,
    pub name: Name,
    pub namings: i64,
    pub logged_in: bool,
}

pub async fn show(
    State(state): State<AppState>,
    RobotFriendly(ctx): RobotFriendly,
    session: Session,
    Path(raw_id): Path<String>,
) -> Result<Response> {
    let Some(name) = find(&state, &raw_id).await? else {
        return not_found(&state, &ctx, &session, &raw_id).await;
    };

    let namings = ObservationRepository::new(state.pool())
        .count_namings_of(name.id)
        .await?;
    let page = PageContext::new(&state, &ctx, &session, "title_name")
        .await?
        .titled(name.text_name.clone());

    Ok(ShowTemplate {
        page,
        name,
        namings,
        logged_in: ctx.is_logged_in(),
    }
    .into_response())
}

/// Look the name up in the ontology service.
///
/// A found term is returned as JSON. A missing term or any service failure
/// sends the user back to the name page with a flash.
#[instrument(skip(state, ctx, session))]
pub async fn ontology(
    State(state): State<AppState>,
    RobotFriendly(ctx): RobotFriendly,
    session: Session,
    Path(raw_id): Path<String>,
) -> Result<Response> {
    let Some(name) = find(&state, &raw_id).await? else {
        return not_found(&state, &ctx, &session, &raw_id).await;
    };
    let back = format!("/names/{}", name.id);

    let text = match state.ontology().lookup(&name.text_name).await {
        Ok(Some(term)) => return Ok(Json(term).into_response()),
        Ok(None) => state.catalog().t_with(
            &ctx.locale,
            "ontology_term_missing",
            &[("name", &name.text_name)],
        ),
        Err(e) => {
            tracing::warn!(name_id = %name.id, error = %e, "Ontology lookup failed");
            state.catalog().t(&ctx.locale, "ontology_unreachable")
        }
    };

    redirect_with_flash(&session, FlashMessage::warning(text), &back).await
}

async fn find(state: &AppState, raw_id: &str) -> Result<Option<Name>> {
    match parse_id::<NameId>(raw_id) {
        Some(id) => Ok(NameRepository::new(state.pool()).get(id).await?),
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
        &[("type", "name"), ("id", raw_id)],
    );
    redirect_with_flash(session, FlashMessage::error(text), "/observations").await
}
