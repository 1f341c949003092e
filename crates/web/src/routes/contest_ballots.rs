//! Contest ballot: view and cast.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::contest::BallotLine;
use crate::error::{AppError, Result};
use crate::middleware::RequireLogin;
use crate::models::FlashMessage;
use crate::services::ballots::{BallotError, cast_ballot, find_or_create_votes};
use crate::state::AppState;
use crate::views::{PageContext, redirect_with_flash};

/// The user's ballot.
#[derive(Template, WebTemplate)]
#[template(path = "contest_ballots/index.html")]
pub struct BallotTemplate {
    pub page: PageContext,
    pub lines: Vec<BallotLine>,
    pub ranks: Vec<i32>,
}

impl BallotTemplate {
    fn selected(&self, line: &BallotLine, rank: &i32) -> &'static str {
        if line.vote == *rank { "selected" } else { "" }
    }
}

/// Show the ballot, creating missing votes first.
pub async fn index(
    State(state): State<AppState>,
    RequireLogin(ctx, user): RequireLogin,
    session: Session,
) -> Result<Response> {
    let lines = find_or_create_votes(state.pool(), user.id).await?;
    let page = PageContext::new(&state, &ctx, &session, "title_ballot").await?;
    let ranks = (1..=i32::try_from(lines.len()).unwrap_or(i32::MAX)).collect();

    Ok(BallotTemplate { page, lines, ranks }.into_response())
}

/// Apply a submitted ballot.
#[instrument(skip(state, ctx, user, session, fields), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireLogin(ctx, user): RequireLogin,
    session: Session,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response> {
    find_or_create_votes(state.pool(), user.id).await?;

    let message = match cast_ballot(state.pool(), user.id, &fields).await {
        Ok(_) => FlashMessage::notice(state.catalog().t(&ctx.locale, "ballot_saved")),
        Err(BallotError::NotConfirmed) => {
            FlashMessage::warning(state.catalog().t(&ctx.locale, "ballot_not_confirmed"))
        }
        Err(BallotError::Repository(e)) => return Err(AppError::Database(e)),
    };

    redirect_with_flash(&session, message, "/contest_ballots").await
}
