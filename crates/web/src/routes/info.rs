//! Static information pages and live site statistics.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::db::stats::{SiteStats, site_stats as load_site_stats};
use crate::error::Result;
use crate::middleware::Context;
use crate::state::AppState;
use crate::views::PageContext;

/// A page of localized prose.
#[derive(Template, WebTemplate)]
#[template(path = "info/page.html")]
pub struct InfoTemplate {
    pub page: PageContext,
    pub body: String,
}

/// Row counts for the statistics page.
#[derive(Template, WebTemplate)]
#[template(path = "info/site_stats.html")]
pub struct SiteStatsTemplate {
    pub page: PageContext,
    pub stats: SiteStats,
}

async fn render(
    state: &AppState,
    ctx: &crate::models::RequestContext,
    session: &Session,
    topic: &str,
) -> Result<Response> {
    let page = PageContext::new(state, ctx, session, &format!("title_{topic}")).await?;
    let body = page.t(&format!("info_{topic}_body"));
    Ok(InfoTemplate { page, body }.into_response())
}

pub async fn intro(
    State(state): State<AppState>,
    Context(ctx): Context,
    session: Session,
) -> Result<Response> {
    render(&state, &ctx, &session, "intro").await
}

pub async fn how_to_help(
    State(state): State<AppState>,
    Context(ctx): Context,
    session: Session,
) -> Result<Response> {
    render(&state, &ctx, &session, "how_to_help").await
}

pub async fn how_to_use(
    State(state): State<AppState>,
    Context(ctx): Context,
    session: Session,
) -> Result<Response> {
    render(&state, &ctx, &session, "how_to_use").await
}

pub async fn news(
    State(state): State<AppState>,
    Context(ctx): Context,
    session: Session,
) -> Result<Response> {
    render(&state, &ctx, &session, "news").await
}

/// Live row counts.
pub async fn site_stats(
    State(state): State<AppState>,
    Context(ctx): Context,
    session: Session,
) -> Result<Response> {
    let page = PageContext::new(&state, &ctx, &session, "title_site_stats").await?;
    let stats = load_site_stats(state.pool()).await?;
    Ok(SiteStatsTemplate { page, stats }.into_response())
}
