//! Donations: the form, submission and the public donor list.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::DonationRepository;
use crate::db::donations::{Donation, Donor};
use crate::error::{AppError, Result};
use crate::middleware::Context;
use crate::models::{FlashMessage, RequestContext};
use crate::services::donations::{DonationError, DonationForm, submit_donation};
use crate::state::AppState;
use crate::views::PageContext;

/// Preset amounts offered on the form.
pub const PRESET_AMOUNTS: &[&str] = &["25", "50", "100", "250"];

/// Donation form.
#[derive(Template, WebTemplate)]
#[template(path = "support/donate.html")]
pub struct DonateTemplate {
    pub page: PageContext,
    pub presets: &'static [&'static str],
    pub form: DonationForm,
}

impl DonateTemplate {
    fn checked(&self, preset: &str) -> &'static str {
        if self.form.amount == preset { "checked" } else { "" }
    }
}

/// Confirmation after a recorded donation.
#[derive(Template, WebTemplate)]
#[template(path = "support/confirm.html")]
pub struct ConfirmTemplate {
    pub page: PageContext,
    pub donation: Donation,
}

/// Reviewed, non-anonymous donors.
#[derive(Template, WebTemplate)]
#[template(path = "support/donors.html")]
pub struct DonorsTemplate {
    pub page: PageContext,
    pub donors: Vec<Donor>,
}

/// Show the donation form.
pub async fn donate(
    State(state): State<AppState>,
    Context(ctx): Context,
    session: Session,
) -> Result<Response> {
    let page = PageContext::new(&state, &ctx, &session, "title_donate").await?;
    Ok(DonateTemplate {
        page,
        presets: PRESET_AMOUNTS,
        form: DonationForm::default(),
    }
    .into_response())
}

/// Submit a donation posted as a form.
pub async fn confirm(
    State(state): State<AppState>,
    Context(ctx): Context,
    session: Session,
    Form(form): Form<DonationForm>,
) -> Result<Response> {
    record(&state, &ctx, &session, form).await
}

/// Submit a donation given as query parameters.
pub async fn confirm_query(
    State(state): State<AppState>,
    Context(ctx): Context,
    session: Session,
    Query(form): Query<DonationForm>,
) -> Result<Response> {
    record(&state, &ctx, &session, form).await
}

#[instrument(skip_all, fields(amount = %form.amount))]
async fn record(
    state: &AppState,
    ctx: &RequestContext,
    session: &Session,
    form: DonationForm,
) -> Result<Response> {
    match submit_donation(state.pool(), &form, ctx.user_id()).await {
        Ok(donation) => {
            let page = PageContext::new(state, ctx, session, "title_donation_confirm").await?;
            Ok(ConfirmTemplate { page, donation }.into_response())
        }
        Err(DonationError::InvalidAmount(e)) => {
            tracing::info!(error = %e, "Donation rejected");
            let mut page = PageContext::new(state, ctx, session, "title_donate").await?;
            page.push_flash(FlashMessage::error(
                state.catalog().t(&ctx.locale, "confirm_positive_number_error"),
            ));
            Ok(DonateTemplate {
                page,
                presets: PRESET_AMOUNTS,
                form,
            }
            .into_response())
        }
        Err(DonationError::Repository(e)) => Err(AppError::Database(e)),
    }
}

/// Public list of donors.
pub async fn donors(
    State(state): State<AppState>,
    Context(ctx): Context,
    session: Session,
) -> Result<Response> {
    let page = PageContext::new(&state, &ctx, &session, "title_donors").await?;
    let donors = DonationRepository::new(state.pool()).public_donors().await?;
    Ok(DonorsTemplate { page, donors }.into_response())
}
