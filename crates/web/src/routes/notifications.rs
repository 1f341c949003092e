//! Name tracking notifications owned by the current user.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mycoflora_core::{NameId, NamingId, NotificationId};

use crate::db::notifications::NotificationSummary;
use crate::db::{NameRepository, NotificationRepository};
use crate::error::Result;
use crate::middleware::RequireLogin;
use crate::models::FlashMessage;
use crate::services::notifications::notes_for_naming;
use crate::state::AppState;
use crate::views::{PageContext, parse_id, redirect_with_flash};

const INDEX_PATH: &str = "/notifications";

/// Track-a-name form data.
#[derive(Debug, Deserialize)]
pub struct NotificationForm {
    #[serde(default)]
    pub name_id: String,
    pub note_template: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "notifications/index.html")]
pub struct IndexTemplate {
    pub page: PageContext,
    pub notifications: Vec<NotificationSummary>,
}

/// Filled note templates for one naming.
#[derive(Template, WebTemplate)]
#[template(path = "notifications/show.html")]
pub struct ShowTemplate {
    pub page: PageContext,
    pub notes: Vec<String>,
}

pub async fn index(
    State(state): State<AppState>,
    RequireLogin(ctx, user): RequireLogin,
    session: Session,
) -> Result<Response> {
    let page = PageContext::new(&state, &ctx, &session, "title_notifications").await?;
    let notifications = NotificationRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(IndexTemplate {
        page,
        notifications,
    }
    .into_response())
}

#[instrument(skip(state, ctx, user, session, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireLogin(ctx, user): RequireLogin,
    session: Session,
    Form(form): Form<NotificationForm>,
) -> Result<Response> {
    let name = match parse_id::<NameId>(form.name_id.trim()) {
        Some(id) => NameRepository::new(state.pool()).get(id).await?,
        None => None,
    };
    let Some(name) = name else {
        let text = state.catalog().t_with(
            &ctx.locale,
            "notification_name_missing",
            &[("id", form.name_id.trim())],
        );
        return redirect_with_flash(&session, FlashMessage::error(text), INDEX_PATH).await;
    };

    let note = form
        .note_template
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let notification = NotificationRepository::new(state.pool())
        .create_name_tracker(user.id, name.id, note)
        .await?;
    tracing::info!(notification_id = %notification.id, name_id = %name.id, "Tracking name");

    let text = state
        .catalog()
        .t_with(&ctx.locale, "notification_created", &[("name", &name.text_name)]);
    redirect_with_flash(&session, FlashMessage::notice(text), INDEX_PATH).await
}

#[instrument(skip(state, ctx, user, session), fields(user_id = %user.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireLogin(ctx, user): RequireLogin,
    session: Session,
    Path(raw_id): Path<String>,
) -> Result<Response> {
    let removed = match parse_id::<NotificationId>(&raw_id) {
        Some(id) => {
            NotificationRepository::new(state.pool())
                .delete_owned(id, user.id)
                .await?
        }
        None => false,
    };

    let message = if removed {
        FlashMessage::notice(state.catalog().t(&ctx.locale, "notification_destroyed"))
    } else {
        FlashMessage::error(state.catalog().t_with(
            &ctx.locale,
            "runtime_object_not_found",
            &[("type", "notification"), ("id", &raw_id)],
        ))
    };
    redirect_with_flash(&session, message, INDEX_PATH).await
}

/// The owner's notes for a naming someone else proposed.
pub async fn show_naming(
    State(state): State<AppState>,
    RequireLogin(ctx, user): RequireLogin,
    session: Session,
    Path(raw_id): Path<String>,
) -> Result<Response> {
    let notes = match parse_id::<NamingId>(&raw_id) {
        Some(naming_id) => notes_for_naming(state.pool(), user.id, naming_id).await?,
        None => Vec::new(),
    };

    let page = PageContext::new(&state, &ctx, &session, "title_notifications").await?;
    Ok(ShowTemplate { page, notes }.into_response())
}
