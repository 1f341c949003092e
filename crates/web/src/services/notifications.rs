//! Name tracking.
//!
//! A user places a `name` notification on a name to hear when someone else
//! proposes it. Proposing a name queues one email per such tracker; delivery
//! runs in a detached task so the proposing request never waits on SMTP.

use askama::Template;
use sqlx::SqlitePool;

use mycoflora_core::{NamingId, QueuedEmailId, UserId};

use crate::db::RepositoryError;
use crate::db::notifications::PendingNameTrackingEmail;
use crate::db::observations::Naming;
use crate::db::{NameRepository, NotificationRepository, ObservationRepository, UserRepository};
use crate::i18n::Catalog;
use crate::services::email::{
    EmailError, EmailService, NameTrackingEmailHtml, NameTrackingEmailText,
};
use crate::state::AppState;

/// Fill a note template.
///
/// `:observer` becomes the proposer's login, `:observation` the observation
/// id and `:name` the proposed name.
#[must_use]
pub fn fill_note_template(template: &str, observer: &str, observation: &str, name: &str) -> String {
    template
        .replace(":observation", observation)
        .replace(":observer", observer)
        .replace(":name", name)
}

/// Queue name-tracking emails for a new naming and start delivery.
///
/// Never fails: enqueue errors are logged and the naming stands.
pub async fn track_naming(state: &AppState, naming: &Naming) {
    let queued = match NotificationRepository::new(state.pool())
        .enqueue_name_tracking(naming)
        .await
    {
        Ok(queued) => queued,
        Err(e) => {
            tracing::error!(naming_id = %naming.id, error = %e, "Failed to queue name tracking emails");
            return;
        }
    };

    if queued.is_empty() {
        return;
    }
    tracing::info!(naming_id = %naming.id, count = queued.len(), "Queued name tracking emails");

    let Some(mailer) = state.mailer().cloned() else {
        tracing::debug!("SMTP not configured, leaving name tracking emails queued");
        return;
    };

    let pool = state.pool().clone();
    let catalog = state.catalog().clone();
    let base_url = state.config().base_url.clone();
    tokio::spawn(async move {
        deliver_name_tracking(&pool, &mailer, &catalog, &base_url, &queued).await;
    });
}

/// Send queued name-tracking emails and mark each delivered one.
///
/// Rows already sent are skipped. Failures are logged per email.
pub async fn deliver_name_tracking(
    pool: &SqlitePool,
    mailer: &EmailService,
    catalog: &Catalog,
    base_url: &str,
    ids: &[QueuedEmailId],
) {
    let repo = NotificationRepository::new(pool);
    for &id in ids {
        let pending = match repo.pending_name_tracking(id).await {
            Ok(Some(pending)) => pending,
            Ok(None) => continue,
            Err(e) => {
                tracing::error!(queued_email_id = %id, error = %e, "Failed to load queued email");
                continue;
            }
        };

        if let Err(e) = send_one(mailer, catalog, base_url, &pending).await {
            tracing::error!(queued_email_id = %id, error = %e, "Failed to send name tracking email");
            continue;
        }
        if let Err(e) = repo.mark_sent(id).await {
            tracing::error!(queued_email_id = %id, error = %e, "Failed to mark email sent");
        }
    }
}

async fn send_one(
    mailer: &EmailService,
    catalog: &Catalog,
    base_url: &str,
    pending: &PendingNameTrackingEmail,
) -> Result<(), EmailError> {
    let observation_id = pending.observation_id.to_string();
    let observation_url = format!(
        "{}/observations/{observation_id}",
        base_url.trim_end_matches('/')
    );
    let note = pending.note_template.as_deref().map(|t| {
        fill_note_template(t, &pending.from_login, &observation_id, &pending.text_name)
    });

    let text = NameTrackingEmailText {
        recipient: &pending.to_login,
        observer: &pending.from_login,
        name: &pending.text_name,
        observation_url: &observation_url,
        note: note.as_deref(),
    }
    .render()?;
    let html = NameTrackingEmailHtml {
        recipient: &pending.to_login,
        observer: &pending.from_login,
        name: &pending.text_name,
        observation_url: &observation_url,
        note: note.as_deref(),
    }
    .render()?;

    let subject = catalog.t_with(
        catalog.default_locale(),
        "email_name_tracking_subject",
        &[("observer", &pending.from_login), ("name", &pending.text_name)],
    );

    mailer
        .send_multipart_email(&pending.to_email, &subject, text, html)
        .await
}

/// The owner's filled note templates for a naming.
///
/// Empty when the naming does not exist, when the owner proposed it, or when
/// none of the owner's trackers on that name carries a template.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn notes_for_naming(
    pool: &SqlitePool,
    owner: UserId,
    naming_id: NamingId,
) -> Result<Vec<String>, RepositoryError> {
    let Some(naming) = ObservationRepository::new(pool).get_naming(naming_id).await? else {
        return Ok(Vec::new());
    };
    if naming.user_id == owner {
        return Ok(Vec::new());
    }

    let trackers = NotificationRepository::new(pool)
        .templated_trackers_for(owner, &naming)
        .await?;
    if trackers.is_empty() {
        return Ok(Vec::new());
    }

    let observer = UserRepository::new(pool)
        .get_by_id(naming.user_id)
        .await?
        .map(|u| u.login)
        .unwrap_or_default();
    let name = NameRepository::new(pool)
        .get(naming.name_id)
        .await?
        .map(|n| n.text_name)
        .unwrap_or_default();
    let observation = naming.observation_id.to_string();

    Ok(trackers
        .iter()
        .filter_map(|t| t.note_template.as_deref())
        .map(|t| fill_note_template(t, &observer, &observation, &name))
        .collect())
}
