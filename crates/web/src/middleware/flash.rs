//! One-shot messages carried in the session to the next rendered page.

use tower_sessions::Session;

use crate::models::{FlashMessage, session_keys};

/// Queue a message for the next page.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn push(
    session: &Session,
    message: FlashMessage,
) -> Result<(), tower_sessions::session::Error> {
    let mut queued: Vec<FlashMessage> = session
        .get(session_keys::FLASH)
        .await?
        .unwrap_or_default();
    queued.push(message);
    session.insert(session_keys::FLASH, queued).await
}

/// Remove and return all queued messages.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn take(session: &Session) -> Result<Vec<FlashMessage>, tower_sessions::session::Error> {
    Ok(session
        .remove::<Vec<FlashMessage>>(session_keys::FLASH)
        .await?
        .unwrap_or_default())
}
