//! Name tracking: trackers, queued emails and note templates.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;

use mycoflora_core::{NameId, ObservationId, UserId};
use mycoflora_web::db::{NameRepository, NotificationRepository, ObservationRepository};

use mycoflora_integration_tests::TestApp;

const NOTE: &str = "Hi :observer, may I have a sample of :name from observation :observation?";

struct Fixture {
    app: TestApp,
    mary: UserId,
    rolf: UserId,
    name: NameId,
    observation: ObservationId,
}

/// Mary tracks Amanita muscaria; Rolf owns an observation.
async fn fixture() -> Fixture {
    let mut app = TestApp::new().await;
    let mary = app.create_user("mary", false).await;
    let rolf = app.create_user("rolf", false).await;
    let name = NameRepository::new(app.pool())
        .create("Amanita muscaria", "(L.) Lam.")
        .await
        .unwrap()
        .id;
    let observation = ObservationRepository::new(app.pool())
        .create(rolf, "Red cap with white warts", "Falmouth")
        .await
        .unwrap();

    app.login("mary").await;
    let response = app
        .post_form(
            "/notifications",
            &[("name_id", &name.to_string()), ("note_template", NOTE)],
        )
        .await;
    assert_eq!(response.location(), "/notifications");

    Fixture {
        app,
        mary,
        rolf,
        name,
        observation,
    }
}

async fn propose(app: &mut TestApp, observation: ObservationId, name: &str) {
    let response = app
        .post_form(&format!("/observations/{observation}/namings"), &[("name", name)])
        .await;
    assert!(response.status.is_redirection(), "naming failed: {}", response.status);
}

#[tokio::test]
async fn test_track_name() {
    let Fixture { mut app, mary, .. } = fixture().await;

    let index = app.get("/notifications").await;
    assert_eq!(index.status, StatusCode::OK);
    assert!(index.body.contains("You are now tracking Amanita muscaria."));
    assert!(index.body.contains("Amanita muscaria"));

    let trackers = NotificationRepository::new(app.pool())
        .list_for_user(mary)
        .await
        .unwrap();
    assert_eq!(trackers.len(), 1);
    assert_eq!(trackers[0].note_template.as_deref(), Some(NOTE));
}

#[tokio::test]
async fn test_track_missing_name() {
    let mut app = TestApp::new().await;
    app.create_user("mary", false).await;
    app.login("mary").await;

    let response = app.post_form("/notifications", &[("name_id", "404")]).await;
    let index = app.follow(&response).await;
    assert!(index.body.contains("Name #404 does not exist."));
}

#[tokio::test]
async fn test_proposal_queues_email_for_tracker() {
    let Fixture {
        mut app,
        mary,
        rolf,
        observation,
        ..
    } = fixture().await;

    app.clear_cookies();
    app.login("rolf").await;
    propose(&mut app, observation, "Amanita muscaria").await;

    let queued = NotificationRepository::new(app.pool())
        .queued_for(mary)
        .await
        .unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].from_user_id, rolf);
    assert_eq!(queued[0].flavor, "name_tracking");
    // No SMTP in tests, so it stays queued
    assert!(queued[0].sent_at.is_none());
}

#[tokio::test]
async fn test_tracker_sees_filled_note() {
    let Fixture {
        mut app,
        observation,
        ..
    } = fixture().await;

    app.clear_cookies();
    app.login("rolf").await;
    propose(&mut app, observation, "Amanita muscaria").await;
    let naming = ObservationRepository::new(app.pool())
        .namings_for(observation)
        .await
        .unwrap()
        .remove(0);

    app.clear_cookies();
    app.login("mary").await;
    let response = app.get(&format!("/notifications/naming/{}", naming.id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(&format!(
        "Hi rolf, may I have a sample of Amanita muscaria from observation {observation}?"
    )));
}

#[tokio::test]
async fn test_own_proposal_is_not_tracked() {
    let Fixture {
        mut app,
        mary,
        observation,
        ..
    } = fixture().await;

    propose(&mut app, observation, "Amanita muscaria").await;
    assert!(NotificationRepository::new(app.pool())
        .queued_for(mary)
        .await
        .unwrap()
        .is_empty());

    let naming = ObservationRepository::new(app.pool())
        .namings_for(observation)
        .await
        .unwrap()
        .remove(0);
    let response = app.get(&format!("/notifications/naming/{}", naming.id)).await;
    assert!(!response.body.contains("may I have a sample"));
}

#[tokio::test]
async fn test_other_names_are_not_tracked() {
    let Fixture {
        mut app,
        mary,
        observation,
        ..
    } = fixture().await;

    app.clear_cookies();
    app.login("rolf").await;
    propose(&mut app, observation, "Amanita pantherina").await;

    assert!(NotificationRepository::new(app.pool())
        .queued_for(mary)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_stop_tracking() {
    let Fixture {
        mut app, mary, name, ..
    } = fixture().await;
    let pool = app.pool().clone();
    let repo = NotificationRepository::new(&pool);
    let tracker = repo.list_for_user(mary).await.unwrap().remove(0);
    assert_eq!(tracker.name_id, name);

    // Someone else cannot remove it
    app.clear_cookies();
    app.login("rolf").await;
    app.post_form(&format!("/notifications/{}/destroy", tracker.id), &[])
        .await;
    assert_eq!(repo.list_for_user(mary).await.unwrap().len(), 1);

    app.clear_cookies();
    app.login("mary").await;
    let response = app
        .post_form(&format!("/notifications/{}/destroy", tracker.id), &[])
        .await;
    let index = app.follow(&response).await;
    assert!(index.body.contains("You are no longer tracking that name."));
    assert!(repo.list_for_user(mary).await.unwrap().is_empty());
}
