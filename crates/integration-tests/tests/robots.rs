//! Crawler handling: allowlisted robots may read, others are refused.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use mycoflora_web::db::ObservationRepository;

use mycoflora_integration_tests::{ALLOWED_BOT, OTHER_BOT, TestApp};

fn agent(ua: &str) -> [(&str, &str); 1] {
    [("user-agent", ua)]
}

#[tokio::test]
async fn test_robot_friendly_pages() {
    let mut app = TestApp::new().await;

    let response = app.get_with("/observations", &agent(OTHER_BOT)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get_with("/observations", &agent(ALLOWED_BOT)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .get_with("/observations", &agent("Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_public_pages_serve_every_robot() {
    let mut app = TestApp::new().await;

    let response = app.get_with("/info/intro", &agent(OTHER_BOT)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_humans_only_refuses_allowed_robot() {
    let mut app = TestApp::new().await;
    let mary = app.create_user("mary", false).await;
    let observation = ObservationRepository::new(app.pool())
        .create(mary, "Puffball", "Meadow")
        .await
        .unwrap();
    let path = format!("/observations/{observation}/namings/new");

    let response = app.get_with(&path, &agent(ALLOWED_BOT)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // Even with a logged-in session
    app.login("mary").await;
    let response = app.get_with(&path, &agent(ALLOWED_BOT)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get(&path).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_observation_page_hides_proposal_link_from_robots() {
    let mut app = TestApp::new().await;
    let mary = app.create_user("mary", false).await;
    let observation = ObservationRepository::new(app.pool())
        .create(mary, "Puffball", "Meadow")
        .await
        .unwrap();
    app.login("mary").await;

    let path = format!("/observations/{observation}");
    let link = format!("/observations/{observation}/namings/new");
    assert!(app.get(&path).await.body.contains(&link));
    assert!(!app.get_with(&path, &agent(ALLOWED_BOT)).await.body.contains(&link));
}
