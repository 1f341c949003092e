//! Public pages, health checks and the JavaScript toggle.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;

use mycoflora_integration_tests::TestApp;

#[tokio::test]
async fn test_health_endpoints() {
    let mut app = TestApp::new().await;

    let live = app.get("/health").await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, "ok");

    let ready = app.get("/health/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let mut app = TestApp::new().await;

    let response = app.get_with("/health", &[("x-request-id", "abc-123")]).await;
    assert_eq!(response.headers["x-request-id"], "abc-123");

    let generated = app.get("/health").await;
    assert!(!generated.headers["x-request-id"].is_empty());
}

#[tokio::test]
async fn test_info_pages_are_public() {
    let mut app = TestApp::new().await;

    for path in [
        "/info/intro",
        "/info/how_to_help",
        "/info/how_to_use",
        "/info/news",
    ] {
        let response = app.get(path).await;
        assert_eq!(response.status, StatusCode::OK, "{path}");
        assert!(response.body.contains("<html lang=\"en\""), "{path}");
    }
}

#[tokio::test]
async fn test_site_stats_counts_rows() {
    let mut app = TestApp::new().await;
    app.create_user("mary", false).await;
    app.create_user("rolf", false).await;

    let response = app.get("/info/site_stats").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("<th>Members</th><td>2</td>"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let mut app = TestApp::new().await;
    assert_eq!(app.get("/no/such/page").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_javascript_override_round_trip() {
    let mut app = TestApp::new().await;
    assert!(app.get("/").await.body.contains("data-js=\"auto\""));

    let response = app
        .get_with("/javascript/turn_off", &[("referer", "/info/intro")])
        .await;
    assert!(response.status.is_redirection());
    assert_eq!(response.location(), "/info/intro");
    assert!(app.get("/").await.body.contains("data-js=\"off\""));

    app.get("/javascript/turn_on").await;
    assert!(app.get("/").await.body.contains("data-js=\"on\""));

    let response = app.get("/javascript/turn_nil").await;
    assert_eq!(response.location(), "/");
    assert!(app.get("/").await.body.contains("data-js=\"auto\""));
}

#[tokio::test]
async fn test_foreign_referer_redirects_home() {
    let mut app = TestApp::new().await;

    let response = app
        .get_with(
            "/javascript/turn_on",
            &[("referer", "https://elsewhere.example/phish")],
        )
        .await;
    assert_eq!(response.location(), "/");
}
