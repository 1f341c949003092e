//! Locale precedence across request parameter, user preference, session and default.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use mycoflora_core::{Locale, UserId};
use mycoflora_web::db::UserRepository;

use mycoflora_integration_tests::TestApp;

const AJAX: (&str, &str) = ("x-requested-with", "XMLHttpRequest");

fn lang(body: &str) -> &str {
    let start = body.find("<html lang=\"").map(|i| i + 12).unwrap_or(0);
    let end = body[start..].find('"').map_or(start, |i| start + i);
    &body[start..end]
}

async fn set_user_locale(app: &TestApp, user: UserId, code: &str) {
    let locale = Locale::parse(code).unwrap();
    UserRepository::new(app.pool())
        .set_locale(user, Some(&locale))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_default_locale_when_nothing_set() {
    let mut app = TestApp::new().await;
    assert_eq!(lang(&app.get("/").await.body), "en");
}

#[tokio::test]
async fn test_param_beats_user_and_session() {
    let mut app = TestApp::new().await;
    let mary = app.create_user("mary", false).await;
    set_user_locale(&app, mary, "fr").await;
    app.login("mary").await;

    // Session remembers es
    assert_eq!(lang(&app.get("/?user_locale=es").await.body), "es");

    assert_eq!(lang(&app.get("/?user_locale=pt").await.body), "pt");
}

#[tokio::test]
async fn test_ajax_skips_param_and_uses_user_preference() {
    let mut app = TestApp::new().await;
    let mary = app.create_user("mary", false).await;
    set_user_locale(&app, mary, "fr").await;
    app.login("mary").await;
    app.get("/?user_locale=es").await;

    let response = app.get_with("/?user_locale=pt", &[AJAX]).await;
    assert_eq!(lang(&response.body), "fr");
}

#[tokio::test]
async fn test_ajax_without_user_preference_uses_session() {
    let mut app = TestApp::new().await;
    assert_eq!(lang(&app.get("/?user_locale=es").await.body), "es");

    let response = app.get_with("/?user_locale=pt", &[AJAX]).await;
    assert_eq!(lang(&response.body), "es");
}

#[tokio::test]
async fn test_param_is_remembered_in_session() {
    let mut app = TestApp::new().await;
    app.get("/?user_locale=de").await;

    assert_eq!(lang(&app.get("/info/intro").await.body), "de");
}

#[tokio::test]
async fn test_user_preference_beats_session() {
    let mut app = TestApp::new().await;
    let mary = app.create_user("mary", false).await;
    app.get("/?user_locale=es").await;
    set_user_locale(&app, mary, "fr").await;
    app.login("mary").await;

    assert_eq!(lang(&app.get("/").await.body), "fr");
}

#[tokio::test]
async fn test_unsupported_param_falls_through() {
    let mut app = TestApp::new().await;
    assert_eq!(lang(&app.get("/?user_locale=tlh").await.body), "en");
    assert_eq!(lang(&app.get("/?user_locale=not%20a%20locale").await.body), "en");
}

#[tokio::test]
async fn test_locale_does_not_leak_between_sessions() {
    let mut app = TestApp::new().await;
    assert_eq!(lang(&app.get("/?user_locale=pt").await.body), "pt");

    app.clear_cookies();
    assert_eq!(lang(&app.get("/").await.body), "en");
}

#[tokio::test]
async fn test_translated_text_follows_locale() {
    let mut app = TestApp::new().await;
    let english = app.get("/info/intro").await.body;
    let french = app.get("/info/intro?user_locale=fr").await.body;

    let title = app
        .state
        .catalog()
        .t(&Locale::parse("fr").unwrap(), "title_intro");
    assert!(french.contains(&title));
    assert_ne!(english, french);
}
