//! Field slip CRUD across HTML, JSON and Turbo Stream responses.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;

use mycoflora_core::FieldSlipId;
use mycoflora_web::db::{FieldSlipRepository, ObservationRepository, ProjectRepository};

use mycoflora_integration_tests::TestApp;

const JSON: (&str, &str) = ("accept", "application/json");
const TURBO: (&str, &str) = ("accept", "text/vnd.turbo-stream.html, text/html");

async fn logged_in(login: &str) -> TestApp {
    let mut app = TestApp::new().await;
    app.create_user(login, false).await;
    app.login(login).await;
    app
}

async fn slip_ids(app: &TestApp) -> Vec<FieldSlipId> {
    let mut slips = FieldSlipRepository::new(app.pool()).list().await.unwrap();
    slips.sort_by(|a, b| a.code.cmp(&b.code));
    slips.into_iter().map(|s| s.id).collect()
}

#[tokio::test]
async fn test_field_slips_require_login() {
    let mut app = TestApp::new().await;

    let response = app.get("/field_slips").await;
    assert_eq!(response.location(), "/account/login");
}

#[tokio::test]
async fn test_html_create_redirects_to_slip() {
    let mut app = logged_in("mary").await;

    assert_eq!(app.get("/field_slips/new").await.status, StatusCode::OK);

    let response = app
        .post_form("/field_slips", &[("field_slip[code]", "nemf-0042")])
        .await;
    assert!(response.status.is_redirection());

    let slips = FieldSlipRepository::new(app.pool()).list().await.unwrap();
    assert_eq!(slips.len(), 1);
    assert_eq!(slips[0].code, "NEMF-0042");
    assert_eq!(response.location(), format!("/field_slips/{}", slips[0].id));

    let show = app.follow(&response).await;
    assert_eq!(show.status, StatusCode::OK);
    assert!(show.body.contains("Field slip NEMF-0042 created."));
}

#[tokio::test]
async fn test_create_attaches_project_and_observation() {
    let mut app = TestApp::new().await;
    let mary = app.create_user("mary", false).await;
    app.login("mary").await;

    let project = ProjectRepository::new(app.pool())
        .create("North East Mushroom Foray", "NEMF", mary)
        .await
        .unwrap();
    let observation = ObservationRepository::new(app.pool())
        .create(mary, "Boletus edulis", "Pasadena")
        .await
        .unwrap();

    let response = app
        .post_form_with(
            "/field_slips",
            &[
                ("field_slip[code]", "NEMF-7"),
                ("field_slip[observation_id]", &observation.to_string()),
            ],
            &[JSON],
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let body = response.json();
    assert_eq!(body["code"], "NEMF-7");
    assert_eq!(body["project_id"], project.id.as_i32());
    assert_eq!(body["observation_id"], observation.as_i32());
}

#[tokio::test]
async fn test_json_rejection_lists_errors() {
    let mut app = logged_in("mary").await;

    let response = app
        .post_form_with(
            "/field_slips",
            &[("field_slip[code]", "no dash"), ("field_slip[observation_id]", "999")],
            &[JSON],
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let errors = response.json()["errors"].as_array().unwrap().clone();
    assert_eq!(errors.len(), 2);
    assert!(FieldSlipRepository::new(app.pool()).list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_html_rejection_rerenders_form() {
    let mut app = logged_in("mary").await;

    let response = app
        .post_form("/field_slips", &[("field_slip[code]", "no dash")])
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("field_slip_errors"));
    assert!(response.body.contains("no dash"));
}

#[tokio::test]
async fn test_turbo_rejection_replaces_error_list() {
    let mut app = logged_in("mary").await;

    let response = app
        .post_form_with("/field_slips", &[("field_slip[code]", "??")], &[TURBO])
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.content_type().starts_with("text/vnd.turbo-stream.html"));
    assert!(response.body.contains("<turbo-stream action=\"replace\" target=\"field_slip_errors\">"));
}

#[tokio::test]
async fn test_duplicate_code_is_rejected() {
    let mut app = logged_in("mary").await;

    app.post_form("/field_slips", &[("field_slip[code]", "ABC-1")])
        .await;
    let response = app
        .post_form_with("/field_slips", &[("field_slip[code]", "abc-1")], &[JSON])
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(FieldSlipRepository::new(app.pool()).list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_by_owner() {
    let mut app = logged_in("mary").await;
    app.post_form("/field_slips", &[("field_slip[code]", "ABC-1")])
        .await;
    let slip = FieldSlipRepository::new(app.pool()).list().await.unwrap().remove(0);
    let path = format!("/field_slips/{}", slip.id);

    assert_eq!(app.get(&format!("{path}/edit")).await.status, StatusCode::OK);

    let response = app
        .post_form_with(&path, &[("field_slip[code]", "ABC-2")], &[JSON])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["code"], "ABC-2");
}

#[tokio::test]
async fn test_other_user_cannot_edit_or_destroy() {
    let mut app = logged_in("mary").await;
    app.post_form("/field_slips", &[("field_slip[code]", "ABC-1")])
        .await;
    let slip = FieldSlipRepository::new(app.pool()).list().await.unwrap().remove(0);
    let path = format!("/field_slips/{}", slip.id);

    app.clear_cookies();
    app.create_user("rolf", false).await;
    app.login("rolf").await;

    // Anyone logged in may look
    assert_eq!(app.get(&path).await.status, StatusCode::OK);

    let response = app.get(&format!("{path}/edit")).await;
    assert_eq!(response.location(), "/");
    assert!(app.follow(&response).await.body.contains("Permission denied."));

    let response = app
        .post_form(&path, &[("field_slip[code]", "XYZ-9")])
        .await;
    assert!(response.status.is_redirection());

    let response = app.delete_with(&path, &[JSON]).await;
    assert!(response.status.is_redirection());

    let kept = FieldSlipRepository::new(app.pool()).get(slip.id).await.unwrap().unwrap();
    assert_eq!(kept.code, "ABC-1");
}

#[tokio::test]
async fn test_admin_mode_can_edit_any_slip() {
    let mut app = logged_in("mary").await;
    app.post_form("/field_slips", &[("field_slip[code]", "ABC-1")])
        .await;
    let slip = FieldSlipRepository::new(app.pool()).list().await.unwrap().remove(0);

    app.clear_cookies();
    app.login_admin("rolf").await;
    let response = app.get(&format!("/field_slips/{}/edit", slip.id)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_destroy_in_each_format() {
    let mut app = logged_in("mary").await;
    for code in ["A-1", "A-2", "A-3"] {
        app.post_form("/field_slips", &[("field_slip[code]", code)])
            .await;
    }
    let ids = slip_ids(&app).await;

    let response = app
        .post_form(&format!("/field_slips/{}/destroy", ids[0]), &[])
        .await;
    assert_eq!(response.location(), "/field_slips");

    let response = app
        .delete_with(&format!("/field_slips/{}", ids[1]), &[JSON])
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app
        .delete_with(&format!("/field_slips/{}", ids[2]), &[TURBO])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(&format!(
        "<turbo-stream action=\"remove\" target=\"field_slip_{}\">",
        ids[2]
    )));

    assert!(slip_ids(&app).await.is_empty());
}

#[tokio::test]
async fn test_missing_slip() {
    let mut app = logged_in("mary").await;

    let response = app.get_with("/field_slips/999", &[JSON]).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.json()["error"].as_str().unwrap().contains("999"));

    let response = app.get("/field_slips/not-a-number").await;
    assert_eq!(response.location(), "/field_slips");
    let index = app.follow(&response).await;
    assert!(index.body.contains("Could not find field slip #not-a-number."));
}
