//! Donations and the donor list.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;

use mycoflora_web::db::DonationRepository;

use mycoflora_integration_tests::TestApp;

#[tokio::test]
async fn test_donate_form() {
    let mut app = TestApp::new().await;

    let response = app.get("/support/donate").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("name=\"donation[amount]\""));
    assert!(response.body.contains("value=\"other\""));
}

#[tokio::test]
async fn test_preset_amount_records_unreviewed_donation() {
    let mut app = TestApp::new().await;

    let response = app
        .post_form(
            "/support/confirm",
            &[
                ("donation[amount]", "25"),
                ("donation[who]", "Rolf Singer"),
                ("donation[email]", "rolf@example.org"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let donations = DonationRepository::new(app.pool()).list().await.unwrap();
    assert_eq!(donations.len(), 1);
    assert_eq!(donations[0].amount.to_string(), "25");
    assert_eq!(donations[0].who, "Rolf Singer");
    assert!(!donations[0].reviewed);
    assert!(donations[0].user_id.is_none());
}

#[tokio::test]
async fn test_other_amount() {
    let mut app = TestApp::new().await;

    app.post_form(
        "/support/confirm",
        &[("donation[amount]", "other"), ("donation[other_amount]", "30")],
    )
    .await;

    let donations = DonationRepository::new(app.pool()).list().await.unwrap();
    assert_eq!(donations[0].amount.to_string(), "30");
}

#[tokio::test]
async fn test_non_positive_amount_records_nothing() {
    let mut app = TestApp::new().await;

    let response = app
        .post_form(
            "/support/confirm",
            &[("donation[amount]", "0"), ("donation[other_amount]", "0")],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Please enter a positive number"));
    assert!(DonationRepository::new(app.pool()).list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_confirm_from_query_string() {
    let mut app = TestApp::new().await;
    let mary = app.create_user("mary", false).await;
    app.login("mary").await;

    let response = app
        .get("/support/confirm?donation%5Bamount%5D=50&donation%5Brecurring%5D=1")
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let donations = DonationRepository::new(app.pool()).list().await.unwrap();
    assert_eq!(donations[0].user_id, Some(mary));
    assert!(donations[0].recurring);
}

#[tokio::test]
async fn test_donor_list_shows_reviewed_public_donors() {
    let mut app = TestApp::new().await;

    for (who, anonymous) in [("Rolf Singer", "0"), ("Secret Donor", "1"), ("Mary Newbie", "0")] {
        app.post_form(
            "/support/confirm",
            &[
                ("donation[amount]", "25"),
                ("donation[who]", who),
                ("donation[anonymous]", anonymous),
            ],
        )
        .await;
    }

    let repo = DonationRepository::new(app.pool());
    for donation in repo.list().await.unwrap() {
        if donation.who != "Mary Newbie" {
            repo.mark_reviewed(donation.id).await.unwrap();
        }
    }

    let response = app.get("/support/donors").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Rolf Singer"));
    assert!(!response.body.contains("Secret Donor"));
    assert!(!response.body.contains("Mary Newbie"));
}
