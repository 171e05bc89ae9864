//! HTTP-level tests for the member endpoints.

mod common;

use axum::http::StatusCode;
use clubhouse_core::member_status::MemberStatus;
use common::{build_test_app, expect_json, TestApp};
use serde_json::json;

const ACTIVE: i64 = MemberStatus::Active as i64;
const SUSPENDED: i64 = MemberStatus::Suspended as i64;
const LEFT: i64 = MemberStatus::Left as i64;

async fn create_member(app: &TestApp, club: i64, status: &str) -> i64 {
    let token = app.club_admin_token(club);
    let body = json!({
        "first_name": "Grace",
        "last_name": "Hopper",
        "email": "grace@example.com",
        "status": status,
    });
    let json = expect_json(
        app.post(&format!("/api/v1/clubs/{club}/members"), &token, body).await,
        StatusCode::CREATED,
    )
    .await;
    json["data"]["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn requests_without_token_are_rejected() {
    let app = build_test_app();
    let club = app.store.seed_club("Rowing Club", "rowing-club").await;

    let json = expect_json(
        app.get(&format!("/api/v1/clubs/{club}/members"), None).await,
        StatusCode::UNAUTHORIZED,
    )
    .await;

    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let app = build_test_app();
    let club = app.store.seed_club("Rowing Club", "rowing-club").await;

    let response = app
        .get(&format!("/api/v1/clubs/{club}/members"), Some("not-a-jwt"))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn staff_can_read_but_not_change_status() {
    let app = build_test_app();
    let club = app.store.seed_club("Rowing Club", "rowing-club").await;
    let member = create_member(&app, club, "ACTIVE").await;
    let staff = app.staff_token(club);

    let json = expect_json(
        app.get(&format!("/api/v1/clubs/{club}/members"), Some(&staff)).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let body = json!({ "to_status": "DORMANT", "reason": "no show" });
    let json = expect_json(
        app.post(&format!("/api/v1/clubs/{club}/members/{member}/status"), &staff, body)
            .await,
        StatusCode::FORBIDDEN,
    )
    .await;
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn club_admin_is_confined_to_own_club() {
    let app = build_test_app();
    let mine = app.store.seed_club("Rowing Club", "rowing-club").await;
    let theirs = app.store.seed_club("Chess Club", "chess-club").await;
    let token = app.club_admin_token(mine);

    let body = json!({ "first_name": "A", "last_name": "B" });
    let response = app
        .post(&format!("/api/v1/clubs/{theirs}/members"), &token, body)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .get(&format!("/api/v1/clubs/{theirs}/members"), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn platform_admin_reaches_any_club() {
    let app = build_test_app();
    let club = app.store.seed_club("Rowing Club", "rowing-club").await;
    let token = app.admin_token();

    let body = json!({ "first_name": "Ada", "last_name": "Lovelace" });
    let json = expect_json(
        app.post(&format!("/api/v1/clubs/{club}/members"), &token, body).await,
        StatusCode::CREATED,
    )
    .await;

    assert_eq!(json["data"]["status_id"], MemberStatus::Pending as i64);
}

// ---------------------------------------------------------------------------
// Status changes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_transition_is_422_with_allowed_list() {
    let app = build_test_app();
    let club = app.store.seed_club("Rowing Club", "rowing-club").await;
    let member = create_member(&app, club, "ACTIVE").await;
    let token = app.club_admin_token(club);

    let body = json!({ "to_status": "PENDING", "reason": "mistake" });
    let json = expect_json(
        app.post(&format!("/api/v1/clubs/{club}/members/{member}/status"), &token, body)
            .await,
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;

    assert_eq!(json["code"], "INVALID_TRANSITION");
    assert_eq!(json["allowed"], json!(["DORMANT", "SUSPENDED", "LEFT"]));
}

#[tokio::test]
async fn status_change_and_history() {
    let app = build_test_app();
    let club = app.store.seed_club("Rowing Club", "rowing-club").await;
    let member = create_member(&app, club, "ACTIVE").await;
    let token = app.club_admin_token(club);
    let base = format!("/api/v1/clubs/{club}/members/{member}");

    let body = json!({ "to_status": "SUSPENDED", "reason": "unpaid fees" });
    let json = expect_json(
        app.post(&format!("{base}/status"), &token, body).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["data"]["status_id"], SUSPENDED);

    let body = json!({
        "to_status": "LEFT",
        "reason": "board decision",
        "left_category": "EXCLUSION",
    });
    let json = expect_json(
        app.post(&format!("{base}/status"), &token, body).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["data"]["status_id"], LEFT);

    let json = expect_json(
        app.get(&format!("{base}/status-history"), Some(&token)).await,
        StatusCode::OK,
    )
    .await;
    let history = json["data"].as_array().unwrap();
    assert!(history.len() >= 2);
    assert!(history
        .iter()
        .any(|t| t["to_status_id"] == LEFT && t["left_category"] == "EXCLUSION"));

    let json = expect_json(
        app.get(&format!("{base}/periods"), Some(&token)).await,
        StatusCode::OK,
    )
    .await;
    let periods = json["data"].as_array().unwrap();
    assert_eq!(periods.len(), 1);
    assert!(!periods[0]["leave_date"].is_null());
}

#[tokio::test]
async fn left_without_category_is_400() {
    let app = build_test_app();
    let club = app.store.seed_club("Rowing Club", "rowing-club").await;
    let member = create_member(&app, club, "ACTIVE").await;
    let token = app.club_admin_token(club);

    let body = json!({ "to_status": "LEFT", "reason": "moved away" });
    let json = expect_json(
        app.post(&format!("/api/v1/clubs/{club}/members/{member}/status"), &token, body)
            .await,
        StatusCode::BAD_REQUEST,
    )
    .await;

    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn bulk_status_reports_partial_success() {
    let app = build_test_app();
    let club = app.store.seed_club("Rowing Club", "rowing-club").await;
    let active = create_member(&app, club, "ACTIVE").await;
    let pending = create_member(&app, club, "PENDING").await;
    let token = app.club_admin_token(club);

    let body = json!({
        "member_ids": [active, pending, 9999],
        "to_status": "DORMANT",
        "reason": "season ended",
    });
    let json = expect_json(
        app.post(&format!("/api/v1/clubs/{club}/members/bulk-status"), &token, body)
            .await,
        StatusCode::OK,
    )
    .await;

    assert_eq!(json["data"]["updated"], json!([active]));
    let skipped = json["data"]["skipped"].as_array().unwrap();
    assert_eq!(skipped.len(), 2);
    assert!(skipped.iter().any(|s| s["id"] == pending));
    assert!(skipped.iter().any(|s| s["id"] == 9999));
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancellation_set_conflict_and_revoke() {
    let app = build_test_app();
    let club = app.store.seed_club("Rowing Club", "rowing-club").await;
    let member = create_member(&app, club, "ACTIVE").await;
    let token = app.club_admin_token(club);
    let uri = format!("/api/v1/clubs/{club}/members/{member}/cancellation");

    let body = json!({ "cancellation_date": "2026-12-31", "reason": "moving abroad" });
    let json = expect_json(app.put(&uri, &token, body.clone()).await, StatusCode::OK).await;
    assert_eq!(json["data"]["cancellation_date"], "2026-12-31");
    assert_eq!(json["data"]["cancellation_received_at"], "2026-03-01");
    assert_eq!(json["data"]["status_id"], ACTIVE);

    let json = expect_json(app.put(&uri, &token, body).await, StatusCode::CONFLICT).await;
    assert_eq!(json["code"], "CONFLICT");

    let json = expect_json(
        app.delete(&uri, &token, Some(json!({ "reason": "changed mind" }))).await,
        StatusCode::OK,
    )
    .await;
    assert!(json["data"]["cancellation_date"].is_null());
}

#[tokio::test]
async fn cancellation_in_the_past_is_400() {
    let app = build_test_app();
    let club = app.store.seed_club("Rowing Club", "rowing-club").await;
    let member = create_member(&app, club, "ACTIVE").await;
    let token = app.club_admin_token(club);

    let body = json!({ "cancellation_date": "2026-01-31", "reason": "late notice" });
    let response = app
        .put(
            &format!("/api/v1/clubs/{club}/members/{member}/cancellation"),
            &token,
            body,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Field edits and deletion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stale_version_is_409() {
    let app = build_test_app();
    let club = app.store.seed_club("Rowing Club", "rowing-club").await;
    let member = create_member(&app, club, "ACTIVE").await;
    let token = app.club_admin_token(club);
    let uri = format!("/api/v1/clubs/{club}/members/{member}");

    let json = expect_json(app.get(&uri, Some(&token)).await, StatusCode::OK).await;
    let version = json["data"]["version"].as_i64().unwrap();

    let json = expect_json(
        app.put(&uri, &token, json!({ "version": version, "phone": "+49 30 1234" }))
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["data"]["phone"], "+49 30 1234");
    assert_eq!(json["data"]["version"], version + 1);

    let json = expect_json(
        app.put(&uri, &token, json!({ "version": version, "phone": "+49 30 9999" }))
            .await,
        StatusCode::CONFLICT,
    )
    .await;
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn only_left_members_can_be_deleted() {
    let app = build_test_app();
    let club = app.store.seed_club("Rowing Club", "rowing-club").await;
    let member = create_member(&app, club, "ACTIVE").await;
    let token = app.club_admin_token(club);
    let uri = format!("/api/v1/clubs/{club}/members/{member}");

    let response = app.delete(&uri, &token, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json!({ "to_status": "LEFT", "reason": "moved", "left_category": "VOLUNTARY" });
    app.post(&format!("{uri}/status"), &token, body).await;

    let response = app.delete(&uri, &token, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.get(&uri, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_member_is_404() {
    let app = build_test_app();
    let club = app.store.seed_club("Rowing Club", "rowing-club").await;
    let token = app.club_admin_token(club);

    let json = expect_json(
        app.get(&format!("/api/v1/clubs/{club}/members/4242"), Some(&token))
            .await,
        StatusCode::NOT_FOUND,
    )
    .await;

    assert_eq!(json["code"], "NOT_FOUND");
}
