//! Router tests: full middleware stack, oneshot requests
//!
//! Run with: cargo test -p integration-tests --test api_tests

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use integration_tests::*;
use serde_json::json;
use tower::ServiceExt;
use verify_core::Permissions;

fn verifications_uri(suffix: &str) -> String {
    format!("/api/v1/servers/{SERVER}/verifications{suffix}")
}

#[tokio::test]
async fn test_health_check() {
    let h = TestHarness::new();
    let request = Request::get("/health").body(Body::empty()).unwrap();

    let (status, body) = send(h.app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let h = TestHarness::new();
    let request = Request::get("/health").body(Body::empty()).unwrap();

    let response = h.app().oneshot(request).await.unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

// ============================================================================
// Dispatcher authentication
// ============================================================================

#[tokio::test]
async fn test_missing_authorization() {
    let h = TestHarness::new();
    let request = Request::post(verifications_uri(""))
        .header("x-actor-id", MEMBER.to_string())
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(h.app(), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "MISSING_AUTHORIZATION");
}

#[tokio::test]
async fn test_wrong_trigger_token() {
    let h = TestHarness::new();
    let request = Request::post(verifications_uri(""))
        .header(header::AUTHORIZATION, "Bearer not-the-token")
        .header("x-actor-id", MEMBER.to_string())
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(h.app(), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    assert!(h.pending.is_empty());
}

#[tokio::test]
async fn test_missing_actor() {
    let h = TestHarness::new();
    let request = Request::post(verifications_uri(""))
        .header(header::AUTHORIZATION, format!("Bearer {TRIGGER_TOKEN}"))
        .header("x-actor-id", "someone")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(h.app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MISSING_ACTOR");
}

#[tokio::test]
async fn test_invalid_server_id() {
    let h = TestHarness::new();
    let request = trigger_request(Method::POST, "/api/v1/servers/abc/verifications", MEMBER, None);

    let (status, body) = send(h.app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_PATH_PARAMETER");
}

// ============================================================================
// Member flow
// ============================================================================

#[tokio::test]
async fn test_start_then_check_over_http() {
    let h = TestHarness::new();
    h.add_member(MEMBER, "member");
    h.seed_policy(|_| {}).await;
    h.add_account("42", "Builder", "");

    let request = trigger_request(
        Method::POST,
        &verifications_uri(""),
        MEMBER,
        Some(json!({ "username": "Builder" })),
    );
    let (status, body) = send(h.app(), request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["preview"]["id"], "42");
    let issued = body["pending"]["code"].as_str().unwrap().to_string();
    assert!(issued.starts_with("VERIFY-"));

    h.directory.set_description("42", &format!("my code: {}", issued.to_lowercase()));

    let request = trigger_request(Method::POST, &verifications_uri("/check"), MEMBER, None);
    let (status, body) = send(h.app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "verified");
    assert_eq!(body["link"]["external_id"], "42");
    assert_eq!(body["link"]["subject_id"], MEMBER.to_string());
    assert_eq!(body["completion"]["roles_added"], json!([VERIFIED_ROLE.to_string()]));

    let request = trigger_request(Method::GET, &verifications_uri("/@me"), MEMBER, None);
    let (status, body) = send(h.app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verified"], true);
    assert!(body.get("pending").is_none());
}

#[tokio::test]
async fn test_check_not_yet_verified() {
    let h = TestHarness::new();
    h.add_member(MEMBER, "member");
    h.add_account("42", "Builder", "nothing here");
    h.seed_pending(MEMBER, "VERIFY-AB12C3", Some("Builder")).await;

    let request = trigger_request(Method::POST, &verifications_uri("/check"), MEMBER, None);
    let (status, body) = send(h.app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_yet_verified");
    assert_eq!(body["code"], "VERIFY-AB12C3");
}

#[tokio::test]
async fn test_check_without_pending_is_not_found() {
    let h = TestHarness::new();

    let request = trigger_request(Method::POST, &verifications_uri("/check"), MEMBER, None);
    let (status, body) = send(h.app(), request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NO_PENDING_VERIFICATION");
}

#[tokio::test]
async fn test_check_expired_is_gone() {
    let h = TestHarness::new();
    h.seed_expired_pending(MEMBER, "VERIFY-AB12C3").await;

    let request = trigger_request(Method::POST, &verifications_uri("/check"), MEMBER, None);
    let (status, body) = send(h.app(), request).await;

    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"]["code"], "VERIFICATION_EXPIRED");
}

#[tokio::test]
async fn test_invalid_username_reports_details() {
    let h = TestHarness::new();

    let request = trigger_request(
        Method::POST,
        &verifications_uri(""),
        MEMBER,
        Some(json!({ "username": "ab" })),
    );
    let (status, body) = send(h.app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(!body["error"]["details"].is_null());
    assert!(h.pending.is_empty());
}

#[tokio::test]
async fn test_cancel_returns_no_content() {
    let h = TestHarness::new();
    h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;

    let request = trigger_request(Method::DELETE, &verifications_uri("/@me"), MEMBER, None);
    let (status, body) = send(h.app(), request).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
    assert!(h.pending.is_empty());
}

#[tokio::test]
async fn test_persistence_failure_is_reported_generically() {
    let h = TestHarness::new();
    h.add_member(MEMBER, "member");
    h.add_account("42", "Builder", "VERIFY-AB12C3");
    h.seed_pending(MEMBER, "VERIFY-AB12C3", Some("Builder")).await;
    h.links.fail_writes();

    let request = trigger_request(Method::POST, &verifications_uri("/check"), MEMBER, None);
    let (status, body) = send(h.app(), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], "Internal server error");
    assert!(!body.to_string().contains("10.0.0.5"));
    assert_eq!(h.pending.len(), 1);
}

// ============================================================================
// Admin flow
// ============================================================================

#[tokio::test]
async fn test_admin_route_requires_permission() {
    let h = TestHarness::new();
    h.add_member(OTHER_MEMBER, "member");

    let uri = format!("/api/v1/servers/{SERVER}/config");
    let (status, body) = send(h.app(), trigger_request(Method::GET, &uri, OTHER_MEMBER, None)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "MISSING_PERMISSIONS");
}

#[tokio::test]
async fn test_configure_and_read_back() {
    let h = TestHarness::new();
    h.add_admin(ADMIN, "owner", Permissions::MANAGE_GUILD);
    let uri = format!("/api/v1/servers/{SERVER}/config");

    let patch = json!({ "log_channel_id": LOG_CHANNEL.to_string(), "allow_reverification": false });
    let (status, body) = send(h.app(), trigger_request(Method::PATCH, &uri, ADMIN, Some(patch))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["log_channel_id"], LOG_CHANNEL.to_string());

    let (status, body) = send(h.app(), trigger_request(Method::GET, &uri, ADMIN, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stored"], true);
    assert_eq!(body["allow_reverification"], false);
}

#[tokio::test]
async fn test_add_role_and_reset_link() {
    let h = TestHarness::new();
    h.add_admin(ADMIN, "owner", Permissions::ADMINISTRATOR);
    h.seed_link(MEMBER, "42", "Builder");

    let uri = format!("/api/v1/servers/{SERVER}/config/roles/{VERIFIED_ROLE}");
    let (status, body) = send(h.app(), trigger_request(Method::PUT, &uri, ADMIN, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], true);

    let uri = format!("/api/v1/servers/{SERVER}/links/{MEMBER}");
    let (status, body) = send(h.app(), trigger_request(Method::DELETE, &uri, ADMIN, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed_link"]["external_username"], "Builder");
    assert!(h.links.is_empty());
}

#[tokio::test]
async fn test_logs_limit_is_bounded() {
    let h = TestHarness::new();
    h.add_admin(ADMIN, "owner", Permissions::MANAGE_GUILD);

    let uri = format!("/api/v1/servers/{SERVER}/logs?limit=51");
    let (status, body) = send(h.app(), trigger_request(Method::GET, &uri, ADMIN, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let uri = format!("/api/v1/servers/{SERVER}/logs?limit=5");
    let (status, body) = send(h.app(), trigger_request(Method::GET, &uri, ADMIN, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
