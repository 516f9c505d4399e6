//! End-to-end API integration tests
//!
//! These tests drive the real router over the in-memory Team Store:
//! - JWT authentication on protected endpoints
//! - Team creation and management
//! - Invite / accept / leave flows
//! - Error status and code mapping

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use prompt_teams_api::api::{router, AppState};
use prompt_teams_api::auth::jwt::create_token;
use prompt_teams_api::domain::team::MembershipService;
use prompt_teams_api::infrastructure::repositories::InMemoryTeamStore;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for oneshot
use uuid::Uuid;

const SECRET: &str = "api-test-secret";

/// Setup test application over a fresh store
fn setup_app() -> Router {
    let store = Arc::new(InMemoryTeamStore::new());
    router(AppState::new(MembershipService::new(store), SECRET))
}

fn token_for(user_id: Uuid, email: Option<&str>) -> String {
    create_token(user_id, email, SECRET).expect("token")
}

/// Send a request and return status plus parsed JSON body (Null if empty)
async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

async fn create_team(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/teams",
        Some(token),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create team: {}", body);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = setup_app();

    let (status, body) = send(&app, Method::GET, "/api/teams", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let app = setup_app();
    let token = create_token(Uuid::new_v4(), None, "other-secret").unwrap();

    let (status, _) = send(&app, Method::GET, "/api/teams", Some(&token), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_get_team() {
    let app = setup_app();
    let alice = Uuid::new_v4();
    let token = token_for(alice, None);

    let team_id = create_team(&app, &token, "Prompt Lab").await;
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/teams/{}", team_id),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["team"]["name"], "Prompt Lab");
    assert_eq!(body["team"]["owner_id"], alice.to_string());
    assert_eq!(body["members"][0]["role"], "owner");
    assert_eq!(body["members"][0]["status"], "active");
}

#[tokio::test]
async fn test_blank_name_is_bad_request() {
    let app = setup_app();
    let token = token_for(Uuid::new_v4(), None);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/teams",
        Some(&token),
        Some(json!({ "name": "  " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_team_name");
}

#[tokio::test]
async fn test_third_team_hits_limit() {
    let app = setup_app();
    let token = token_for(Uuid::new_v4(), None);
    create_team(&app, &token, "One").await;
    create_team(&app, &token, "Two").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/teams",
        Some(&token),
        Some(json!({ "name": "Three" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "team_limit_reached");
}

#[tokio::test]
async fn test_personal_team_is_created_once() {
    let app = setup_app();
    let token = token_for(Uuid::new_v4(), None);

    let (first_status, first) =
        send(&app, Method::POST, "/api/teams/personal", Some(&token), None).await;
    let (_, second) = send(&app, Method::POST, "/api/teams/personal", Some(&token), None).await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(first["is_personal"], true);
    assert_eq!(first["id"], second["id"]);
}

#[tokio::test]
async fn test_invite_accept_and_leave_flow() {
    let app = setup_app();
    let alice = token_for(Uuid::new_v4(), None);
    let bob_id = Uuid::new_v4();
    let bob = token_for(bob_id, Some("bob@example.com"));
    let team_id = create_team(&app, &alice, "Prompt Lab").await;

    let (status, invite) = send(
        &app,
        Method::POST,
        &format!("/api/teams/{}/members", team_id),
        Some(&alice),
        Some(json!({ "email": "bob@example.com", "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(invite["status"], "pending");
    assert_eq!(invite["role"], "admin");

    let (status, accepted) = send(
        &app,
        Method::PATCH,
        &format!("/api/teams/{}/members/me", team_id),
        Some(&bob),
        Some(json!({ "status": "active" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "active");
    assert_eq!(accepted["user_id"], bob_id.to_string());

    let (status, teams) = send(&app, Method::GET, "/api/teams", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(teams.as_array().unwrap().len(), 1);

    let (status, left) = send(
        &app,
        Method::DELETE,
        &format!("/api/teams/{}/members/me", team_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(left["status"], "left");
}

#[tokio::test]
async fn test_pending_invites_are_listed() {
    let app = setup_app();
    let alice = token_for(Uuid::new_v4(), None);
    let bob_id = Uuid::new_v4();
    let team_id = create_team(&app, &alice, "Prompt Lab").await;
    send(
        &app,
        Method::POST,
        &format!("/api/teams/{}/members", team_id),
        Some(&alice),
        Some(json!({ "email": "bob@example.com", "user_id": bob_id })),
    )
    .await;

    let (status, invites) = send(
        &app,
        Method::GET,
        "/api/teams/invites",
        Some(&token_for(bob_id, None)),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(invites[0]["team"]["id"], team_id);
    assert_eq!(invites[0]["membership"]["status"], "pending");
}

#[tokio::test]
async fn test_stranger_cannot_read_team() {
    let app = setup_app();
    let team_id = create_team(&app, &token_for(Uuid::new_v4(), None), "Private").await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/teams/{}", team_id),
        Some(&token_for(Uuid::new_v4(), None)),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "not_a_member");
}

#[tokio::test]
async fn test_unknown_role_is_rejected() {
    let app = setup_app();
    let alice = token_for(Uuid::new_v4(), None);
    let team_id = create_team(&app, &alice, "Prompt Lab").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/teams/{}/members", team_id),
        Some(&alice),
        Some(json!({ "email": "bob@example.com", "role": "superuser" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_role");
}

#[tokio::test]
async fn test_transfer_and_delete() {
    let app = setup_app();
    let alice = token_for(Uuid::new_v4(), None);
    let bob_id = Uuid::new_v4();
    let bob = token_for(bob_id, Some("bob@example.com"));
    let team_id = create_team(&app, &alice, "Prompt Lab").await;
    send(
        &app,
        Method::POST,
        &format!("/api/teams/{}/members", team_id),
        Some(&alice),
        Some(json!({ "email": "bob@example.com" })),
    )
    .await;
    send(
        &app,
        Method::PATCH,
        &format!("/api/teams/{}/members/{}", team_id, bob_id),
        Some(&bob),
        Some(json!({ "status": "active" })),
    )
    .await;

    let (status, team) = send(
        &app,
        Method::POST,
        &format!("/api/teams/{}/transfer", team_id),
        Some(&alice),
        Some(json!({ "new_owner_id": bob_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(team["owner_id"], bob_id.to_string());

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/teams/{}", team_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/teams/{}", team_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/teams/{}", team_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "not_a_member");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = setup_app();
    let token = token_for(Uuid::new_v4(), None);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/teams",
        Some(&token),
        Some(json!({ "title": "missing name" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}
