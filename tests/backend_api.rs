//! Workout REST endpoints through the full router

#![cfg(feature = "ssr")]

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use fitlog::backend::server::{create_app, ServerConfig};

fn app() -> Router {
    create_app(ServerConfig::default().with_tokens("alice-token:alice,bob-token:bob")).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn bench_day(date: &str) -> Value {
    json!({
        "date": date,
        "type": "push",
        "exercises": [{"name": "bench", "sets": [{"reps": "10", "rest": "60", "weight": "50"}]}],
        "synced": true
    })
}

async fn create(app: &Router, token: &str, date: &str) -> Value {
    let (status, body) = send(
        app,
        request("POST", "/api/workouts", Some(token), Some(bench_day(date))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let (status, body) = send(&app(), request("GET", "/api/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_or_unknown_token_is_unauthorized() {
    let app = app();
    let (status, body) = send(&app, request("GET", "/api/workouts", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Unauthorized", "status": 401}));

    let (status, _) = send(&app, request("GET", "/api/workouts", Some("forged"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_cookie_is_accepted() {
    let app = app();
    let request = Request::builder()
        .uri("/api/workouts")
        .header(header::COOKIE, "token=bob-token")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_create_returns_document_with_id() {
    let app = app();
    let body = create(&app, "alice-token", "2024-01-01").await;

    assert!(body["_id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(body["userId"], "alice");
    assert_eq!(body["type"], "push");
    assert_eq!(body["synced"], true);
    assert_eq!(body["exercises"][0]["sets"][0]["weight"], "50");
}

#[tokio::test]
async fn test_create_validates_body() {
    let app = app();
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/workouts",
            Some("alice-token"),
            Some(json!({"date": "", "type": "push"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Workout date is required");

    let malformed = Request::builder()
        .method("POST")
        .uri("/api/workouts")
        .header(header::AUTHORIZATION, "Bearer alice-token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, malformed).await;
    assert!(status.is_client_error());
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_list_is_per_user_and_newest_first() {
    let app = app();
    create(&app, "alice-token", "2024-01-01").await;
    create(&app, "alice-token", "2024-02-01").await;
    create(&app, "bob-token", "2024-03-01").await;

    let (status, body) = send(&app, request("GET", "/api/workouts", Some("alice-token"), None)).await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|doc| doc["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2024-02-01", "2024-01-01"]);
}

#[tokio::test]
async fn test_get_update_delete() {
    let app = app();
    let created = create(&app, "alice-token", "2024-01-01").await;
    let uri = format!("/api/workouts/{}", created["_id"].as_str().unwrap());

    let (status, body) = send(&app, request("GET", &uri, Some("alice-token"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["_id"], created["_id"]);

    // Another user sees nothing
    let (status, body) = send(&app, request("GET", &uri, Some("bob-token"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Workout not found");

    let (status, body) = send(
        &app,
        request(
            "PUT",
            &uri,
            Some("alice-token"),
            Some(json!({"date": "2024-01-01", "type": "legs", "notes": "heavy"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "legs");
    assert_eq!(body["notes"], "heavy");

    let (status, _) = send(&app, request("DELETE", &uri, Some("alice-token"), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, request("DELETE", &uri, Some("alice-token"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_reduce_own_workouts() {
    let app = app();
    create(&app, "alice-token", "2024-01-01").await;
    create(&app, "alice-token", "2024-01-02").await;
    create(&app, "bob-token", "2024-01-03").await;

    let (status, body) = send(
        &app,
        request("GET", "/api/workouts/stats", Some("alice-token"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalWorkouts"], 2);
    assert_eq!(body["totalSets"], 2);
    assert_eq!(body["totalReps"], 20);
    assert_eq!(body["totalVolume"], 1000.0);
    assert_eq!(body["workoutsByType"]["push"], 2);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (status, body) = send(&app(), request("GET", "/nope", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}
