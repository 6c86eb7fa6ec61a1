//! `HttpWorkoutApi` against a wiremock server

mod common;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::workout;
use fitlog::client::{ApiError, Config, HttpWorkoutApi, WorkoutApi};
use fitlog::shared::{AppConfig, WorkoutSubmission};

fn api_for(server_url: &str, token: Option<&str>) -> HttpWorkoutApi {
    let mut config = Config::from_app(AppConfig {
        server_url: server_url.to_string(),
        request_timeout_secs: 1,
        ..AppConfig::default()
    });
    config.set_token(token.map(String::from));
    HttpWorkoutApi::new(config).unwrap()
}

#[tokio::test]
async fn test_create_posts_json_with_auth_and_no_cache_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/workouts"))
        .and(body_partial_json(json!({"type": "push", "notes": "a", "synced": true})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"_id": "65f0a1"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server.uri(), Some("secret"));
    let response = api
        .create_workout(&WorkoutSubmission::synced(workout("a")))
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.server_id().as_deref(), Some("65f0a1"));

    let requests = server.received_requests().await.unwrap();
    let headers = &requests[0].headers;
    assert_eq!(headers.get("authorization").unwrap(), "Bearer secret");
    assert_eq!(headers.get("cache-control").unwrap(), "no-cache, no-store");
    assert_eq!(headers.get("pragma").unwrap(), "no-cache");
    assert!(headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("application/json"));
}

#[tokio::test]
async fn test_no_token_sends_no_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let api = api_for(&server.uri(), None);
    let response = api
        .create_workout(&WorkoutSubmission::synced(workout("a")))
        .await
        .unwrap();

    // Empty body still counts as success
    assert_eq!(response.status, 200);
    assert!(response.server_id().is_none());
    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_client_error_is_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("date is required"))
        .mount(&server)
        .await;

    let error = api_for(&server.uri(), None)
        .create_workout(&WorkoutSubmission::synced(workout("a")))
        .await
        .unwrap_err();

    assert_matches!(error, ApiError::Status { status: 400, ref body } if body == "date is required");
    assert!(error.is_rejection());
    assert!(!error.is_network());
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let error = api_for(&server.uri(), None)
        .create_workout(&WorkoutSubmission::synced(workout("a")))
        .await
        .unwrap_err();

    assert_matches!(error, ApiError::Status { status: 503, .. });
    assert!(!error.is_rejection());
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_delay(std::time::Duration::from_secs(3)))
        .mount(&server)
        .await;

    let error = api_for(&server.uri(), None)
        .create_workout(&WorkoutSubmission::synced(workout("a")))
        .await
        .unwrap_err();

    assert_matches!(error, ApiError::Timeout);
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    let error = api_for("http://127.0.0.1:9", None)
        .create_workout(&WorkoutSubmission::synced(workout("a")))
        .await
        .unwrap_err();

    assert!(error.is_network());
}
