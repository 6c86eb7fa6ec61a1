/**
 * Workout API Client
 *
 * HTTP client for the workout create endpoint. Every create call sends the
 * payload flagged `synced: true` and bypasses intermediate caches so that a
 * replayed submission always reaches the server.
 */
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use crate::client::config::Config;
use crate::shared::WorkoutSubmission;

/// API call errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never reached the server
    #[error("network error: {0}")]
    Network(String),
    /// No response within the configured timeout
    #[error("request timed out")]
    Timeout,
    /// The server answered with a non-2xx status
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    /// The client could not be built or the request could not be formed
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// 4xx: the server understood the request and refused it
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if (400..500).contains(status))
    }

    /// The failure says nothing about the payload, only about reachability
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_builder() {
            ApiError::InvalidRequest(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

/// A 2xx answer of the create endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct CreateResponse {
    pub status: u16,
    /// Parsed body, `Value::Null` when the body was empty or not JSON
    pub body: Value,
}

impl CreateResponse {
    /// Server-assigned id (`_id`), if the body carries one
    pub fn server_id(&self) -> Option<String> {
        match self.body.get("_id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            Value::Object(map) => map.get("$oid").and_then(Value::as_str).map(String::from),
            _ => None,
        }
    }
}

/// Remote workout API
#[async_trait]
pub trait WorkoutApi: Send + Sync {
    /// Create a workout. Any 2xx status is `Ok`.
    async fn create_workout(&self, submission: &WorkoutSubmission)
        -> Result<CreateResponse, ApiError>;
}

/// `WorkoutApi` over HTTP
#[derive(Debug, Clone)]
pub struct HttpWorkoutApi {
    config: Config,
    client: Client,
}

impl HttpWorkoutApi {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[async_trait]
impl WorkoutApi for HttpWorkoutApi {
    async fn create_workout(
        &self,
        submission: &WorkoutSubmission,
    ) -> Result<CreateResponse, ApiError> {
        let url = self.config.workouts_url();

        let mut request = self.client.post(&url).json(submission);
        if let Some(token) = self.config.get_token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("POST {} failed with {}", url, status);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Ok(CreateResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejection_classification() {
        let rejected = ApiError::Status { status: 422, body: String::new() };
        let server = ApiError::Status { status: 503, body: String::new() };
        assert!(rejected.is_rejection());
        assert!(!server.is_rejection());
        assert!(!ApiError::Timeout.is_rejection());
        assert!(ApiError::Timeout.is_network());
        assert!(ApiError::Network("refused".into()).is_network());
        assert!(!server.is_network());
    }

    #[test]
    fn test_server_id_shapes() {
        let response = |body| CreateResponse { status: 201, body };
        assert_eq!(response(json!({"_id": "abc"})).server_id().as_deref(), Some("abc"));
        assert_eq!(response(json!({"_id": 7})).server_id().as_deref(), Some("7"));
        assert_eq!(
            response(json!({"_id": {"$oid": "65f0"}})).server_id().as_deref(),
            Some("65f0")
        );
        assert!(response(Value::Null).server_id().is_none());
    }
}
