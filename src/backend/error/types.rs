/**
 * Backend Error Types
 *
 * Errors raised while serving the workout endpoints.
 *
 * # Status Code Mapping
 *
 * - `Unauthorized` - 401, missing or unknown token
 * - `NotFound` - 404, no such workout for this user
 * - `SharedError` - 400 for validation, 500 for serialization
 * - `HandlerError` - the status it carries
 * - `StoreError` - 500
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::SharedError;

/// Backend-specific error types
#[derive(Debug, Error)]
pub enum BackendError {
    /// No valid token on the request
    #[error("Unauthorized")]
    Unauthorized,

    /// The requested resource does not exist for this user
    #[error("{resource} not found")]
    NotFound {
        /// Kind of resource, e.g. "Workout"
        resource: &'static str,
    },

    /// Handler error with an explicit status
    #[error("Handler error: {message}")]
    HandlerError {
        status: StatusCode,
        message: String,
    },

    /// Workout store failure
    #[error("Store error: {message}")]
    StoreError { message: String },

    /// Validation or serialization error from the shared types
    #[error(transparent)]
    SharedError(#[from] SharedError),
}

impl BackendError {
    /// Create a handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreError {
            message: message.into(),
        }
    }

    /// Workout not found
    pub fn workout_not_found() -> Self {
        Self::NotFound {
            resource: "Workout",
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::HandlerError { status, .. } => *status,
            Self::StoreError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SharedError(err) => match err {
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message sent to the client
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::StoreError { .. } => "Internal server error".to_string(),
            Self::SharedError(SharedError::ValidationError { message, .. }) => message.clone(),
            other => other.to_string(),
        }
    }
}
