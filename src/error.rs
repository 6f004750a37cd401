use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

// Faults inside the rate limit bookkeeping. Never surfaced to HTTP callers.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("rate limit store unavailable: {0}")]
    Unavailable(String),

    #[error("rate limit store rejected key {0}")]
    InvalidKey(String),
}

// Startup configuration errors
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid policy override '{0}', expected name=window_ms:max_requests")]
    MalformedOverride(String),

    #[error("unknown rate limit policy '{0}'")]
    UnknownPolicy(String),

    #[error("policy '{endpoint}' has invalid {field}: must be greater than zero")]
    InvalidPolicy { endpoint: String, field: &'static str },

    #[error("policy '{endpoint}' window of {window_ms}ms exceeds the {max_ms}ms maximum")]
    WindowTooLong { endpoint: String, window_ms: u64, max_ms: u64 },
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("notification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notification provider returned status {0}")]
    Status(u16),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

// Errors returned by HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<FieldError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let error = self.to_string();
        let details = match self {
            ApiError::Validation(details) => details,
            _ => Vec::new(),
        };
        (status, Json(ErrorBody { error, details })).into_response()
    }
}
