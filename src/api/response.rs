//! Response types for the holiday ledger API.
//!
//! This module defines the error response structures and the mapping from
//! engine errors to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Pairs an error body with a status.
    pub fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        match error {
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::InvalidConfig { .. } => ApiErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
            ),
            EngineError::NotFound { entity, key } => ApiErrorResponse::new(
                StatusCode::NOT_FOUND,
                ApiError::with_details(
                    "NOT_FOUND",
                    message,
                    format!("No {} exists with key '{}'", entity, key),
                ),
            ),
            EngineError::InvalidShift { .. } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::with_details(
                    "INVALID_SHIFT",
                    message,
                    "The shift data contains invalid information",
                ),
            ),
            EngineError::InvalidStaff { .. } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::with_details(
                    "INVALID_STAFF",
                    message,
                    "The staff data contains invalid information",
                ),
            ),
            EngineError::ConcurrencyConflict { .. } => ApiErrorResponse::new(
                StatusCode::CONFLICT,
                ApiError::new("CONCURRENCY_CONFLICT", message),
            ),
            EngineError::RetriesExhausted { .. } => ApiErrorResponse::new(
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::with_details(
                    "RETRIES_EXHAUSTED",
                    message,
                    "The store was busy; retry the request",
                ),
            ),
            EngineError::NamespaceMismatch { .. } => ApiErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("NAMESPACE_MISMATCH", message),
            ),
            EngineError::InvalidNamespaceMigration { .. } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_NAMESPACE_MIGRATION", message),
            ),
            EngineError::Storage { .. } => ApiErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("STORAGE_ERROR", "Storage failure", message),
            ),
        }
    }
}
