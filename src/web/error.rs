//! API error handling.
//!
//! Every JSON endpoint reports failures as
//! `{ "success": false, "description": "..." }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::TempdropError;

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bad request (400).
    BadRequest,
    /// Not found (404).
    NotFound,
    /// Internal server error (500).
    InternalError,
    /// Status relayed from an upstream service.
    Upstream(StatusCode),
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Upstream(status) => *status,
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Human-readable message.
    pub description: String,
}

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    description: String,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    /// Create a bad request error.
    pub fn bad_request(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, description)
    }

    /// Create a not found error.
    pub fn not_found(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, description)
    }

    /// Create an internal server error.
    pub fn internal(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, description)
    }

    /// Relay an upstream failure with its status code.
    ///
    /// Statuses that are not errors are reported as 502.
    pub fn upstream(status: u16, description: impl Into<String>) -> Self {
        let status = StatusCode::from_u16(status)
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        Self::new(ErrorCode::Upstream(status), description)
    }

    /// Error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorBody {
            success: false,
            description: self.description,
        };
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.description)
    }
}

impl std::error::Error for ApiError {}

impl From<TempdropError> for ApiError {
    fn from(err: TempdropError) -> Self {
        match &err {
            TempdropError::Validation(msg) => ApiError::bad_request(msg.clone()),
            TempdropError::TooLarge { .. } => ApiError::bad_request(err.to_string()),
            TempdropError::NotFound(_) => ApiError::not_found("File not found or has expired"),
            TempdropError::Upstream(_) => {
                tracing::error!("Upload proxy error: {}", err);
                ApiError::internal("Failed to upload to upstream API")
            }
            _ => {
                tracing::error!("Internal error: {}", err);
                ApiError::internal("Server error")
            }
        }
    }
}
