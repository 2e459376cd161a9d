//! Error types for adk2goose
//!
//! This module defines the error taxonomy shared by the Goose client, the
//! session registry and the HTTP handlers, together with its mapping onto
//! HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Goose answered with a status outside the accepted range
    #[error("unexpected status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// Goose could not be reached or the connection broke
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Goose answered 2xx but the body did not match the expected schema
    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("start goose agent for session {session_id}: {source}")]
    SessionStart {
        session_id: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status and stable error code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::UpstreamStatus { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            AppError::Http(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNREACHABLE"),
            AppError::Decode(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_DECODE_ERROR"),
            AppError::SessionStart { source, .. } => (source.status_and_code().0, "SESSION_START_FAILED"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, code = code, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, code = code, error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
