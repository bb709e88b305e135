//! Error types for cardio-ui HTTP handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::client::ClientError;
use crate::controller::ControllerError;
use crate::report::ReportError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., analysis already running
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backend unreachable or rejected the request (502)
    #[error("{}", .0.user_message())]
    Backend(ClientError),

    /// Report could not be assembled (500)
    #[error("{}", .0.user_message())]
    Report(#[from] ReportError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ControllerError> for ApiError {
    fn from(err: ControllerError) -> Self {
        match err {
            ControllerError::AnalysisInProgress | ControllerError::ReportInProgress => {
                ApiError::Conflict(err.to_string())
            }
            ControllerError::NoResult => ApiError::NotFound(err.to_string()),
            ControllerError::NoEcgFile | ControllerError::Preview(_) => {
                ApiError::BadRequest(err.to_string())
            }
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Validation(msg) => ApiError::BadRequest(msg),
            other => ApiError::Backend(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Backend(ref err) => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR", err.user_message()),
            ApiError::Report(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "REPORT_ERROR",
                err.user_message().to_string(),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
