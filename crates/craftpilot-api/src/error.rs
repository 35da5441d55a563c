//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping agent errors to appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use craftpilot_agent::error::AgentError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "not_found", "conflict").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 409 Conflict - state conflict (e.g., no task running).
    Conflict(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match &err {
            AgentError::EndpointNotFound(_) => ApiError::NotFound(err.to_string()),
            AgentError::NoActiveEndpoint
            | AgentError::NoTaskRunning
            | AgentError::TaskAlreadyRunning => ApiError::Conflict(err.to_string()),
            AgentError::MalformedPayload(_) | AgentError::NoStructuredPayload => {
                ApiError::BadRequest(err.to_string())
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_not_found_maps_to_404() {
        let api_err: ApiError = AgentError::EndpointNotFound("instance_9".into()).into();
        assert!(matches!(api_err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_lifecycle_conflicts_map_to_409() {
        for err in [
            AgentError::NoActiveEndpoint,
            AgentError::NoTaskRunning,
            AgentError::TaskAlreadyRunning,
        ] {
            let api_err: ApiError = err.into();
            assert!(matches!(api_err, ApiError::Conflict(_)));
        }
    }

    #[test]
    fn test_timeout_maps_to_internal() {
        let api_err: ApiError = AgentError::ActionTimeout {
            action_id: 1,
            timeout_ms: 60_000,
        }
        .into();
        assert!(matches!(api_err, ApiError::Internal(_)));
    }
}
