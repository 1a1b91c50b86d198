//! Error envelope returned by every endpoint

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::domain::FlowError;

/// `{success: false, error, code}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                success: false,
                error: message.into(),
                code: code.into(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

/// HTTP status for each flow failure kind
pub fn flow_error_status(err: &FlowError) -> StatusCode {
    match err {
        FlowError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        FlowError::UnknownFlow(_) => StatusCode::NOT_FOUND,
        FlowError::SafetyBlocked { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        FlowError::ProviderTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        FlowError::Provider { .. } | FlowError::OutputSchemaViolation { .. } => {
            StatusCode::BAD_GATEWAY
        }
        FlowError::Template { .. } | FlowError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        Self::new(flow_error_status(&err), err.code(), err.user_message())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.response.code, self.response.error)
    }
}

impl std::error::Error for ApiError {}
