//! Success envelope shared by the HTTP routes and the CLI

use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiErrorResponse};
use super::json::Json;
use crate::domain::FlowError;

/// `{success: true, data}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiEnvelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Either envelope, for callers that report failures in-band
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ActionEnvelope<T> {
    Success(ApiEnvelope<T>),
    Failure(ApiErrorResponse),
}

impl<T> ActionEnvelope<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl<T> From<Result<T, FlowError>> for ActionEnvelope<T> {
    fn from(result: Result<T, FlowError>) -> Self {
        match result {
            Ok(data) => Self::Success(ApiEnvelope::ok(data)),
            Err(e) => Self::Failure(ApiError::from(e).response),
        }
    }
}
