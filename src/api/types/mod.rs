//! Request and response types for the HTTP surface

pub mod envelope;
pub mod error;
pub mod json;

pub use envelope::{ActionEnvelope, ApiEnvelope};
pub use error::{ApiError, ApiErrorResponse, flow_error_status};
pub use json::Json;
