//! Flow error types

use thiserror::Error;

use crate::domain::DomainError;
use crate::domain::schema::SchemaViolation;
use crate::domain::template::TemplateError;

/// Errors that can occur while defining or invoking a flow
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FlowError {
    #[error("Invalid input: {0}")]
    InvalidInput(SchemaViolation),

    #[error("Template for flow '{flow}' is invalid: {source}")]
    Template {
        flow: String,
        #[source]
        source: TemplateError,
    },

    #[error("Flow not found: {0}")]
    UnknownFlow(String),

    #[error("Provider failure: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Provider timeout: {provider} did not respond within {timeout_ms}ms")]
    ProviderTimeout { provider: String, timeout_ms: u64 },

    #[error("Blocked by safety policy ({provider}): {reason}")]
    SafetyBlocked { provider: String, reason: String },

    #[error("Model output does not match the output schema: {message}")]
    OutputSchemaViolation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl FlowError {
    pub fn template(flow: impl Into<String>, source: TemplateError) -> Self {
        Self::Template {
            flow: flow.into(),
            source,
        }
    }

    pub fn unknown_flow(name: impl Into<String>) -> Self {
        Self::UnknownFlow(name.into())
    }

    pub fn output_schema_violation(message: impl Into<String>) -> Self {
        Self::OutputSchemaViolation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Template { source, .. } if source.is_unknown_field() => "template_field_unknown",
            Self::Template { .. } => "template_invalid",
            Self::UnknownFlow(_) => "unknown_flow",
            Self::Provider { .. } => "provider_failure",
            Self::ProviderTimeout { .. } => "provider_timeout",
            Self::SafetyBlocked { .. } => "safety_blocked",
            Self::OutputSchemaViolation { .. } => "output_schema_violation",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// Whether the caller can fix the failure by changing its input
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::UnknownFlow(_))
    }

    /// Message suitable for showing to an end user
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(violation) => format!("Invalid input: {}", violation),
            Self::UnknownFlow(name) => format!("Unknown flow: {}", name),
            Self::SafetyBlocked { .. } => {
                "The request was blocked by the content safety policy.".to_string()
            }
            Self::ProviderTimeout { .. } => {
                "The AI service took too long to respond. Please try again.".to_string()
            }
            _ => "An unexpected error occurred.".to_string(),
        }
    }
}

impl From<SchemaViolation> for FlowError {
    fn from(violation: SchemaViolation) -> Self {
        Self::InvalidInput(violation)
    }
}

impl From<DomainError> for FlowError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Provider { provider, message } => Self::Provider { provider, message },
            DomainError::Timeout {
                provider,
                timeout_ms,
            } => Self::ProviderTimeout {
                provider,
                timeout_ms,
            },
            DomainError::Blocked { provider, reason } => Self::SafetyBlocked { provider, reason },
            DomainError::MalformedResponse { provider, message } => {
                Self::Provider { provider, message }
            }
            DomainError::Configuration { message } => Self::Provider {
                provider: "configuration".to_string(),
                message,
            },
        }
    }
}
