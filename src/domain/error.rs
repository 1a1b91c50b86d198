use thiserror::Error;

/// Errors reported by model providers and infrastructure
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Provider timeout: {provider} did not respond within {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("Blocked by {provider}: {reason}")]
    Blocked { provider: String, reason: String },

    #[error("Malformed response from {provider}: {message}")]
    MalformedResponse { provider: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl DomainError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn timeout(provider: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            provider: provider.into(),
            timeout_ms,
        }
    }

    pub fn blocked(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Blocked {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
