use async_trait::async_trait;
use std::fmt::Debug;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Generative model capability (Gemini, OpenAI, ...)
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Generate a reply for the prompt parts under the request's safety policy
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Model the provider generates with
    fn model(&self) -> &str;
}
