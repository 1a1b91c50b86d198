//! Model provider capability: request/response types and the provider trait

mod provider;
mod request;
mod response;

pub use provider::LlmProvider;
pub use request::{LlmJsonSchema, LlmRequest, LlmRequestBuilder, LlmResponseFormat};
pub use response::{FinishReason, LlmResponse, Usage};

#[cfg(test)]
pub use provider::mock::MockLlmProvider;
