use serde::Serialize;
use serde_json::Value;

use crate::domain::safety::SafetyPolicy;
use crate::domain::template::{PromptPart, RenderedPrompt};

/// JSON schema the reply should conform to
#[derive(Debug, Clone, Serialize)]
pub struct LlmJsonSchema {
    pub name: String,
    pub schema: Value,
    pub strict: bool,
}

/// Requested shape of the reply
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LlmResponseFormat {
    Text,
    JsonSchema { json_schema: LlmJsonSchema },
}

/// A single generation request
#[derive(Debug, Clone, Serialize)]
pub struct LlmRequest {
    /// Prompt text and media, in order
    pub parts: Vec<PromptPart>,
    /// Thresholds the provider must enforce
    pub safety_policy: SafetyPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<LlmResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    pub fn new(parts: Vec<PromptPart>, safety_policy: SafetyPolicy) -> Self {
        Self {
            parts,
            safety_policy,
            response_format: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn builder() -> LlmRequestBuilder {
        LlmRequestBuilder::new()
    }

    /// Concatenated text parts
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                PromptPart::Text { text } => Some(text.as_str()),
                PromptPart::Media { .. } => None,
            })
            .collect()
    }

    pub fn expects_json(&self) -> bool {
        matches!(
            self.response_format,
            Some(LlmResponseFormat::JsonSchema { .. })
        )
    }
}

/// Builder for LlmRequest
#[derive(Debug, Default)]
pub struct LlmRequestBuilder {
    parts: Vec<PromptPart>,
    safety_policy: Option<SafetyPolicy>,
    response_format: Option<LlmResponseFormat>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl LlmRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(mut self, prompt: RenderedPrompt) -> Self {
        self.parts.extend(prompt.into_parts());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(PromptPart::Text { text: text.into() });
        self
    }

    pub fn safety_policy(mut self, policy: SafetyPolicy) -> Self {
        self.safety_policy = Some(policy);
        self
    }

    pub fn json_schema(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.response_format = Some(LlmResponseFormat::JsonSchema {
            json_schema: LlmJsonSchema {
                name: name.into(),
                schema,
                strict: false,
            },
        });
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn build(self) -> LlmRequest {
        LlmRequest {
            parts: self.parts,
            safety_policy: self.safety_policy.unwrap_or_default(),
            response_format: self.response_format,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builder() {
        let request = LlmRequest::builder()
            .text("Suggest a price for: ")
            .text("Wireless mouse")
            .json_schema("pricingAssistant", json!({"type": "object"}))
            .temperature(0.2)
            .max_tokens(512)
            .build();

        assert_eq!(request.parts.len(), 2);
        assert_eq!(request.prompt_text(), "Suggest a price for: Wireless mouse");
        assert!(request.expects_json());
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(512));
        assert_eq!(request.safety_policy, SafetyPolicy::standard());
    }

    #[test]
    fn test_request_without_schema_expects_text() {
        let request = LlmRequest::new(Vec::new(), SafetyPolicy::standard());
        assert!(!request.expects_json());
        assert!(request.prompt_text().is_empty());
    }
}
