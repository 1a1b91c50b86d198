use serde::{Deserialize, Serialize};

use crate::domain::safety::HarmCategory;

/// Reason why the generation finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    /// The reply was withheld by the provider's safety filters
    ContentFilter,
    Error,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Response from an LLM provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub id: String,
    pub model: String,
    pub text: Option<String>,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<Usage>,
    /// Categories the provider flagged when it filtered the reply
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_categories: Vec<HarmCategory>,
}

impl LlmResponse {
    pub fn new(id: impl Into<String>, model: impl Into<String>, text: Option<String>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            text,
            finish_reason: None,
            usage: None,
            blocked_categories: Vec::new(),
        }
    }

    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = Some(reason);
        self
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn with_blocked_categories(mut self, categories: Vec<HarmCategory>) -> Self {
        self.blocked_categories = categories;
        self
    }

    pub fn content(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_filtered(&self) -> bool {
        self.finish_reason == Some(FinishReason::ContentFilter)
    }
}
