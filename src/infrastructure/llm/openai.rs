use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::http_client::HttpClientTrait;
use crate::domain::llm::LlmResponseFormat;
use crate::domain::{
    DomainError, FinishReason, LlmProvider, LlmRequest, LlmResponse, PromptPart, Usage,
};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// OpenAI chat completions provider
#[derive(Debug)]
pub struct OpenAiProvider<C: HttpClientTrait> {
    client: C,
    model: String,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> OpenAiProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, model, DEFAULT_OPENAI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            model: model.into(),
            auth_header,
            base_url,
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_request(&self, request: &LlmRequest) -> serde_json::Value {
        let message = OpenAiMessage {
            role: "user",
            content: OpenAiContent::from_parts(&request.parts),
        };

        let mut body = json!({
            "model": self.model,
            "messages": [message],
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if let Some(ref response_format) = request.response_format {
            match response_format {
                LlmResponseFormat::Text => {
                    body["response_format"] = json!({"type": "text"});
                }
                LlmResponseFormat::JsonSchema { json_schema } => {
                    body["response_format"] = json!({
                        "type": "json_schema",
                        "json_schema": {
                            "name": json_schema.name,
                            "strict": json_schema.strict,
                            "schema": json_schema.schema
                        }
                    });
                }
            }
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<LlmResponse, DomainError> {
        let response: OpenAiResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::malformed("openai", format!("Failed to parse response: {}", e))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::malformed("openai", "No choices in response"))?;

        // Structured outputs report a policy refusal instead of content
        if let Some(refusal) = choice.message.refusal.filter(|r| !r.trim().is_empty()) {
            return Err(DomainError::blocked("openai", refusal));
        }

        let mut llm_response =
            LlmResponse::new(response.id, response.model, choice.message.content);

        if let Some(reason) = choice.finish_reason {
            llm_response = llm_response.with_finish_reason(parse_finish_reason(&reason));
        }

        if let Some(usage) = response.usage {
            llm_response = llm_response.with_usage(Usage::new(
                usage.prompt_tokens,
                usage.completion_tokens,
            ));
        }

        Ok(llm_response)
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for OpenAiProvider<C> {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        // Chat completions has no per-request safety settings; moderation is server side
        debug!(
            model = %self.model,
            policy = ?request.safety_policy,
            "Safety policy enforced by provider moderation"
        );

        let url = self.chat_completions_url();
        let body = self.build_request(&request);
        let response = self.client.post_json(&url, self.headers(), &body).await?;

        self.parse_response(response)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn parse_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::Length,
        "content_filter" => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: OpenAiContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum OpenAiContent {
    Text(String),
    Parts(Vec<OpenAiContentPart>),
}

impl OpenAiContent {
    /// Plain string when the prompt has no media
    fn from_parts(parts: &[PromptPart]) -> Self {
        let has_media = parts.iter().any(|p| matches!(p, PromptPart::Media { .. }));

        if !has_media {
            let text = parts
                .iter()
                .filter_map(|p| match p {
                    PromptPart::Text { text } => Some(text.as_str()),
                    PromptPart::Media { .. } => None,
                })
                .collect();
            return Self::Text(text);
        }

        Self::Parts(
            parts
                .iter()
                .map(|p| match p {
                    PromptPart::Text { text } => OpenAiContentPart::Text { text: text.clone() },
                    PromptPart::Media { media } => OpenAiContentPart::ImageUrl {
                        image_url: OpenAiImageUrl {
                            url: media.url.clone(),
                        },
                    },
                })
                .collect(),
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAiContentPart {
    Text { text: String },
    ImageUrl { image_url: OpenAiImageUrl },
}

#[derive(Debug, Serialize)]
struct OpenAiImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    id: String,
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::FlowExecutor;
    use crate::domain::flows;
    use crate::domain::media::MediaRef;
    use crate::infrastructure::flow::FlowEngine;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;

    const TEST_URL: &str = "https://api.openai.com/v1/chat/completions";

    fn completion(content: &str, finish_reason: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-123",
            "model": "gpt-4o-mini",
            "choices": [{
                "message": { "role": "assistant", "content": content },
                "finish_reason": finish_reason
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 8, "total_tokens": 18 }
        })
    }

    #[tokio::test]
    async fn test_openai_generate() {
        let client = MockHttpClient::new()
            .with_response(TEST_URL, completion("{\"response\":\"Hello!\"}", "stop"));
        let provider = OpenAiProvider::new(client, "test-api-key", "gpt-4o-mini");

        let request = LlmRequest::builder()
            .text("Say hello")
            .json_schema("chat", json!({"type": "object"}))
            .build();

        let response = provider.generate(request).await.unwrap();

        assert_eq!(response.id, "chatcmpl-123");
        assert_eq!(response.content(), Some("{\"response\":\"Hello!\"}"));
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.usage.unwrap().total_tokens, 18);

        let body = provider.client.last_body().unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["content"], "Say hello");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "chat");

        let request = &provider.client.requests()[0];
        assert!(request
            .headers
            .contains(&("Authorization".to_string(), "Bearer test-api-key".to_string())));
    }

    #[tokio::test]
    async fn test_refusal_is_blocked() {
        let client = MockHttpClient::new().with_response(
            TEST_URL,
            json!({
                "id": "chatcmpl-7",
                "model": "gpt-4o-mini",
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "refusal": "I'm sorry, I cannot assist with that request."
                    },
                    "finish_reason": "stop"
                }]
            }),
        );
        let provider = Arc::new(OpenAiProvider::new(client, "key", "gpt-4o-mini"));

        let result = provider.generate(LlmRequest::builder().text("x").build()).await;
        assert_eq!(
            result.unwrap_err(),
            DomainError::blocked("openai", "I'm sorry, I cannot assist with that request.")
        );

        let engine = FlowEngine::new(provider);
        let err = engine
            .execute(&flows::chat::definition().unwrap(), json!({"query": "Hi"}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "safety_blocked");
    }

    #[tokio::test]
    async fn test_media_becomes_image_url_part() {
        let client = MockHttpClient::new().with_response(TEST_URL, completion("{}", "stop"));
        let provider = OpenAiProvider::new(client, "key", "gpt-4o");

        let request = LlmRequest::new(
            vec![
                PromptPart::Text {
                    text: "Photo: ".to_string(),
                },
                PromptPart::Media {
                    media: MediaRef::from_url("data:image/png;base64,iVBORw0KGgo="),
                },
            ],
            Default::default(),
        );
        provider.generate(request).await.unwrap();

        let body = provider.client.last_body().unwrap();
        let content = &body["messages"][0]["content"];
        assert_eq!(content[0], json!({"type": "text", "text": "Photo: "}));
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(
            content[1]["image_url"]["url"],
            "data:image/png;base64,iVBORw0KGgo="
        );
    }

    #[tokio::test]
    async fn test_content_filter() {
        let client = MockHttpClient::new().with_response(
            TEST_URL,
            json!({
                "id": "chatcmpl-9",
                "model": "gpt-4o",
                "choices": [{ "message": { "content": null }, "finish_reason": "content_filter" }]
            }),
        );
        let provider = OpenAiProvider::new(client, "key", "gpt-4o");

        let response = provider.generate(LlmRequest::builder().text("x").build()).await.unwrap();
        assert!(response.is_filtered());
        assert_eq!(response.content(), None);
    }

    #[tokio::test]
    async fn test_openai_error_handling() {
        let client = MockHttpClient::new()
            .with_error(TEST_URL, DomainError::provider("http", "HTTP 401: invalid key"));
        let provider = OpenAiProvider::new(client, "invalid-key", "gpt-4o");

        let result = provider.generate(LlmRequest::builder().text("Hello!").build()).await;
        assert!(matches!(result, Err(DomainError::Provider { .. })));
    }

    #[tokio::test]
    async fn test_openai_custom_base_url() {
        let custom_url = "http://localhost:8080/v1/chat/completions";
        let client = MockHttpClient::new().with_response(custom_url, completion("{}", "stop"));
        let provider =
            OpenAiProvider::with_base_url(client, "test-key", "gpt-4o", "http://localhost:8080/");

        let response = provider.generate(LlmRequest::builder().text("Test").build()).await.unwrap();
        assert_eq!(response.id, "chatcmpl-123");
    }
}
