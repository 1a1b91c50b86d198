//! Google Generative Language (Gemini) provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use super::http_client::HttpClientTrait;
use crate::domain::llm::LlmResponseFormat;
use crate::domain::{
    DomainError, FinishReason, HarmCategory, LlmProvider, LlmRequest, LlmResponse, PromptPart,
    SafetyPolicy, Usage,
};

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// JSON Schema keywords the `responseSchema` field accepts
const RESPONSE_SCHEMA_KEYWORDS: &[&str] = &[
    "type",
    "properties",
    "required",
    "items",
    "description",
    "enum",
    "format",
    "nullable",
    "minItems",
    "maxItems",
];

/// Gemini `generateContent` provider
#[derive(Debug)]
pub struct GeminiProvider<C: HttpClientTrait> {
    client: C,
    model: String,
    api_key: String,
    base_url: String,
}

impl<C: HttpClientTrait> GeminiProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, model, DEFAULT_GEMINI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("x-goog-api-key", self.api_key.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, request: &LlmRequest) -> Value {
        let parts: Vec<GeminiPart> = request.parts.iter().map(GeminiPart::from_domain).collect();

        let mut generation_config = Map::new();

        if let Some(temp) = request.temperature {
            generation_config.insert("temperature".to_string(), json!(temp));
        }

        if let Some(max_tokens) = request.max_tokens {
            generation_config.insert("maxOutputTokens".to_string(), json!(max_tokens));
        }

        if let Some(LlmResponseFormat::JsonSchema { json_schema }) = &request.response_format {
            generation_config.insert("responseMimeType".to_string(), json!("application/json"));
            generation_config.insert(
                "responseSchema".to_string(),
                sanitize_schema(&json_schema.schema),
            );
        }

        let mut body = json!({
            "contents": [{ "role": "user", "parts": parts }],
            "safetySettings": safety_settings(&request.safety_policy),
        });

        if !generation_config.is_empty() {
            body["generationConfig"] = Value::Object(generation_config);
        }

        body
    }

    fn parse_response(&self, json: Value) -> Result<LlmResponse, DomainError> {
        let response: GeminiResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::malformed("gemini", format!("Failed to parse response: {}", e))
        })?;

        // The whole prompt was rejected
        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(DomainError::blocked("gemini", format!("Prompt blocked: {}", reason)));
        }

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::malformed("gemini", "No candidates in response"))?;

        let text: Option<String> = candidate.content.map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect()
        });

        let mut llm_response = LlmResponse::new(
            response.response_id.unwrap_or_default(),
            response.model_version.unwrap_or_else(|| self.model.clone()),
            text.filter(|t| !t.is_empty()),
        );

        if let Some(reason) = candidate.finish_reason.as_deref() {
            llm_response = llm_response.with_finish_reason(parse_finish_reason(reason));
        }

        let blocked: Vec<HarmCategory> = candidate
            .safety_ratings
            .iter()
            .filter(|r| r.blocked)
            .filter_map(|r| HarmCategory::from_wire(&r.category))
            .collect();
        if !blocked.is_empty() {
            llm_response = llm_response.with_blocked_categories(blocked);
        }

        if let Some(usage) = response.usage_metadata {
            llm_response = llm_response.with_usage(Usage::new(
                usage.prompt_token_count,
                usage.candidates_token_count,
            ));
        }

        Ok(llm_response)
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for GeminiProvider<C> {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let url = self.generate_content_url();
        let body = self.build_request(&request);

        debug!(model = %self.model, parts = request.parts.len(), "Calling Gemini generateContent");

        let response = self.client.post_json(&url, self.headers(), &body).await?;

        self.parse_response(response)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn safety_settings(policy: &SafetyPolicy) -> Value {
    json!(policy.settings())
}

/// Keep only the JSON Schema keywords `responseSchema` understands
fn sanitize_schema(schema: &Value) -> Value {
    let Value::Object(obj) = schema else {
        return schema.clone();
    };

    let mut cleaned = Map::new();
    for (key, value) in obj {
        if !RESPONSE_SCHEMA_KEYWORDS.contains(&key.as_str()) {
            continue;
        }

        let value = match key.as_str() {
            "properties" => match value {
                Value::Object(props) => Value::Object(
                    props
                        .iter()
                        .map(|(name, prop)| (name.clone(), sanitize_schema(prop)))
                        .collect(),
                ),
                other => other.clone(),
            },
            "items" => sanitize_schema(value),
            _ => value.clone(),
        };

        cleaned.insert(key.clone(), value);
    }

    Value::Object(cleaned)
}

fn parse_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII" => FinishReason::ContentFilter,
        "FINISH_REASON_UNSPECIFIED" | "STOP_REASON_UNSPECIFIED" => FinishReason::Stop,
        _ => FinishReason::Error,
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum GeminiPart {
    #[serde(rename = "text")]
    Text(String),
    InlineData(GeminiBlob),
    FileData(GeminiFileData),
}

impl GeminiPart {
    fn from_domain(part: &PromptPart) -> Self {
        match part {
            PromptPart::Text { text } => Self::Text(text.clone()),
            PromptPart::Media { media } => match media.inline_data() {
                Some((mime_type, data)) => Self::InlineData(GeminiBlob {
                    mime_type: mime_type.to_string(),
                    data: data.to_string(),
                }),
                None => Self::FileData(GeminiFileData {
                    mime_type: media.content_type.clone(),
                    file_uri: media.url.clone(),
                }),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiFileData {
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    file_uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    usage_metadata: Option<GeminiUsageMetadata>,
    model_version: Option<String>,
    response_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
    #[serde(default)]
    safety_ratings: Vec<GeminiSafetyRating>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiSafetyRating {
    category: String,
    #[serde(default)]
    blocked: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::media::MediaRef;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;

    const TEST_URL: &str =
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

    fn reply(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP",
                "safetyRatings": [
                    { "category": "HARM_CATEGORY_HARASSMENT", "probability": "NEGLIGIBLE" }
                ]
            }],
            "usageMetadata": { "promptTokenCount": 42, "candidatesTokenCount": 7, "totalTokenCount": 49 },
            "modelVersion": "gemini-2.0-flash",
            "responseId": "resp-1"
        })
    }

    fn provider(client: MockHttpClient) -> GeminiProvider<MockHttpClient> {
        GeminiProvider::new(client, "test-key", "gemini-2.0-flash")
    }

    #[tokio::test]
    async fn test_generate() {
        let provider = provider(
            MockHttpClient::new().with_response(TEST_URL, reply("{\"summary\":\"ok\"}")),
        );

        let request = LlmRequest::builder()
            .text("Optimize my cart")
            .json_schema(
                "cartOptimizer",
                json!({
                    "type": "object",
                    "properties": {
                        "budget": { "type": "number", "exclusiveMinimum": 0, "description": "Budget" }
                    },
                    "required": ["budget"]
                }),
            )
            .temperature(0.4)
            .build();

        let response = provider.generate(request).await.unwrap();

        assert_eq!(response.id, "resp-1");
        assert_eq!(response.content(), Some("{\"summary\":\"ok\"}"));
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.usage.unwrap().total_tokens, 49);

        let body = provider.client.last_body().unwrap();
        assert_eq!(body["contents"][0]["parts"][0], json!({"text": "Optimize my cart"}));
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(
            body["generationConfig"]["responseSchema"]["properties"]["budget"],
            json!({"type": "number", "description": "Budget"})
        );
        assert_eq!(body["generationConfig"]["temperature"], json!(0.4f32));

        let request = &provider.client.requests()[0];
        assert!(request
            .headers
            .contains(&("x-goog-api-key".to_string(), "test-key".to_string())));
    }

    #[tokio::test]
    async fn test_safety_settings_are_sent() {
        let provider = provider(MockHttpClient::new().with_response(TEST_URL, reply("{}")));

        provider
            .generate(LlmRequest::builder().text("hi").build())
            .await
            .unwrap();

        let body = provider.client.last_body().unwrap();
        let settings = body["safetySettings"].as_array().unwrap();
        assert_eq!(settings.len(), 4);
        assert!(settings.contains(&json!({
            "category": "HARM_CATEGORY_DANGEROUS_CONTENT",
            "threshold": "BLOCK_MEDIUM_AND_ABOVE"
        })));
        assert!(body.get("generationConfig").is_none());
    }

    #[tokio::test]
    async fn test_media_parts() {
        let provider = provider(MockHttpClient::new().with_response(TEST_URL, reply("{}")));

        let request = LlmRequest::new(
            vec![
                PromptPart::Media {
                    media: MediaRef::from_url("data:image/jpeg;base64,/9j/4AAQ"),
                },
                PromptPart::Media {
                    media: MediaRef::from_url("https://cdn.example.com/wallet.jpg"),
                },
            ],
            SafetyPolicy::standard(),
        );
        provider.generate(request).await.unwrap();

        let body = provider.client.last_body().unwrap();
        let parts = &body["contents"][0]["parts"];
        assert_eq!(
            parts[0],
            json!({"inlineData": {"mimeType": "image/jpeg", "data": "/9j/4AAQ"}})
        );
        assert_eq!(
            parts[1],
            json!({"fileData": {"fileUri": "https://cdn.example.com/wallet.jpg"}})
        );
    }

    #[tokio::test]
    async fn test_prompt_block_is_reported() {
        let provider = provider(MockHttpClient::new().with_response(
            TEST_URL,
            json!({ "promptFeedback": { "blockReason": "SAFETY" } }),
        ));

        let err = provider
            .generate(LlmRequest::builder().text("something nasty").build())
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::blocked("gemini", "Prompt blocked: SAFETY"));
    }

    #[tokio::test]
    async fn test_safety_finish_reason() {
        let provider = provider(MockHttpClient::new().with_response(
            TEST_URL,
            json!({
                "candidates": [{
                    "finishReason": "SAFETY",
                    "safetyRatings": [
                        { "category": "HARM_CATEGORY_HATE_SPEECH", "probability": "HIGH", "blocked": true },
                        { "category": "HARM_CATEGORY_HARASSMENT", "probability": "LOW" }
                    ]
                }]
            }),
        ));

        let response = provider
            .generate(LlmRequest::builder().text("x").build())
            .await
            .unwrap();

        assert!(response.is_filtered());
        assert_eq!(response.content(), None);
        assert_eq!(response.blocked_categories, vec![HarmCategory::HateSpeech]);
    }

    #[tokio::test]
    async fn test_no_candidates() {
        let provider =
            provider(MockHttpClient::new().with_response(TEST_URL, json!({"candidates": []})));

        let err = provider
            .generate(LlmRequest::builder().text("x").build())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::MalformedResponse { .. }));
    }

    #[test]
    fn test_sanitize_schema_recurses_into_items() {
        let schema = json!({
            "type": "object",
            "properties": {
                "tags": { "type": "array", "minItems": 1, "items": { "type": "string", "minLength": 1 } }
            },
            "required": ["tags"],
            "additionalProperties": false
        });

        assert_eq!(
            sanitize_schema(&schema),
            json!({
                "type": "object",
                "properties": {
                    "tags": { "type": "array", "minItems": 1, "items": { "type": "string" } }
                },
                "required": ["tags"]
            })
        );
    }
}
