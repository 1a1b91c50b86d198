//! Flow engine implementation

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::domain::{
    FinishReason, FlowDefinition, FlowError, FlowExecutor, LlmProvider, LlmRequest, LlmResponse,
};

/// Configuration applied to every invocation
#[derive(Debug, Clone, Default)]
pub struct FlowEngineConfig {
    /// Upper bound for one provider call
    pub timeout: Option<Duration>,

    /// Sampling temperature forwarded to the provider
    pub temperature: Option<f32>,

    /// Maximum tokens in the reply
    pub max_tokens: Option<u32>,
}

impl From<&EngineConfig> for FlowEngineConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            timeout: config.timeout_secs.map(Duration::from_secs),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Stateless flow engine: validate, render, generate, check
#[derive(Debug)]
pub struct FlowEngine {
    provider: Arc<dyn LlmProvider>,
    config: FlowEngineConfig,
}

impl FlowEngine {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            config: FlowEngineConfig::default(),
        }
    }

    pub fn with_config(provider: Arc<dyn LlmProvider>, config: FlowEngineConfig) -> Self {
        Self { provider, config }
    }

    fn build_request(&self, flow: &FlowDefinition, input: &Value) -> Result<LlmRequest, FlowError> {
        let validated = flow.input_schema().validate(input)?;
        let prompt = flow.template().render(&validated);

        let mut builder = LlmRequest::builder()
            .prompt(prompt)
            .safety_policy(flow.safety_policy().clone());

        if !flow.output_schema().is_empty() {
            builder = builder.json_schema(flow.name(), flow.output_schema().to_json_schema());
        }

        if let Some(temp) = self.config.temperature {
            builder = builder.temperature(temp);
        }

        if let Some(max_tokens) = self.config.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }

        Ok(builder.build())
    }

    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, FlowError> {
        let call = self.provider.generate(request);

        let result = match self.config.timeout {
            Some(timeout) => tokio::time::timeout(timeout, call).await.map_err(|_| {
                FlowError::ProviderTimeout {
                    provider: self.provider.provider_name().to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                }
            })?,
            None => call.await,
        };

        Ok(result?)
    }

    fn parse_output(
        &self,
        flow: &FlowDefinition,
        response: &LlmResponse,
    ) -> Result<Value, FlowError> {
        if response.is_filtered() {
            let reason = if response.blocked_categories.is_empty() {
                "Reply withheld by content filter".to_string()
            } else {
                let categories: Vec<&str> = response
                    .blocked_categories
                    .iter()
                    .map(|c| c.as_str())
                    .collect();
                format!("Reply withheld for {}", categories.join(", "))
            };

            return Err(FlowError::SafetyBlocked {
                provider: self.provider.provider_name().to_string(),
                reason,
            });
        }

        let text = response.content().map(str::trim).filter(|t| !t.is_empty());

        let Some(text) = text else {
            if response.finish_reason == Some(FinishReason::Error) {
                return Err(FlowError::Provider {
                    provider: self.provider.provider_name().to_string(),
                    message: "Generation stopped without a reply".to_string(),
                });
            }
            return Err(FlowError::output_schema_violation("Model returned no content"));
        };

        let reply: Value = serde_json::from_str(strip_code_fence(text)).map_err(|e| {
            FlowError::output_schema_violation(format!("Reply is not valid JSON: {}", e))
        })?;

        let validated = flow
            .output_schema()
            .validate(&reply)
            .map_err(|violation| FlowError::output_schema_violation(violation.to_string()))?;

        Ok(validated.into_value())
    }
}

#[async_trait]
impl FlowExecutor for FlowEngine {
    async fn execute(&self, flow: &FlowDefinition, input: Value) -> Result<Value, FlowError> {
        let start = Instant::now();

        let request = self.build_request(flow, &input).inspect_err(|e| {
            debug!(flow = %flow.name(), error = %e, "Rejected flow input");
        })?;

        debug!(
            flow = %flow.name(),
            provider = self.provider.provider_name(),
            parts = request.parts.len(),
            "Invoking model"
        );

        let result = match self.generate(request).await {
            Ok(response) => self.parse_output(flow, &response),
            Err(e) => Err(e),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => debug!(flow = %flow.name(), elapsed_ms, "Flow completed"),
            Err(e) => warn!(
                flow = %flow.name(),
                code = e.code(),
                elapsed_ms,
                error = %e,
                "Flow failed"
            ),
        }

        result
    }
}

/// Contents of a single Markdown code fence, or the text itself
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    let Some(body) = rest.strip_suffix("```") else {
        return text;
    };

    // Skip the info string (```json)
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => {
            let body = body.trim();
            match body.split_once(char::is_whitespace) {
                Some((info, rest)) if is_info_string(info) => rest.trim(),
                _ => body,
            }
        }
    }
}

fn is_info_string(word: &str) -> bool {
    word.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::domain::flows::{self, CartOptimizerInput, CartOptimizerOutput};
    use crate::domain::llm::MockLlmProvider;
    use crate::domain::{DomainError, FlowExecutorExt, HarmCategory, SafetyPolicy};
    use serde_json::json;

    fn engine(provider: MockLlmProvider) -> (FlowEngine, Arc<MockLlmProvider>) {
        let provider = Arc::new(provider);
        (FlowEngine::new(provider.clone()), provider)
    }

    #[tokio::test]
    async fn test_cart_scenario() {
        let reply = json!({"suggestions": [], "summary": "Looks good"});
        let (engine, provider) = engine(MockLlmProvider::new("mock").with_json(reply.clone()));
        let flow = flows::cart_optimizer::definition().unwrap();

        let output = engine
            .execute(&flow, json!({"cartItems": "Laptop, Mouse", "budget": 500}))
            .await
            .unwrap();

        assert_eq!(output, reply);

        let request = provider.last_request().unwrap();
        let prompt = request.prompt_text();
        assert!(prompt.contains("Laptop, Mouse"));
        assert!(prompt.contains("500"));
        assert_eq!(request.safety_policy, SafetyPolicy::standard());
        assert!(request.expects_json());
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_provider() {
        let (engine, provider) = engine(MockLlmProvider::new("mock").with_json(json!({})));
        let flow = flows::pricing_assistant::definition().unwrap();

        let err = engine
            .execute(&flow, json!({"productDetails": "Mouse", "currentPrice": "cheap"}))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "invalid_input");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_pricing_scenario_missing_field() {
        let (engine, provider) = engine(
            MockLlmProvider::new("mock").with_json(json!({"reasoning": "Competitors are cheaper"})),
        );
        let flow = flows::pricing_assistant::definition().unwrap();

        let err = engine
            .execute(&flow, json!({"productDetails": "Wireless mouse", "currentPrice": 49.99}))
            .await
            .unwrap_err();

        assert!(matches!(err, FlowError::OutputSchemaViolation { .. }));
        assert!(err.to_string().contains("suggestedPrice"));

        let prompt = provider.last_request().unwrap().prompt_text();
        assert!(!prompt.contains("Market Trends"));
        assert!(!prompt.contains("Competitor Prices"));
    }

    #[tokio::test]
    async fn test_output_drops_undeclared_fields() {
        let (engine, _) = engine(MockLlmProvider::new("mock").with_json(json!({
            "suggestedPrice": 45,
            "reasoning": "Match the market",
            "confidence": 0.9
        })));
        let flow = flows::pricing_assistant::definition().unwrap();

        let output = engine
            .execute(&flow, json!({"productDetails": "Mouse", "currentPrice": 49.99}))
            .await
            .unwrap();

        assert_eq!(output, json!({"suggestedPrice": 45, "reasoning": "Match the market"}));
    }

    #[tokio::test]
    async fn test_code_fenced_reply() {
        let (engine, _) = engine(
            MockLlmProvider::new("mock")
                .with_text("```json\n{\"response\": \"We ship worldwide.\"}\n```"),
        );
        let flow = flows::chat::definition().unwrap();

        let output = engine
            .execute(&flow, json!({"query": "Do you ship abroad?"}))
            .await
            .unwrap();

        assert_eq!(output, json!({"response": "We ship worldwide."}));
    }

    #[tokio::test]
    async fn test_single_line_fence_with_info_string() {
        let (engine, _) = engine(
            MockLlmProvider::new("mock").with_text("```json {\"response\": \"In stock.\"}```"),
        );
        let flow = flows::chat::definition().unwrap();

        let output = engine
            .execute(&flow, json!({"query": "Is it in stock?"}))
            .await
            .unwrap();

        assert_eq!(output, json!({"response": "In stock."}));
    }

    #[tokio::test]
    async fn test_error_finish_without_text_is_provider_failure() {
        let response =
            LlmResponse::new("id", "model", None).with_finish_reason(FinishReason::Error);
        let (engine, _) = engine(MockLlmProvider::new("gemini").with_response(response));
        let flow = flows::chat::definition().unwrap();

        let err = engine
            .execute(&flow, json!({"query": "Hi"}))
            .await
            .unwrap_err();

        assert!(matches!(err, FlowError::Provider { ref provider, .. } if provider == "gemini"));
        assert_eq!(err.code(), "provider_failure");
    }

    #[tokio::test]
    async fn test_empty_stop_is_output_violation() {
        let response = LlmResponse::new("id", "model", Some("  ".to_string()))
            .with_finish_reason(FinishReason::Stop);
        let (engine, _) = engine(MockLlmProvider::new("mock").with_response(response));
        let flow = flows::chat::definition().unwrap();

        let err = engine
            .execute(&flow, json!({"query": "Hi"}))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "output_schema_violation");
    }

    #[tokio::test]
    async fn test_non_json_reply() {
        let (engine, _) = engine(MockLlmProvider::new("mock").with_text("Sure! Here you go."));
        let flow = flows::chat::definition().unwrap();

        let err = engine
            .execute(&flow, json!({"query": "Hi"}))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "output_schema_violation");
    }

    #[tokio::test]
    async fn test_filtered_reply_is_safety_blocked() {
        let response = LlmResponse::new("id", "model", None)
            .with_finish_reason(FinishReason::ContentFilter)
            .with_blocked_categories(vec![HarmCategory::DangerousContent]);
        let (engine, _) = engine(MockLlmProvider::new("mock").with_response(response));
        let flow = flows::chat::definition().unwrap();

        let err = engine
            .execute(&flow, json!({"query": "Hi"}))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "safety_blocked");
        assert!(err.to_string().contains("HARM_CATEGORY_DANGEROUS_CONTENT"));
    }

    #[tokio::test]
    async fn test_provider_block_is_safety_blocked() {
        let (engine, _) = engine(
            MockLlmProvider::new("gemini").with_error(DomainError::blocked("gemini", "SAFETY")),
        );
        let flow = flows::chat::definition().unwrap();

        let err = engine
            .execute(&flow, json!({"query": "Hi"}))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            FlowError::SafetyBlocked {
                provider: "gemini".to_string(),
                reason: "SAFETY".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_timeout() {
        let provider = Arc::new(
            MockLlmProvider::new("slow")
                .with_json(json!({"response": "late"}))
                .with_delay(Duration::from_millis(200)),
        );
        let engine = FlowEngine::with_config(
            provider,
            FlowEngineConfig {
                timeout: Some(Duration::from_millis(20)),
                ..Default::default()
            },
        );
        let flow = flows::chat::definition().unwrap();

        let err = engine
            .execute(&flow, json!({"query": "Hi"}))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            FlowError::ProviderTimeout {
                provider: "slow".to_string(),
                timeout_ms: 20
            }
        );
    }

    #[tokio::test]
    async fn test_config_is_forwarded() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_json(json!({"response": "ok"})));
        let engine = FlowEngine::with_config(
            provider.clone(),
            FlowEngineConfig {
                temperature: Some(0.3),
                max_tokens: Some(256),
                ..Default::default()
            },
        );
        let flow = flows::chat::definition().unwrap();

        engine.execute(&flow, json!({"query": "Hi"})).await.unwrap();

        let request = provider.last_request().unwrap();
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, Some(256));
    }

    #[tokio::test]
    async fn test_execute_typed() {
        let (engine, _) = engine(MockLlmProvider::new("mock").with_json(json!({
            "suggestions": [{"item": "USB hub", "reason": "Bundle discount", "price": 19.99}],
            "summary": "Add a hub"
        })));
        let flow = flows::cart_optimizer::definition().unwrap();

        let output: CartOptimizerOutput = engine
            .execute_typed(
                &flow,
                &CartOptimizerInput {
                    cart_items: "Laptop".to_string(),
                    budget: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(output.suggestions[0].price, Some(19.99));
        assert_eq!(output.summary, "Add a hub");
    }

    #[tokio::test]
    async fn test_execute_typed_unserializable_input() {
        let (engine, provider) = engine(MockLlmProvider::new("mock"));
        let flow = flows::chat::definition().unwrap();
        let input: HashMap<(u8, u8), &str> = HashMap::from([((1, 2), "Hi")]);

        let result: Result<Value, FlowError> = engine.execute_typed(&flow, &input).await;

        assert_eq!(result.unwrap_err().code(), "internal_error");
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("{}"), "{}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json {\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\"two words\"```"), "\"two words\"");
        assert_eq!(strip_code_fence("```json\n{}"), "```json\n{}");
    }

    #[test]
    fn test_engine_config_from_app_config() {
        let config = FlowEngineConfig::from(&EngineConfig {
            timeout_secs: Some(30),
            temperature: Some(0.2),
            max_tokens: None,
        });

        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.temperature, Some(0.2));
        assert!(config.max_tokens.is_none());
    }
}
