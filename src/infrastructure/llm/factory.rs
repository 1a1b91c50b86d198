use std::sync::Arc;

use super::http_client::HttpClient;
use super::{GeminiProvider, OpenAiProvider};
use crate::config::{ProviderConfig, ProviderKind};
use crate::domain::{DomainError, LlmProvider};

/// Factory for creating LLM providers
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create the configured provider
    pub fn create(config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>, DomainError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            DomainError::configuration(format!(
                "No API key for provider '{:?}': set provider.api_key or one of {}",
                config.kind,
                config.kind.api_key_env_vars().join(", ")
            ))
        })?;

        let http_client = HttpClient::with_timeout(config.timeout())?;
        let model = config.model().to_string();

        let provider: Arc<dyn LlmProvider> = match (config.kind, config.base_url.as_deref()) {
            (ProviderKind::Gemini, Some(base_url)) => Arc::new(GeminiProvider::with_base_url(
                http_client,
                api_key,
                model,
                base_url,
            )),
            (ProviderKind::Gemini, None) => {
                Arc::new(GeminiProvider::new(http_client, api_key, model))
            }
            (ProviderKind::OpenAi, Some(base_url)) => Arc::new(OpenAiProvider::with_base_url(
                http_client,
                api_key,
                model,
                base_url,
            )),
            (ProviderKind::OpenAi, None) => {
                Arc::new(OpenAiProvider::new(http_client, api_key, model))
            }
        };

        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_gemini() {
        let config = ProviderConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        };

        let provider = LlmProviderFactory::create(&config).unwrap();
        assert_eq!(provider.provider_name(), "gemini");
        assert_eq!(provider.model(), "gemini-2.0-flash");
    }

    #[test]
    fn test_create_openai_with_model() {
        let config = ProviderConfig {
            kind: ProviderKind::OpenAi,
            model: Some("gpt-4o".to_string()),
            api_key: Some("sk-test".to_string()),
            base_url: Some("http://localhost:9000".to_string()),
            ..Default::default()
        };

        let provider = LlmProviderFactory::create(&config).unwrap();
        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.model(), "gpt-4o");
    }

    #[test]
    fn test_blank_key_is_not_used() {
        let config = ProviderConfig {
            kind: ProviderKind::OpenAi,
            api_key: Some("  ".to_string()),
            ..Default::default()
        };

        if std::env::var("OPENAI_API_KEY").is_err() {
            let err = LlmProviderFactory::create(&config).unwrap_err();
            assert!(matches!(err, DomainError::Configuration { .. }));
        }
    }
}
