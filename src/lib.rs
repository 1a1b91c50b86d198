//! ShopMate flows
//!
//! Structured generative flows for an e-commerce assistant:
//! - typed input and output schemas checked on both sides of the model call
//! - prompt templates with guarded optional sections and media parts
//! - a safety policy attached to every request
//! - chat sessions that stay coherent when a turn fails

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{FlowExecutor, FlowRegistry};
use infrastructure::flow::{FlowEngine, FlowEngineConfig};
use infrastructure::llm::LlmProviderFactory;
use tracing::info;

/// Build the flow engine for the configured provider
pub fn create_executor(config: &AppConfig) -> anyhow::Result<Arc<dyn FlowExecutor>> {
    let provider = LlmProviderFactory::create(&config.provider)?;

    info!(
        provider = provider.provider_name(),
        model = provider.model(),
        "LLM provider ready"
    );

    let engine = FlowEngine::with_config(provider, FlowEngineConfig::from(&config.engine));
    Ok(Arc::new(engine))
}

/// Create the application state with all services initialized
pub fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let registry = Arc::new(FlowRegistry::builtin()?);
    info!(flows = ?registry.names(), "Flow registry loaded");

    let executor = create_executor(config)?;

    Ok(AppState::from_executor(registry, executor)?)
}
