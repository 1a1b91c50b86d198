//! Run command - one flow invocation from the terminal

use std::process::ExitCode;

use anyhow::Context;
use clap::Args;
use serde_json::Value;

use crate::api::types::ActionEnvelope;
use crate::infrastructure::services::FlowService;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Flow name, e.g. `cartOptimizer`
    pub flow: String,

    /// Flow input as inline JSON, or `@path` to read it from a file
    #[arg(long, short)]
    pub input: String,
}

/// Invoke the flow and print the envelope; exits non-zero on failure
pub async fn run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let config = super::bootstrap();
    let input = read_input(&args.input).await?;

    let state = crate::create_app_state_with_config(&config)?;
    let envelope = invoke(&state.flow_service, &args.flow, input).await;

    println!("{}", serde_json::to_string_pretty(&envelope)?);

    Ok(if envelope.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn invoke(service: &FlowService, flow: &str, input: Value) -> ActionEnvelope<Value> {
    service.invoke(flow, input).await.into()
}

/// Parse `raw` as JSON, reading it from a file when prefixed with `@`
pub async fn read_input(raw: &str) -> anyhow::Result<Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read input file '{}'", path))?,
        None => raw.to_string(),
    };

    serde_json::from_str(&text).context("Flow input is not valid JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::domain::FlowRegistry;
    use crate::domain::llm::MockLlmProvider;
    use crate::infrastructure::flow::FlowEngine;

    fn service(provider: MockLlmProvider) -> FlowService {
        FlowService::new(
            Arc::new(FlowRegistry::builtin().unwrap()),
            Arc::new(FlowEngine::new(Arc::new(provider))),
        )
    }

    #[tokio::test]
    async fn test_read_inline_input() {
        let value = read_input(r#"{"description":"running shoes"}"#).await.unwrap();
        assert_eq!(value, json!({"description": "running shoes"}));
    }

    #[tokio::test]
    async fn test_read_input_from_file() {
        let path =
            std::env::temp_dir().join(format!("shopmate-input-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"cartItems":"Laptop, Mouse"}"#).unwrap();

        let value = read_input(&format!("@{}", path.display())).await.unwrap();
        assert_eq!(value["cartItems"], "Laptop, Mouse");

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_read_invalid_input() {
        assert!(read_input("{oops").await.is_err());
        assert!(read_input("@/definitely/missing.json").await.is_err());
    }

    #[tokio::test]
    async fn test_invoke_prints_envelopes() {
        let service = service(
            MockLlmProvider::new("mock").with_json(json!({"response": "We ship in 2 days."})),
        );

        let ok = invoke(&service, "chat", json!({"query": "Shipping time?"})).await;
        assert!(ok.is_success());
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"success": true, "data": {"response": "We ship in 2 days."}})
        );

        let failed = invoke(&service, "checkout", json!({})).await;
        assert!(!failed.is_success());
        assert_eq!(serde_json::to_value(&failed).unwrap()["code"], "unknown_flow");
    }
}
