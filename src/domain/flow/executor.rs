//! Flow executor trait

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::definition::FlowDefinition;
use super::error::FlowError;

/// Runs one invocation of a flow: validate, render, call the model, check the reply
#[async_trait]
pub trait FlowExecutor: Send + Sync + std::fmt::Debug {
    /// Execute `flow` with a raw JSON input, returning the validated output
    async fn execute(&self, flow: &FlowDefinition, input: Value) -> Result<Value, FlowError>;
}

/// Extension trait providing typed execution
pub trait FlowExecutorExt: FlowExecutor {
    /// Execute with a typed input and deserialize the validated output
    fn execute_typed<'a, I, O>(
        &'a self,
        flow: &'a FlowDefinition,
        input: &'a I,
    ) -> impl std::future::Future<Output = Result<O, FlowError>> + Send
    where
        I: Serialize + Sync,
        O: DeserializeOwned + Send,
    {
        async move {
            let input = serde_json::to_value(input)
                .map_err(|e| FlowError::internal(format!("Failed to serialize input: {}", e)))?;

            let output = self.execute(flow, input).await?;

            serde_json::from_value(output).map_err(|e| {
                FlowError::output_schema_violation(format!(
                    "Failed to deserialize flow output: {}",
                    e
                ))
            })
        }
    }
}

// Blanket implementation for all types implementing FlowExecutor
impl<T: FlowExecutor + ?Sized> FlowExecutorExt for T {}
