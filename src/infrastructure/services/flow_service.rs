//! Flow service - looks up flows by name and runs them

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::domain::{FlowDefinition, FlowError, FlowExecutor, FlowRegistry, FlowSummary};

/// Flow service for invoking registered flows
pub struct FlowService {
    registry: Arc<FlowRegistry>,
    executor: Arc<dyn FlowExecutor>,
}

impl std::fmt::Debug for FlowService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowService")
            .field("flows", &self.registry.names())
            .finish()
    }
}

impl FlowService {
    /// Create a new flow service
    pub fn new(registry: Arc<FlowRegistry>, executor: Arc<dyn FlowExecutor>) -> Self {
        Self { registry, executor }
    }

    pub fn registry(&self) -> &Arc<FlowRegistry> {
        &self.registry
    }

    /// Get a flow by name
    pub fn get(&self, name: &str) -> Result<Arc<FlowDefinition>, FlowError> {
        self.registry.require(name)
    }

    /// Catalog of all registered flows
    pub fn list(&self) -> Vec<FlowSummary> {
        self.registry.summaries()
    }

    /// Execute the named flow with a raw JSON input
    pub async fn invoke(&self, name: &str, input: Value) -> Result<Value, FlowError> {
        let flow = self.get(name)?;

        debug!(flow = %name, "Invoking flow");

        self.executor.execute(&flow, input).await
    }
}
