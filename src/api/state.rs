//! Application state for shared services

use std::sync::Arc;

use crate::domain::{FlowError, FlowExecutor, FlowRegistry};
use crate::infrastructure::services::{ChatService, FlowService};

/// Application state shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub flow_service: Arc<FlowService>,
    pub chat_service: Arc<ChatService>,
}

impl AppState {
    pub fn new(flow_service: Arc<FlowService>, chat_service: Arc<ChatService>) -> Self {
        Self {
            flow_service,
            chat_service,
        }
    }

    /// Wire both services to one registry and executor
    pub fn from_executor(
        registry: Arc<FlowRegistry>,
        executor: Arc<dyn FlowExecutor>,
    ) -> Result<Self, FlowError> {
        let chat_service = ChatService::from_registry(&registry, executor.clone())?;
        let flow_service = FlowService::new(registry, executor);

        Ok(Self::new(Arc::new(flow_service), Arc::new(chat_service)))
    }
}
