//! Chat service - one conversation round trip against the chat flow

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::conversation::APOLOGY_MESSAGE;
use crate::domain::flows::{self, ChatInput, ChatOutput};
use crate::domain::{
    ConversationSession, ConversationTurn, FlowDefinition, FlowError, FlowExecutor,
    FlowExecutorExt, FlowRegistry,
};

/// Runs chat turns and keeps the caller's session coherent
pub struct ChatService {
    flow: Arc<FlowDefinition>,
    executor: Arc<dyn FlowExecutor>,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("flow", &self.flow.name())
            .finish()
    }
}

impl ChatService {
    pub fn new(flow: Arc<FlowDefinition>, executor: Arc<dyn FlowExecutor>) -> Self {
        Self { flow, executor }
    }

    /// Use the chat flow of `registry`
    pub fn from_registry(
        registry: &FlowRegistry,
        executor: Arc<dyn FlowExecutor>,
    ) -> Result<Self, FlowError> {
        Ok(Self::new(registry.require(flows::chat::NAME)?, executor))
    }

    /// Send `query` and record the exchange.
    ///
    /// The session always grows by exactly two turns: the user turn, then either the
    /// reply or an apology.
    pub async fn send(
        &self,
        session: &mut ConversationSession,
        query: &str,
        product_details: Option<&str>,
    ) -> Result<ChatOutput, FlowError> {
        // History as of before this turn; the query itself travels separately
        let past_convo = (!session.is_empty()).then(|| session.history_text());

        let input = ChatInput {
            query: query.to_string(),
            product_details: product_details
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            past_convo,
        };

        debug!(session = %session.id(), turns = session.len(), "Sending chat turn");

        let result: Result<ChatOutput, FlowError> =
            self.executor.execute_typed(&self.flow, &input).await;

        session.append(ConversationTurn::user(query));

        match &result {
            Ok(output) => session.append(ConversationTurn::assistant(&output.response)),
            Err(e) => {
                warn!(session = %session.id(), code = e.code(), error = %e, "Chat turn failed");
                session.append(ConversationTurn::assistant(APOLOGY_MESSAGE));
            }
        }

        result
    }
}
