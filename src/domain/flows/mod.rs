//! The built-in ShopMate flows and the registry that holds them

pub mod cart_optimizer;
pub mod chat;
pub mod listing_generator;
pub mod pricing_assistant;
pub mod product_discovery;

use std::sync::Arc;

use crate::domain::flow::{FlowDefinition, FlowError, FlowSummary};

pub use cart_optimizer::{CartOptimizerInput, CartOptimizerOutput, CartSuggestion};
pub use chat::{ChatInput, ChatOutput};
pub use listing_generator::{ListingInput, ListingOutput};
pub use pricing_assistant::{PricingInput, PricingOutput};
pub use product_discovery::{Product, ProductDiscoveryInput, ProductDiscoveryOutput};

/// Read-only set of flow definitions, looked up by name
#[derive(Debug, Clone, Default)]
pub struct FlowRegistry {
    flows: Vec<Arc<FlowDefinition>>,
}

impl FlowRegistry {
    /// Build every built-in flow; fails if any template does not match its schema
    pub fn builtin() -> Result<Self, FlowError> {
        Ok(Self::default()
            .with(chat::definition()?)
            .with(product_discovery::definition()?)
            .with(cart_optimizer::definition()?)
            .with(pricing_assistant::definition()?)
            .with(listing_generator::definition()?))
    }

    /// Add a flow, replacing any flow with the same name
    pub fn with(mut self, flow: FlowDefinition) -> Self {
        self.flows.retain(|f| f.name() != flow.name());
        self.flows.push(Arc::new(flow));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<FlowDefinition>> {
        self.flows.iter().find(|f| f.name() == name).cloned()
    }

    /// Look up a flow, failing with `UnknownFlow`
    pub fn require(&self, name: &str) -> Result<Arc<FlowDefinition>, FlowError> {
        self.get(name).ok_or_else(|| FlowError::unknown_flow(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.flows.iter().map(|f| f.name()).collect()
    }

    pub fn summaries(&self) -> Vec<FlowSummary> {
        self.flows.iter().map(|f| f.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}
