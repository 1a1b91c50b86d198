//! Flow domain: definitions, errors and the executor capability

mod definition;
mod error;
mod executor;

pub use definition::{FlowDefinition, FlowDefinitionBuilder, FlowSummary};
pub use error::FlowError;
pub use executor::{FlowExecutor, FlowExecutorExt};
