//! Flow engine

mod engine;

pub use engine::{FlowEngine, FlowEngineConfig};
