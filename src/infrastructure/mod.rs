//! Infrastructure layer - External service implementations

pub mod flow;
pub mod llm;
pub mod logging;
pub mod services;
