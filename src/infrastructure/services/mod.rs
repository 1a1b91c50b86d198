//! Infrastructure services

mod chat_service;
mod flow_service;

pub use chat_service::ChatService;
pub use flow_service::FlowService;
