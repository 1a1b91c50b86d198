//! Domain layer - Core business logic and entities

pub mod conversation;
pub mod error;
pub mod flow;
pub mod flows;
pub mod llm;
pub mod media;
pub mod safety;
pub mod schema;
pub mod template;

pub use conversation::{ConversationSession, ConversationTurn, Speaker};
pub use error::DomainError;
pub use flow::{FlowDefinition, FlowError, FlowExecutor, FlowExecutorExt, FlowSummary};
pub use flows::FlowRegistry;
pub use llm::{FinishReason, LlmProvider, LlmRequest, LlmResponse, Usage};
pub use safety::{BlockThreshold, HarmCategory, SafetyPolicy};
pub use schema::{FieldDescriptor, FieldType, Schema, SchemaViolation, ValidatedValue};
pub use template::{PromptPart, PromptTemplate, RenderedPrompt, TemplateError};
