//! Chat conversation state

mod session;
mod turn;

pub use session::ConversationSession;
pub use turn::{ConversationTurn, Speaker};

/// Assistant turn recorded when a chat round trip fails
pub const APOLOGY_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";
