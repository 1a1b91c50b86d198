use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::turn::ConversationTurn;

/// Append-only transcript of one chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    id: Uuid,
    turns: Vec<ConversationTurn>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            turns: Vec::new(),
        }
    }

    /// Resume a transcript held by a client
    pub fn from_turns(turns: Vec<ConversationTurn>) -> Self {
        Self {
            id: Uuid::new_v4(),
            turns,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn into_turns(self) -> Vec<ConversationTurn> {
        self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// One line per turn, oldest first
    pub fn history_text(&self) -> String {
        self.turns
            .iter()
            .map(ConversationTurn::history_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}
