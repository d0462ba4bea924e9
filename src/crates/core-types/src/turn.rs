use serde::{Deserialize, Serialize};

use crate::event::ParsedEvent;

/// One rendered conversational exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderableTurn {
    UserTurn {
        content: String,
    },
    SimpleBotTurn {
        text: String,
    },
    /// Never carries both an empty thought sequence and no final answer.
    ComplexBotTurn {
        thought_sequence: Vec<ParsedEvent>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        final_answer: Option<String>,
    },
}

impl RenderableTurn {
    pub fn is_user(&self) -> bool {
        matches!(self, RenderableTurn::UserTurn { .. })
    }

    pub fn final_answer(&self) -> Option<&str> {
        match self {
            RenderableTurn::ComplexBotTurn { final_answer, .. } => final_answer.as_deref(),
            _ => None,
        }
    }

    pub fn thought_sequence(&self) -> &[ParsedEvent] {
        match self {
            RenderableTurn::ComplexBotTurn {
                thought_sequence, ..
            } => thought_sequence,
            _ => &[],
        }
    }
}
