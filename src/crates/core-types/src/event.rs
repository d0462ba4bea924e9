use serde::{Deserialize, Serialize};

/// Kind of an event record, named by the `event:` header line on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Started,
    Thought,
    Action,
    Results,
    Final,
    Summary,
    /// Raw tabular/result payload; unlabeled text becomes a `Data` block.
    Data,
    /// Plain conversational reply without a thought sequence.
    Message,
    /// Echo of a user submission.
    User,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 10] = [
        EventKind::Started,
        EventKind::Thought,
        EventKind::Action,
        EventKind::Results,
        EventKind::Final,
        EventKind::Summary,
        EventKind::Data,
        EventKind::Message,
        EventKind::User,
        EventKind::Error,
    ];

    /// Parses a wire token, ignoring case and surrounding whitespace.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(token))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Started => "started",
            EventKind::Thought => "thought",
            EventKind::Action => "action",
            EventKind::Results => "results",
            EventKind::Final => "final",
            EventKind::Summary => "summary",
            EventKind::Data => "data",
            EventKind::Message => "message",
            EventKind::User => "user",
            EventKind::Error => "error",
        }
    }

    pub fn origin(&self) -> Origin {
        match self {
            EventKind::User => Origin::User,
            _ => Origin::Bot,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    User,
    Bot,
}

/// Label attached to one payload section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockLabel {
    Thought,
    Action,
    Results,
    FinalAnswer,
    Summary,
    Data,
}

impl BlockLabel {
    /// Labels that can appear as `Label:` tokens inside a payload, in vocabulary order.
    pub const VOCABULARY: [BlockLabel; 4] = [
        BlockLabel::Thought,
        BlockLabel::Action,
        BlockLabel::Results,
        BlockLabel::FinalAnswer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockLabel::Thought => "Thought",
            BlockLabel::Action => "Action",
            BlockLabel::Results => "Results",
            BlockLabel::FinalAnswer => "Final Answer",
            BlockLabel::Summary => "Summary",
            BlockLabel::Data => "Data",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::VOCABULARY
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(token.trim()))
    }
}

impl std::fmt::Display for BlockLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledBlock {
    pub label: BlockLabel,
    pub content: String,
}

impl LabeledBlock {
    pub fn new(label: BlockLabel, content: impl Into<String>) -> Self {
        Self {
            label,
            content: content.into(),
        }
    }
}

/// One decoded event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedEvent {
    pub kind: EventKind,
    pub origin: Origin,
    pub blocks: Vec<LabeledBlock>,
    /// Answer text routed out of a terminal `final` event, marker already stripped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
}

impl ParsedEvent {
    pub fn new(kind: EventKind, blocks: Vec<LabeledBlock>) -> Self {
        Self {
            kind,
            origin: kind.origin(),
            blocks,
            final_answer: None,
        }
    }

    /// Event standing for a user submission.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(
            EventKind::User,
            vec![LabeledBlock::new(BlockLabel::Summary, content)],
        )
    }

    pub fn with_final_answer(mut self, answer: impl Into<String>) -> Self {
        self.final_answer = Some(answer.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.final_answer.is_none()
    }

    pub fn is_user(&self) -> bool {
        self.origin == Origin::User
    }

    pub fn carries_final_answer(&self) -> bool {
        self.final_answer.is_some()
            || self
                .blocks
                .iter()
                .any(|block| block.label == BlockLabel::FinalAnswer)
    }

    /// Block contents joined by newlines.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(|block| block.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
