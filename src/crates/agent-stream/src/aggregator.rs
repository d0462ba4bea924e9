//! Turn aggregation
//!
//! Groups decoded events into conversational turns. Bot events accumulate into
//! one open complex turn until a final answer, a user event, a plain message or
//! the end of the stream closes it.

use datapilot_core_types::{BlockLabel, EventKind, Origin, ParsedEvent, RenderableTurn};

#[derive(Debug, Clone, Default)]
pub struct TurnAggregator {
    turns: Vec<RenderableTurn>,
    open: Vec<ParsedEvent>,
}

impl TurnAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one event and returns the turns it closed.
    pub fn push(&mut self, event: ParsedEvent) -> &[RenderableTurn] {
        let closed_from = self.turns.len();

        match event.origin {
            Origin::User => {
                self.flush();
                self.turns.push(RenderableTurn::UserTurn {
                    content: event.text(),
                });
            }
            Origin::Bot if event.carries_final_answer() => {
                let (rest, answer) = split_final_answer(event);
                if let Some(rest) = rest {
                    self.open.push(rest);
                }
                self.close(Some(answer));
            }
            Origin::Bot if event.kind == EventKind::Message => {
                self.flush();
                self.turns.push(RenderableTurn::SimpleBotTurn { text: event.text() });
            }
            Origin::Bot => self.open.push(event),
        }

        &self.turns[closed_from..]
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = ParsedEvent>) {
        for event in events {
            self.push(event);
        }
    }

    /// Closes the open accumulator, if it holds anything.
    pub fn flush(&mut self) {
        self.close(None);
    }

    /// Turns closed so far, excluding the open accumulator.
    pub fn turns(&self) -> &[RenderableTurn] {
        &self.turns
    }

    pub fn open_events(&self) -> &[ParsedEvent] {
        &self.open
    }

    /// Closed turns plus the open accumulator rendered as a provisional turn.
    ///
    /// Equal to `aggregate` over every event pushed so far.
    pub fn render(&self) -> Vec<RenderableTurn> {
        let mut turns = self.turns.clone();
        if !self.open.is_empty() {
            turns.push(RenderableTurn::ComplexBotTurn {
                thought_sequence: self.open.clone(),
                final_answer: None,
            });
        }
        turns
    }

    pub fn finish(mut self) -> Vec<RenderableTurn> {
        self.flush();
        self.turns
    }

    fn close(&mut self, final_answer: Option<String>) {
        if self.open.is_empty() && final_answer.is_none() {
            return;
        }
        self.turns.push(RenderableTurn::ComplexBotTurn {
            thought_sequence: std::mem::take(&mut self.open),
            final_answer,
        });
    }
}

/// Aggregates a complete event history in one call.
pub fn aggregate(events: &[ParsedEvent]) -> Vec<RenderableTurn> {
    let mut aggregator = TurnAggregator::new();
    aggregator.extend(events.iter().cloned());
    aggregator.finish()
}

/// Separates the answer from an event; returns the event without it, if anything is left.
fn split_final_answer(mut event: ParsedEvent) -> (Option<ParsedEvent>, String) {
    let mut parts: Vec<String> = event.final_answer.take().into_iter().collect();
    event.blocks.retain(|block| {
        if block.label == BlockLabel::FinalAnswer {
            parts.push(block.content.clone());
            false
        } else {
            true
        }
    });
    let rest = (!event.blocks.is_empty()).then_some(event);
    (rest, parts.join("\n"))
}
