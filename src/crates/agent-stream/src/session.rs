use crate::decoder::{decode, decode_delimited, Decoded};
use datapilot_core_types::ParsedEvent;
use log::{trace, warn};

/// Owns the buffer of one decode session.
///
/// Every pushed chunk is appended to the buffer and the buffer is re-decoded;
/// only the unconsumed remainder is kept between chunks. The last record stays
/// buffered until a header or a blank line follows it, or until [`finish`],
/// so a record split between data lines is never emitted half-filled.
///
/// [`finish`]: DecodeSession::finish
#[derive(Debug, Default)]
pub struct DecodeSession {
    buffer: String,
}

impl DecodeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns the events it completed, in arrival order.
    pub fn push(&mut self, chunk: &str) -> Vec<ParsedEvent> {
        trace!("Decode chunk: {:?}", chunk);
        self.buffer.push_str(chunk);
        let Decoded { events, remainder } = decode_delimited(&self.buffer);
        self.buffer = remainder;
        events
    }

    /// Text received but not yet part of a complete record.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Releases the held-back last record if its data lines are complete.
    ///
    /// Used when the stream stops early (abort, transport error); unlike
    /// [`finish`](Self::finish) no newline is added, so a half-received line
    /// stays buffered.
    pub fn drain(&mut self) -> Vec<ParsedEvent> {
        let Decoded { events, remainder } = decode(&self.buffer);
        self.buffer = remainder;
        events
    }

    /// Ends the session after the transport completed normally.
    ///
    /// The buffered last record is decoded, even when its last data line lacks
    /// the terminating newline; anything else left over is dropped.
    pub fn finish(mut self) -> Vec<ParsedEvent> {
        if self.buffer.is_empty() {
            return Vec::new();
        }
        if !self.buffer.ends_with('\n') {
            self.buffer.push('\n');
        }
        let Decoded { events, remainder } = decode(&self.buffer);
        if !remainder.trim().is_empty() {
            warn!(
                "Dropping incomplete event text at end of stream: len={}",
                remainder.len()
            );
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datapilot_core_types::EventKind;

    #[test]
    fn push_keeps_only_remainder() {
        let mut session = DecodeSession::new();
        assert!(session.push("event: thought\ndata: Thou").is_empty());
        assert_eq!(session.buffered(), "event: thought\ndata: Thou");

        assert!(session.push("ght: scan table\n").is_empty());
        let events = session.push("\nevent: final\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Thought);
        assert_eq!(session.buffered(), "event: final\n");
    }

    #[test]
    fn record_split_between_data_lines_keeps_every_line() {
        let mut session = DecodeSession::new();
        assert!(session
            .push("event: results\ndata: Results: region, total\n")
            .is_empty());
        assert!(session.push("data: EMEA, 10\n").is_empty());
        let events = session.push("event: final\ndata: [Final Answer]: EMEA\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Results);
        assert_eq!(events[0].blocks[0].content, "region, total\nEMEA, 10");

        let tail = session.finish();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].final_answer.as_deref(), Some("EMEA"));
    }

    #[test]
    fn drain_releases_held_record_but_not_partial_line() {
        let mut session = DecodeSession::new();
        assert!(session
            .push("event: thought\ndata: Thought: scanning\n")
            .is_empty());
        let drained = session.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].kind, EventKind::Thought);
        assert_eq!(session.buffered(), "");

        session.push("event: action\ndata: Action: sum");
        assert!(session.drain().is_empty());
        assert_eq!(session.buffered(), "event: action\ndata: Action: sum");
    }

    #[test]
    fn finish_flushes_record_missing_trailing_newline() {
        let mut session = DecodeSession::new();
        assert!(session.push("event: final\ndata: [Final Answer]: 7").is_empty());
        let events = session.finish();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Final);
        assert_eq!(events[0].final_answer.as_deref(), Some("7"));
    }

    #[test]
    fn finish_drops_header_without_payload() {
        let mut session = DecodeSession::new();
        session.push("event: thought\n");
        assert!(session.finish().is_empty());
    }
}
