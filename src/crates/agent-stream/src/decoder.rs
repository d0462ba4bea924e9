//! Stream decoder
//!
//! Wire format: records made of one `event: <kind>` header line followed by
//! `data:` payload lines. A record is complete once it is followed by another
//! header or a blank line, or once it ends with a newline-terminated data line
//! (the last rule does not apply to [`decode_delimited`]). Everything else stays
//! in the remainder so the caller can retry after the next chunk arrives.

use datapilot_core_types::{BlockLabel, EventKind, LabeledBlock, ParsedEvent};
use log::{trace, warn};
use regex::Regex;
use std::sync::OnceLock;

pub const EVENT_HEADER: &str = "event:";
pub const DATA_MARKER: &str = "data:";
pub const FINAL_ANSWER_MARKER: &str = "[Final Answer]";

static LABEL_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Output of one `decode` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub events: Vec<ParsedEvent>,
    /// Unconsumed suffix of the input, verbatim.
    pub remainder: String,
}

struct PendingRecord<'a> {
    start: usize,
    kind_token: &'a str,
    data: Vec<&'a str>,
}

impl PendingRecord<'_> {
    fn into_event(self) -> Option<ParsedEvent> {
        let Some(kind) = EventKind::parse(self.kind_token) else {
            warn!(
                "Dropping event record with unrecognized kind: kind={:?}",
                self.kind_token
            );
            return None;
        };
        Some(parse_payload(kind, &self.data.join("\n")))
    }
}

/// Extracts every complete event record from `buffer`.
///
/// Pure and total: the same input always yields the same output, and malformed
/// segments are dropped rather than reported.
pub fn decode(buffer: &str) -> Decoded {
    decode_records(buffer, true)
}

/// Like [`decode`], but a trailing record is only emitted once a header or a
/// blank line follows it, since later chunks may still add data lines to it.
pub fn decode_delimited(buffer: &str) -> Decoded {
    decode_records(buffer, false)
}

fn decode_records(buffer: &str, emit_trailing: bool) -> Decoded {
    let mut events = Vec::new();
    let mut pending: Option<PendingRecord<'_>> = None;
    let mut offset = 0;
    let mut partial_start = buffer.len();

    for piece in buffer.split_inclusive('\n') {
        let line_start = offset;
        offset += piece.len();
        let Some(line) = piece.strip_suffix('\n') else {
            partial_start = line_start;
            break;
        };
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(kind_token) = header_token(line) {
            if let Some(record) = pending.take() {
                events.extend(record.into_event());
            }
            pending = Some(PendingRecord {
                start: line_start,
                kind_token,
                data: Vec::new(),
            });
        } else if line.trim().is_empty() {
            if let Some(record) = pending.take() {
                events.extend(record.into_event());
            }
        } else if let Some(record) = pending.as_mut() {
            match data_payload(line) {
                Some(payload) => record.data.push(payload),
                None => trace!("Ignoring non-data line inside event record: {:?}", line),
            }
        } else {
            warn!("Dropping line outside any event record: {:?}", line);
        }
    }

    let remainder_start = match pending {
        Some(record)
            if emit_trailing && partial_start == buffer.len() && !record.data.is_empty() =>
        {
            events.extend(record.into_event());
            buffer.len()
        }
        Some(record) => record.start,
        None => partial_start,
    };

    Decoded {
        events,
        remainder: buffer[remainder_start..].to_string(),
    }
}

fn header_token(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let head = trimmed.get(..EVENT_HEADER.len())?;
    head.eq_ignore_ascii_case(EVENT_HEADER)
        .then(|| trimmed[EVENT_HEADER.len()..].trim())
}

fn data_payload(line: &str) -> Option<&str> {
    let head = line.get(..DATA_MARKER.len())?;
    if !head.eq_ignore_ascii_case(DATA_MARKER) {
        return None;
    }
    let rest = &line[DATA_MARKER.len()..];
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

fn label_pattern() -> &'static Regex {
    LABEL_PATTERN.get_or_init(|| {
        let alternatives = BlockLabel::VOCABULARY
            .iter()
            .map(|label| regex::escape(label.as_str()))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!("(?i)(?:{}):", alternatives))
            .expect("label vocabulary is a valid pattern")
    })
}

/// Splits one reconstructed payload into labeled blocks.
pub fn parse_payload(kind: EventKind, payload: &str) -> ParsedEvent {
    let labels: Vec<(usize, usize, BlockLabel)> = label_pattern()
        .find_iter(payload)
        .filter_map(|m| {
            BlockLabel::from_token(m.as_str().trim_end_matches(':'))
                .map(|label| (m.start(), m.end(), label))
        })
        .collect();

    let mut blocks = Vec::with_capacity(labels.len() + 1);

    let leading_end = labels
        .first()
        .map(|(start, _, _)| *start)
        .unwrap_or(payload.len());
    let leading = payload[..leading_end].trim();
    if !leading.is_empty() {
        let label = if kind == EventKind::Data {
            BlockLabel::Data
        } else {
            BlockLabel::Summary
        };
        blocks.push(LabeledBlock::new(label, leading));
    }

    for (index, (_, content_start, label)) in labels.iter().enumerate() {
        let content_end = labels
            .get(index + 1)
            .map(|(start, _, _)| *start)
            .unwrap_or(payload.len());
        blocks.push(LabeledBlock::new(
            *label,
            payload[*content_start..content_end].trim(),
        ));
    }

    let event = ParsedEvent::new(kind, blocks);
    if kind == EventKind::Final {
        route_final_answer(event)
    } else {
        event
    }
}

fn route_final_answer(mut event: ParsedEvent) -> ParsedEvent {
    let mut answers = Vec::new();
    event.blocks.retain(|block| {
        let answer = match block.label {
            BlockLabel::FinalAnswer => {
                Some(strip_final_marker(&block.content).unwrap_or(&block.content))
            }
            _ => strip_final_marker(&block.content),
        };
        match answer {
            Some(answer) => {
                answers.push(answer.to_string());
                false
            }
            None => true,
        }
    });
    if !answers.is_empty() {
        event.final_answer = Some(answers.join("\n"));
    }
    event
}

/// Returns the answer text when `content` begins with the bracketed marker.
pub fn strip_final_marker(content: &str) -> Option<&str> {
    let head = content.get(..FINAL_ANSWER_MARKER.len())?;
    if !head.eq_ignore_ascii_case(FINAL_ANSWER_MARKER) {
        return None;
    }
    let rest = content[FINAL_ANSWER_MARKER.len()..].trim_start();
    Some(rest.strip_prefix(':').unwrap_or(rest).trim())
}
