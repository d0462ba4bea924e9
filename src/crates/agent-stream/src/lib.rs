//! Agent stream processing
//!
//! Turns the chunked text stream of a backend task run into decoded event records
//! (`decoder`) and groups those records into renderable conversational turns
//! (`aggregator`). Both stages are total: malformed input is dropped or retained,
//! never reported as an error.

pub mod aggregator;
pub mod decoder;
pub mod session;

pub use aggregator::{aggregate, TurnAggregator};
pub use decoder::{
    decode, decode_delimited, Decoded, DATA_MARKER, EVENT_HEADER, FINAL_ANSWER_MARKER,
};
pub use session::DecodeSession;

pub use datapilot_core_types::{
    BlockLabel, EventKind, LabeledBlock, Origin, ParsedEvent, RenderableTurn,
};
