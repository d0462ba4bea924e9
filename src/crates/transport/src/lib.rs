/// DataPilot Transport Layer
///
/// Delivers the raw text of a remote task run as an ordered stream of chunks:
/// - HTTP (streaming response body via reqwest)
/// - Scripted (in-memory chunks for replay and tests)
///
/// Transports never interpret the text they carry.
pub mod error;
pub mod http;
pub mod scripted;
pub mod traits;
pub mod utf8;

pub use error::TransportError;
pub use http::{HttpTransport, HttpTransportConfig};
pub use scripted::{ScriptStep, ScriptedTransport};
pub use traits::{ChunkStream, StreamRequest, Transport};
pub use utf8::Utf8ChunkDecoder;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
