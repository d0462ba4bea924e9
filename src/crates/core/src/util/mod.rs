pub mod errors;

pub use errors::{DataPilotError, DataPilotResult};

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
