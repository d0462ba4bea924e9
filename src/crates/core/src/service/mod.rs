//! Service layer

pub mod config;

pub use config::{BackendConfig, DataPilotConfig, ExecutionConfig};
