//! Error types shared by the core layers

use datapilot_transport::TransportError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataPilotError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Stream stalled: no chunk received within {0:?}")]
    Stalled(Duration),

    #[error("Backend reported an error: {0}")]
    Backend(String),

    #[error("Execution busy: {0}")]
    Busy(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DataPilotError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DataPilotError::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        DataPilotError::Config(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        DataPilotError::NotFound(msg.into())
    }
}

pub type DataPilotResult<T> = Result<T, DataPilotError>;
