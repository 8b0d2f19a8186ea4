//! Raddec sinks for the ziotc bridge
//!
//! Sinks receive the decoded records the bridge produces. The `accept`
//! path is infallible by contract, so each sink absorbs and counts its
//! own failures; constructors are where configuration problems surface.

use thiserror::Error;

pub mod console;
pub mod jsonl;

pub use console::ConsoleSink;
pub use jsonl::{JsonlSink, JsonlSinkConfig};

/// Sink error type
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Sink operation failed: {0}")]
    OperationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SinkResult<T> = Result<T, SinkError>;
