//! Transport listener trait and error type
//!
//! Every transport variant (pub/sub subscriber, streaming-socket client,
//! synthetic generator) implements `Listener`. A listener owns exactly
//! one connection or timer task and forwards raw payloads into the
//! decoder; it never interprets them.

use async_trait::async_trait;
use thiserror::Error;

/// Listener error type
#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("Listener already running")]
    AlreadyRunning,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    #[error("Invalid listener configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ListenerResult<T> = Result<T, ListenerError>;

/// Listener statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerStats {
    /// Payloads forwarded to the decoder
    pub payloads_forwarded: u64,
    /// Bytes forwarded to the decoder
    pub bytes_forwarded: u64,
    /// Transport errors observed (logged, not raised)
    pub transport_errors: u64,
}

/// Transport listener - owns one connection/timer and feeds the decoder
#[async_trait]
pub trait Listener: Send + Sync {
    /// Listener name, for logs
    fn name(&self) -> &str;

    /// Start the listener's connection/timer task.
    ///
    /// Starting an already-running listener is an error.
    async fn start(&mut self) -> ListenerResult<()>;

    /// Signal the task to stop and close the underlying connection
    /// where the client exposes one.
    async fn stop(&mut self) -> ListenerResult<()>;

    /// Whether the listener task is running
    fn is_running(&self) -> bool;

    /// Get listener statistics
    fn stats(&self) -> ListenerStats {
        ListenerStats::default()
    }
}
