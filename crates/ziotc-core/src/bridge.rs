//! Listener orchestration
//!
//! The bridge owns the set of transport listeners wired to one decoder
//! and drives their lifecycle. It contains no decoding logic of its own.

use crate::listener::{Listener, ListenerResult, ListenerStats};
use tracing::{info, warn};

/// Owns registered listeners and manages their lifecycle
#[derive(Default)]
pub struct Bridge {
    listeners: Vec<Box<dyn Listener>>,
}

impl Bridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Listeners start in registration order and
    /// stop in reverse order.
    pub fn add_listener(&mut self, listener: Box<dyn Listener>) {
        self.listeners.push(listener);
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Whether any registered listener is currently running
    pub fn any_running(&self) -> bool {
        self.listeners.iter().any(|listener| listener.is_running())
    }

    /// Start every registered listener, in registration order.
    ///
    /// On failure the error propagates immediately; listeners already
    /// started keep running until `stop_all`.
    pub async fn start_all(&mut self) -> ListenerResult<()> {
        for listener in self.listeners.iter_mut() {
            listener.start().await?;
            info!(listener = listener.name(), "listener started");
        }
        Ok(())
    }

    /// Stop every listener in reverse registration order. Stop failures
    /// are logged, not raised, so one bad listener cannot block the rest
    /// of shutdown.
    pub async fn stop_all(&mut self) {
        for listener in self.listeners.iter_mut().rev() {
            if let Err(e) = listener.stop().await {
                warn!(listener = listener.name(), error = %e, "listener stop failed");
            } else {
                info!(listener = listener.name(), "listener stopped");
            }
        }
    }

    /// Aggregate statistics across all listeners
    pub fn stats(&self) -> ListenerStats {
        let mut total = ListenerStats::default();
        for listener in &self.listeners {
            let stats = listener.stats();
            total.payloads_forwarded += stats.payloads_forwarded;
            total.bytes_forwarded += stats.bytes_forwarded;
            total.transport_errors += stats.transport_errors;
        }
        total
    }
}
