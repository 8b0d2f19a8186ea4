//! Shared atomic counters behind every listener's `stats()`

use std::sync::atomic::{AtomicU64, Ordering};
use ziotc_core::ListenerStats;

#[derive(Default)]
pub(crate) struct ListenerCounters {
    payloads_forwarded: AtomicU64,
    bytes_forwarded: AtomicU64,
    transport_errors: AtomicU64,
}

impl ListenerCounters {
    pub(crate) fn record_payload(&self, bytes: usize) {
        self.payloads_forwarded.fetch_add(1, Ordering::Relaxed);
        self.bytes_forwarded.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ListenerStats {
        ListenerStats {
            payloads_forwarded: self.payloads_forwarded.load(Ordering::Relaxed),
            bytes_forwarded: self.bytes_forwarded.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
        }
    }
}
