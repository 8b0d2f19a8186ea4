//! Console sink
//!
//! Prints each record to stdout, compact (one JSON document per line,
//! pipeable) or pretty printed for humans.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;
use ziotc_core::{Raddec, RaddecSink};

/// Console sink
pub struct ConsoleSink {
    pretty: bool,
    records_written: AtomicU64,
}

impl ConsoleSink {
    pub fn new(pretty: bool) -> Self {
        Self {
            pretty,
            records_written: AtomicU64::new(0),
        }
    }

    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }
}

impl RaddecSink for ConsoleSink {
    fn accept(&self, raddec: Raddec) {
        let json = if self.pretty {
            serde_json::to_string_pretty(&raddec)
        } else {
            serde_json::to_string(&raddec)
        };

        match json {
            Ok(json) => {
                println!("{}", json);
                self.records_written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => warn!("Failed to serialize raddec: {}", e),
        }
    }
}
