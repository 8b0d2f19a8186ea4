//! JSONL file sink

use crate::{SinkError, SinkResult};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{info, warn};
use ziotc_core::{Raddec, RaddecSink};

/// JSONL sink configuration
#[derive(Debug, Clone)]
pub struct JsonlSinkConfig {
    /// Output file path
    pub path: PathBuf,

    /// Whether to append to an existing file
    pub append: bool,

    /// Pretty print JSON (not recommended for large files)
    pub pretty: bool,

    /// Flush after each write
    pub flush_each: bool,
}

impl Default for JsonlSinkConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/tmp/ziotc-raddecs.jsonl"),
            append: true,
            pretty: false,
            flush_each: true,
        }
    }
}

/// JSONL file sink
pub struct JsonlSink {
    config: JsonlSinkConfig,
    writer: Mutex<BufWriter<File>>,
    records_written: AtomicU64,
    write_errors: AtomicU64,
}

impl JsonlSink {
    /// Open the output file up front so configuration problems surface
    /// before any traffic flows.
    pub fn open(config: JsonlSinkConfig) -> SinkResult<Self> {
        let file = if config.append {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.path)?
        } else {
            File::create(&config.path)?
        };

        info!("JSONL sink writing to: {:?}", config.path);

        Ok(Self {
            config,
            writer: Mutex::new(BufWriter::new(file)),
            records_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        })
    }

    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    /// Flush buffered records to disk
    pub fn flush(&self) -> SinkResult<()> {
        let mut w = self
            .writer
            .lock()
            .map_err(|e| SinkError::OperationFailed(format!("Lock poisoned: {}", e)))?;
        w.flush()?;
        Ok(())
    }

    fn write_record(&self, raddec: &Raddec) -> SinkResult<()> {
        let json = if self.config.pretty {
            serde_json::to_string_pretty(raddec)?
        } else {
            serde_json::to_string(raddec)?
        };

        let mut w = self
            .writer
            .lock()
            .map_err(|e| SinkError::OperationFailed(format!("Lock poisoned: {}", e)))?;

        writeln!(w, "{}", json)?;

        if self.config.flush_each {
            w.flush()?;
        }

        self.records_written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl RaddecSink for JsonlSink {
    fn accept(&self, raddec: Raddec) {
        if let Err(e) = self.write_record(&raddec) {
            self.write_errors.fetch_add(1, Ordering::Relaxed);
            warn!("Failed to write raddec: {}", e);
        }
    }
}
