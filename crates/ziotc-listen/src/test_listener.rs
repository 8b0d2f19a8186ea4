//! Synthetic generator listener
//!
//! Emits one artificial tag data event per timer tick with a
//! random-walked peak RSSI, serialized to the exact JSON shape the
//! reader produces and pushed through the same ingestion entry point as
//! live traffic. No hardware, no network; useful for development, demos,
//! and exercising the decoder end to end.

use crate::counters::ListenerCounters;
use async_trait::async_trait;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use ziotc_core::{DecodingOptions, Listener, ListenerError, ListenerResult, ListenerStats};
use ziotc_decode::ZiotcDecoder;

const DEFAULT_PERIOD_MS: u64 = 1000;
const DEFAULT_RSSI: i32 = -7000;
const MIN_RSSI: i32 = -8000;
const MAX_RSSI: i32 = -6000;
const RSSI_RANDOM_DELTA: i32 = 500;

/// Fixed origin label for synthetic payloads
const TEST_ORIGIN: &str = "test";

/// Fixed simulated reader address and tag identifier
const SIMULATED_MAC: &str = "C4:7D:CC:FF:FF:FF";
const SIMULATED_ID_HEX: &str = "7EDA9038051002710002C0AE";

/// Synthetic generator configuration
#[derive(Debug, Clone)]
pub struct TestListenerConfig {
    /// Interval between events in milliseconds
    pub period_ms: u64,

    /// Number of events to generate (0 = unbounded)
    pub event_count: u64,

    /// Options passed through to every `ingest` call
    pub decoding_options: DecodingOptions,
}

impl Default for TestListenerConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_PERIOD_MS,
            event_count: 0,
            decoding_options: DecodingOptions::default(),
        }
    }
}

/// Synthetic generator listener
pub struct TestListener {
    config: TestListenerConfig,
    decoder: Arc<ZiotcDecoder>,
    running: Arc<AtomicBool>,
    counters: Arc<ListenerCounters>,
}

impl TestListener {
    pub fn new(config: TestListenerConfig, decoder: Arc<ZiotcDecoder>) -> Self {
        Self {
            config,
            decoder,
            running: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(ListenerCounters::default()),
        }
    }
}

#[async_trait]
impl Listener for TestListener {
    fn name(&self) -> &str {
        "test-generator"
    }

    async fn start(&mut self) -> ListenerResult<()> {
        if self.running.load(Ordering::SeqCst) {
            return Err(ListenerError::AlreadyRunning);
        }
        // tokio::time::interval panics on a zero duration
        if self.config.period_ms == 0 {
            return Err(ListenerError::InvalidConfiguration(
                "generator period must be at least 1 ms".to_string(),
            ));
        }
        self.running.store(true, Ordering::SeqCst);

        info!(
            period_ms = self.config.period_ms,
            event_count = self.config.event_count,
            "starting synthetic generator"
        );

        let running = self.running.clone();
        let counters = self.counters.clone();
        let decoder = self.decoder.clone();
        let config = self.config.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(config.period_ms));
            let mut rssi = DEFAULT_RSSI;
            let mut event_num: u64 = 0;

            while running.load(Ordering::SeqCst) {
                interval.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if config.event_count > 0 && event_num >= config.event_count {
                    break;
                }
                event_num += 1;
                rssi = step_simulated_rssi(rssi, &mut rand::thread_rng());

                let now = chrono::Utc::now();
                let tag_data_event = serde_json::json!({
                    "type": "SIMPLE",
                    "timestamp": now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                    "data": {
                        "MAC": SIMULATED_MAC,
                        "antenna": 1,
                        "eventNum": event_num,
                        "format": "epc",
                        "idHex": SIMULATED_ID_HEX,
                        "peakRssi": rssi,
                        "reads": 1
                    }
                });

                let payload = tag_data_event.to_string();
                counters.record_payload(payload.len());
                decoder.ingest(
                    payload.as_bytes(),
                    TEST_ORIGIN,
                    now.timestamp_millis(),
                    &config.decoding_options,
                );
            }

            running.store(false, Ordering::SeqCst);
            info!(events = event_num, "synthetic generator stopped");
        });

        Ok(())
    }

    async fn stop(&mut self) -> ListenerResult<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn stats(&self) -> ListenerStats {
        self.counters.snapshot()
    }
}

/// One step of the simulated RSSI walk: add a uniform delta in
/// [-RSSI_RANDOM_DELTA/2, RSSI_RANDOM_DELTA/2), then clamp to the
/// simulated window.
fn step_simulated_rssi(rssi: i32, rng: &mut impl Rng) -> i32 {
    let delta = rng.gen_range(-(RSSI_RANDOM_DELTA / 2)..(RSSI_RANDOM_DELTA / 2));
    (rssi + delta).clamp(MIN_RSSI, MAX_RSSI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use ziotc_core::{IdentifierType, Raddec, RaddecSink};

    #[derive(Default)]
    struct RecordingSink {
        records: Mutex<Vec<Raddec>>,
    }

    impl RecordingSink {
        fn records(&self) -> Vec<Raddec> {
            self.records.lock().unwrap().clone()
        }
    }

    impl RaddecSink for RecordingSink {
        fn accept(&self, raddec: Raddec) {
            self.records.lock().unwrap().push(raddec);
        }
    }

    #[test]
    fn walk_stays_bounded_with_small_steps() {
        let mut rng = rand::thread_rng();
        let mut rssi = DEFAULT_RSSI;

        for _ in 0..10_000 {
            let next = step_simulated_rssi(rssi, &mut rng);
            assert!((MIN_RSSI..=MAX_RSSI).contains(&next));
            assert!((next - rssi).abs() <= RSSI_RANDOM_DELTA / 2);
            rssi = next;
        }
    }

    #[tokio::test]
    async fn generated_events_flow_through_the_decoder() {
        let sink = Arc::new(RecordingSink::default());
        let decoder = Arc::new(ZiotcDecoder::new(sink.clone()));
        let config = TestListenerConfig {
            period_ms: 5,
            event_count: 4,
            ..Default::default()
        };
        let mut listener = TestListener::new(config, decoder.clone());

        listener.start().await.unwrap();
        for _ in 0..200 {
            if !listener.is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!listener.is_running());

        let records = sink.records();
        assert_eq!(records.len(), 4);
        for record in &records {
            assert_eq!(record.transmitter_id, "7eda9038051002710002c0ae");
            assert_eq!(record.transmitter_id_type, IdentifierType::Epc96);
            assert_eq!(record.rssi_signature.len(), 1);
            let entry = &record.rssi_signature[0];
            assert_eq!(entry.receiver_id, "c47dccffffff");
            assert_eq!(entry.receiver_id_type, IdentifierType::Eui48);
            assert_eq!(entry.receiver_antenna, 1);
            assert!((MIN_RSSI..=MAX_RSSI).contains(&entry.rssi));
            assert_eq!(entry.number_of_decodings, 1);
        }
        assert_eq!(decoder.stats().records_emitted, 4);
        assert_eq!(listener.stats().payloads_forwarded, 4);
    }

    #[tokio::test]
    async fn zero_period_is_rejected() {
        let sink = Arc::new(RecordingSink::default());
        let decoder = Arc::new(ZiotcDecoder::new(sink.clone()));
        let config = TestListenerConfig {
            period_ms: 0,
            event_count: 3,
            ..Default::default()
        };
        let mut listener = TestListener::new(config, decoder);

        let result = listener.start().await;
        assert!(matches!(result, Err(ListenerError::InvalidConfiguration(_))));
        assert!(!listener.is_running());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn stop_halts_the_timer() {
        let sink = Arc::new(RecordingSink::default());
        let decoder = Arc::new(ZiotcDecoder::new(sink.clone()));
        let config = TestListenerConfig {
            period_ms: 5,
            event_count: 0,
            ..Default::default()
        };
        let mut listener = TestListener::new(config, decoder);

        listener.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        listener.stop().await.unwrap();

        // Let any in-flight tick finish before taking the baseline
        tokio::time::sleep(Duration::from_millis(20)).await;
        let baseline = sink.records().len();
        assert!(baseline > 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.records().len(), baseline);
    }
}
