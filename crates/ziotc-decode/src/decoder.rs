//! Tag data event decoder
//!
//! The single ingestion entry point for every transport listener. Each
//! payload chunk is split into tag data events, each event is mapped to
//! a normalized record, and each record is handed to the host sink, in
//! order. Nothing here returns an error: malformed input degrades to
//! fewer or emptier records, and the damage is visible in the counters.

use crate::extract::extract_tag_data_events;
use crate::tag_data::TagDataEvent;
use chrono::DateTime;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use ziotc_core::{DecodingOptions, IdentifierType, Raddec, RaddecSink, RssiSignatureEntry};

/// Decoder statistics snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct DecoderStats {
    /// Payload chunks ingested
    pub payloads_ingested: u64,
    /// Fragments the payloads split into
    pub fragments_seen: u64,
    /// Fragments dropped to parse failures
    pub fragments_dropped: u64,
    /// Parsed events skipped for lack of a tag identifier
    pub events_without_id: u64,
    /// Records handed to the sink
    pub records_emitted: u64,
}

#[derive(Default)]
struct DecoderCounters {
    payloads_ingested: AtomicU64,
    fragments_seen: AtomicU64,
    fragments_dropped: AtomicU64,
    events_without_id: AtomicU64,
    records_emitted: AtomicU64,
}

/// Decodes reader payloads into normalized records and forwards each to
/// the host sink
pub struct ZiotcDecoder {
    sink: Arc<dyn RaddecSink>,
    counters: DecoderCounters,
}

impl ZiotcDecoder {
    pub fn new(sink: Arc<dyn RaddecSink>) -> Self {
        Self {
            sink,
            counters: DecoderCounters::default(),
        }
    }

    /// Ingest one raw payload chunk.
    ///
    /// `origin` labels the transport the payload arrived on; `time` is
    /// the arrival time in epoch milliseconds, used when an event
    /// carries no usable timestamp of its own. Runs synchronously to
    /// completion and invokes the sink once per mapped record, in
    /// extraction order.
    pub fn ingest(&self, payload: &[u8], origin: &str, time: i64, options: &DecodingOptions) {
        // Options ride along for downstream integrations; nothing here
        // interprets them.
        let _ = options;

        self.counters.payloads_ingested.fetch_add(1, Ordering::Relaxed);

        let extraction = extract_tag_data_events(payload);
        self.counters
            .fragments_seen
            .fetch_add(extraction.fragments as u64, Ordering::Relaxed);
        if extraction.parse_failures > 0 {
            self.counters
                .fragments_dropped
                .fetch_add(extraction.parse_failures as u64, Ordering::Relaxed);
            debug!(
                origin,
                dropped = extraction.parse_failures,
                "dropped unparseable payload fragments"
            );
        }

        for event in &extraction.events {
            match map_tag_data_event(event, time) {
                Some(raddec) => {
                    self.counters.records_emitted.fetch_add(1, Ordering::Relaxed);
                    self.sink.accept(raddec);
                }
                None => {
                    self.counters
                        .events_without_id
                        .fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Get a statistics snapshot
    pub fn stats(&self) -> DecoderStats {
        DecoderStats {
            payloads_ingested: self.counters.payloads_ingested.load(Ordering::Relaxed),
            fragments_seen: self.counters.fragments_seen.load(Ordering::Relaxed),
            fragments_dropped: self.counters.fragments_dropped.load(Ordering::Relaxed),
            events_without_id: self.counters.events_without_id.load(Ordering::Relaxed),
            records_emitted: self.counters.records_emitted.load(Ordering::Relaxed),
        }
    }
}

/// Map one tag data event to a normalized record.
///
/// Returns `None` when the event carries no tag identifier. A record
/// gets a receiver observation only when the reader address, antenna,
/// and peak RSSI are all present; anything less yields a record with an
/// empty signature rather than a half-filled entry.
fn map_tag_data_event(event: &TagDataEvent, arrival_time: i64) -> Option<Raddec> {
    let data = event.data.as_ref()?;
    let id_hex = data.id_hex.as_deref()?;

    let transmitter_id = id_hex.to_lowercase();
    let transmitter_id_type = infer_transmitter_id_type(data.format.as_deref(), &transmitter_id);
    let timestamp = event
        .timestamp
        .as_deref()
        .and_then(parse_event_timestamp)
        .unwrap_or(arrival_time);

    let mut raddec = Raddec::new(transmitter_id, transmitter_id_type, timestamp);

    if let (Some(mac), Some(antenna), Some(peak_rssi)) =
        (data.mac.as_deref(), data.antenna, data.peak_rssi)
    {
        let receiver_id = mac.to_lowercase().replace(':', "");
        let mut entry =
            RssiSignatureEntry::new(receiver_id, IdentifierType::Eui48, antenna, peak_rssi);
        if let Some(reads) = data.reads {
            if reads > 1 {
                entry.number_of_decodings = reads;
            }
        }
        raddec.add_decoding(entry);
    }

    Some(raddec)
}

/// EPC-96 only when the reader labels the format `epc` and the
/// identifier is exactly the EPC-96 hex length; everything else is
/// unknown.
// TODO: map the reader's "tid" format once its hex length is pinned down
fn infer_transmitter_id_type(format: Option<&str>, id_hex: &str) -> IdentifierType {
    let is_epc96_length = IdentifierType::Epc96
        .length_in_bytes()
        .is_some_and(|bytes| id_hex.len() == bytes * 2);

    if format == Some("epc") && is_epc96_length {
        IdentifierType::Epc96
    } else {
        IdentifierType::Unknown
    }
}

/// Parse the reader's ISO-8601 timestamp to epoch milliseconds.
///
/// The reader reports colon-less offsets (`+0000`), which strict
/// RFC 3339 parsing rejects, so that form gets a second attempt.
fn parse_event_timestamp(timestamp: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(timestamp)
        .or_else(|_| DateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|parsed| parsed.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

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

    fn decoder() -> (ZiotcDecoder, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (ZiotcDecoder::new(sink.clone()), sink)
    }

    fn simple_event(id_hex: &str) -> String {
        format!(
            r#"{{"type":"SIMPLE","timestamp":"2025-01-01T00:00:00.000+0000","data":{{"idHex":"{}"}}}}"#,
            id_hex
        )
    }

    const ARRIVAL: i64 = 1_735_689_600_000; // 2025-01-01T00:00:00Z

    #[test]
    fn emits_one_record_per_document_in_order() {
        let (decoder, sink) = decoder();
        let payload = format!(
            "{}{}{}",
            simple_event("AA01"),
            simple_event("AA02"),
            simple_event("AA03")
        );

        decoder.ingest(payload.as_bytes(), "test", ARRIVAL, &DecodingOptions::new());

        let ids: Vec<_> = sink
            .records()
            .iter()
            .map(|r| r.transmitter_id.clone())
            .collect();
        assert_eq!(ids, vec!["aa01", "aa02", "aa03"]);

        let stats = decoder.stats();
        assert_eq!(stats.payloads_ingested, 1);
        assert_eq!(stats.fragments_seen, 3);
        assert_eq!(stats.fragments_dropped, 0);
        assert_eq!(stats.records_emitted, 3);
    }

    #[test]
    fn corrupt_document_costs_exactly_one_record() {
        let (decoder, sink) = decoder();
        let payload = format!(
            "{}{}{}",
            simple_event("AA01"),
            r#"{"type":"SIM}"#,
            simple_event("AA03")
        );

        decoder.ingest(payload.as_bytes(), "test", ARRIVAL, &DecodingOptions::new());

        let ids: Vec<_> = sink
            .records()
            .iter()
            .map(|r| r.transmitter_id.clone())
            .collect();
        assert_eq!(ids, vec!["aa01", "aa03"]);
        assert_eq!(decoder.stats().fragments_dropped, 1);
    }

    #[test]
    fn event_without_id_hex_yields_no_record() {
        let (decoder, sink) = decoder();
        let payload = r#"{"type":"SIMPLE","timestamp":"2025-01-01T00:00:00.000+0000","data":{"MAC":"C4:7D:CC:FF:FF:FF","antenna":1,"peakRssi":-70}}"#;

        decoder.ingest(payload.as_bytes(), "test", ARRIVAL, &DecodingOptions::new());

        assert!(sink.records().is_empty());
        let stats = decoder.stats();
        assert_eq!(stats.events_without_id, 1);
        assert_eq!(stats.records_emitted, 0);
    }

    #[test]
    fn epc96_requires_epc_format_and_exact_length() {
        // 24 hex characters with format epc
        assert_eq!(
            infer_transmitter_id_type(Some("epc"), "7eda9038051002710002c0ae"),
            IdentifierType::Epc96
        );
        // Wrong length
        assert_eq!(
            infer_transmitter_id_type(Some("epc"), "7eda9038051002710002c0ae6"),
            IdentifierType::Unknown
        );
        // Wrong format label
        assert_eq!(
            infer_transmitter_id_type(Some("tid"), "7eda9038051002710002c0ae"),
            IdentifierType::Unknown
        );
        // No format label at all
        assert_eq!(
            infer_transmitter_id_type(None, "7eda9038051002710002c0ae"),
            IdentifierType::Unknown
        );
    }

    #[test]
    fn receiver_entry_requires_mac_antenna_and_rssi() {
        let (decoder, sink) = decoder();
        // Antenna missing: the record survives with an empty signature
        let payload = r#"{"type":"SIMPLE","timestamp":"2025-01-01T00:00:00.000+0000","data":{"MAC":"C4:7D:CC:FF:FF:FF","idHex":"AA01","peakRssi":-70}}"#;

        decoder.ingest(payload.as_bytes(), "test", ARRIVAL, &DecodingOptions::new());

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].rssi_signature.is_empty());
    }

    #[test]
    fn mac_normalizes_to_bare_lowercase_hex() {
        let (decoder, sink) = decoder();
        let payload = r#"{"type":"SIMPLE","timestamp":"2025-01-01T00:00:00.000+0000","data":{"MAC":"C4:7D:CC:FF:FF:FF","antenna":1,"idHex":"AA01","peakRssi":-70}}"#;

        decoder.ingest(payload.as_bytes(), "test", ARRIVAL, &DecodingOptions::new());

        let records = sink.records();
        assert_eq!(records[0].rssi_signature[0].receiver_id, "c47dccffffff");
        assert_eq!(
            records[0].rssi_signature[0].receiver_id_type,
            IdentifierType::Eui48
        );
    }

    #[test]
    fn reads_above_one_sets_number_of_decodings() {
        let (decoder, sink) = decoder();
        let with_reads = r#"{"timestamp":"2025-01-01T00:00:00.000+0000","data":{"MAC":"C4:7D:CC:FF:FF:FF","antenna":1,"idHex":"AA01","peakRssi":-70,"reads":3}}"#;
        let single_read = r#"{"timestamp":"2025-01-01T00:00:00.000+0000","data":{"MAC":"C4:7D:CC:FF:FF:FF","antenna":1,"idHex":"AA02","peakRssi":-70,"reads":1}}"#;
        let no_reads = r#"{"timestamp":"2025-01-01T00:00:00.000+0000","data":{"MAC":"C4:7D:CC:FF:FF:FF","antenna":1,"idHex":"AA03","peakRssi":-70}}"#;

        decoder.ingest(with_reads.as_bytes(), "test", ARRIVAL, &DecodingOptions::new());
        decoder.ingest(single_read.as_bytes(), "test", ARRIVAL, &DecodingOptions::new());
        decoder.ingest(no_reads.as_bytes(), "test", ARRIVAL, &DecodingOptions::new());

        let records = sink.records();
        assert_eq!(records[0].rssi_signature[0].number_of_decodings, 3);
        assert_eq!(records[1].rssi_signature[0].number_of_decodings, 1);
        assert_eq!(records[2].rssi_signature[0].number_of_decodings, 1);
    }

    #[test]
    fn end_to_end_two_concatenated_documents() {
        let (decoder, sink) = decoder();
        let first = r#"{"type":"SIMPLE","timestamp":"2025-01-01T00:00:00.000+0000","data":{"MAC":"C4:7D:CC:FF:FF:FF","antenna":1,"format":"epc","idHex":"7EDA9038051002710002C0AE","peakRssi":-70,"reads":1}}"#;
        // 25 hex characters: one past the EPC-96 length
        let second = r#"{"type":"SIMPLE","timestamp":"2025-01-01T00:00:01.000+0000","data":{"format":"epc","idHex":"AABBCCDDEEFF0011223344556"}}"#;
        let payload = format!("{}{}", first, second);

        decoder.ingest(payload.as_bytes(), "test", ARRIVAL, &DecodingOptions::new());

        let records = sink.records();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].transmitter_id, "7eda9038051002710002c0ae");
        assert_eq!(records[0].transmitter_id_type, IdentifierType::Epc96);
        assert_eq!(records[0].timestamp, 1_735_689_600_000);
        assert_eq!(records[0].rssi_signature.len(), 1);
        let entry = &records[0].rssi_signature[0];
        assert_eq!(entry.receiver_id, "c47dccffffff");
        assert_eq!(entry.receiver_antenna, 1);
        assert_eq!(entry.rssi, -70);
        assert_eq!(entry.number_of_decodings, 1);

        assert_eq!(records[1].transmitter_id, "aabbccddeeff0011223344556");
        assert_eq!(records[1].transmitter_id_type, IdentifierType::Unknown);
        assert_eq!(records[1].timestamp, 1_735_689_601_000);
        assert!(records[1].rssi_signature.is_empty());
    }

    #[test]
    fn timestamp_offset_forms_agree() {
        assert_eq!(
            parse_event_timestamp("2025-01-01T00:00:00.000+0000"),
            Some(1_735_689_600_000)
        );
        assert_eq!(
            parse_event_timestamp("2025-01-01T00:00:00.000+00:00"),
            Some(1_735_689_600_000)
        );
        assert_eq!(
            parse_event_timestamp("2025-01-01T00:00:00.000Z"),
            Some(1_735_689_600_000)
        );
        assert_eq!(
            parse_event_timestamp("2025-01-01T01:00:00.000+0100"),
            Some(1_735_689_600_000)
        );
        assert_eq!(parse_event_timestamp("not-a-time"), None);
    }

    #[test]
    fn arrival_time_backfills_missing_timestamp() {
        let (decoder, sink) = decoder();
        let missing = r#"{"type":"SIMPLE","data":{"idHex":"AA01"}}"#;
        let garbage = r#"{"type":"SIMPLE","timestamp":"yesterday-ish","data":{"idHex":"AA02"}}"#;

        decoder.ingest(missing.as_bytes(), "test", 42, &DecodingOptions::new());
        decoder.ingest(garbage.as_bytes(), "test", 43, &DecodingOptions::new());

        let records = sink.records();
        assert_eq!(records[0].timestamp, 42);
        assert_eq!(records[1].timestamp, 43);
    }
}
