//! Vendor wire model
//!
//! The reader's IoT Connector channel emits "tag data events" as JSON
//! documents. Every field of the data block is optional on the wire;
//! presence (not value) drives the mapping, so the whole block
//! deserializes into `Option`s. Unknown fields are ignored.

use serde::Deserialize;

/// One tag data event as received from the reader
#[derive(Debug, Clone, Deserialize)]
pub struct TagDataEvent {
    /// Event type label, e.g. "SIMPLE"
    #[serde(rename = "type")]
    pub event_type: Option<String>,

    /// ISO-8601 event timestamp reported by the reader
    pub timestamp: Option<String>,

    /// Event data block
    pub data: Option<TagData>,
}

/// The data block of a tag data event
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagData {
    /// Reader hardware address, colon-separated hex
    #[serde(rename = "MAC")]
    pub mac: Option<String>,

    /// Antenna port reporting the read
    pub antenna: Option<u16>,

    /// Reader event sequence number
    pub event_num: Option<u64>,

    /// Identifier format label, e.g. "epc"
    pub format: Option<String>,

    /// Tag identifier as a hex string
    pub id_hex: Option<String>,

    /// Peak signal strength for the read
    pub peak_rssi: Option<i32>,

    /// Number of reads aggregated into this event
    pub reads: Option<u32>,
}
