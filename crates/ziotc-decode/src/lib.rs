//! ziotc-decode - Reader payload decoding
//!
//! Recovers vendor tag data events from delimiter-less concatenated JSON
//! payload chunks and maps each into a normalized radio-decoding record.
//! Decoding never fails outward: malformed input degrades to fewer or
//! emptier records.

pub mod decoder;
pub mod extract;
pub mod tag_data;

pub use decoder::{DecoderStats, ZiotcDecoder};
pub use extract::{extract_tag_data_events, Extraction};
pub use tag_data::{TagData, TagDataEvent};
