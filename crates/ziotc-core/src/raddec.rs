//! Normalized radio-decoding records
//!
//! A raddec is the transport-agnostic statement that "a transmitter was
//! heard by a receiver with a given signal strength at a given time". It
//! is what every transport listener ultimately produces, and the only
//! type the downstream consumer ever sees.

use serde::{Deserialize, Serialize};

/// Identifier types of the radio-decoding registry.
///
/// Serialized as the registry's numeric codes so records interoperate
/// with other producers and consumers of the same format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum IdentifierType {
    Unknown = 0,
    Eui64 = 1,
    Eui48 = 2,
    Rnd48 = 3,
    Tid96 = 4,
    Epc96 = 5,
    Uuid128 = 6,
    Eurid32 = 7,
}

impl IdentifierType {
    /// Identifier length in bytes, where the type implies one.
    pub const fn length_in_bytes(self) -> Option<usize> {
        match self {
            IdentifierType::Unknown => None,
            IdentifierType::Eui64 => Some(8),
            IdentifierType::Eui48 => Some(6),
            IdentifierType::Rnd48 => Some(6),
            IdentifierType::Tid96 => Some(12),
            IdentifierType::Epc96 => Some(12),
            IdentifierType::Uuid128 => Some(16),
            IdentifierType::Eurid32 => Some(4),
        }
    }
}

impl From<IdentifierType> for u8 {
    fn from(identifier_type: IdentifierType) -> u8 {
        identifier_type as u8
    }
}

impl TryFrom<u8> for IdentifierType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(IdentifierType::Unknown),
            1 => Ok(IdentifierType::Eui64),
            2 => Ok(IdentifierType::Eui48),
            3 => Ok(IdentifierType::Rnd48),
            4 => Ok(IdentifierType::Tid96),
            5 => Ok(IdentifierType::Epc96),
            6 => Ok(IdentifierType::Uuid128),
            7 => Ok(IdentifierType::Eurid32),
            other => Err(format!("unknown identifier type code: {}", other)),
        }
    }
}

/// One receiver's observation of a transmitter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RssiSignatureEntry {
    /// Receiver hardware identifier, lower-cased hex with delimiters stripped
    pub receiver_id: String,

    /// Receiver identifier type (EUI-48 for reader hardware addresses)
    pub receiver_id_type: IdentifierType,

    /// Antenna port on which the read occurred
    pub receiver_antenna: u16,

    /// Peak signal strength reported for the read
    pub rssi: i32,

    /// Number of decodings aggregated into this entry
    #[serde(default = "default_number_of_decodings")]
    pub number_of_decodings: u32,
}

fn default_number_of_decodings() -> u32 {
    1
}

impl RssiSignatureEntry {
    /// Create an entry for a single decoding
    pub fn new(
        receiver_id: impl Into<String>,
        receiver_id_type: IdentifierType,
        receiver_antenna: u16,
        rssi: i32,
    ) -> Self {
        Self {
            receiver_id: receiver_id.into(),
            receiver_id_type,
            receiver_antenna,
            rssi,
            number_of_decodings: default_number_of_decodings(),
        }
    }
}

/// Normalized radio-decoding record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Raddec {
    /// Transmitter identifier, lower-cased hex
    pub transmitter_id: String,

    /// Transmitter identifier type, inferred from the wire event
    pub transmitter_id_type: IdentifierType,

    /// Record timestamp in epoch milliseconds
    pub timestamp: i64,

    /// Receiver observations, in decoding order
    #[serde(default)]
    pub rssi_signature: Vec<RssiSignatureEntry>,
}

impl Raddec {
    /// Create a record with no receiver observations yet
    pub fn new(
        transmitter_id: impl Into<String>,
        transmitter_id_type: IdentifierType,
        timestamp: i64,
    ) -> Self {
        Self {
            transmitter_id: transmitter_id.into(),
            transmitter_id_type,
            timestamp,
            rssi_signature: Vec::new(),
        }
    }

    /// Append one receiver observation
    pub fn add_decoding(&mut self, entry: RssiSignatureEntry) {
        self.rssi_signature.push(entry);
    }
}
