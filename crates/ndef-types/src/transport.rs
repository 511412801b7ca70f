//! The shape NDEF data takes when it crosses the native boundary
//!
//! Byte fields travel as plain integer arrays inside JSON, one integer per
//! byte, in order.

use serde::{Deserialize, Serialize};

use crate::{NdefRecord, Tag, Tnf};

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("payload does not match the expected shape: {0}")]
    InvalidShape(String),
}

type Result<T, E = TransportError> = std::result::Result<T, E>;

/// Converts bytes to their transport form, an empty buffer gives an empty sequence
pub fn to_transport(bytes: &[u8]) -> Vec<i64> {
    bytes.iter().map(|byte| i64::from(*byte)).collect()
}

/// Converts a transport sequence back to bytes
///
/// Values outside 0..=255 break the contract, only their low 8 bits are kept
pub fn from_transport(values: &[i64]) -> Vec<u8> {
    values.iter().map(|value| *value as u8).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecord {
    pub id: Vec<i64>,
    pub tnf: Tnf,
    pub mime_type: Option<String>,
    pub ndef_data: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTag {
    pub tag_serial: String,
    pub ndef_records: Vec<WireRecord>,
}

impl WireRecord {
    /// Parses the JSON array of records a `write` call carries
    pub fn list_from_json(value: serde_json::Value) -> Result<Vec<Self>> {
        serde_json::from_value(value).map_err(|error| TransportError::InvalidShape(error.to_string()))
    }
}

impl WireTag {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|error| TransportError::InvalidShape(error.to_string()))
    }
}

impl From<&NdefRecord> for WireRecord {
    fn from(record: &NdefRecord) -> Self {
        Self {
            id: to_transport(&record.id),
            tnf: record.tnf,
            mime_type: record.mime_type.clone(),
            ndef_data: to_transport(&record.payload),
        }
    }
}

impl From<WireRecord> for NdefRecord {
    fn from(record: WireRecord) -> Self {
        Self {
            id: from_transport(&record.id),
            tnf: record.tnf,
            mime_type: record.mime_type,
            payload: from_transport(&record.ndef_data),
        }
    }
}

impl From<&Tag> for WireTag {
    fn from(tag: &Tag) -> Self {
        Self {
            tag_serial: tag.tag_serial.clone(),
            ndef_records: tag.ndef_records.iter().map(WireRecord::from).collect(),
        }
    }
}

impl From<WireTag> for Tag {
    fn from(tag: WireTag) -> Self {
        Self {
            tag_serial: tag.tag_serial,
            ndef_records: tag.ndef_records.into_iter().map(NdefRecord::from).collect(),
        }
    }
}
