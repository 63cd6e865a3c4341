//! RawFrame / DecodedMessage - the two shapes that flow through the collector
//!
//! A `RawFrame` is the canonical form of one single-frame N2K message as
//! relayed by the broker. A `DecodedMessage` is what a decoder worker makes
//! of it: named physical fields plus provenance.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Largest single-frame N2K payload this pipeline accepts (fast-packet
/// reassembly is out of scope).
pub const MAX_FRAME_PAYLOAD: usize = 223;

/// An unparsed NMEA2000 CAN frame
///
/// Invariants: `data` is non-empty; `pgn` is either taken verbatim from the
/// broker payload or derived from the (dp, pf, ps) CAN-ID parts.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Broker topic the frame arrived on (provenance)
    pub topic: String,

    /// UTC arrival or source timestamp
    pub timestamp: DateTime<Utc>,

    /// Raw 29-bit CAN identifier, when the broker supplied one
    pub can_id: Option<u32>,

    /// CAN-ID components, when the broker supplied them
    pub priority: Option<u8>,
    pub dp: Option<u8>,
    pub pf: Option<u8>,
    pub ps: Option<u8>,

    /// Source address (low byte of the CAN ID)
    pub source: u8,

    /// Parameter Group Number
    pub pgn: u32,

    /// Payload bytes
    pub data: Bytes,
}

/// One decoded field value
///
/// Decoded field maps mix integer counters, physical floats, flags and the
/// occasional formatted instant. Consumers match on the variant instead of
/// parsing strings back apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// Time-of-day offsets (e.g. PGN 126992 seconds since midnight)
    Duration(Duration),
}

impl FieldValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::UInt(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::UInt(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Str(v) => f.write_str(v),
            FieldValue::Duration(v) => {
                let secs = v.as_secs();
                write!(
                    f,
                    "{:02}:{:02}:{:02}.{:03}",
                    secs / 3600,
                    (secs % 3600) / 60,
                    secs % 60,
                    v.subsec_millis()
                )
            }
        }
    }
}

impl From<u8> for FieldValue {
    fn from(v: u8) -> Self {
        FieldValue::UInt(v.into())
    }
}

impl From<u16> for FieldValue {
    fn from(v: u16) -> Self {
        FieldValue::UInt(v.into())
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::UInt(v.into())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<Duration> for FieldValue {
    fn from(v: Duration) -> Self {
        FieldValue::Duration(v)
    }
}

/// Named decoded fields of one message
pub type FieldMap = HashMap<String, FieldValue>;

/// A fully decoded NMEA2000 message
///
/// An empty `fields` map means "no handler / not decoded"; the raw payload
/// is kept alongside for late inspection.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    pub timestamp: DateTime<Utc>,
    pub pgn: u32,

    /// Human-readable PGN name ("Unknown" when unregistered)
    pub pgn_name: String,

    pub source: u8,

    /// Measurement class, e.g. "wind", "attitude" ("nmea_general" default)
    pub measurement: String,

    pub fields: FieldMap,

    /// Original payload bytes
    pub raw: Option<Bytes>,
}

impl DecodedMessage {
    /// Whether a handler produced at least one field
    pub fn is_decoded(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Numeric field lookup shorthand
    pub fn field_f64(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(FieldValue::as_f64)
    }
}
