//! Broker payload -> canonical RawFrame
//!
//! Payloads are JSON-like maps. Recognized keys: `ts` / `timestamp` (ms
//! since epoch), `pgn`, `dp`/`pf`/`ps` (PGN fallback), `src`, `id` (low
//! byte is the source address), `data` (hex string or array of byte
//! values). A frame with no usable payload bytes is rejected, not an
//! error: the caller drops it and moves on.

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use contracts::{RawFrame, MAX_FRAME_PAYLOAD};
use n2k::pgn_from_parts;
use serde_json::Value;

/// Parse one broker payload into a frame. `None` means the payload is not
/// a decodable frame (wrong shape, no data, oversized payload).
pub fn parse_frame(topic: &str, payload: &Value) -> Option<RawFrame> {
    let map = payload.as_object()?;

    // Timestamp: `ts` preferred, `timestamp` alias, else arrival time.
    // The contract is milliseconds since epoch; anything non-finite or
    // negative falls back to now().
    let timestamp = map
        .get("ts")
        .or_else(|| map.get("timestamp"))
        .and_then(Value::as_f64)
        .and_then(millis_to_utc)
        .unwrap_or_else(Utc::now);

    // PGN: explicit field preferred, else derived from CAN-ID parts
    let dp = u8_field(map, "dp");
    let pf = u8_field(map, "pf");
    let ps = u8_field(map, "ps");
    let pgn = match map.get("pgn").and_then(Value::as_u64) {
        Some(pgn) => pgn as u32,
        None => pgn_from_parts(
            dp.unwrap_or(0),
            pf.unwrap_or(0),
            ps.unwrap_or(0),
        ),
    };

    // Source address: explicit `src`, else low byte of the CAN ID
    let can_id = map.get("id").and_then(Value::as_u64).map(|id| id as u32);
    let source = match u8_field(map, "src") {
        Some(src) => src,
        None => can_id.map(|id| (id & 0xFF) as u8).unwrap_or(0),
    };

    // Payload bytes: hex string or numeric array
    let data = match map.get("data") {
        Some(Value::String(s)) => parse_hex_data(s)?,
        Some(Value::Array(values)) => parse_array_data(values),
        _ => return None,
    };

    if data.is_empty() || data.len() > MAX_FRAME_PAYLOAD {
        return None;
    }

    Some(RawFrame {
        topic: topic.to_string(),
        timestamp,
        can_id,
        priority: u8_field(map, "prio"),
        dp,
        pf,
        ps,
        source,
        pgn,
        data: Bytes::from(data),
    })
}

fn millis_to_utc(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() || ms < 0.0 {
        return None;
    }
    Utc.timestamp_millis_opt(ms as i64).single()
}

fn u8_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<u8> {
    map.get(key).and_then(Value::as_u64).map(|v| v as u8)
}

/// Hex payload, tolerating spaces, commas, colons and dashes
fn parse_hex_data(raw: &str) -> Option<Vec<u8>> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | ',' | ':' | '-'))
        .collect();

    if cleaned.len() % 2 != 0 {
        return None;
    }

    cleaned
        .as_bytes()
        .chunks_exact(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16)?;
            let lo = (pair[1] as char).to_digit(16)?;
            Some((hi * 16 + lo) as u8)
        })
        .collect()
}

fn parse_array_data(values: &[Value]) -> Vec<u8> {
    values
        .iter()
        .filter_map(Value::as_f64)
        .map(|v| v as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_frame() {
        let payload = json!({
            "ts": 1_700_000_000_123.0f64,
            "pgn": 130306,
            "src": 42,
            "data": "01 C8 00 A0 0F 00",
        });
        let frame = parse_frame("boats/dev/n2k", &payload).unwrap();

        assert_eq!(frame.pgn, 130306);
        assert_eq!(frame.source, 42);
        assert_eq!(frame.timestamp.timestamp_millis(), 1_700_000_000_123);
        assert_eq!(frame.data.as_ref(), &[0x01, 0xC8, 0x00, 0xA0, 0x0F, 0x00]);
        assert_eq!(frame.topic, "boats/dev/n2k");
    }

    #[test]
    fn test_pgn_derived_from_can_id_parts() {
        let payload = json!({
            "dp": 0, "pf": 0xF0, "ps": 0x1A,
            "data": [1, 2, 3],
        });
        let frame = parse_frame("t", &payload).unwrap();
        assert_eq!(frame.pgn, 61_466);
        assert_eq!(frame.data.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn test_source_from_low_byte_of_id() {
        let payload = json!({
            "pgn": 127257,
            "id": 0x09F1_1223u32,
            "data": "00",
        });
        let frame = parse_frame("t", &payload).unwrap();
        assert_eq!(frame.source, 0x23);
        assert_eq!(frame.can_id, Some(0x09F1_1223));
    }

    #[test]
    fn test_hex_separators_and_case() {
        let payload = json!({ "pgn": 1, "data": "de:AD-be,ef 00" });
        let frame = parse_frame("t", &payload).unwrap();
        assert_eq!(frame.data.as_ref(), &[0xDE, 0xAD, 0xBE, 0xEF, 0x00]);
    }

    #[test]
    fn test_rejects_bad_payloads() {
        // no data key
        assert!(parse_frame("t", &json!({ "pgn": 1 })).is_none());
        // empty data
        assert!(parse_frame("t", &json!({ "pgn": 1, "data": "" })).is_none());
        assert!(parse_frame("t", &json!({ "pgn": 1, "data": [] })).is_none());
        // invalid hex
        assert!(parse_frame("t", &json!({ "pgn": 1, "data": "xyz1" })).is_none());
        assert!(parse_frame("t", &json!({ "pgn": 1, "data": "abc" })).is_none());
        // not an object
        assert!(parse_frame("t", &json!("hello")).is_none());
        // oversized single-frame payload
        let big = "00".repeat(MAX_FRAME_PAYLOAD + 1);
        assert!(parse_frame("t", &json!({ "pgn": 1, "data": big })).is_none());
    }

    #[test]
    fn test_bad_timestamp_falls_back_to_arrival() {
        let before = Utc::now();
        let payload = json!({ "pgn": 1, "ts": -5.0, "data": "01" });
        let frame = parse_frame("t", &payload).unwrap();
        assert!(frame.timestamp >= before);
    }

    #[test]
    fn test_timestamp_alias() {
        let payload = json!({ "pgn": 1, "timestamp": 1_700_000_000_000.0f64, "data": "01" });
        let frame = parse_frame("t", &payload).unwrap();
        assert_eq!(frame.timestamp.timestamp_millis(), 1_700_000_000_000);
    }
}
