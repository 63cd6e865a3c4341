//! BoomSenseMapper - latest-by-PGN to fused quantities
//!
//! A read-only view over the ring buffer. Every accessor is a fresh O(1)
//! lookup against the index, so callers can poll at UI cadence without
//! touching the ingestion path.

use std::sync::Arc;

use serde::Serialize;
use storage::RingBuffer;

use crate::wind::apparent_wind;

/// Composite snapshot assembled from the latest messages
#[derive(Debug, Clone, Default, Serialize)]
pub struct BoomSenseData {
    /// Heel angle stand-in for the boom estimate (deg)
    pub boom_angle: f64,

    /// Rate of turn used as a roll-rate proxy (deg/s)
    pub roll_rate: f64,

    /// Pitch (deg)
    pub pitch_rate: f64,

    /// Yaw (deg)
    pub yaw_rate: f64,

    pub event_type: String,

    /// Milliseconds since epoch of the newest contributing message
    pub timestamp: i64,

    /// True wind (kts / deg)
    pub wind_speed: f64,
    pub wind_angle: f64,

    /// SOG, falling back to water speed (kts)
    pub boat_speed: f64,
}

/// Reader over the collector's ring buffer
pub struct BoomSenseMapper {
    buffer: Arc<RingBuffer>,
}

impl BoomSenseMapper {
    pub fn new(buffer: Arc<RingBuffer>) -> Self {
        Self { buffer }
    }

    /// Assemble the full composite snapshot
    pub fn current_data(&self) -> BoomSenseData {
        let mut data = BoomSenseData {
            event_type: "normal".to_string(),
            ..BoomSenseData::default()
        };

        // PGN 127257 - Attitude (heel, pitch, yaw)
        if let Some(msg) = self.buffer.get_latest_by_pgn(127_257) {
            if let Some(heel) = msg.field_f64("heel_angle") {
                data.boom_angle = heel;
            }
            if let Some(pitch) = msg.field_f64("pitch_deg") {
                data.pitch_rate = pitch;
            }
            if let Some(yaw) = msg.field_f64("yaw_deg") {
                data.yaw_rate = yaw;
            }
            data.timestamp = msg.timestamp.timestamp_millis();
        }

        // PGN 127251 - Rate of Turn
        if let Some(msg) = self.buffer.get_latest_by_pgn(127_251) {
            if let Some(rot) = msg.field_f64("rate_of_turn_deg_s") {
                data.roll_rate = rot;
            }
        }

        // PGN 130306 - Wind Data
        if let Some(msg) = self.buffer.get_latest_by_pgn(130_306) {
            if let Some(speed) = msg.field_f64("wind_speed_kts") {
                data.wind_speed = speed;
            }
            if let Some(angle) = msg.field_f64("wind_angle_deg") {
                data.wind_angle = angle;
            }
            if data.timestamp == 0 {
                data.timestamp = msg.timestamp.timestamp_millis();
            }
        }

        data.boat_speed = self.boat_speed();

        data
    }

    /// Current heel angle (deg), 0 when unknown
    pub fn heel_angle(&self) -> f64 {
        self.buffer
            .get_latest_by_pgn(127_257)
            .and_then(|msg| msg.field_f64("heel_angle"))
            .unwrap_or(0.0)
    }

    /// True wind speed (kts) and angle (deg)
    pub fn wind(&self) -> (f64, f64) {
        match self.buffer.get_latest_by_pgn(130_306) {
            Some(msg) => (
                msg.field_f64("wind_speed_kts").unwrap_or(0.0),
                msg.field_f64("wind_angle_deg").unwrap_or(0.0),
            ),
            None => (0.0, 0.0),
        }
    }

    /// Boat speed in knots: SOG preferred, water speed as fallback
    pub fn boat_speed(&self) -> f64 {
        let sog = self
            .buffer
            .get_latest_by_pgn(129_026)
            .and_then(|msg| msg.field_f64("sog_kts"))
            .unwrap_or(0.0);

        if sog != 0.0 {
            return sog;
        }

        self.buffer
            .get_latest_by_pgn(128_259)
            .and_then(|msg| msg.field_f64("water_speed_kts"))
            .unwrap_or(0.0)
    }

    /// Apparent wind (kts, deg folded to [0, 180]) from the latest true
    /// wind and boat speed
    pub fn apparent_wind(&self) -> (f64, f64) {
        let (tws, twa) = self.wind();
        apparent_wind(tws, twa, self.boat_speed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use contracts::{DecodedMessage, FieldMap};

    fn push_msg(buffer: &RingBuffer, pgn: u32, fields: &[(&str, f64)], ts_secs: i64) {
        let mut map = FieldMap::new();
        for (name, value) in fields {
            map.insert(name.to_string(), (*value).into());
        }
        buffer.push(DecodedMessage {
            timestamp: Utc.timestamp_opt(ts_secs, 0).unwrap(),
            pgn,
            pgn_name: "Test".to_string(),
            source: 1,
            measurement: "test".to_string(),
            fields: map,
            raw: None,
        });
    }

    #[test]
    fn test_current_data_assembly() {
        let buffer = Arc::new(RingBuffer::new(16));
        push_msg(&buffer, 127_257, &[("heel_angle", 12.5), ("pitch_deg", 2.0)], 100);
        push_msg(&buffer, 127_251, &[("rate_of_turn_deg_s", 4.0)], 101);
        push_msg(&buffer, 130_306, &[("wind_speed_kts", 10.0), ("wind_angle_deg", 45.0)], 102);
        push_msg(&buffer, 129_026, &[("sog_kts", 5.5)], 103);

        let mapper = BoomSenseMapper::new(buffer);
        let data = mapper.current_data();

        assert_eq!(data.boom_angle, 12.5);
        assert_eq!(data.pitch_rate, 2.0);
        assert_eq!(data.roll_rate, 4.0);
        assert_eq!(data.wind_speed, 10.0);
        assert_eq!(data.wind_angle, 45.0);
        assert_eq!(data.boat_speed, 5.5);
        assert_eq!(data.event_type, "normal");
        assert_eq!(data.timestamp, 100_000);
    }

    #[test]
    fn test_empty_buffer_defaults() {
        let mapper = BoomSenseMapper::new(Arc::new(RingBuffer::new(4)));
        let data = mapper.current_data();
        assert_eq!(data.boom_angle, 0.0);
        assert_eq!(data.boat_speed, 0.0);
        assert_eq!(mapper.heel_angle(), 0.0);
        assert_eq!(mapper.apparent_wind(), (0.0, 0.0));
    }

    #[test]
    fn test_boat_speed_falls_back_to_water_speed() {
        let buffer = Arc::new(RingBuffer::new(16));
        push_msg(&buffer, 128_259, &[("water_speed_kts", 4.2)], 100);
        let mapper = BoomSenseMapper::new(Arc::clone(&buffer));
        assert_eq!(mapper.boat_speed(), 4.2);

        // Zero SOG still falls through to water speed
        push_msg(&buffer, 129_026, &[("sog_kts", 0.0)], 101);
        assert_eq!(mapper.boat_speed(), 4.2);

        // Non-zero SOG wins
        push_msg(&buffer, 129_026, &[("sog_kts", 6.1)], 102);
        assert_eq!(mapper.boat_speed(), 6.1);
    }

    #[test]
    fn test_apparent_wind_through_mapper() {
        let buffer = Arc::new(RingBuffer::new(16));
        push_msg(&buffer, 130_306, &[("wind_speed_kts", 10.0), ("wind_angle_deg", 0.0)], 100);
        push_msg(&buffer, 129_026, &[("sog_kts", 5.0)], 101);

        let mapper = BoomSenseMapper::new(buffer);
        let (aws, awa) = mapper.apparent_wind();
        assert!((aws - 15.0).abs() < 1e-9);
        assert!(awa.abs() < 1e-9);
    }
}
