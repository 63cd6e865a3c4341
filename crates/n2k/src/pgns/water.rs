//! Speed, depth and distance-log decoders

use contracts::FieldMap;

use super::{MS_TO_KNOTS, NM_TENTH_M};
use crate::reader::{u16_le, u32_le, u8_at, U16_NA, U32_NA};

/// PGN 128259 - Speed Water Referenced
pub fn decode_water_speed(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 7 {
        return None;
    }

    let mut fields = FieldMap::new();
    fields.insert("sid".into(), u8_at(data, 0).into());

    let water_raw = u16_le(data, 1);
    let ground_raw = u16_le(data, 3);

    if water_raw != U16_NA {
        let speed = water_raw as f64 * 0.01; // m/s
        fields.insert("water_speed_ms".into(), speed.into());
        fields.insert("water_speed_kts".into(), (speed * MS_TO_KNOTS).into());
    }

    if ground_raw != U16_NA {
        let speed = ground_raw as f64 * 0.01;
        fields.insert("ground_speed_ms".into(), speed.into());
        fields.insert("ground_speed_kts".into(), (speed * MS_TO_KNOTS).into());
    }

    Some(fields)
}

/// PGN 128267 - Water Depth
pub fn decode_water_depth(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 5 {
        return None;
    }

    let mut fields = FieldMap::new();
    fields.insert("sid".into(), u8_at(data, 0).into());

    let depth_raw = u32_le(data, 1);
    if depth_raw != U32_NA {
        fields.insert("depth_m".into(), (depth_raw as f64 * 0.01).into());
    }

    Some(fields)
}

/// PGN 128275 - Distance Log
///
/// Both counters are in 0.1 nautical mile units, re-emitted in meters.
pub fn decode_distance_log(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 8 {
        return None;
    }

    let mut fields = FieldMap::new();

    let log_raw = u32_le(data, 0);
    let trip_raw = u32_le(data, 4);

    if log_raw != U32_NA {
        fields.insert("log_distance_m".into(), (log_raw as f64 * NM_TENTH_M).into());
    }

    if trip_raw != U32_NA {
        fields.insert("trip_distance_m".into(), (trip_raw as f64 * NM_TENTH_M).into());
    }

    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_water_speed() {
        let mut data = [0u8; 7];
        data[1..3].copy_from_slice(&300u16.to_le_bytes()); // 3.00 m/s
        data[3..5].copy_from_slice(&U16_NA.to_le_bytes());
        let fields = decode_water_speed(&data).unwrap();

        assert!((fields["water_speed_kts"].as_f64().unwrap() - 5.83152).abs() < 1e-5);
        assert!(!fields.contains_key("ground_speed_ms"));
    }

    #[test]
    fn test_water_depth() {
        let mut data = [0u8; 5];
        data[1..5].copy_from_slice(&1234u32.to_le_bytes());
        let fields = decode_water_depth(&data).unwrap();
        assert!((fields["depth_m"].as_f64().unwrap() - 12.34).abs() < 1e-9);

        assert!(decode_water_depth(&data[..4]).is_none());
    }

    #[test]
    fn test_distance_log_unit() {
        let mut data = [0u8; 8];
        data[0..4].copy_from_slice(&10u32.to_le_bytes()); // 1 nm
        data[4..8].copy_from_slice(&U32_NA.to_le_bytes());
        let fields = decode_distance_log(&data).unwrap();

        assert!((fields["log_distance_m"].as_f64().unwrap() - 1852.0).abs() < 1e-9);
        assert!(!fields.contains_key("trip_distance_m"));
    }
}
