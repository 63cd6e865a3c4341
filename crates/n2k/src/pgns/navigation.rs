//! Position, course and GNSS decoders

use contracts::FieldMap;

use super::{utc_from_days_and_ticks, MS_TO_KNOTS, RAD_TO_DEG};
use crate::reader::{
    i16_le, i32_le, i64_le, u16_le, u32_le, u8_at, I16_NA, I32_NA, I64_NA, U16_NA, U32_NA, U8_NA,
};

/// PGN 129026 - COG & SOG Rapid Update
pub fn decode_cog_sog(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 8 {
        return None;
    }

    let mut fields = FieldMap::new();
    fields.insert("sid".into(), u8_at(data, 0).into());

    let cog_raw = u16_le(data, 1);
    let sog_raw = u16_le(data, 3);

    if cog_raw != U16_NA {
        let cog = cog_raw as f64 * 0.0001; // radians
        fields.insert("cog_rad".into(), cog.into());
        fields.insert("cog_deg".into(), (cog * RAD_TO_DEG).into());
    }

    if sog_raw != U16_NA {
        let sog = sog_raw as f64 * 0.01; // m/s
        fields.insert("sog_ms".into(), sog.into());
        fields.insert("sog_kts".into(), (sog * MS_TO_KNOTS).into());
    }

    Some(fields)
}

/// PGN 129025 - Position Rapid Update
///
/// Lat/lon are offset-binary u32 at 1e-7 degree resolution.
pub fn decode_position_rapid(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 8 {
        return None;
    }

    let mut fields = FieldMap::new();

    let lat_raw = u32_le(data, 0);
    let lon_raw = u32_le(data, 4);

    if lat_raw != U32_NA {
        let lat = (lat_raw as f64 - 2_147_483_648.0) * 1e-7;
        fields.insert("latitude".into(), lat.into());
    }

    if lon_raw != U32_NA {
        let lon = (lon_raw as f64 - 2_147_483_648.0) * 1e-7;
        fields.insert("longitude".into(), lon.into());
    }

    Some(fields)
}

/// PGN 129029 - GNSS Position Data
pub fn decode_gnss_position(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 43 {
        return None;
    }

    let mut fields = FieldMap::new();
    fields.insert("sid".into(), u8_at(data, 0).into());

    let date_days = u16_le(data, 1);
    let time_ticks = u32_le(data, 3);
    let lat_raw = i64_le(data, 7);
    let lon_raw = i64_le(data, 15);
    let alt_raw = i64_le(data, 23);

    let pack1 = u8_at(data, 31);
    fields.insert("gnss_type".into(), (pack1 & 0x0F).into());
    fields.insert("method".into(), ((pack1 >> 4) & 0x0F).into());

    let pack2 = u8_at(data, 32);
    fields.insert("integrity".into(), (pack2 & 0b11).into());

    fields.insert("satellites".into(), u8_at(data, 33).into());

    let hdop_raw = i16_le(data, 34);
    let pdop_raw = i16_le(data, 36);
    let geoid_raw = i32_le(data, 38);
    fields.insert("reference_stations".into(), u8_at(data, 42).into());

    if date_days != U16_NA && time_ticks != U32_NA {
        if let Some(fix_time) = utc_from_days_and_ticks(date_days, time_ticks) {
            fields.insert("fix_time_utc".into(), fix_time.to_rfc3339().into());
        }
    }

    if lat_raw != I64_NA {
        fields.insert("latitude".into(), (lat_raw as f64 * 1e-16).into());
    }

    if lon_raw != I64_NA {
        fields.insert("longitude".into(), (lon_raw as f64 * 1e-16).into());
    }

    if alt_raw != I64_NA {
        fields.insert("altitude_m".into(), (alt_raw as f64 * 1e-6).into());
    }

    if hdop_raw != I16_NA {
        fields.insert("hdop".into(), (hdop_raw as f64 * 0.01).into());
    }

    if pdop_raw != I16_NA {
        fields.insert("pdop".into(), (pdop_raw as f64 * 0.01).into());
    }

    if geoid_raw != I32_NA {
        fields.insert("geoidal_separation_m".into(), (geoid_raw as f64 * 0.01).into());
    }

    Some(fields)
}

/// PGN 129284 - Navigation Data
pub fn decode_navigation_data(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 8 {
        return None;
    }

    let mut fields = FieldMap::new();
    fields.insert("sid".into(), u8_at(data, 0).into());

    let dist_cm = u32_le(data, 1);
    if dist_cm != U32_NA {
        fields.insert("distance_to_waypoint_m".into(), (dist_cm as f64 / 100.0).into());
    }

    let flags = u8_at(data, 5);
    fields.insert("bearing_reference".into(), ((flags >> 6) & 0b11).into());
    fields.insert("perpendicular_crossed".into(), ((flags >> 4) & 0b11).into());
    fields.insert("arrival_circle_entered".into(), ((flags >> 2) & 0b11).into());
    fields.insert("calculation_type".into(), (flags & 0b11).into());

    // Optional ETA tail
    if data.len() >= 12 {
        let eta_ticks = u32_le(data, 6);
        let eta_days = u16_le(data, 10);
        if eta_days != U16_NA && eta_ticks != U32_NA {
            if let Some(eta) = utc_from_days_and_ticks(eta_days, eta_ticks) {
                fields.insert("eta_utc".into(), eta.to_rfc3339().into());
            }
        }
    }

    Some(fields)
}

/// PGN 129540 - GNSS Satellites in View
///
/// Repeating 9-byte block per satellite after the 3-byte header.
pub fn decode_gnss_satellites(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 3 {
        return None;
    }

    let mut fields = FieldMap::new();
    fields.insert("sid".into(), u8_at(data, 0).into());
    fields.insert("range_residual_mode".into(), ((u8_at(data, 1) >> 6) & 0b11).into());

    let sats_in_view = u8_at(data, 2);
    fields.insert("sats_in_view".into(), sats_in_view.into());

    let mut offset = 3usize;
    for i in 1..=sats_in_view as usize {
        if offset + 9 > data.len() {
            break;
        }

        let prn = u8_at(data, offset);
        let elev_raw = i16_le(data, offset + 1);
        let azim_raw = u16_le(data, offset + 3);
        let snr_raw = i16_le(data, offset + 5);
        let range_raw = u32_le(data, offset + 7);
        let status = u8_at(data, offset + 11);
        offset += 12;

        if prn != U8_NA {
            fields.insert(format!("sv_{i}_prn"), prn.into());
        }
        if elev_raw != I16_NA {
            fields.insert(format!("sv_{i}_elevation_rad"), (elev_raw as f64 * 0.0001).into());
        }
        if azim_raw != U16_NA {
            fields.insert(format!("sv_{i}_azimuth_rad"), (azim_raw as f64 * 0.0001).into());
        }
        if snr_raw != I16_NA {
            fields.insert(format!("sv_{i}_snr_dbhz"), (snr_raw as f64 * 0.1).into());
        }
        if range_raw != U32_NA {
            fields.insert(format!("sv_{i}_range_residual_m"), (range_raw as f64 * 0.001).into());
        }
        fields.insert(format!("sv_{i}_status"), ((status >> 4) & 0x0F).into());
    }

    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cog_sog_decode() {
        let mut data = [0u8; 8];
        data[1..3].copy_from_slice(&15_708u16.to_le_bytes()); // ~pi/2 rad
        data[3..5].copy_from_slice(&514u16.to_le_bytes()); // 5.14 m/s ~ 10 kts
        let fields = decode_cog_sog(&data).unwrap();

        assert!((fields["cog_deg"].as_f64().unwrap() - 90.0).abs() < 0.01);
        assert!((fields["sog_kts"].as_f64().unwrap() - 9.99).abs() < 0.01);
    }

    #[test]
    fn test_position_rapid_offset_binary() {
        let mut data = [0u8; 8];
        // 59.3293 deg north: raw = 2^31 + 593_293_000
        data[0..4].copy_from_slice(&(2_147_483_648u32 + 593_293_000).to_le_bytes());
        // 18.0686 deg east
        data[4..8].copy_from_slice(&(2_147_483_648u32 + 180_686_000).to_le_bytes());
        let fields = decode_position_rapid(&data).unwrap();

        assert!((fields["latitude"].as_f64().unwrap() - 59.3293).abs() < 1e-6);
        assert!((fields["longitude"].as_f64().unwrap() - 18.0686).abs() < 1e-6);
    }

    #[test]
    fn test_gnss_position_fix_time() {
        let mut data = [0xFFu8; 43];
        data[0] = 7;
        // 2021-05-01 = 18748 days since epoch, 12:00:00 = 432_000_000 ticks
        data[1..3].copy_from_slice(&18_748u16.to_le_bytes());
        data[3..7].copy_from_slice(&432_000_000u32.to_le_bytes());
        // lat 57.0 deg = 57e16 * 1e-16
        data[7..15].copy_from_slice(&570_000_000_000_000_000i64.to_le_bytes());
        let fields = decode_gnss_position(&data).unwrap();

        assert_eq!(
            fields["fix_time_utc"],
            "2021-05-01T12:00:00+00:00".into(),
        );
        assert!((fields["latitude"].as_f64().unwrap() - 57.0).abs() < 1e-9);
        // lon/alt were sentinel
        assert!(!fields.contains_key("longitude"));
        assert!(!fields.contains_key("altitude_m"));
    }

    #[test]
    fn test_gnss_satellites_repeating_block() {
        let mut data = vec![0x01, 0x00, 0x02];
        for prn in [5u8, 9u8] {
            data.push(prn);
            data.extend_from_slice(&3000i16.to_le_bytes()); // elevation 0.3 rad
            data.extend_from_slice(&15_000u16.to_le_bytes()); // azimuth 1.5 rad
            data.extend_from_slice(&450i16.to_le_bytes()); // 45.0 dB-Hz
            data.extend_from_slice(&U32_NA.to_le_bytes()); // range residual n/a
            data.push(0x10); // status = 1
        }
        let fields = decode_gnss_satellites(&data).unwrap();

        assert_eq!(fields["sats_in_view"].as_f64().unwrap(), 2.0);
        assert_eq!(fields["sv_1_prn"].as_f64().unwrap(), 5.0);
        assert_eq!(fields["sv_2_prn"].as_f64().unwrap(), 9.0);
        assert!((fields["sv_2_snr_dbhz"].as_f64().unwrap() - 45.0).abs() < 1e-9);
        assert!(!fields.contains_key("sv_1_range_residual_m"));
    }

    #[test]
    fn test_navigation_data_with_eta() {
        let mut data = [0u8; 12];
        data[1..5].copy_from_slice(&123_456u32.to_le_bytes()); // 1234.56 m
        data[5] = 0b01_00_01_10;
        data[6..10].copy_from_slice(&0u32.to_le_bytes());
        data[10..12].copy_from_slice(&18_748u16.to_le_bytes());
        let fields = decode_navigation_data(&data).unwrap();

        assert!((fields["distance_to_waypoint_m"].as_f64().unwrap() - 1234.56).abs() < 1e-9);
        assert_eq!(fields["bearing_reference"].as_f64().unwrap(), 1.0);
        assert_eq!(fields["calculation_type"].as_f64().unwrap(), 2.0);
        assert_eq!(fields["eta_utc"], "2021-05-01T00:00:00+00:00".into());
    }
}
