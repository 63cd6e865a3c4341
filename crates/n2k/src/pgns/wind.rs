//! Wind data decoder

use contracts::FieldMap;

use super::{MS_TO_KNOTS, RAD_TO_DEG};
use crate::reader::{u16_le, u8_at, U16_NA};

/// PGN 130306 - Wind Data
///
/// Reference byte: 0 = true (ground), 2 = apparent, 3 = true (boat).
pub fn decode_wind(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 6 {
        return None;
    }

    let mut fields = FieldMap::new();
    fields.insert("sid".into(), u8_at(data, 0).into());
    fields.insert("wind_reference".into(), u8_at(data, 5).into());

    let speed_raw = u16_le(data, 1);
    let angle_raw = u16_le(data, 3);

    if speed_raw != U16_NA {
        let speed = speed_raw as f64 * 0.01; // m/s
        fields.insert("wind_speed_ms".into(), speed.into());
        fields.insert("wind_speed_kts".into(), (speed * MS_TO_KNOTS).into());
    }

    if angle_raw != U16_NA {
        let angle = angle_raw as f64 * 0.0001; // radians
        fields.insert("wind_angle_rad".into(), angle.into());
        fields.insert("wind_angle_deg".into(), (angle * RAD_TO_DEG).into());
    }

    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wind_decode() {
        // speed = 0x00C8 = 200 -> 2.00 m/s; angle = 0x0FA0 = 4000 -> 0.4 rad
        let data = [0x01, 0xC8, 0x00, 0xA0, 0x0F, 0x00];
        let fields = decode_wind(&data).unwrap();

        assert!((fields["wind_speed_ms"].as_f64().unwrap() - 2.0).abs() < 1e-12);
        assert!((fields["wind_speed_kts"].as_f64().unwrap() - 3.88768).abs() < 1e-5);
        assert!((fields["wind_angle_rad"].as_f64().unwrap() - 0.4).abs() < 1e-12);
        assert!((fields["wind_angle_deg"].as_f64().unwrap() - 22.9183).abs() < 1e-4);
        assert_eq!(fields["wind_reference"].as_f64().unwrap(), 0.0);
    }

    #[test]
    fn test_wind_sentinel_payload() {
        let data = [0xFF; 6];
        let fields = decode_wind(&data).unwrap();
        assert!(!fields.contains_key("wind_speed_ms"));
        assert!(!fields.contains_key("wind_angle_rad"));
        // sid and reference are index bytes, they stay
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_wind_truncated() {
        assert!(decode_wind(&[0x01, 0xC8, 0x00, 0xA0, 0x0F]).is_none());
    }
}
