//! Environmental decoders: temperature, humidity, pressure

use contracts::FieldMap;

use super::kelvin_to_c;
use crate::reader::{u16_le, u8_at, U16_NA};

/// PGN 130310 - Environmental Parameters
pub fn decode_environmental(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 12 {
        return None;
    }

    let mut fields = FieldMap::new();
    fields.insert("sid".into(), u8_at(data, 0).into());

    let air_temp_raw = u16_le(data, 4);
    let water_temp_raw = u16_le(data, 6);
    let humidity_raw = u16_le(data, 8);
    let pressure_raw = u16_le(data, 10);

    if air_temp_raw != U16_NA {
        fields.insert("air_temperature_c".into(), kelvin_to_c(air_temp_raw, 0.01).into());
    }

    if water_temp_raw != U16_NA {
        fields.insert(
            "water_temperature_c".into(),
            kelvin_to_c(water_temp_raw, 0.01).into(),
        );
    }

    if humidity_raw != U16_NA {
        fields.insert(
            "relative_humidity_pct".into(),
            (humidity_raw as f64 * 0.004).into(),
        );
    }

    if pressure_raw != U16_NA {
        fields.insert(
            "atmospheric_pressure_hpa".into(),
            (pressure_raw as f64 * 0.1).into(),
        );
    }

    Some(fields)
}

/// PGN 130312 - Temperature
pub fn decode_temperature(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 6 {
        return None;
    }

    let mut fields = FieldMap::new();
    fields.insert("sid".into(), u8_at(data, 0).into());
    fields.insert("temperature_instance".into(), u8_at(data, 1).into());
    fields.insert("temperature_source".into(), u8_at(data, 2).into());

    let actual_raw = u16_le(data, 3);
    if actual_raw != U16_NA {
        fields.insert("actual_temperature_c".into(), kelvin_to_c(actual_raw, 0.01).into());
    }

    // Optional set-point tail
    if data.len() >= 7 {
        let set_raw = u16_le(data, 5);
        if set_raw != U16_NA {
            fields.insert("set_temperature_c".into(), kelvin_to_c(set_raw, 0.01).into());
        }
    }

    Some(fields)
}

/// PGN 130313 - Humidity
pub fn decode_humidity(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 6 {
        return None;
    }

    let mut fields = FieldMap::new();
    fields.insert("sid".into(), u8_at(data, 0).into());
    fields.insert("humidity_instance".into(), u8_at(data, 1).into());
    fields.insert("humidity_source".into(), u8_at(data, 2).into());

    let actual_raw = u16_le(data, 3);
    if actual_raw != U16_NA {
        fields.insert("actual_humidity_pct".into(), (actual_raw as f64 * 0.004).into());
    }

    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environmental_decode() {
        let mut data = [0u8; 12];
        data[4..6].copy_from_slice(&29_315u16.to_le_bytes()); // 293.15 K = 20 C
        data[6..8].copy_from_slice(&U16_NA.to_le_bytes());
        data[8..10].copy_from_slice(&16_250u16.to_le_bytes()); // 65 %
        data[10..12].copy_from_slice(&10_132u16.to_le_bytes()); // 1013.2 hPa
        let fields = decode_environmental(&data).unwrap();

        assert!((fields["air_temperature_c"].as_f64().unwrap() - 20.0).abs() < 1e-9);
        assert!(!fields.contains_key("water_temperature_c"));
        assert!((fields["relative_humidity_pct"].as_f64().unwrap() - 65.0).abs() < 1e-9);
        assert!((fields["atmospheric_pressure_hpa"].as_f64().unwrap() - 1013.2).abs() < 1e-9);
    }

    #[test]
    fn test_temperature_with_setpoint() {
        let mut data = [0u8; 7];
        data[1] = 1;
        data[2] = 2; // engine room
        data[3..5].copy_from_slice(&30_315u16.to_le_bytes()); // 30 C
        data[5..7].copy_from_slice(&29_815u16.to_le_bytes()); // 25 C
        let fields = decode_temperature(&data).unwrap();

        assert!((fields["actual_temperature_c"].as_f64().unwrap() - 30.0).abs() < 1e-9);
        assert!((fields["set_temperature_c"].as_f64().unwrap() - 25.0).abs() < 1e-9);

        // 6-byte form drops the set point
        let fields = decode_temperature(&data[..6]).unwrap();
        assert!(!fields.contains_key("set_temperature_c"));
    }

    #[test]
    fn test_humidity_decode() {
        let mut data = [0u8; 6];
        data[3..5].copy_from_slice(&12_500u16.to_le_bytes()); // 50 %
        let fields = decode_humidity(&data).unwrap();
        assert!((fields["actual_humidity_pct"].as_f64().unwrap() - 50.0).abs() < 1e-9);
    }
}
