//! Engine and battery decoders

use contracts::FieldMap;

use super::kelvin_to_c;
use crate::reader::{i16_le, u16_le, u8_at, I16_NA, U16_NA};

/// PGN 127489 - Engine Parameters Dynamic
pub fn decode_engine_dynamic(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 8 {
        return None;
    }

    let mut fields = FieldMap::new();
    fields.insert("engine_instance".into(), u8_at(data, 0).into());

    let oil_pressure_raw = u16_le(data, 1);
    let oil_temp_raw = u16_le(data, 3);
    let engine_temp_raw = u16_le(data, 5);

    if oil_pressure_raw != U16_NA {
        fields.insert("oil_pressure_pa".into(), (oil_pressure_raw as f64 * 100.0).into());
    }

    if oil_temp_raw != U16_NA {
        fields.insert("oil_temperature_c".into(), kelvin_to_c(oil_temp_raw, 0.1).into());
    }

    if engine_temp_raw != U16_NA {
        fields.insert(
            "engine_temperature_c".into(),
            kelvin_to_c(engine_temp_raw, 0.01).into(),
        );
    }

    // Alternator voltage in the longer form
    if data.len() >= 9 {
        let alt_voltage_raw = u16_le(data, 7);
        if alt_voltage_raw != U16_NA {
            fields.insert(
                "alternator_voltage_v".into(),
                (alt_voltage_raw as f64 * 0.01).into(),
            );
        }
    }

    Some(fields)
}

/// PGN 127508 - Battery Status
pub fn decode_battery_status(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 8 {
        return None;
    }

    let mut fields = FieldMap::new();
    fields.insert("battery_instance".into(), u8_at(data, 0).into());
    fields.insert("sid".into(), u8_at(data, 7).into());

    let voltage_raw = u16_le(data, 1);
    let current_raw = i16_le(data, 3);
    let temp_raw = u16_le(data, 5);

    if voltage_raw != U16_NA {
        fields.insert("battery_voltage_v".into(), (voltage_raw as f64 * 0.01).into());
    }

    if current_raw != I16_NA {
        fields.insert("battery_current_a".into(), (current_raw as f64 * 0.1).into());
    }

    if temp_raw != U16_NA {
        fields.insert("battery_temperature_c".into(), kelvin_to_c(temp_raw, 0.01).into());
    }

    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_dynamic() {
        let mut data = [0u8; 9];
        data[0] = 0;
        data[1..3].copy_from_slice(&4000u16.to_le_bytes()); // 400 kPa
        data[3..5].copy_from_slice(&3731u16.to_le_bytes()); // 373.1 K = 99.95 C
        data[5..7].copy_from_slice(&U16_NA.to_le_bytes());
        data[7..9].copy_from_slice(&1410u16.to_le_bytes()); // 14.10 V
        let fields = decode_engine_dynamic(&data).unwrap();

        assert!((fields["oil_pressure_pa"].as_f64().unwrap() - 400_000.0).abs() < 1e-9);
        assert!((fields["oil_temperature_c"].as_f64().unwrap() - 99.95).abs() < 1e-9);
        assert!(!fields.contains_key("engine_temperature_c"));
        assert!((fields["alternator_voltage_v"].as_f64().unwrap() - 14.10).abs() < 1e-9);
    }

    #[test]
    fn test_battery_status() {
        let mut data = [0u8; 8];
        data[0] = 1;
        data[1..3].copy_from_slice(&1280u16.to_le_bytes()); // 12.80 V
        data[3..5].copy_from_slice(&(-52i16).to_le_bytes()); // -5.2 A
        data[5..7].copy_from_slice(&U16_NA.to_le_bytes());
        data[7] = 9;
        let fields = decode_battery_status(&data).unwrap();

        assert!((fields["battery_voltage_v"].as_f64().unwrap() - 12.8).abs() < 1e-9);
        assert!((fields["battery_current_a"].as_f64().unwrap() + 5.2).abs() < 1e-9);
        assert!(!fields.contains_key("battery_temperature_c"));
        assert_eq!(fields["sid"].as_f64().unwrap(), 9.0);
    }
}
