//! Attitude, rate-of-turn and heading decoders

use contracts::FieldMap;

use super::RAD_TO_DEG;
use crate::reader::{i16_le, i32_le, u16_le, u8_at, I16_NA, I32_NA, U16_NA};

/// PGN 127257 - Attitude (yaw, pitch, roll)
///
/// Roll is the heel angle; it is re-emitted as `heel_angle` so fusion
/// consumers do not need to know the PGN layout.
pub fn decode_attitude(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 7 {
        return None;
    }

    let mut fields = FieldMap::new();
    fields.insert("sid".into(), u8_at(data, 0).into());

    let yaw_raw = i16_le(data, 1);
    let pitch_raw = i16_le(data, 3);
    let roll_raw = i16_le(data, 5);

    if yaw_raw != I16_NA {
        let yaw = yaw_raw as f64 * 0.0001; // radians
        fields.insert("yaw_rad".into(), yaw.into());
        fields.insert("yaw_deg".into(), (yaw * RAD_TO_DEG).into());
    }

    if pitch_raw != I16_NA {
        let pitch = pitch_raw as f64 * 0.0001;
        fields.insert("pitch_rad".into(), pitch.into());
        fields.insert("pitch_deg".into(), (pitch * RAD_TO_DEG).into());
    }

    if roll_raw != I16_NA {
        let roll = roll_raw as f64 * 0.0001;
        fields.insert("roll_rad".into(), roll.into());
        fields.insert("roll_deg".into(), (roll * RAD_TO_DEG).into());
        fields.insert("heel_angle".into(), (roll * RAD_TO_DEG).into());
    }

    Some(fields)
}

/// PGN 127251 - Rate of Turn
///
/// Two encodings exist in the wild: the standard 8-byte form with an i32 at
/// 3.125e-8 rad/s, and a short 3-byte form with an i16 at 1e-4 rad/s.
pub fn decode_rate_of_turn(data: &[u8]) -> Option<FieldMap> {
    if data.len() >= 8 {
        let mut fields = FieldMap::new();
        fields.insert("sid".into(), u8_at(data, 0).into());

        let rot_raw = i32_le(data, 1);
        if rot_raw != I32_NA {
            let rot = rot_raw as f64 * 3.125e-8; // rad/s
            fields.insert("rate_of_turn_rad_s".into(), rot.into());
            fields.insert("rate_of_turn_deg_s".into(), (rot * RAD_TO_DEG).into());
        }
        return Some(fields);
    }

    if data.len() >= 3 {
        let mut fields = FieldMap::new();
        fields.insert("sid".into(), u8_at(data, 0).into());

        let rot_raw = i16_le(data, 1);
        if rot_raw != I16_NA {
            let rot = rot_raw as f64 * 0.0001;
            fields.insert("rate_of_turn_rad_s".into(), rot.into());
            fields.insert("rate_of_turn_deg_s".into(), (rot * RAD_TO_DEG).into());
        }
        return Some(fields);
    }

    None
}

/// PGN 127250 - Vessel Heading
pub fn decode_vessel_heading(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 8 {
        return None;
    }

    let mut fields = FieldMap::new();
    fields.insert("sid".into(), u8_at(data, 0).into());
    fields.insert("heading_reference".into(), u8_at(data, 7).into());

    let heading_raw = u16_le(data, 1);
    let deviation_raw = i16_le(data, 3);
    let variation_raw = i16_le(data, 5);

    if heading_raw != U16_NA {
        let heading = heading_raw as f64 * 0.0001;
        fields.insert("heading_rad".into(), heading.into());
        fields.insert("heading_deg".into(), (heading * RAD_TO_DEG).into());
    }

    if deviation_raw != I16_NA {
        let deviation = deviation_raw as f64 * 0.0001;
        fields.insert("deviation_rad".into(), deviation.into());
        fields.insert("deviation_deg".into(), (deviation * RAD_TO_DEG).into());
    }

    if variation_raw != I16_NA {
        let variation = variation_raw as f64 * 0.0001;
        fields.insert("variation_rad".into(), variation.into());
        fields.insert("variation_deg".into(), (variation * RAD_TO_DEG).into());
    }

    Some(fields)
}
