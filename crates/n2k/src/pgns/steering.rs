//! Rudder and autopilot decoders

use contracts::FieldMap;

use super::RAD_TO_DEG;
use crate::reader::{i16_le, u16_le, u8_at, I16_NA, U16_NA};

/// PGN 127245 - Rudder
pub fn decode_rudder(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 6 {
        return None;
    }

    let mut fields = FieldMap::new();
    fields.insert("rudder_instance".into(), u8_at(data, 0).into());
    fields.insert("direction_order".into(), u8_at(data, 1).into());

    let angle_order_raw = i16_le(data, 2);
    let position_raw = i16_le(data, 4);

    if angle_order_raw != I16_NA {
        let angle = angle_order_raw as f64 * 0.0001;
        fields.insert("rudder_angle_order_rad".into(), angle.into());
        fields.insert("rudder_angle_order_deg".into(), (angle * RAD_TO_DEG).into());
    }

    if position_raw != I16_NA {
        let pos = position_raw as f64 * 0.0001;
        fields.insert("rudder_position_rad".into(), pos.into());
        fields.insert("rudder_position_deg".into(), (pos * RAD_TO_DEG).into());
    }

    Some(fields)
}

/// PGN 127237 - Heading/Track Control (autopilot)
///
/// The first three bytes are densely packed 2- and 3-bit status fields.
pub fn decode_heading_track_control(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 8 {
        return None;
    }

    let mut fields = FieldMap::new();

    let b0 = u8_at(data, 0);
    let b1 = u8_at(data, 1);
    let b2 = u8_at(data, 2);

    fields.insert("rudder_limit_exceeded".into(), ((b0 >> 6) & 0b11).into());
    fields.insert("off_heading_exceeded".into(), ((b0 >> 4) & 0b11).into());
    fields.insert("off_track_exceeded".into(), ((b0 >> 2) & 0b11).into());
    fields.insert("override".into(), (b0 & 0b11).into());
    fields.insert("steering_mode".into(), ((b1 >> 5) & 0b111).into());
    fields.insert("turn_mode".into(), ((b1 >> 2) & 0b111).into());
    fields.insert(
        "heading_reference".into(),
        ((b1 & 0b11) | (((b2 >> 7) & 0b1) << 2)).into(),
    );
    fields.insert("commanded_rudder_direction".into(), (b2 & 0b111).into());

    let cmd_rudder_raw = i16_le(data, 3);
    let heading_to_steer_raw = u16_le(data, 5);
    let track_raw = u16_le(data, 7);

    if cmd_rudder_raw != I16_NA {
        fields.insert(
            "commanded_rudder_angle_rad".into(),
            (cmd_rudder_raw as f64 * 0.0001).into(),
        );
    }

    if heading_to_steer_raw != U16_NA {
        fields.insert(
            "heading_to_steer_rad".into(),
            (heading_to_steer_raw as f64 * 0.0001).into(),
        );
    }

    if track_raw != U16_NA {
        fields.insert("track_rad".into(), (track_raw as f64 * 0.0001).into());
    }

    Some(fields)
}
