//! PGN registry: handler table, display names, measurement classes
//!
//! The handler table is an explicit map keyed by PGN so deployments can
//! register additional decoders without touching this crate.

use std::collections::HashMap;

use contracts::FieldMap;

use crate::pgns;

/// A PGN decoder: payload bytes in, named fields out.
///
/// Returns `None` when the payload is shorter than the PGN's minimum
/// length. Decoders never fail on malformed content beyond that; fields
/// whose raw bits equal the N2K sentinel are simply dropped.
pub type DecoderFn = fn(&[u8]) -> Option<FieldMap>;

/// Result of running a frame through the registry
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// A handler ran and produced fields
    Decoded(FieldMap),

    /// A handler exists but the payload was too short
    Truncated,

    /// No handler registered for this PGN
    Unhandled,
}

impl DecodeOutcome {
    /// Fields if decoding succeeded, an empty map otherwise
    pub fn into_fields(self) -> FieldMap {
        match self {
            DecodeOutcome::Decoded(fields) => fields,
            _ => FieldMap::new(),
        }
    }
}

/// PGN decoder registry
pub struct Decoder {
    handlers: HashMap<u32, DecoderFn>,
}

impl Decoder {
    pub fn new() -> Self {
        let mut d = Self {
            handlers: HashMap::new(),
        };
        d.register_default_handlers();
        d
    }

    /// Run the registered handler for `pgn`, if any
    pub fn decode(&self, pgn: u32, data: &[u8]) -> DecodeOutcome {
        match self.handlers.get(&pgn) {
            Some(handler) => match handler(data) {
                Some(fields) => DecodeOutcome::Decoded(fields),
                None => DecodeOutcome::Truncated,
            },
            None => DecodeOutcome::Unhandled,
        }
    }

    /// Register (or replace) a handler
    pub fn register(&mut self, pgn: u32, handler: DecoderFn) {
        self.handlers.insert(pgn, handler);
    }

    pub fn has_handler(&self, pgn: u32) -> bool {
        self.handlers.contains_key(&pgn)
    }

    fn register_default_handlers(&mut self) {
        // Critical PGNs for sailing telemetry
        self.register(127257, pgns::decode_attitude); // heel angle source
        self.register(127251, pgns::decode_rate_of_turn);
        self.register(130306, pgns::decode_wind); // true wind source
        self.register(127250, pgns::decode_vessel_heading);
        self.register(129026, pgns::decode_cog_sog); // boat speed source
        self.register(129025, pgns::decode_position_rapid);
        self.register(129029, pgns::decode_gnss_position);
        self.register(128267, pgns::decode_water_depth);
        self.register(128259, pgns::decode_water_speed);
        self.register(128275, pgns::decode_distance_log);
        self.register(127245, pgns::decode_rudder);
        self.register(127237, pgns::decode_heading_track_control);
        self.register(129284, pgns::decode_navigation_data);
        self.register(129540, pgns::decode_gnss_satellites);
        self.register(126992, pgns::decode_system_time);
        self.register(127508, pgns::decode_battery_status);
        self.register(127489, pgns::decode_engine_dynamic);
        self.register(130310, pgns::decode_environmental);
        self.register(130312, pgns::decode_temperature);
        self.register(130313, pgns::decode_humidity);
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculate a PGN from CAN-ID components
///
/// PDU1 (PF < 240): PS is a destination address and is not part of the PGN.
/// PDU2 (PF >= 240): PS is the group extension.
pub fn pgn_from_parts(dp: u8, pf: u8, ps: u8) -> u32 {
    let base = ((dp as u32 & 0x01) << 16) | ((pf as u32) << 8);
    if pf < 240 {
        base
    } else {
        base | ps as u32
    }
}

/// Human-readable name for a PGN ("Unknown" when unregistered)
pub fn pgn_name(pgn: u32) -> &'static str {
    match pgn {
        129025 => "Position Rapid Update",
        129026 => "COG & SOG Rapid Update",
        129029 => "GNSS Position Data",
        127250 => "Vessel Heading",
        127251 => "Rate of Turn",
        127257 => "Attitude",
        127252 => "Heave",
        128259 => "Speed Water Referenced",
        128267 => "Water Depth",
        128275 => "Distance Log",
        129284 => "Navigation Data",
        129285 => "Route/WP Information",
        129540 => "GNSS Satellites in View",
        130306 => "Wind Data",
        130310 => "Environmental Parameters",
        130311 => "Environmental Parameters",
        130312 => "Temperature",
        130313 => "Humidity",
        130314 => "Actual Pressure",
        127488 => "Engine Parameters Rapid",
        127489 => "Engine Parameters Dynamic",
        127493 => "Transmission Parameters",
        127497 => "Trip Parameters Engine",
        127498 => "Engine Parameters Static",
        127500 => "Load Controller State",
        127501 => "Binary Switch Bank Status",
        127502 => "Switch Bank Control",
        127503 => "AC Input Status",
        127504 => "AC Output Status",
        127505 => "Fluid Level",
        127506 => "DC Detailed Status",
        127507 => "Charger Status",
        127508 => "Battery Status",
        127509 => "Inverter Status",
        129038 => "AIS Class A Position",
        129039 => "AIS Class B Position",
        129040 => "AIS Class B Extended Position",
        129793 => "AIS UTC Date/Time",
        129794 => "AIS Class A Static Data",
        129798 => "AIS SAR Aircraft Position",
        129802 => "AIS Safety Broadcast",
        129809 => "AIS Class B Static A",
        129810 => "AIS Class B Static B",
        126992 => "System Time",
        126993 => "Heartbeat",
        126996 => "Product Information",
        126998 => "Configuration Information",
        127245 => "Rudder",
        127237 => "Heading/Track Control",
        127258 => "Magnetic Variation",
        126208 => "Group Function",
        130576 => "Small Craft Status",
        130577 => "Direction Data",
        126720 => "Proprietary",
        130822 => "Proprietary Fast",
        _ => "Unknown",
    }
}

/// Measurement classification for a PGN ("nmea_general" default)
pub fn measurement_class(pgn: u32) -> &'static str {
    match pgn {
        // Navigation & position
        129025 | 129029 => "position",
        129026 | 127251 | 128259 | 128267 | 129284 | 129285 => "navigation",
        127250 => "heading",
        128275 => "log",
        129540 => "gnss",

        // Wind & weather
        130306 => "wind",
        130310 | 130311 | 130312 | 130313 | 130314 => "environment",

        // Engine & propulsion
        127488 | 127489 | 127497 | 127498 => "engine",
        127493 => "transmission",
        127500 | 127501 | 127502 | 127505 | 127506 | 127507 | 127508 | 127509 => "dc_power",
        127503 | 127504 => "ac_power",

        // Attitude (heel angle lives here)
        127257 | 127252 => "attitude",

        // AIS
        129038 | 129039 | 129040 | 129793 | 129794 | 129798 | 129802 | 129809 | 129810 => "ais",

        // System & steering
        126992 | 126993 | 126996 | 126998 | 126208 => "system",
        127245 | 127237 | 127258 => "autopilot",

        // Small craft
        130576 | 130577 => "craft_status",

        // Proprietary
        126720 | 130822 => "proprietary",

        _ => "nmea_general",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pgn_from_parts_pdu2() {
        // PF >= 240: PS is part of the PGN
        assert_eq!(pgn_from_parts(0, 0xF0, 0x1A), 0xF01A);
        assert_eq!(pgn_from_parts(0, 0xF0, 0x1A), 61_466);
    }

    #[test]
    fn test_pgn_from_parts_pdu1_drops_ps() {
        // PF < 240: PS is a destination address, not part of the PGN
        assert_eq!(pgn_from_parts(1, 0xEF, 0x12), 0x1EF00);
        assert_eq!(pgn_from_parts(1, 0xEF, 0x12), 126_720);
        for ps in 0..=255u8 {
            assert_eq!(pgn_from_parts(0, 0x80, ps), pgn_from_parts(0, 0x80, 0));
            assert_eq!(pgn_from_parts(1, 0xEF, ps), pgn_from_parts(1, 0xEF, 0));
        }
    }

    #[test]
    fn test_unknown_pgn_defaults() {
        assert_eq!(pgn_name(42), "Unknown");
        assert_eq!(measurement_class(42), "nmea_general");
        let decoder = Decoder::new();
        assert_eq!(decoder.decode(42, &[0u8; 8]), DecodeOutcome::Unhandled);
    }

    #[test]
    fn test_registered_handlers_cover_core_pgns() {
        let decoder = Decoder::new();
        for pgn in [
            127237, 127245, 127250, 127251, 127257, 127489, 127508, 128259, 128267, 128275,
            129025, 129026, 129029, 129284, 129540, 126992, 130306, 130310, 130312, 130313,
        ] {
            assert!(decoder.has_handler(pgn), "missing handler for {pgn}");
        }
    }

    #[test]
    fn test_custom_handler_registration() {
        fn stub(_data: &[u8]) -> Option<FieldMap> {
            let mut fields = FieldMap::new();
            fields.insert("custom".into(), true.into());
            Some(fields)
        }

        let mut decoder = Decoder::new();
        decoder.register(60_928, stub);
        let fields = decoder.decode(60_928, &[]).into_fields();
        assert_eq!(fields.get("custom"), Some(&contracts::FieldValue::Bool(true)));
    }
}
