//! Per-PGN decoders
//!
//! Each decoder is a pure function from payload bytes to named fields.
//! A `None` return means the payload was shorter than the PGN's minimum
//! length; individual fields whose raw bits equal the N2K sentinel are
//! dropped rather than emitted as zero.
//!
//! Scale factors and units are part of the field names: speeds appear both
//! as `*_ms` and `*_kts`, angles both as `*_rad` and `*_deg`.

mod attitude;
mod environment;
mod navigation;
mod power;
mod steering;
mod system;
mod water;
mod wind;

pub use attitude::{decode_attitude, decode_rate_of_turn, decode_vessel_heading};
pub use environment::{decode_environmental, decode_humidity, decode_temperature};
pub use navigation::{
    decode_cog_sog, decode_gnss_position, decode_gnss_satellites, decode_navigation_data,
    decode_position_rapid,
};
pub use power::{decode_battery_status, decode_engine_dynamic};
pub use steering::{decode_heading_track_control, decode_rudder};
pub use system::decode_system_time;
pub use water::{decode_distance_log, decode_water_depth, decode_water_speed};
pub use wind::decode_wind;

use chrono::{DateTime, Utc};

pub(crate) const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;
pub(crate) const MS_TO_KNOTS: f64 = 1.94384;

/// 0.1 nautical mile in meters (Distance Log unit)
pub(crate) const NM_TENTH_M: f64 = 185.2;

/// Kelvin (scaled raw) to Celsius
pub(crate) fn kelvin_to_c(raw: u16, scale: f64) -> f64 {
    raw as f64 * scale - 273.15
}

/// UTC instant from an N2K date (days since 1970-01-01) and a time of day
/// in 0.0001-second units.
pub(crate) fn utc_from_days_and_ticks(days: u16, ticks: u32) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(days as i64 * 86_400_000_000 + ticks as i64 * 100)
}
