//! Sensor-side data structures
//!
//! Raw IMU/meteo/wind readings, the filtered output, boom calibration
//! parameters and detected sailing events.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw IMU sensor data
#[derive(Debug, Clone, Copy)]
pub struct ImuReading {
    pub timestamp: DateTime<Utc>,

    /// Accelerometer (g)
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,

    /// Gyroscope (deg/s)
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
}

/// Meteorological sensor data
#[derive(Debug, Clone, Copy)]
pub struct MeteoReading {
    pub timestamp: DateTime<Utc>,
    pub temp_c: f64,
    pub pressure_hpa: f64,
    pub humidity_pct: f64,
}

/// Wind sensor data
#[derive(Debug, Clone, Copy)]
pub struct WindReading {
    pub timestamp: DateTime<Utc>,
    pub speed_kts: f64,
    pub angle_deg: f64,
}

/// Processed IMU data with filtered angles
///
/// `boom_rel_deg` and `boom_norm` are NaN while no calibration is loaded.
#[derive(Debug, Clone, Copy)]
pub struct FilteredData {
    pub timestamp: DateTime<Utc>,
    pub roll_deg: f64,
    pub pitch_deg: f64,

    /// Boom angle relative to the calibrated center (deg)
    pub boom_rel_deg: f64,

    /// Normalized boom position, clamped to [-1.1, 1.1]
    pub boom_norm: f64,

    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
}

/// Boom calibration parameters
///
/// Produced by the 4-point calibration sequence and replaced atomically;
/// persisted as a JSON blob with these exact key names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Calibration {
    /// Center angle (degrees)
    pub mid: f64,

    /// Starboard span (degrees, >= 1e-3)
    pub span_pos: f64,

    /// Port span (degrees, >= 1e-3)
    pub span_neg: f64,

    /// Capture instant
    pub timestamp: DateTime<Utc>,
}

/// Which filtered axis drives the boom mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoomAxis {
    #[default]
    Roll,
    Pitch,
}

impl fmt::Display for BoomAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoomAxis::Roll => f.write_str("roll"),
            BoomAxis::Pitch => f.write_str("pitch"),
        }
    }
}

/// Detected sailing event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Tack,
    GybeNormal,
    GybeCrash,
    BoomHit,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Tack => f.write_str("tack"),
            EventKind::GybeNormal => f.write_str("gybe_normal"),
            EventKind::GybeCrash => f.write_str("gybe_crash"),
            EventKind::BoomHit => f.write_str("boom_hit"),
        }
    }
}

/// Tack crossing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TackDirection {
    StbToPort,
    PortToStb,
}

impl fmt::Display for TackDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TackDirection::StbToPort => f.write_str("stb_to_port"),
            TackDirection::PortToStb => f.write_str("port_to_stb"),
        }
    }
}

/// A detected sailing event
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,

    /// Peak |gyro| over the detection window (deg/s)
    pub gyro_peak: f64,

    /// Boom-norm travel over the window
    pub boom_delta: f64,

    /// Largest roll decrease over the window (deg)
    pub roll_delta: f64,

    /// Window span (s)
    pub duration: f64,

    /// Crossing direction (tacks only)
    pub direction: Option<TackDirection>,

    /// Settling overshoot (tacks only)
    pub overshoot: f64,

    /// Tack quality score 0-100 (tacks only)
    pub score: f64,

    /// Wind enrichment (latest reading at emission time)
    pub wind_speed: f64,
    pub wind_angle: f64,
}
