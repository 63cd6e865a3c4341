//! Complementary filter - IMU accel+gyro to filtered roll/pitch
//!
//! Coordinates are remapped into the stern-view frame before filtering:
//! +X = starboard, +Y = up, +Z = forward (bow). Gravity at rest is
//! (0, -1g, 0) in that frame.

use std::sync::RwLock;

use contracts::ImuReading;

/// Euler angle estimator fusing integrated gyro (high-pass) with
/// accelerometer tilt (low-pass)
pub struct ComplementaryFilter {
    tau: f64,
    state: RwLock<FilterState>,
}

#[derive(Debug, Clone, Copy, Default)]
struct FilterState {
    initialized: bool,
    roll: f64,
    pitch: f64,
    last_time: f64,
}

impl ComplementaryFilter {
    /// `tau` is the fusion time constant in seconds
    pub fn new(tau: f64) -> Self {
        Self {
            tau,
            state: RwLock::new(FilterState::default()),
        }
    }

    /// Process one IMU reading, returning filtered (roll, pitch) in degrees
    pub fn update(&self, reading: &ImuReading) -> (f64, f64) {
        let ts = reading.timestamp.timestamp_micros() as f64 / 1e6;

        // Remap into the stern-view frame
        let ax = reading.accel_y;
        let ay = -reading.accel_z;
        let az = reading.accel_x;
        let gx = reading.gyro_y;
        let gy = -reading.gyro_z;

        let mut state = self.state.write().expect("filter lock poisoned");

        if !state.initialized {
            let (roll_acc, pitch_acc) = acc_tilt_deg(ax, ay, az);
            state.roll = roll_acc;
            state.pitch = pitch_acc;
            state.last_time = ts;
            state.initialized = true;
            return (state.roll, state.pitch);
        }

        // Large gaps are capped so a stalled sampler cannot swing the state
        let dt = (ts - state.last_time).min(0.2);
        state.last_time = ts;

        // Prediction: integrate gyro
        let roll_gyro = state.roll + gx * dt;
        let pitch_gyro = state.pitch + gy * dt;

        // Measurement: accelerometer tilt
        let (roll_acc, pitch_acc) = acc_tilt_deg(ax, ay, az);

        let tau = self.tau.max(1e-3);
        let alpha = if dt <= 0.0 { 1.0 } else { tau / (tau + dt) };

        state.roll = alpha * roll_gyro + (1.0 - alpha) * roll_acc;
        state.pitch = alpha * pitch_gyro + (1.0 - alpha) * pitch_acc;

        (state.roll, state.pitch)
    }

    /// Current (roll, pitch, initialized)
    pub fn state(&self) -> (f64, f64, bool) {
        let state = self.state.read().expect("filter lock poisoned");
        (state.roll, state.pitch, state.initialized)
    }

    pub fn reset(&self) {
        let mut state = self.state.write().expect("filter lock poisoned");
        *state = FilterState::default();
    }
}

/// Tilt from the accelerometer in the stern-view frame:
/// roll about +X is atan2(az, -ay), pitch about +Y is
/// atan2(-ax, sqrt(ay^2 + az^2)).
fn acc_tilt_deg(ax: f64, ay: f64, az: f64) -> (f64, f64) {
    let roll = az.atan2(-ay).to_degrees();
    let pitch = (-ax).atan2((ay * ay + az * az).sqrt()).to_degrees();
    (roll, pitch)
}
