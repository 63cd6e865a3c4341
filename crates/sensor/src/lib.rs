//! # Sensor
//!
//! The IMU-side subsystem: complementary filter for roll/pitch, 4-point
//! boom calibration, the sliding-window sailing event detector, and the
//! online Bayesian quality model that scores emitted events. `BoomSense`
//! coordinates them and owns the telemetry buffers and CSV log.

mod bayesian;
mod boomsense;
mod calibrator;
mod detector;
mod filter;
mod persist;
mod telemetry;

pub use bayesian::{extract_features, BayesianQa, FEATURE_DIM};
pub use boomsense::{BoomSense, EventQaFlag, SensorState, SensorStats};
pub use calibrator::{BoomCalibrator, CalibrationSolution, CaptureSet, CaptureStage};
pub use detector::{EventDetector, EventListener, ListenerHandle};
pub use filter::ComplementaryFilter;
pub use telemetry::{SampleBuffer, TelemetryBuffers};
