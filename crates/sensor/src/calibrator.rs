//! Boom calibrator - 4-point capture to (mid, span+, span-)
//!
//! The operator captures four points in order: boom centered, fully out to
//! starboard, fully out to port, centered again. The blended center weighs
//! the extreme midpoint against the operator centers, leaning on the
//! extremes more when the two center captures disagree (rough water).
//!
//! The interactive prompts live outside this crate: the calibrator only
//! consumes a "read axis" callback and a "capture now" signal, and exposes
//! compute and commit as separate operations so a UI can confirm first.

use std::path::Path;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use contracts::{BoomAxis, Calibration, TelemetryError};
use tracing::{info, warn};

use crate::persist;

/// How long each capture samples the axis
const CAPTURE_WINDOW: Duration = Duration::from_millis(500);

/// Polling period during a capture
const CAPTURE_POLL: Duration = Duration::from_millis(20);

/// How long to wait for the filter before giving up
const FILTER_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Center captures further than this from the blended mid trigger a warning
const CENTER_OFF_WARN_DEG: f64 = 3.0;

/// The four capture points, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    CenterFirst,
    Starboard,
    Port,
    CenterSecond,
}

impl CaptureStage {
    pub const ALL: [CaptureStage; 4] = [
        CaptureStage::CenterFirst,
        CaptureStage::Starboard,
        CaptureStage::Port,
        CaptureStage::CenterSecond,
    ];

    /// Operator instruction for this stage
    pub fn instruction(&self) -> &'static str {
        match self {
            CaptureStage::CenterFirst => "Place boom centered on the centerline",
            CaptureStage::Starboard => "Ease boom fully out to starboard (max)",
            CaptureStage::Port => "Ease boom fully out to port (max)",
            CaptureStage::CenterSecond => "Return boom to center again (validation)",
        }
    }
}

/// The four captured medians
#[derive(Debug, Clone, Copy)]
pub struct CaptureSet {
    pub c0: f64,
    pub stb: f64,
    pub port: f64,
    pub c1: f64,
}

/// Computed calibration plus its diagnostics
#[derive(Debug, Clone)]
pub struct CalibrationSolution {
    pub calibration: Calibration,

    /// Midpoint of the two extremes
    pub mid_ext: f64,

    /// Midpoint of the two center captures
    pub c_mid: f64,

    /// |c1 - c0|: disagreement between the center captures
    pub noise: f64,

    /// Blending weight given to the extremes
    pub w_ext: f64,

    /// Center capture offsets vs the blended mid
    pub offset_c0: f64,
    pub offset_c1: f64,

    /// Centers are suspiciously far off the blended mid
    pub centers_off: bool,
}

impl CaptureSet {
    /// Compute the calibration from the four captures
    pub fn solve(&self) -> CalibrationSolution {
        let mid_ext = (self.stb + self.port) / 2.0;
        let c_mid = (self.c0 + self.c1) / 2.0;
        let noise = (self.c1 - self.c0).abs();

        // Noisier centers shift trust toward the extremes
        let w_ext = (0.5 + noise / 10.0).min(0.9);
        let mid = w_ext * mid_ext + (1.0 - w_ext) * c_mid;

        let span_pos = (self.stb - mid).max(1e-3);
        let span_neg = (mid - self.port).max(1e-3);

        let offset_c0 = self.c0 - mid;
        let offset_c1 = self.c1 - mid;

        CalibrationSolution {
            calibration: Calibration {
                mid,
                span_pos,
                span_neg,
                timestamp: Utc::now(),
            },
            mid_ext,
            c_mid,
            noise,
            w_ext,
            offset_c0,
            offset_c1,
            centers_off: offset_c0.abs().max(offset_c1.abs()) > CENTER_OFF_WARN_DEG,
        }
    }
}

/// Boom calibration state holder
pub struct BoomCalibrator {
    boom_axis: BoomAxis,
    calibration: RwLock<Option<Arc<Calibration>>>,
}

impl BoomCalibrator {
    pub fn new(boom_axis: BoomAxis) -> Self {
        Self {
            boom_axis,
            calibration: RwLock::new(None),
        }
    }

    pub fn boom_axis(&self) -> BoomAxis {
        self.boom_axis
    }

    /// Run the 4-point capture sequence.
    ///
    /// `read_axis` returns the live filtered axis value (None until the
    /// filter has initialized). `wait_capture` blocks until the operator
    /// signals "capture now" for the given stage.
    pub fn capture<F, W>(&self, read_axis: F, mut wait_capture: W) -> Result<CaptureSet, TelemetryError>
    where
        F: Fn() -> Option<f64>,
        W: FnMut(CaptureStage),
    {
        if !wait_for_filter(&read_axis, FILTER_READY_TIMEOUT) {
            return Err(TelemetryError::Other(
                "filter not initialized in time for calibration".to_string(),
            ));
        }

        let mut points = [0.0f64; 4];
        for (i, stage) in CaptureStage::ALL.iter().enumerate() {
            wait_capture(*stage);
            points[i] = capture_point(&read_axis);
        }

        Ok(CaptureSet {
            c0: points[0],
            stb: points[1],
            port: points[2],
            c1: points[3],
        })
    }

    /// Atomically replace the active calibration
    pub fn commit(&self, solution: &CalibrationSolution) {
        if solution.centers_off {
            warn!(
                offset_c0 = solution.offset_c0,
                offset_c1 = solution.offset_c1,
                "centers are >3 deg off blended mid, check sea state / sensor alignment"
            );
        }
        self.set_calibration(solution.calibration);
        info!(
            mid = solution.calibration.mid,
            span_pos = solution.calibration.span_pos,
            span_neg = solution.calibration.span_neg,
            "calibration committed"
        );
    }

    pub fn set_calibration(&self, calibration: Calibration) {
        *self.calibration.write().expect("calibration lock poisoned") =
            Some(Arc::new(calibration));
    }

    pub fn calibration(&self) -> Option<Arc<Calibration>> {
        self.calibration
            .read()
            .expect("calibration lock poisoned")
            .clone()
    }

    /// Boom metrics for an axis value: (degrees from center, normalized
    /// position clamped to [-1.1, 1.1]). `None` while uncalibrated.
    pub fn compute_boom(&self, axis_value: f64) -> Option<(f64, f64)> {
        let cal = self.calibration()?;

        let rel = axis_value - cal.mid;
        let norm = if rel >= 0.0 {
            rel / cal.span_pos
        } else {
            rel / cal.span_neg
        };

        Some((rel, norm.clamp(-1.1, 1.1)))
    }

    /// Persist the active calibration (no-op error when uncalibrated)
    pub fn save_to_file(&self, path: &Path) -> Result<(), TelemetryError> {
        match self.calibration() {
            Some(cal) => persist::save_json(path, cal.as_ref()),
            None => Err(TelemetryError::state_persist(
                path.display().to_string(),
                "no calibration to save",
            )),
        }
    }

    /// Restore a persisted calibration; a missing file leaves the
    /// uncalibrated state in place
    pub fn load_from_file(&self, path: &Path) -> Result<bool, TelemetryError> {
        match persist::load_json::<Calibration>(path)? {
            Some(cal) => {
                self.set_calibration(cal);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Median of samples polled every 20 ms for 500 ms
fn capture_point<F: Fn() -> Option<f64>>(read_axis: &F) -> f64 {
    let mut samples = Vec::new();
    let end = Instant::now() + CAPTURE_WINDOW;

    while Instant::now() < end {
        if let Some(value) = read_axis() {
            samples.push(value);
        }
        thread::sleep(CAPTURE_POLL);
    }

    if samples.is_empty() {
        warn!("no samples captured");
        return 0.0;
    }

    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    samples[samples.len() / 2]
}

fn wait_for_filter<F: Fn() -> Option<f64>>(read_axis: &F, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if read_axis().is_some() {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    false
}
