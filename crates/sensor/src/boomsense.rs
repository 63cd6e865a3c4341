//! BoomSense coordinator
//!
//! Owns the filter, calibrator, detector, Bayesian model and telemetry
//! buffers. IMU/meteo/wind sampling callers drive it; events flow out
//! through registered listeners, enriched with the latest wind reading.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use contracts::{
    Calibration, Event, FilteredData, ImuReading, MeteoReading, SensorConfig, TelemetryError,
    WindReading,
};
use serde::Serialize;
use storage::CsvAppender;
use tracing::{info, warn};

use crate::bayesian::{extract_features, BayesianQa, FEATURE_DIM};
use crate::calibrator::{BoomCalibrator, CalibrationSolution, CaptureStage};
use crate::detector::{EventDetector, EventListener, ListenerHandle};
use crate::filter::ComplementaryFilter;
use crate::telemetry::{TelemetryBuffers, TelemetrySizes};

const CSV_HEADER: [&str; 17] = [
    "iso8601",
    "ts",
    "ax_g",
    "ay_g",
    "az_g",
    "gx_dps",
    "gy_dps",
    "gz_dps",
    "roll_f_deg",
    "pitch_f_deg",
    "boom_rel_deg",
    "boom_norm",
    "temp_c",
    "press_hpa",
    "rh_pct",
    "wind_speed_kn",
    "wind_angle_deg",
];

/// Live-state snapshot for external consumers
#[derive(Debug, Clone, Serialize)]
pub struct SensorState {
    pub has_calibration: bool,
    pub wind_speed_kts: f64,
    pub wind_angle_deg: f64,
    pub roll_deg: Option<f64>,
    pub pitch_deg: Option<f64>,
    pub boom_rel_deg: Option<f64>,
    pub boom_norm: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub calibration: Option<Calibration>,
}

/// Where an event's QA probability lands relative to the configured
/// low/high thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventQaFlag {
    /// Below the low threshold: probably a false detection
    LikelySpurious,
    /// Between the thresholds: worth operator feedback
    Uncertain,
    /// Above the high threshold
    AutoAccepted,
}

/// Operational statistics
#[derive(Debug, Clone, Serialize)]
pub struct SensorStats {
    pub filter_initialized: bool,
    pub current_roll_deg: f64,
    pub current_pitch_deg: f64,
    pub has_calibration: bool,
    pub uptime_seconds: f64,
    pub buffers: TelemetrySizes,
}

/// The sensor-side coordinator
pub struct BoomSense {
    config: SensorConfig,
    filter: ComplementaryFilter,
    calibrator: BoomCalibrator,
    detector: Arc<EventDetector>,
    bayesian: Arc<BayesianQa>,
    buffers: Arc<TelemetryBuffers>,
    csv: Mutex<Option<CsvAppender>>,
    started_at: Instant,
}

impl BoomSense {
    pub fn new(config: SensorConfig) -> Self {
        let sensor = Self {
            filter: ComplementaryFilter::new(config.euler_tau),
            calibrator: BoomCalibrator::new(config.boom_axis),
            detector: Arc::new(EventDetector::new(
                config.thresholds.clone(),
                config.max_buffer_len,
            )),
            bayesian: Arc::new(BayesianQa::new(FEATURE_DIM, config.bayes_sigma0)),
            buffers: Arc::new(TelemetryBuffers::new(config.max_buffer_len)),
            csv: Mutex::new(None),
            started_at: Instant::now(),
            config,
        };
        sensor.install_qa_listener();
        sensor
    }

    /// Every emitted event gets a QA line relating its predicted
    /// probability to the configured thresholds
    fn install_qa_listener(&self) {
        let bayesian = Arc::clone(&self.bayesian);
        let low = self.config.qa_low_threshold;
        let high = self.config.qa_high_threshold;

        self.detector.add_listener(Arc::new(move |event: Event| {
            let probability = bayesian.predict_proba(&extract_features(&event));
            if probability <= low {
                warn!(
                    kind = %event.kind,
                    probability,
                    "event flagged as likely spurious"
                );
            } else if probability >= high {
                info!(kind = %event.kind, probability, "event auto-accepted");
            } else {
                info!(kind = %event.kind, probability, "event awaiting feedback");
            }
        }));
    }

    /// Relate an event's QA probability to the configured thresholds
    pub fn classify_event(&self, event: &Event) -> EventQaFlag {
        let probability = self.evaluate_event(event);
        if probability <= self.config.qa_low_threshold {
            EventQaFlag::LikelySpurious
        } else if probability >= self.config.qa_high_threshold {
            EventQaFlag::AutoAccepted
        } else {
            EventQaFlag::Uncertain
        }
    }

    /// Load persisted calibration and posterior; absence of either is fine
    pub fn start(&self) -> Result<(), TelemetryError> {
        info!(
            tau = self.config.euler_tau,
            boom_axis = %self.config.boom_axis,
            "starting sensor"
        );

        match self.calibrator.load_from_file(&self.config.calibration_path) {
            Ok(true) => {
                if let Some(cal) = self.calibrator.calibration() {
                    info!(
                        mid = cal.mid,
                        span_pos = cal.span_pos,
                        span_neg = cal.span_neg,
                        "loaded calibration"
                    );
                }
            }
            Ok(false) => info!("no calibration on disk, starting uncalibrated"),
            Err(e) => warn!(error = %e, "calibration load failed, starting uncalibrated"),
        }

        match self.bayesian.load_from_file(&self.config.posterior_path) {
            Ok(true) => info!("loaded Bayesian QA posterior"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "posterior load failed, keeping prior"),
        }

        Ok(())
    }

    /// Persist state and flush the CSV log
    pub fn stop(&self) {
        info!("stopping sensor");

        if self.calibrator.calibration().is_some() {
            if let Err(e) = self.calibrator.save_to_file(&self.config.calibration_path) {
                warn!(error = %e, "calibration save failed");
            }
        }

        if let Err(e) = self.bayesian.save_to_file(&self.config.posterior_path) {
            warn!(error = %e, "posterior save failed");
        }

        if let Some(csv) = self.csv.lock().expect("csv lock poisoned").as_mut() {
            if let Err(e) = csv.flush() {
                warn!(error = %e, "sensor csv flush failed");
            }
        }

        info!("sensor stopped");
    }

    /// Start appending one row per IMU sample to `path`
    pub fn enable_csv_logging(&self, path: &std::path::Path) -> Result<(), TelemetryError> {
        let appender = CsvAppender::open(path, &CSV_HEADER)?;
        *self.csv.lock().expect("csv lock poisoned") = Some(appender);
        info!(path = %path.display(), "sensor csv logging enabled");
        Ok(())
    }

    /// Run one IMU reading through the filter, boom mapping, buffers,
    /// detector and CSV log
    pub fn process_imu(&self, reading: ImuReading) -> FilteredData {
        let (roll, pitch) = self.filter.update(&reading);

        let axis_value = match self.config.boom_axis {
            contracts::BoomAxis::Roll => roll,
            contracts::BoomAxis::Pitch => pitch,
        };

        // NaN marks "uncalibrated" downstream
        let (boom_rel_deg, boom_norm) = self
            .calibrator
            .compute_boom(axis_value)
            .unwrap_or((f64::NAN, f64::NAN));

        let filtered = FilteredData {
            timestamp: reading.timestamp,
            roll_deg: roll,
            pitch_deg: pitch,
            boom_rel_deg,
            boom_norm,
            accel_x: reading.accel_x,
            accel_y: reading.accel_y,
            accel_z: reading.accel_z,
            gyro_x: reading.gyro_x,
            gyro_y: reading.gyro_y,
            gyro_z: reading.gyro_z,
        };

        self.buffers.push_filtered(filtered);

        // The detector only sees samples with a usable boom position
        if boom_norm.is_finite() {
            self.detector
                .on_sample(reading.timestamp, reading.gyro_y, boom_norm, roll);
        }

        self.write_csv_row(&filtered);

        filtered
    }

    pub fn process_meteo(&self, reading: MeteoReading) {
        self.buffers.push_meteo(reading);
    }

    pub fn process_wind(&self, reading: WindReading) {
        self.buffers.push_wind(reading);
    }

    /// Live value of the configured boom axis (None until the filter has
    /// initialized); this is the calibrator's "read axis" hook
    pub fn axis_value(&self) -> Option<f64> {
        let (roll, pitch, initialized) = self.filter.state();
        if !initialized {
            return None;
        }
        Some(match self.config.boom_axis {
            contracts::BoomAxis::Roll => roll,
            contracts::BoomAxis::Pitch => pitch,
        })
    }

    /// Run the 4-point capture sequence and compute a solution for the
    /// caller to confirm; nothing is applied yet
    pub fn perform_calibration<W>(&self, wait_capture: W) -> Result<CalibrationSolution, TelemetryError>
    where
        W: FnMut(CaptureStage),
    {
        let set = self.calibrator.capture(|| self.axis_value(), wait_capture)?;
        Ok(set.solve())
    }

    /// Apply a confirmed solution and persist it immediately
    pub fn commit_calibration(&self, solution: &CalibrationSolution) {
        self.calibrator.commit(solution);
        if let Err(e) = self.calibrator.save_to_file(&self.config.calibration_path) {
            warn!(error = %e, "calibration save failed");
        }
    }

    /// Register an event listener; events are enriched with the latest
    /// wind reading before delivery
    pub fn add_event_listener(&self, listener: EventListener) -> ListenerHandle {
        let buffers = Arc::clone(&self.buffers);
        self.detector.add_listener(Arc::new(move |mut event: Event| {
            if let Some(wind) = buffers.latest_wind() {
                event.wind_speed = wind.speed_kts;
                event.wind_angle = wind.angle_deg;
            }
            listener(event);
        }))
    }

    pub fn remove_event_listener(&self, handle: ListenerHandle) -> bool {
        self.detector.remove_listener(handle)
    }

    /// Operator feedback: update the posterior and persist it
    pub fn process_event_feedback(&self, event: &Event, is_correct: bool) {
        let features = extract_features(event);
        self.bayesian
            .update(&features, if is_correct { 1.0 } else { 0.0 }, 1);

        if let Err(e) = self.bayesian.save_to_file(&self.config.posterior_path) {
            warn!(error = %e, "posterior save failed");
        }
    }

    /// Predicted probability that `event` is a correct detection
    pub fn evaluate_event(&self, event: &Event) -> f64 {
        self.bayesian.predict_proba(&extract_features(event))
    }

    pub fn current_state(&self) -> SensorState {
        let latest = self.buffers.latest_filtered();
        let wind = self.buffers.latest_wind();
        let calibration = self.calibrator.calibration();

        SensorState {
            has_calibration: calibration.is_some(),
            wind_speed_kts: wind.map(|w| w.speed_kts).unwrap_or(0.0),
            wind_angle_deg: wind.map(|w| w.angle_deg).unwrap_or(0.0),
            roll_deg: latest.map(|f| f.roll_deg),
            pitch_deg: latest.map(|f| f.pitch_deg),
            boom_rel_deg: latest.map(|f| f.boom_rel_deg),
            boom_norm: latest.map(|f| f.boom_norm),
            timestamp: latest.map(|f| f.timestamp),
            calibration: calibration.map(|c| *c),
        }
    }

    pub fn stats(&self) -> SensorStats {
        let (roll, pitch, initialized) = self.filter.state();
        SensorStats {
            filter_initialized: initialized,
            current_roll_deg: roll,
            current_pitch_deg: pitch,
            has_calibration: self.calibrator.calibration().is_some(),
            uptime_seconds: self.started_at.elapsed().as_secs_f64(),
            buffers: self.buffers.sizes(),
        }
    }

    pub fn detector(&self) -> &EventDetector {
        &self.detector
    }

    pub fn calibrator(&self) -> &BoomCalibrator {
        &self.calibrator
    }

    pub fn buffers(&self) -> &TelemetryBuffers {
        &self.buffers
    }

    fn write_csv_row(&self, data: &FilteredData) {
        let mut guard = self.csv.lock().expect("csv lock poisoned");
        let Some(csv) = guard.as_mut() else { return };

        let wind = self.buffers.latest_wind();
        let meteo = self.buffers.latest_meteo();

        let row = [
            data.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            format!("{:.3}", data.timestamp.timestamp_micros() as f64 / 1e6),
            format!("{:.6}", data.accel_x),
            format!("{:.6}", data.accel_y),
            format!("{:.6}", data.accel_z),
            format!("{:.6}", data.gyro_x),
            format!("{:.6}", data.gyro_y),
            format!("{:.6}", data.gyro_z),
            format!("{:.3}", data.roll_deg),
            format!("{:.3}", data.pitch_deg),
            format!("{:.3}", data.boom_rel_deg),
            format!("{:.3}", data.boom_norm),
            format!("{:.2}", meteo.map(|m| m.temp_c).unwrap_or(0.0)),
            format!("{:.2}", meteo.map(|m| m.pressure_hpa).unwrap_or(0.0)),
            format!("{:.2}", meteo.map(|m| m.humidity_pct).unwrap_or(0.0)),
            format!("{:.2}", wind.map(|w| w.speed_kts).unwrap_or(0.0)),
            format!("{:.2}", wind.map(|w| w.angle_deg).unwrap_or(0.0)),
        ];

        if let Err(e) = csv.write_row(row) {
            warn!(error = %e, "sensor csv write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::mpsc;

    fn config(dir: &std::path::Path) -> SensorConfig {
        SensorConfig {
            calibration_path: dir.join("boom_calibration.json"),
            posterior_path: dir.join("boom_bayes_posterior.json"),
            ..SensorConfig::default()
        }
    }

    fn reading(ms: i64, accel: (f64, f64, f64), gyro_y: f64) -> ImuReading {
        ImuReading {
            timestamp: Utc.timestamp_opt(1_000, 0).unwrap() + Duration::milliseconds(ms),
            accel_x: accel.0,
            accel_y: accel.1,
            accel_z: accel.2,
            gyro_x: 0.0,
            gyro_y,
            gyro_z: 0.0,
        }
    }

    fn test_calibration() -> Calibration {
        Calibration {
            mid: 0.0,
            span_pos: 30.0,
            span_neg: 30.0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_uncalibrated_boom_is_nan() {
        let dir = tempfile::tempdir().unwrap();
        let sensor = BoomSense::new(config(dir.path()));
        sensor.start().unwrap();

        let filtered = sensor.process_imu(reading(0, (0.0, 0.0, 1.0), 0.0));
        assert!(filtered.boom_rel_deg.is_nan());
        assert!(filtered.boom_norm.is_nan());
        assert!(!sensor.current_state().has_calibration);
    }

    #[test]
    fn test_calibrated_boom_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let sensor = BoomSense::new(config(dir.path()));
        sensor.calibrator().set_calibration(test_calibration());

        // Device accel (sin15, 0, cos15): 15 deg heel in the stern frame
        let tilt = 15f64.to_radians();
        let filtered = sensor.process_imu(reading(0, (tilt.sin(), 0.0, tilt.cos()), 0.0));

        assert!((filtered.roll_deg - 15.0).abs() < 1e-6);
        assert!((filtered.boom_rel_deg - 15.0).abs() < 1e-6);
        assert!((filtered.boom_norm - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_axis_value_requires_initialized_filter() {
        let dir = tempfile::tempdir().unwrap();
        let sensor = BoomSense::new(config(dir.path()));
        assert!(sensor.axis_value().is_none());

        sensor.process_imu(reading(0, (0.0, 0.0, 1.0), 0.0));
        assert!(sensor.axis_value().is_some());
    }

    #[test]
    fn test_event_wind_enrichment() {
        let dir = tempfile::tempdir().unwrap();
        let sensor = BoomSense::new(config(dir.path()));

        sensor.process_wind(WindReading {
            timestamp: Utc::now(),
            speed_kts: 14.5,
            angle_deg: 60.0,
        });

        let (tx, rx) = mpsc::channel();
        sensor.add_event_listener(Arc::new(move |event| {
            let _ = tx.send(event);
        }));

        // Drive a crash gybe straight into the detector
        let base = Utc.timestamp_opt(2_000, 0).unwrap();
        for i in 0..=10i64 {
            let frac = i as f64 / 10.0;
            sensor.detector().on_sample(
                base + Duration::milliseconds(i * 50),
                150.0,
                0.7 - 1.4 * frac,
                5.0,
            );
        }

        let event = rx
            .recv_timeout(std::time::Duration::from_secs(2))
            .expect("no event delivered");
        assert_eq!(event.kind, contracts::EventKind::GybeCrash);
        assert_eq!(event.wind_speed, 14.5);
        assert_eq!(event.wind_angle, 60.0);
    }

    #[test]
    fn test_feedback_persists_posterior() {
        let dir = tempfile::tempdir().unwrap();
        let sensor = BoomSense::new(config(dir.path()));

        let event = Event {
            kind: contracts::EventKind::Tack,
            timestamp: Utc::now(),
            gyro_peak: 60.0,
            boom_delta: 1.1,
            roll_delta: 18.0,
            duration: 2.0,
            direction: None,
            overshoot: 0.05,
            score: 75.0,
            wind_speed: 10.0,
            wind_angle: 40.0,
        };

        let before = sensor.evaluate_event(&event);
        sensor.process_event_feedback(&event, true);
        let after = sensor.evaluate_event(&event);

        assert!(after > before);
        assert!(dir.path().join("boom_bayes_posterior.json").exists());
    }

    #[test]
    fn test_state_round_trip_through_stop_start() {
        let dir = tempfile::tempdir().unwrap();

        {
            let sensor = BoomSense::new(config(dir.path()));
            sensor.calibrator().set_calibration(test_calibration());
            sensor.stop();
        }

        let sensor = BoomSense::new(config(dir.path()));
        sensor.start().unwrap();
        let state = sensor.current_state();
        assert!(state.has_calibration);
        assert_eq!(state.calibration.unwrap().span_pos, 30.0);
    }

    #[test]
    fn test_csv_logging_writes_rows() {
        let dir = tempfile::tempdir().unwrap();
        let sensor = BoomSense::new(config(dir.path()));
        let csv_path = dir.path().join("boomsense.csv");
        sensor.enable_csv_logging(&csv_path).unwrap();

        sensor.process_meteo(MeteoReading {
            timestamp: Utc::now(),
            temp_c: 21.5,
            pressure_hpa: 1013.0,
            humidity_pct: 55.0,
        });
        sensor.process_imu(reading(0, (0.0, 0.0, 1.0), 0.0));
        sensor.process_imu(reading(20, (0.0, 0.0, 1.0), 0.0));
        sensor.stop();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3); // header + 2 rows
        assert!(lines[0].starts_with("iso8601,ts,ax_g"));
        assert!(lines[1].contains("21.50,1013.00,55.00"));
        // Uncalibrated boom columns are NaN
        assert!(lines[1].contains("NaN,NaN"));
    }

    #[test]
    fn test_classify_event_against_thresholds() {
        let dir = tempfile::tempdir().unwrap();
        let sensor = BoomSense::new(config(dir.path()));

        let event = Event {
            kind: contracts::EventKind::Tack,
            timestamp: Utc::now(),
            gyro_peak: 60.0,
            boom_delta: 1.1,
            roll_delta: 18.0,
            duration: 2.0,
            direction: None,
            overshoot: 0.05,
            score: 75.0,
            wind_speed: 10.0,
            wind_angle: 40.0,
        };

        // Fresh prior predicts 0.5: inside the default [0.02, 0.85] window
        assert_eq!(sensor.classify_event(&event), EventQaFlag::Uncertain);

        // Enough positive feedback crosses the auto-accept threshold
        for _ in 0..20 {
            sensor.process_event_feedback(&event, true);
        }
        assert_eq!(sensor.classify_event(&event), EventQaFlag::AutoAccepted);
    }

    #[test]
    fn test_stats() {
        let dir = tempfile::tempdir().unwrap();
        let sensor = BoomSense::new(config(dir.path()));
        sensor.process_imu(reading(0, (0.0, 0.0, 1.0), 0.0));

        let stats = sensor.stats();
        assert!(stats.filter_initialized);
        assert_eq!(stats.buffers.imu_size, 1);
        assert!(!stats.has_calibration);
    }
}
