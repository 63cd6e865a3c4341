//! TelemetryConfig - Config Loader output
//!
//! Describes the complete deployment: broker connection, collector pipeline
//! sizing, CSV outputs and the sensor-side tuning parameters.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::BoomAxis;

/// Complete configuration blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TelemetryConfig {
    /// Collector pipeline settings
    #[serde(default)]
    #[validate(nested)]
    pub collector: CollectorConfig,

    /// Sensor-side settings
    #[serde(default)]
    #[validate(nested)]
    pub sensor: SensorConfig,
}

/// Collector configuration: broker endpoint, pipeline sizing, CSV outputs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CollectorConfig {
    /// Broker hostname
    #[serde(default = "default_broker_host")]
    #[validate(length(min = 1, message = "broker host cannot be empty"))]
    pub broker_host: String,

    /// Broker port
    #[serde(default = "default_broker_port")]
    #[validate(range(min = 1, max = 65535))]
    pub broker_port: u16,

    /// Credentials (optional)
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,

    /// Topic pattern to subscribe to
    #[serde(default = "default_topic")]
    #[validate(length(min = 1, message = "topic cannot be empty"))]
    pub topic: String,

    /// TLS to the broker
    #[serde(default = "default_true")]
    pub use_tls: bool,

    /// Skip TLS certificate verification (debugging only)
    #[serde(default)]
    pub insecure_skip_tls: bool,

    /// Device identifier (client-id prefix)
    #[serde(default = "default_device_id")]
    pub device_id: String,

    /// Ring buffer capacity (messages)
    #[serde(default = "default_buffer_capacity")]
    #[validate(range(min = 1))]
    pub buffer_capacity: usize,

    /// Number of decoder workers
    #[serde(default = "default_decoder_workers")]
    #[validate(range(min = 1))]
    pub decoder_workers: usize,

    /// Bounded channel capacity between pipeline stages
    #[serde(default = "default_queue_size")]
    #[validate(range(min = 1))]
    pub queue_size: usize,

    /// CSV output toggle + paths
    #[serde(default = "default_true")]
    pub enable_csv: bool,
    #[serde(default = "default_frames_path")]
    pub csv_frames_path: PathBuf,
    #[serde(default = "default_decoded_path")]
    pub csv_decoded_path: PathBuf,
    #[serde(default = "default_stats_path")]
    pub csv_stats_path: PathBuf,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            broker_host: default_broker_host(),
            broker_port: default_broker_port(),
            username: None,
            password: None,
            topic: default_topic(),
            use_tls: true,
            insecure_skip_tls: false,
            device_id: default_device_id(),
            buffer_capacity: default_buffer_capacity(),
            decoder_workers: default_decoder_workers(),
            queue_size: default_queue_size(),
            enable_csv: true,
            csv_frames_path: default_frames_path(),
            csv_decoded_path: default_decoded_path(),
            csv_stats_path: default_stats_path(),
        }
    }
}

fn default_broker_host() -> String {
    "localhost".to_string()
}

fn default_broker_port() -> u16 {
    8883
}

fn default_topic() -> String {
    "boats/+/n2k".to_string()
}

fn default_device_id() -> String {
    "boat-dev01".to_string()
}

fn default_buffer_capacity() -> usize {
    86_400
}

fn default_decoder_workers() -> usize {
    4
}

fn default_queue_size() -> usize {
    1_000
}

fn default_true() -> bool {
    true
}

fn default_frames_path() -> PathBuf {
    PathBuf::from("data/frames.csv")
}

fn default_decoded_path() -> PathBuf {
    PathBuf::from("data/decoded_long.csv")
}

fn default_stats_path() -> PathBuf {
    PathBuf::from("data/decode_stats.csv")
}

/// Sensor configuration: filter, boom axis, detector thresholds, QA model
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SensorConfig {
    /// Maximum sample-buffer length
    #[serde(default = "default_max_buffer_len")]
    #[validate(range(min = 2))]
    pub max_buffer_len: usize,

    /// Complementary filter time constant (s)
    #[serde(default = "default_euler_tau")]
    pub euler_tau: f64,

    /// Filtered axis mapped onto the boom
    #[serde(default)]
    pub boom_axis: BoomAxis,

    /// Bayesian QA prior standard deviation
    #[serde(default = "default_bayes_sigma0")]
    pub bayes_sigma0: f64,

    /// QA probability below which an event is flagged as likely spurious
    #[serde(default = "default_qa_low")]
    pub qa_low_threshold: f64,

    /// QA probability above which an event is auto-accepted
    #[serde(default = "default_qa_high")]
    pub qa_high_threshold: f64,

    /// Calibration persistence path
    #[serde(default = "default_calibration_path")]
    pub calibration_path: PathBuf,

    /// Bayesian posterior persistence path
    #[serde(default = "default_posterior_path")]
    pub posterior_path: PathBuf,

    /// Event detection thresholds
    #[serde(default)]
    #[validate(nested)]
    pub thresholds: DetectorThresholds,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            max_buffer_len: default_max_buffer_len(),
            euler_tau: default_euler_tau(),
            boom_axis: BoomAxis::Roll,
            thresholds: DetectorThresholds::default(),
            bayes_sigma0: default_bayes_sigma0(),
            qa_low_threshold: default_qa_low(),
            qa_high_threshold: default_qa_high(),
            calibration_path: default_calibration_path(),
            posterior_path: default_posterior_path(),
        }
    }
}

fn default_max_buffer_len() -> usize {
    600
}

fn default_euler_tau() -> f64 {
    0.7
}

fn default_bayes_sigma0() -> f64 {
    10.0
}

fn default_qa_low() -> f64 {
    0.02
}

fn default_qa_high() -> f64 {
    0.85
}

fn default_calibration_path() -> PathBuf {
    PathBuf::from("boom_calibration.json")
}

fn default_posterior_path() -> PathBuf {
    PathBuf::from("boom_bayes_posterior.json")
}

/// Rule thresholds for the sailing event detector
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DetectorThresholds {
    /// Gyro peak (deg/s) above which a gybe counts as a crash gybe
    #[serde(default = "default_crash_gy_dps")]
    pub crash_gy_dps: f64,

    /// Minimum gyro peak (deg/s) for a normal gybe
    #[serde(default = "default_normal_gy_min")]
    pub normal_gy_min: f64,

    /// Minimum boom-norm travel for a crash gybe
    #[serde(default = "default_boom_step_crash")]
    pub boom_step_crash: f64,

    /// Minimum boom-norm travel for a normal gybe
    #[serde(default = "default_boom_step_normal")]
    pub boom_step_normal: f64,

    /// Crash gybe detection horizon (s)
    #[serde(default = "default_crash_dt")]
    pub crash_dt: f64,

    /// Normal gybe detection horizon (s)
    #[serde(default = "default_normal_dt")]
    pub normal_dt: f64,

    /// Minimum roll drop (deg) for a boom hit
    #[serde(default = "default_roll_hit")]
    pub roll_hit: f64,

    /// Boom hit detection horizon (s)
    #[serde(default = "default_roll_dt")]
    pub roll_dt: f64,

    /// Tack gyro-peak band (deg/s)
    #[serde(default = "default_tack_gy_min")]
    pub tack_gy_min: f64,
    #[serde(default = "default_tack_gy_max")]
    pub tack_gy_max: f64,

    /// Minimum boom-norm travel for a tack
    #[serde(default = "default_tack_boom_step")]
    pub tack_boom_step: f64,

    /// Tack detection horizon (s)
    #[serde(default = "default_tack_dt_max")]
    pub tack_dt_max: f64,

    /// Minimum roll drop (deg) for a tack
    #[serde(default = "default_tack_min_roll_delta")]
    pub tack_min_roll_delta: f64,

    /// Minimum spacing between emitted events (s)
    #[serde(default = "default_refractory")]
    pub refractory: f64,
}

impl Default for DetectorThresholds {
    fn default() -> Self {
        Self {
            crash_gy_dps: default_crash_gy_dps(),
            normal_gy_min: default_normal_gy_min(),
            boom_step_crash: default_boom_step_crash(),
            boom_step_normal: default_boom_step_normal(),
            crash_dt: default_crash_dt(),
            normal_dt: default_normal_dt(),
            roll_hit: default_roll_hit(),
            roll_dt: default_roll_dt(),
            tack_gy_min: default_tack_gy_min(),
            tack_gy_max: default_tack_gy_max(),
            tack_boom_step: default_tack_boom_step(),
            tack_dt_max: default_tack_dt_max(),
            tack_min_roll_delta: default_tack_min_roll_delta(),
            refractory: default_refractory(),
        }
    }
}

fn default_crash_gy_dps() -> f64 {
    120.0
}

fn default_normal_gy_min() -> f64 {
    20.0
}

fn default_boom_step_crash() -> f64 {
    1.2
}

fn default_boom_step_normal() -> f64 {
    1.0
}

fn default_crash_dt() -> f64 {
    0.6
}

fn default_normal_dt() -> f64 {
    2.5
}

fn default_roll_hit() -> f64 {
    8.0
}

fn default_roll_dt() -> f64 {
    0.4
}

fn default_tack_gy_min() -> f64 {
    15.0
}

fn default_tack_gy_max() -> f64 {
    110.0
}

fn default_tack_boom_step() -> f64 {
    1.0
}

fn default_tack_dt_max() -> f64 {
    3.0
}

fn default_tack_min_roll_delta() -> f64 {
    12.0
}

fn default_refractory() -> f64 {
    3.0
}
