//! Configuration validation
//!
//! Rules:
//! - derive-level constraints (ranges, non-empty strings) via `Validate`
//! - decoder_workers / queue_size / buffer_capacity >= 1
//! - euler_tau > 0
//! - detector horizons and thresholds > 0, refractory >= 0
//! - tack gyro band ordered
//! - CSV paths non-empty when CSV output is enabled
//! - QA thresholds in [0, 1] and ordered

use contracts::{TelemetryConfig, TelemetryError};
use validator::Validate;

/// Validate a TelemetryConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    validate_derive(config)?;
    validate_collector(config)?;
    validate_sensor(config)?;
    Ok(())
}

/// Run the derive-level `Validate` constraints
fn validate_derive(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    config.validate().map_err(|e| {
        let field = e
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "config".to_string());
        TelemetryError::config_validation(field, e.to_string())
    })
}

fn validate_collector(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let collector = &config.collector;

    if collector.decoder_workers == 0 {
        return Err(TelemetryError::config_validation(
            "collector.decoder_workers",
            "decoder_workers must be >= 1",
        ));
    }

    if collector.enable_csv {
        for (field, path) in [
            ("collector.csv_frames_path", &collector.csv_frames_path),
            ("collector.csv_decoded_path", &collector.csv_decoded_path),
            ("collector.csv_stats_path", &collector.csv_stats_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(TelemetryError::config_validation(
                    field,
                    "path cannot be empty while CSV output is enabled",
                ));
            }
        }
    }

    Ok(())
}

fn validate_sensor(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let sensor = &config.sensor;

    if sensor.euler_tau <= 0.0 {
        return Err(TelemetryError::config_validation(
            "sensor.euler_tau",
            format!("euler_tau must be > 0, got {}", sensor.euler_tau),
        ));
    }

    if sensor.bayes_sigma0 <= 0.0 {
        return Err(TelemetryError::config_validation(
            "sensor.bayes_sigma0",
            format!("bayes_sigma0 must be > 0, got {}", sensor.bayes_sigma0),
        ));
    }

    for (field, value) in [
        ("sensor.qa_low_threshold", sensor.qa_low_threshold),
        ("sensor.qa_high_threshold", sensor.qa_high_threshold),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(TelemetryError::config_validation(
                field,
                format!("QA threshold must be within [0, 1], got {value}"),
            ));
        }
    }
    if sensor.qa_low_threshold > sensor.qa_high_threshold {
        return Err(TelemetryError::config_validation(
            "sensor.qa_low_threshold / sensor.qa_high_threshold",
            format!(
                "qa_low_threshold ({}) must be <= qa_high_threshold ({})",
                sensor.qa_low_threshold, sensor.qa_high_threshold
            ),
        ));
    }

    let t = &sensor.thresholds;

    for (field, value) in [
        ("crash_gy_dps", t.crash_gy_dps),
        ("normal_gy_min", t.normal_gy_min),
        ("boom_step_crash", t.boom_step_crash),
        ("boom_step_normal", t.boom_step_normal),
        ("crash_dt", t.crash_dt),
        ("normal_dt", t.normal_dt),
        ("roll_hit", t.roll_hit),
        ("roll_dt", t.roll_dt),
        ("tack_gy_min", t.tack_gy_min),
        ("tack_gy_max", t.tack_gy_max),
        ("tack_boom_step", t.tack_boom_step),
        ("tack_dt_max", t.tack_dt_max),
        ("tack_min_roll_delta", t.tack_min_roll_delta),
    ] {
        if value <= 0.0 {
            return Err(TelemetryError::config_validation(
                format!("sensor.thresholds.{field}"),
                format!("{field} must be > 0, got {value}"),
            ));
        }
    }

    if t.refractory < 0.0 {
        return Err(TelemetryError::config_validation(
            "sensor.thresholds.refractory",
            format!("refractory must be >= 0, got {}", t.refractory),
        ));
    }

    if t.tack_gy_min > t.tack_gy_max {
        return Err(TelemetryError::config_validation(
            "sensor.thresholds.tack_gy_min / tack_gy_max",
            format!(
                "tack_gy_min ({}) must be <= tack_gy_max ({})",
                t.tack_gy_min, t.tack_gy_max
            ),
        ));
    }

    if t.normal_gy_min > t.crash_gy_dps {
        return Err(TelemetryError::config_validation(
            "sensor.thresholds.normal_gy_min / crash_gy_dps",
            format!(
                "normal_gy_min ({}) must be <= crash_gy_dps ({})",
                t.normal_gy_min, t.crash_gy_dps
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&TelemetryConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = TelemetryConfig::default();
        config.collector.decoder_workers = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("decoder_workers"), "got: {err}");
    }

    #[test]
    fn test_empty_csv_path_rejected_only_when_enabled() {
        let mut config = TelemetryConfig::default();
        config.collector.csv_decoded_path = std::path::PathBuf::new();

        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("csv_decoded_path"), "got: {err}");

        config.collector.enable_csv = false;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_non_positive_tau_rejected() {
        let mut config = TelemetryConfig::default();
        config.sensor.euler_tau = 0.0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("euler_tau"), "got: {err}");
    }

    #[test]
    fn test_inverted_tack_band_rejected() {
        let mut config = TelemetryConfig::default();
        config.sensor.thresholds.tack_gy_min = 200.0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("tack_gy_min"), "got: {err}");
    }

    #[test]
    fn test_inverted_qa_thresholds_rejected() {
        let mut config = TelemetryConfig::default();
        config.sensor.qa_low_threshold = 0.9;
        config.sensor.qa_high_threshold = 0.1;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("qa_low_threshold"), "got: {err}");
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let mut config = TelemetryConfig::default();
        config.sensor.thresholds.crash_dt = -0.5;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("crash_dt"), "got: {err}");
    }

    #[test]
    fn test_bad_broker_port_rejected() {
        let mut config = TelemetryConfig::default();
        config.collector.broker_port = 0;
        assert!(validate(&config).is_err());
    }
}
