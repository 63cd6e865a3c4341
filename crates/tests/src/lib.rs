//! # Integration Tests
//!
//! Cross-crate end-to-end tests:
//! - replay file -> collector -> ring buffer -> fusion mapper
//! - synthetic source -> full pipeline
//! - IMU samples -> filter -> calibrated boom -> detector -> Bayesian QA

#[cfg(test)]
mod pipeline_e2e {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use collector::{Collector, MockFrameSource, MockSourceConfig, ReplayFrameSource};
    use contracts::CollectorConfig;
    use fusion::BoomSenseMapper;
    use storage::RingBuffer;

    fn collector_config(dir: &std::path::Path) -> CollectorConfig {
        CollectorConfig {
            decoder_workers: 3,
            queue_size: 64,
            buffer_capacity: 256,
            enable_csv: true,
            csv_frames_path: dir.join("frames.csv"),
            csv_decoded_path: dir.join("decoded.csv"),
            csv_stats_path: dir.join("stats.csv"),
            ..CollectorConfig::default()
        }
    }

    /// Replay known byte layouts through the whole pipeline and check the
    /// fused quantities on the other side.
    #[tokio::test]
    async fn test_replay_to_fused_view() {
        let dir = tempfile::tempdir().unwrap();
        let replay_path = dir.path().join("session.jsonl");
        {
            let mut file = std::fs::File::create(&replay_path).unwrap();
            // Wind 2.00 m/s @ 0.4 rad; attitude roll 1 rad (yaw/pitch n/a);
            // SOG/COG not present, so boat speed falls back to water speed
            writeln!(file, r#"{{"ts":1000,"pgn":130306,"src":3,"data":"01c800a00f00"}}"#).unwrap();
            writeln!(file, r#"{{"ts":1020,"pgn":127257,"src":3,"data":"00ff7fff7f1027"}}"#).unwrap();
            writeln!(file, r#"{{"ts":1040,"pgn":128259,"src":3,"data":"00390200000000"}}"#).unwrap();
        }

        let buffer = Arc::new(RingBuffer::new(256));
        let source = ReplayFrameSource::new(&replay_path, 50.0, false);
        let mut pipeline = Collector::new(collector_config(dir.path()), source, Arc::clone(&buffer));
        pipeline.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;
        pipeline.stop().await;

        let snap = pipeline.stats().snapshot();
        assert_eq!(snap.messages_processed, 3);
        assert_eq!(snap.decode_successes, 3);

        let mapper = BoomSenseMapper::new(Arc::clone(&buffer));

        let (tws, twa) = mapper.wind();
        assert!((tws - 3.88768).abs() < 1e-4, "tws {tws}");
        assert!((twa - 22.9183).abs() < 1e-3, "twa {twa}");

        let heel = mapper.heel_angle();
        assert!((heel - 57.2958).abs() < 1e-3, "heel {heel}");

        // water speed 0x0239 = 569 -> 5.69 m/s -> 11.06 kts
        let bs = mapper.boat_speed();
        assert!((bs - 11.0605).abs() < 1e-3, "boat speed {bs}");

        // Boat speed far above the downwind component swings the light
        // apparent wind aft and strengthens it
        let (aws, awa) = mapper.apparent_wind();
        assert!((aws - 7.631).abs() < 0.01, "aws {aws}");
        assert!((awa - 168.56).abs() < 0.1, "awa {awa}");

        // Long-format CSV got one row per decoded field
        let decoded = std::fs::read_to_string(dir.path().join("decoded.csv")).unwrap();
        assert!(decoded.lines().any(|l| l.contains("wind_speed_ms,2")));
        assert!(decoded.lines().any(|l| l.contains("heel_angle")));
    }

    #[tokio::test]
    async fn test_mock_source_full_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = collector_config(dir.path());
        config.enable_csv = false;

        let buffer = Arc::new(RingBuffer::new(256));
        let source = MockFrameSource::new(MockSourceConfig {
            frequency_hz: 400.0,
            ..MockSourceConfig::default()
        });

        let mut pipeline = Collector::new(config, source, Arc::clone(&buffer));
        pipeline.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        pipeline.stop().await;

        let snap = pipeline.stats().snapshot();
        assert!(snap.messages_processed > 20);
        assert!(snap.success_rate_pct > 99.0);
        assert!(snap.measurement_counts.contains_key("wind"));
        assert!(snap.measurement_counts.contains_key("attitude"));

        // All five synthetic PGNs made it into the index
        for pgn in [130_306, 127_257, 129_026, 127_251, 127_250] {
            assert!(
                buffer.get_latest_by_pgn(pgn).is_some(),
                "missing PGN {pgn} in index"
            );
        }

        let mapper = BoomSenseMapper::new(buffer);
        let (tws, _) = mapper.wind();
        assert!(tws > 0.0);
        assert!(mapper.boat_speed() > 0.0);
    }
}

#[cfg(test)]
mod sensor_e2e {
    use std::sync::mpsc;
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use contracts::{Calibration, EventKind, ImuReading, SensorConfig, WindReading};
    use sensor::BoomSense;

    fn sensor_config(dir: &std::path::Path) -> SensorConfig {
        SensorConfig {
            calibration_path: dir.join("boom_calibration.json"),
            posterior_path: dir.join("boom_bayes_posterior.json"),
            ..SensorConfig::default()
        }
    }

    /// IMU samples through filter + calibration + detector + QA model.
    #[test]
    fn test_imu_to_event_to_feedback() {
        let dir = tempfile::tempdir().unwrap();
        let sensor = BoomSense::new(sensor_config(dir.path()));
        sensor.start().unwrap();

        sensor.calibrator().set_calibration(Calibration {
            mid: 0.0,
            span_pos: 30.0,
            span_neg: 30.0,
            timestamp: Utc::now(),
        });

        sensor.process_wind(WindReading {
            timestamp: Utc::now(),
            speed_kts: 11.0,
            angle_deg: 50.0,
        });

        let (tx, rx) = mpsc::channel();
        sensor.add_event_listener(Arc::new(move |event| {
            let _ = tx.send(event);
        }));

        // A crash gybe seen by the IMU: violent negative swing about the
        // roll axis. The integrated gyro drives the filtered roll across
        // the centerline while the accelerometer tracks the heel.
        let base = Utc.timestamp_opt(10_000, 0).unwrap();
        let mut ms = 0i64;
        while ms <= 600 {
            let frac = ms as f64 / 600.0;
            let roll_deg = 25.0 - 50.0 * frac; // +25 -> -25
            let roll_rad = roll_deg.to_radians();
            let reading = ImuReading {
                timestamp: base + Duration::milliseconds(ms),
                // device accel (sin(roll), 0, cos(roll)) = heel in stern frame
                accel_x: roll_rad.sin(),
                accel_y: 0.0,
                accel_z: roll_rad.cos(),
                gyro_x: 0.0,
                gyro_y: -150.0,
                gyro_z: 0.0,
            };
            let filtered = sensor.process_imu(reading);
            assert!(filtered.boom_norm.is_finite());
            ms += 20;
        }

        let event = rx
            .recv_timeout(std::time::Duration::from_secs(2))
            .expect("no event emitted");
        assert_eq!(event.kind, EventKind::GybeCrash);
        assert_eq!(event.wind_speed, 11.0);
        assert!(event.gyro_peak >= 120.0);

        // Feedback loop: confirming the event raises its QA score and
        // persists the posterior
        let before = sensor.evaluate_event(&event);
        sensor.process_event_feedback(&event, true);
        assert!(sensor.evaluate_event(&event) > before);

        sensor.stop();
        assert!(dir.path().join("boom_bayes_posterior.json").exists());
        assert!(dir.path().join("boom_calibration.json").exists());
    }
}
