//! `info` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Reading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        println!(
            "{}",
            config_loader::ConfigLoader::to_json(&config)
                .context("Failed to serialize configuration")?
        );
        return Ok(());
    }

    println!("\n=== BoomSense Configuration ===\n");
    println!("Collector:");
    println!(
        "  Broker: {}:{} (tls: {}, verify: {})",
        config.collector.broker_host,
        config.collector.broker_port,
        config.collector.use_tls,
        !config.collector.insecure_skip_tls
    );
    println!("  Topic: {}", config.collector.topic);
    println!("  Device: {}", config.collector.device_id);
    println!("  Decoder workers: {}", config.collector.decoder_workers);
    println!("  Queue size: {}", config.collector.queue_size);
    println!("  Buffer capacity: {}", config.collector.buffer_capacity);

    println!("\nSensor:");
    println!("  Filter tau: {}s", config.sensor.euler_tau);
    println!("  Boom axis: {}", config.sensor.boom_axis);
    println!("  Sample buffer: {}", config.sensor.max_buffer_len);
    println!(
        "  Bayesian: sigma0 {}, QA window [{}, {}]",
        config.sensor.bayes_sigma0,
        config.sensor.qa_low_threshold,
        config.sensor.qa_high_threshold
    );

    if args.thresholds {
        let t = &config.sensor.thresholds;
        println!("\nDetector thresholds:");
        println!(
            "  Crash gybe: gyro >= {} deg/s, boom step >= {}, window {}s",
            t.crash_gy_dps, t.boom_step_crash, t.crash_dt
        );
        println!(
            "  Normal gybe: gyro in [{}, {}), boom step >= {}, window {}s",
            t.normal_gy_min, t.crash_gy_dps, t.boom_step_normal, t.normal_dt
        );
        println!(
            "  Tack: gyro in [{}, {}], boom step >= {}, roll drop >= {} deg, window {}s",
            t.tack_gy_min, t.tack_gy_max, t.tack_boom_step, t.tack_min_roll_delta, t.tack_dt_max
        );
        println!(
            "  Boom hit: gyro >= {} deg/s, roll drop >= {} deg, window {}s",
            t.crash_gy_dps + 20.0,
            t.roll_hit,
            t.roll_dt
        );
        println!("  Refractory: {}s", t.refractory);
    }

    if args.paths {
        println!("\nOutput paths:");
        println!("  CSV enabled: {}", config.collector.enable_csv);
        println!("  Frames: {}", config.collector.csv_frames_path.display());
        println!("  Decoded: {}", config.collector.csv_decoded_path.display());
        println!("  Stats: {}", config.collector.csv_stats_path.display());
        println!("  Calibration: {}", config.sensor.calibration_path.display());
        println!("  Posterior: {}", config.sensor.posterior_path.display());
    }

    println!();
    Ok(())
}
