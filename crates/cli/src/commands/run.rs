//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig, SourceKind};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut telemetry = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding broker host from CLI");
        telemetry.collector.broker_host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding broker port from CLI");
        telemetry.collector.broker_port = port;
    }

    info!(
        broker = %telemetry.collector.broker_host,
        port = telemetry.collector.broker_port,
        topic = %telemetry.collector.topic,
        workers = telemetry.collector.decoder_workers,
        buffer = telemetry.collector.buffer_capacity,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&telemetry);
        return Ok(());
    }

    let source = if let Some(ref replay) = args.replay {
        SourceKind::Replay {
            path: replay.clone(),
            speed: args.replay_speed,
            loop_playback: args.replay_loop,
        }
    } else {
        // The production broker client lives outside this repository, so
        // everything that is not a replay runs against the synthetic source.
        if !args.mock {
            warn!("no --mock or --replay given; using the synthetic frame generator");
        }
        SourceKind::Mock {
            frequency_hz: args.mock_frequency,
        }
    };

    let pipeline_config = PipelineConfig {
        telemetry,
        source,
        max_messages: if args.max_messages == 0 {
            None
        } else {
            Some(args.max_messages)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let pipeline = Pipeline::new(pipeline_config);

    info!("Starting pipeline...");
    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        messages = stats.messages_processed,
        success_pct = format!("{:.1}", stats.success_rate_pct),
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline completed"
    );

    stats.print_summary();

    info!("BoomSense finished");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::TelemetryConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Collector:");
    println!(
        "  Broker: {}:{} (tls: {})",
        config.collector.broker_host, config.collector.broker_port, config.collector.use_tls
    );
    println!("  Topic: {}", config.collector.topic);
    println!(
        "  Pipeline: {} workers, queue {}, buffer {}",
        config.collector.decoder_workers,
        config.collector.queue_size,
        config.collector.buffer_capacity
    );

    if config.collector.enable_csv {
        println!("  CSV: {}", config.collector.csv_decoded_path.display());
    } else {
        println!("  CSV: disabled");
    }

    println!("\nSensor:");
    println!(
        "  Filter tau: {}s, boom axis: {}",
        config.sensor.euler_tau, config.sensor.boom_axis
    );
    println!(
        "  Refractory: {}s, crash gyro: {} deg/s",
        config.sensor.thresholds.refractory, config.sensor.thresholds.crash_gy_dps
    );

    println!();
}
