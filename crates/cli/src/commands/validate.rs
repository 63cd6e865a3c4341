//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    broker: String,
    topic: String,
    decoder_workers: usize,
    queue_size: usize,
    buffer_capacity: usize,
    csv_enabled: bool,
    boom_axis: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            summary: Some(ConfigSummary {
                broker: format!(
                    "{}:{}",
                    config.collector.broker_host, config.collector.broker_port
                ),
                topic: config.collector.topic.clone(),
                decoder_workers: config.collector.decoder_workers,
                queue_size: config.collector.queue_size,
                buffer_capacity: config.collector.buffer_capacity,
                csv_enabled: config.collector.enable_csv,
                boom_axis: config.sensor.boom_axis.to_string(),
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            summary: None,
        },
    }
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("Configuration is valid: {}", result.config_path);
        if let Some(ref summary) = result.summary {
            println!("  Broker: {}", summary.broker);
            println!("  Topic: {}", summary.topic);
            println!(
                "  Pipeline: {} workers, queue {}, buffer {}",
                summary.decoder_workers, summary.queue_size, summary.buffer_capacity
            );
            println!("  CSV enabled: {}", summary.csv_enabled);
            println!("  Boom axis: {}", summary.boom_axis);
        }
    } else {
        println!("Configuration is INVALID: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("  Error: {}", error);
        }
    }
}
