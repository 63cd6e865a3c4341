//! # BoomSense CLI
//!
//! Command line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Pipeline orchestration and lifecycle management
//! - Graceful shutdown handling

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_pipeline, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Tracing is bootstrapped exactly once, here; the run command starts
    // the metrics exporter itself when a port is configured.
    observability::init_with_config(
        ObservabilityConfig::from_verbosity(cli.quiet, cli.verbose).format(cli.log_format.into()),
    )?;

    info!(version = env!("CARGO_PKG_VERSION"), "boomsense starting");

    // Execute command
    let result = match &cli.command {
        Commands::Run(args) => run_pipeline(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "command failed");
    }

    result
}
