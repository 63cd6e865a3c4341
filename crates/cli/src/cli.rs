//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// BoomSense - real-time marine telemetry pipeline
#[derive(Parser, Debug)]
#[command(
    name = "boomsense",
    author,
    version,
    about = "NMEA2000 telemetry collector and sailing event pipeline",
    long_about = "Subscribes to a broker relaying raw NMEA2000 CAN frames, decodes the \n\
                  sailing-critical PGNs into named physical quantities, keeps a rolling \n\
                  window of decoded values and derives apparent wind, heel angle and \n\
                  boat speed for consumers."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "BOOMSENSE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "console",
        global = true,
        env = "BOOMSENSE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the collector pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "BOOMSENSE_CONFIG")]
    pub config: PathBuf,

    /// Override broker host from configuration
    #[arg(long, env = "BOOMSENSE_BROKER_HOST")]
    pub host: Option<String>,

    /// Override broker port from configuration
    #[arg(long, env = "BOOMSENSE_BROKER_PORT")]
    pub port: Option<u16>,

    /// Run against the synthetic frame generator (no broker required)
    #[arg(long)]
    pub mock: bool,

    /// Synthetic frame rate in Hz (mock mode)
    #[arg(long, default_value = "50.0")]
    pub mock_frequency: f64,

    /// Replay broker payloads from a JSON-lines file
    #[arg(long, conflicts_with = "mock")]
    pub replay: Option<PathBuf>,

    /// Replay speed multiplier (1.0 = original speed)
    #[arg(long, default_value = "1.0")]
    pub replay_speed: f64,

    /// Loop replay when the file is exhausted
    #[arg(long)]
    pub replay_loop: bool,

    /// Maximum number of messages to process (0 = unlimited)
    #[arg(long, default_value = "0", env = "BOOMSENSE_MAX_MESSAGES")]
    pub max_messages: u64,

    /// Pipeline timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "BOOMSENSE_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "BOOMSENSE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detector thresholds
    #[arg(long)]
    pub thresholds: bool,

    /// Show output paths
    #[arg(long)]
    pub paths: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// Structured JSON lines
    Json,
    /// Single-line console output
    #[default]
    Console,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Console => observability::LogFormat::Console,
        }
    }
}
