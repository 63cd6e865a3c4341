//! # Observability
//!
//! One place to stand up the process's own instrumentation: tracing
//! output and the optional Prometheus endpoint. Business crates record
//! through the helpers in [`metrics`]; only the binary calls the init
//! functions here, so there is exactly one subscriber bootstrap in the
//! workspace.

pub mod metrics;

use anyhow::{anyhow, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-exports
pub use crate::metrics::{
    record_buffer_size, record_decode, record_event_emitted, record_frame_dropped,
    record_frame_received,
};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON lines, for shipping logs off the boat
    Json,

    /// Single-line output for a cockpit terminal
    #[default]
    Console,
}

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log output format
    pub format: LogFormat,

    /// Filter directive applied when `RUST_LOG` is not set
    pub default_directive: String,

    /// Prometheus listener port (None = no exporter)
    pub metrics_port: Option<u16>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Console,
            default_directive: "info".to_string(),
            metrics_port: None,
        }
    }
}

impl ObservabilityConfig {
    /// Map the usual `-q` / `-v` / `-vv` CLI flags onto a filter directive
    pub fn from_verbosity(quiet: bool, verbose: u8) -> Self {
        let directive = if quiet {
            "warn"
        } else {
            match verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        };

        Self {
            default_directive: directive.to_string(),
            ..Self::default()
        }
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn metrics_port(mut self, port: Option<u16>) -> Self {
        self.metrics_port = port;
        self
    }
}

/// Install the global tracing subscriber and, when configured, the
/// Prometheus exporter. Call once, from the binary.
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_directive));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().flatten_event(true).with_current_span(false))
            .try_init(),
        LogFormat::Console => registry
            .with(fmt::layer().compact().with_target(false))
            .try_init(),
    };
    installed.map_err(|e| anyhow!("tracing subscriber already installed: {e}"))?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::debug!(
        format = ?config.format,
        metrics_port = ?config.metrics_port,
        "observability initialized"
    );

    Ok(())
}

/// Start only the Prometheus exporter, for a process whose tracing is
/// already up
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .map_err(|e| anyhow!("prometheus exporter failed to start on port {port}: {e}"))?;

    tracing::info!(port, "prometheus endpoint listening");
    Ok(())
}
