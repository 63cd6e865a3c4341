//! Pipeline orchestrator - coordinates collector, storage and fusion.
//!
//! Builds the ring buffer, wires a frame source (synthetic or replay) into
//! the collector, and supervises the run until the message bound, the
//! timeout or the shutdown signal fires.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use collector::{Collector, MockFrameSource, MockSourceConfig, ReplayFrameSource};
use contracts::{FrameSource, TelemetryConfig};
use fusion::BoomSenseMapper;
use storage::RingBuffer;
use tracing::{info, warn};

use super::PipelineStats;
use crate::error::CliError;

/// Supervision poll period
const POLL_PERIOD: Duration = Duration::from_millis(500);

/// Cadence of the fused-view log line
const FUSED_LOG_PERIOD: Duration = Duration::from_secs(5);

/// Where the frames come from
#[derive(Debug, Clone)]
pub enum SourceKind {
    /// Synthetic N2K generator
    Mock { frequency_hz: f64 },

    /// JSON-lines replay file
    Replay {
        path: PathBuf,
        speed: f64,
        loop_playback: bool,
    },
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The loaded telemetry configuration
    pub telemetry: TelemetryConfig,

    /// Frame source selection
    pub source: SourceKind,

    /// Maximum number of messages to process (None = unlimited)
    pub max_messages: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline until completion or until `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send) -> Result<PipelineStats> {
        // Metrics endpoint (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        match self.config.source.clone() {
            SourceKind::Mock { frequency_hz } => {
                info!(frequency_hz, "Running with synthetic frame source (MOCK mode)");
                let source = MockFrameSource::new(MockSourceConfig {
                    frequency_hz,
                    ..MockSourceConfig::default()
                });
                self.run_with_source(source, shutdown).await
            }
            SourceKind::Replay {
                path,
                speed,
                loop_playback,
            } => {
                if !path.exists() {
                    return Err(CliError::replay_not_found(path.display().to_string()).into());
                }
                info!(path = %path.display(), speed, "Running in REPLAY mode");
                let source = ReplayFrameSource::new(path, speed, loop_playback);
                self.run_with_source(source, shutdown).await
            }
        }
    }

    async fn run_with_source<S: FrameSource>(
        self,
        source: S,
        shutdown: impl Future<Output = ()> + Send,
    ) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let collector_config = self.config.telemetry.collector.clone();

        let buffer = Arc::new(RingBuffer::new(collector_config.buffer_capacity));
        let mapper = BoomSenseMapper::new(Arc::clone(&buffer));

        let mut collector = Collector::new(collector_config, source, Arc::clone(&buffer));
        collector
            .start()
            .await
            .context("Failed to start collector")?;

        let max_messages = self.config.max_messages;
        let deadline = self.config.timeout.map(|t| start_time + t);
        let mut last_fused_log = Instant::now();

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    warn!("Shutdown signal received, stopping pipeline");
                    break;
                }
                _ = tokio::time::sleep(POLL_PERIOD) => {
                    let snapshot = collector.stats().snapshot();

                    if let Some(max) = max_messages {
                        if snapshot.messages_processed >= max {
                            info!(messages = snapshot.messages_processed, "Reached message limit");
                            break;
                        }
                    }

                    if let Some(deadline) = deadline {
                        if Instant::now() >= deadline {
                            warn!("Pipeline timed out");
                            break;
                        }
                    }

                    if last_fused_log.elapsed() >= FUSED_LOG_PERIOD {
                        last_fused_log = Instant::now();
                        let (aws, awa) = mapper.apparent_wind();
                        info!(
                            heel_deg = format!("{:.1}", mapper.heel_angle()),
                            boat_speed_kts = format!("{:.1}", mapper.boat_speed()),
                            aws_kts = format!("{:.1}", aws),
                            awa_deg = format!("{:.1}", awa),
                            "fused view"
                        );
                    }
                }
            }
        }

        collector.stop().await;

        let snapshot = collector.stats().snapshot();
        Ok(PipelineStats::from_run(
            snapshot,
            buffer.stats(),
            start_time.elapsed(),
        ))
    }
}
