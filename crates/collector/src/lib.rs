//! # Collector
//!
//! The broker-to-storage ingestion pipeline: structured broker payloads are
//! parsed into canonical raw frames, fanned out to a pool of decoder
//! workers, and fanned back in through a single storage worker that owns
//! the ring buffer writes and the CSV outputs.
//!
//! ```text
//! broker -> on_message -> raw frames channel (bounded)
//!                           |
//!                (N decoder workers, any-of)
//!                           |
//!                 decoded channel (bounded)
//!                           |
//!              storage worker -> ring buffer + CSV
//! ```
//!
//! Backpressure is drop-newest at both channels: sailing telemetry is a
//! high-rate lossy stream where freshness dominates completeness.

mod mock;
mod parse;
mod pipeline;
mod replay;
mod stats;

pub use mock::{MockFrameSource, MockSourceConfig};
pub use parse::parse_frame;
pub use pipeline::{Collector, CONNECT_TIMEOUT, DISCONNECT_GRACE, SUBSCRIBE_TIMEOUT};
pub use replay::ReplayFrameSource;
pub use stats::{Statistics, StatsSnapshot};
