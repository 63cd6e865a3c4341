//! # Storage
//!
//! The collector's bounded in-memory store: a fixed-capacity ring buffer of
//! decoded messages with an O(1) latest-by-PGN index, and append-only CSV
//! writers for the frame/decoded/stats outputs.

mod csv;
mod ring;

pub use csv::{CollectorCsv, CsvAppender, StatsCsv, StatsRecord};
pub use ring::{BufferStats, RingBuffer};
