//! # Fusion
//!
//! Pure readers over the ring buffer's latest-by-PGN index, assembling the
//! fused quantities consumers care about: heel angle, boat speed, true and
//! apparent wind.

mod mapper;
mod wind;

pub use mapper::{BoomSenseData, BoomSenseMapper};
pub use wind::apparent_wind;
