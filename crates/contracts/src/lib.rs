//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - All instants are UTC (`chrono::DateTime<Utc>`)
//! - Broker `ts` fields are milliseconds since the Unix epoch

mod config;
mod error;
mod frame;
mod frame_source;
mod sensing;

pub use config::*;
pub use error::*;
pub use frame::*;
pub use frame_source::{BrokerMessage, FrameSource, MessageCallback};
pub use sensing::*;
