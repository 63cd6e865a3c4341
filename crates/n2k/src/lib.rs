//! # N2K codec
//!
//! Single-frame NMEA2000 decoding: sentinel-aware byte readers, per-PGN
//! decoders, and the PGN registry mapping each Parameter Group Number to a
//! handler, a display name and a measurement class.
//!
//! Fast-packet (multi-frame) reassembly is deliberately not handled here;
//! payloads longer than one frame arrive pre-assembled from the broker.

pub mod pgns;
mod reader;
mod registry;

pub use reader::*;
pub use registry::{pgn_from_parts, pgn_name, measurement_class, DecodeOutcome, Decoder, DecoderFn};
