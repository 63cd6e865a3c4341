//! Pipeline metric recording helpers
//!
//! Thin wrappers over the `metrics` facade so the business crates never
//! format metric names themselves. All series share the `boomsense_`
//! prefix.

use metrics::{counter, gauge};

/// A frame passed payload parsing and entered the pipeline
pub fn record_frame_received() {
    counter!("boomsense_frames_received_total").increment(1);
}

/// A frame was dropped by the drop-newest backpressure policy
///
/// `stage` is the saturated channel: "raw" or "decoded".
pub fn record_frame_dropped(stage: &'static str) {
    counter!("boomsense_frames_dropped_total", "stage" => stage).increment(1);
}

/// A decode attempt finished
pub fn record_decode(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("boomsense_decodes_total", "status" => status).increment(1);
}

/// Current ring buffer occupancy
pub fn record_buffer_size(size: usize) {
    gauge!("boomsense_ring_buffer_size").set(size as f64);
}

/// A sailing event was emitted by the detector
pub fn record_event_emitted(kind: &str) {
    counter!("boomsense_events_total", "kind" => kind.to_string()).increment(1);
}
