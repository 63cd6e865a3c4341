//! Collector statistics
//!
//! All counters live under one lock so a snapshot is internally
//! consistent: a reader never sees a success count from one instant and a
//! message count from another.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Thread-safe counters for the ingestion pipeline
pub struct Statistics {
    inner: Mutex<StatsInner>,
}

struct StatsInner {
    messages_processed: u64,
    decode_successes: u64,
    decode_failures: u64,
    pgn_counts: HashMap<u32, u64>,
    measurement_counts: HashMap<String, u64>,
    start_time: DateTime<Utc>,
    last_update: DateTime<Utc>,
}

/// Consistent point-in-time view with derived rates
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub messages_processed: u64,
    pub decode_successes: u64,
    pub decode_failures: u64,
    pub success_rate_pct: f64,
    pub uptime_seconds: f64,
    pub messages_per_sec: f64,
    pub pgn_counts: HashMap<u32, u64>,
    pub measurement_counts: HashMap<String, u64>,
    pub start_time: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl Statistics {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            inner: Mutex::new(StatsInner {
                messages_processed: 0,
                decode_successes: 0,
                decode_failures: 0,
                pgn_counts: HashMap::new(),
                measurement_counts: HashMap::new(),
                start_time: now,
                last_update: now,
            }),
        }
    }

    pub fn record_message(&self, pgn: u32, measurement: &str, success: bool) {
        let mut inner = self.inner.lock().expect("stats lock poisoned");

        inner.messages_processed += 1;
        if success {
            inner.decode_successes += 1;
        } else {
            inner.decode_failures += 1;
        }

        *inner.pgn_counts.entry(pgn).or_insert(0) += 1;
        *inner
            .measurement_counts
            .entry(measurement.to_string())
            .or_insert(0) += 1;
        inner.last_update = Utc::now();
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock().expect("stats lock poisoned");

        let success_rate_pct = if inner.messages_processed > 0 {
            inner.decode_successes as f64 / inner.messages_processed as f64 * 100.0
        } else {
            0.0
        };

        let uptime_seconds =
            (Utc::now() - inner.start_time).num_milliseconds().max(0) as f64 / 1000.0;
        let messages_per_sec = if uptime_seconds > 0.0 {
            inner.messages_processed as f64 / uptime_seconds
        } else {
            0.0
        };

        StatsSnapshot {
            messages_processed: inner.messages_processed,
            decode_successes: inner.decode_successes,
            decode_failures: inner.decode_failures,
            success_rate_pct,
            uptime_seconds,
            messages_per_sec,
            pgn_counts: inner.pgn_counts.clone(),
            measurement_counts: inner.measurement_counts.clone(),
            start_time: inner.start_time,
            last_update: inner.last_update,
        }
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let stats = Statistics::new();
        stats.record_message(130306, "wind", true);
        stats.record_message(130306, "wind", true);
        stats.record_message(59_904, "nmea_general", false);

        let snap = stats.snapshot();
        assert_eq!(snap.messages_processed, 3);
        assert_eq!(snap.decode_successes, 2);
        assert_eq!(snap.decode_failures, 1);
        assert!((snap.success_rate_pct - 66.666).abs() < 0.01);
        assert_eq!(snap.pgn_counts[&130306], 2);
        assert_eq!(snap.measurement_counts["wind"], 2);
        assert_eq!(snap.measurement_counts["nmea_general"], 1);
    }

    #[test]
    fn test_empty_snapshot_rates() {
        let snap = Statistics::new().snapshot();
        assert_eq!(snap.messages_processed, 0);
        assert_eq!(snap.success_rate_pct, 0.0);
    }
}
