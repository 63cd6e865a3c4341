//! Ring buffer with latest-by-PGN index
//!
//! One writer (the storage worker), many readers. The latest-by-PGN map is
//! kept as a separate index under its own lock: fusion consumers poll it at
//! UI cadence while ingestion may run at hundreds of Hz, so lookups must
//! stay O(1) regardless of buffer size. Messages are stored behind `Arc`,
//! so a reader always observes a fully constructed message.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use contracts::DecodedMessage;
use serde::Serialize;

/// Bounded circular store of decoded messages
pub struct RingBuffer {
    inner: RwLock<Ring>,
    latest_by_pgn: RwLock<HashMap<u32, Arc<DecodedMessage>>>,
}

struct Ring {
    slots: Vec<Option<Arc<DecodedMessage>>>,
    head: usize,
    size: usize,
}

/// Occupancy snapshot
#[derive(Debug, Clone, Serialize)]
pub struct BufferStats {
    pub size: usize,
    pub capacity: usize,
    pub utilization_pct: f64,
    pub oldest_timestamp: Option<DateTime<Utc>>,
    pub newest_timestamp: Option<DateTime<Utc>>,
    pub time_span_seconds: f64,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: RwLock::new(Ring {
                slots: vec![None; capacity],
                head: 0,
                size: 0,
            }),
            latest_by_pgn: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a message, overwriting the oldest slot once full. O(1).
    pub fn push(&self, msg: DecodedMessage) {
        let pgn = msg.pgn;
        let msg = Arc::new(msg);

        {
            let mut ring = self.inner.write().expect("ring lock poisoned");
            let capacity = ring.slots.len();
            let head = ring.head;
            ring.slots[head] = Some(Arc::clone(&msg));
            ring.head = (head + 1) % capacity;
            if ring.size < capacity {
                ring.size += 1;
            }
        }

        self.latest_by_pgn
            .write()
            .expect("index lock poisoned")
            .insert(pgn, msg);
    }

    /// Most recently pushed message with this PGN. O(1).
    pub fn get_latest_by_pgn(&self, pgn: u32) -> Option<Arc<DecodedMessage>> {
        self.latest_by_pgn
            .read()
            .expect("index lock poisoned")
            .get(&pgn)
            .cloned()
    }

    /// Up to `n` most recent messages, newest first.
    pub fn get_recent(&self, n: usize) -> Vec<Arc<DecodedMessage>> {
        let ring = self.inner.read().expect("ring lock poisoned");
        let capacity = ring.slots.len();
        let n = n.min(ring.size);

        (0..n)
            .filter_map(|i| {
                let idx = (ring.head + capacity - 1 - i) % capacity;
                ring.slots[idx].clone()
            })
            .collect()
    }

    /// Messages with `start <= timestamp <= end` (inclusive both ends),
    /// oldest first. Linear scan.
    pub fn get_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<Arc<DecodedMessage>> {
        let ring = self.inner.read().expect("ring lock poisoned");
        let capacity = ring.slots.len();

        (0..ring.size)
            .filter_map(|i| {
                let idx = (ring.head + capacity - ring.size + i) % capacity;
                ring.slots[idx].clone()
            })
            .filter(|msg| msg.timestamp >= start && msg.timestamp <= end)
            .collect()
    }

    pub fn size(&self) -> usize {
        self.inner.read().expect("ring lock poisoned").size
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().expect("ring lock poisoned").slots.len()
    }

    pub fn stats(&self) -> BufferStats {
        let ring = self.inner.read().expect("ring lock poisoned");
        let capacity = ring.slots.len();

        let (oldest, newest) = if ring.size > 0 {
            let oldest_idx = (ring.head + capacity - ring.size) % capacity;
            let newest_idx = (ring.head + capacity - 1) % capacity;
            (
                ring.slots[oldest_idx].as_ref().map(|m| m.timestamp),
                ring.slots[newest_idx].as_ref().map(|m| m.timestamp),
            )
        } else {
            (None, None)
        };

        let span = match (oldest, newest) {
            (Some(o), Some(n)) => (n - o).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        };

        BufferStats {
            size: ring.size,
            capacity,
            utilization_pct: ring.size as f64 / capacity as f64 * 100.0,
            oldest_timestamp: oldest,
            newest_timestamp: newest,
            time_span_seconds: span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use contracts::FieldMap;

    fn make_msg(pgn: u32, ts_secs: i64) -> DecodedMessage {
        DecodedMessage {
            timestamp: Utc.timestamp_opt(ts_secs, 0).unwrap(),
            pgn,
            pgn_name: "Test".to_string(),
            source: 1,
            measurement: "test".to_string(),
            fields: FieldMap::new(),
            raw: None,
        }
    }

    #[test]
    fn test_size_saturates_at_capacity() {
        let buffer = RingBuffer::new(3);
        for i in 0..10 {
            buffer.push(make_msg(1, i));
            assert_eq!(buffer.size(), ((i + 1) as usize).min(3));
        }
        assert_eq!(buffer.capacity(), 3);
    }

    #[test]
    fn test_overwrite_and_recency_order() {
        // C=3: push A(p=1), B(p=2), C(p=1), D(p=3)
        let buffer = RingBuffer::new(3);
        buffer.push(make_msg(1, 10)); // A
        buffer.push(make_msg(2, 11)); // B
        buffer.push(make_msg(1, 12)); // C
        buffer.push(make_msg(3, 13)); // D

        assert_eq!(buffer.size(), 3);

        let recent = buffer.get_recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].pgn, 3); // D
        assert_eq!(recent[1].pgn, 1); // C

        let latest = buffer.get_latest_by_pgn(1).unwrap();
        assert_eq!(latest.timestamp, Utc.timestamp_opt(12, 0).unwrap()); // C, not A
    }

    #[test]
    fn test_latest_by_pgn_tracks_newest_push() {
        let buffer = RingBuffer::new(8);
        buffer.push(make_msg(130306, 1));
        buffer.push(make_msg(130306, 2));
        let latest = buffer.get_latest_by_pgn(130306).unwrap();
        assert_eq!(latest.timestamp, Utc.timestamp_opt(2, 0).unwrap());
        assert!(buffer.get_latest_by_pgn(127257).is_none());
    }

    #[test]
    fn test_index_survives_slot_overwrite() {
        // Even after PGN 2's slot is recycled, the index still serves it.
        let buffer = RingBuffer::new(2);
        buffer.push(make_msg(2, 1));
        buffer.push(make_msg(1, 2));
        buffer.push(make_msg(1, 3)); // evicts PGN 2's slot
        assert!(buffer.get_latest_by_pgn(2).is_some());
    }

    #[test]
    fn test_get_recent_caps_at_size() {
        let buffer = RingBuffer::new(5);
        buffer.push(make_msg(1, 1));
        buffer.push(make_msg(2, 2));
        assert_eq!(buffer.get_recent(10).len(), 2);
    }

    #[test]
    fn test_time_range_inclusive() {
        let buffer = RingBuffer::new(10);
        for i in 0..5 {
            buffer.push(make_msg(1, i));
        }
        let start = Utc.timestamp_opt(1, 0).unwrap();
        let end = Utc.timestamp_opt(3, 0).unwrap();
        let hits = buffer.get_by_time_range(start, end);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].timestamp, start);
        assert_eq!(hits[2].timestamp, end);
    }

    #[test]
    fn test_stats_snapshot() {
        let buffer = RingBuffer::new(4);
        buffer.push(make_msg(1, 100));
        buffer.push(make_msg(1, 130));
        let stats = buffer.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.capacity, 4);
        assert!((stats.utilization_pct - 50.0).abs() < 1e-9);
        assert!((stats.time_span_seconds - 30.0).abs() < 1e-9);
        assert_eq!(stats.oldest_timestamp, Some(Utc.timestamp_opt(100, 0).unwrap()));
        assert_eq!(stats.newest_timestamp, Some(Utc.timestamp_opt(130, 0).unwrap()));
    }

    #[test]
    fn test_empty_stats() {
        let stats = RingBuffer::new(4).stats();
        assert_eq!(stats.size, 0);
        assert!(stats.oldest_timestamp.is_none());
        assert_eq!(stats.time_span_seconds, 0.0);
    }
}
