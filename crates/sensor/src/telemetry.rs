//! Sensor-side telemetry buffers
//!
//! Bounded sample histories for filtered IMU, meteo and wind readings.
//! These feed the live-state snapshot, CSV enrichment and the wind data
//! attached to emitted events.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use contracts::{FilteredData, MeteoReading, WindReading};
use serde::Serialize;

/// Bounded FIFO of samples with newest-first reads
pub struct SampleBuffer<T: Clone> {
    inner: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T: Clone> SampleBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, item: T) {
        let mut inner = self.inner.lock().expect("sample buffer lock poisoned");
        if inner.len() == self.capacity {
            inner.pop_front();
        }
        inner.push_back(item);
    }

    /// Up to `n` most recent samples, newest first
    pub fn recent(&self, n: usize) -> Vec<T> {
        let inner = self.inner.lock().expect("sample buffer lock poisoned");
        inner.iter().rev().take(n).cloned().collect()
    }

    /// All samples, oldest first
    pub fn all(&self) -> Vec<T> {
        let inner = self.inner.lock().expect("sample buffer lock poisoned");
        inner.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<T> {
        let inner = self.inner.lock().expect("sample buffer lock poisoned");
        inner.back().cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("sample buffer lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Buffer occupancy snapshot
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySizes {
    pub imu_size: usize,
    pub meteo_size: usize,
    pub wind_size: usize,
}

/// The three sensor-side histories
pub struct TelemetryBuffers {
    filtered: SampleBuffer<FilteredData>,
    meteo: SampleBuffer<MeteoReading>,
    wind: SampleBuffer<WindReading>,
}

impl TelemetryBuffers {
    pub fn new(max_len: usize) -> Self {
        Self {
            filtered: SampleBuffer::new(max_len),
            meteo: SampleBuffer::new(max_len),
            wind: SampleBuffer::new(max_len),
        }
    }

    pub fn push_filtered(&self, data: FilteredData) {
        self.filtered.push(data);
    }

    pub fn push_meteo(&self, reading: MeteoReading) {
        self.meteo.push(reading);
    }

    pub fn push_wind(&self, reading: WindReading) {
        self.wind.push(reading);
    }

    pub fn latest_filtered(&self) -> Option<FilteredData> {
        self.filtered.latest()
    }

    pub fn latest_meteo(&self) -> Option<MeteoReading> {
        self.meteo.latest()
    }

    pub fn latest_wind(&self) -> Option<WindReading> {
        self.wind.latest()
    }

    pub fn recent_filtered(&self, n: usize) -> Vec<FilteredData> {
        self.filtered.recent(n)
    }

    pub fn recent_meteo(&self, n: usize) -> Vec<MeteoReading> {
        self.meteo.recent(n)
    }

    pub fn recent_wind(&self, n: usize) -> Vec<WindReading> {
        self.wind.recent(n)
    }

    /// Filtered samples with `start <= t <= end`, oldest first
    pub fn filtered_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<FilteredData> {
        self.filtered
            .all()
            .into_iter()
            .filter(|d| d.timestamp >= start && d.timestamp <= end)
            .collect()
    }

    pub fn meteo_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<MeteoReading> {
        self.meteo
            .all()
            .into_iter()
            .filter(|d| d.timestamp >= start && d.timestamp <= end)
            .collect()
    }

    pub fn wind_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<WindReading> {
        self.wind
            .all()
            .into_iter()
            .filter(|d| d.timestamp >= start && d.timestamp <= end)
            .collect()
    }

    pub fn sizes(&self) -> TelemetrySizes {
        TelemetrySizes {
            imu_size: self.filtered.len(),
            meteo_size: self.meteo.len(),
            wind_size: self.wind.len(),
        }
    }
}
