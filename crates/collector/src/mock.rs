//! Mock frame source
//!
//! Implements `FrameSource` and synthesizes broker payloads carrying real
//! N2K byte layouts (wind, attitude, COG/SOG, rate of turn, heading) on a
//! background thread. Used by tests and by `run --mock` so the whole
//! pipeline can be exercised without a broker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use contracts::{BrokerMessage, FrameSource, MessageCallback, TelemetryError};
use tracing::{debug, trace};

/// Mock source configuration
#[derive(Debug, Clone)]
pub struct MockSourceConfig {
    /// Frame emission rate (Hz)
    pub frequency_hz: f64,

    /// Topic the synthetic frames claim to arrive on
    pub topic: String,

    /// N2K source address stamped on each frame
    pub source_address: u8,
}

impl Default for MockSourceConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 50.0,
            topic: "boats/mock/n2k".to_string(),
            source_address: 23,
        }
    }
}

/// Synthetic broker source cycling through the sailing-critical PGNs
pub struct MockFrameSource {
    config: MockSourceConfig,
    connected: Arc<AtomicBool>,
    listening: Arc<AtomicBool>,
}

impl MockFrameSource {
    pub fn new(config: MockSourceConfig) -> Self {
        Self {
            config,
            connected: Arc::new(AtomicBool::new(false)),
            listening: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl FrameSource for MockFrameSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn connect(&mut self, _timeout: Duration) -> Result<(), TelemetryError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(
        &mut self,
        topic: &str,
        _timeout: Duration,
        callback: MessageCallback,
    ) -> Result<(), TelemetryError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TelemetryError::broker_subscribe(topic, "not connected"));
        }

        // Idempotent: one generator thread at most
        if self.listening.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let config = self.config.clone();
        let listening = Arc::clone(&self.listening);
        let interval = Duration::from_secs_f64(1.0 / config.frequency_hz.max(1.0));

        thread::spawn(move || {
            debug!(frequency_hz = config.frequency_hz, "mock frame source started");
            let mut tick = 0u64;

            while listening.load(Ordering::Relaxed) {
                tick += 1;
                let (pgn, data) = synth_frame(tick);
                let hex: String = data.iter().map(|b| format!("{b:02x}")).collect();

                let payload = serde_json::json!({
                    "ts": Utc::now().timestamp_millis(),
                    "pgn": pgn,
                    "src": config.source_address,
                    "data": hex,
                });

                if let Ok(bytes) = serde_json::to_vec(&payload) {
                    callback(BrokerMessage {
                        topic: config.topic.clone(),
                        payload: Bytes::from(bytes),
                    });
                    trace!(tick, pgn, "mock frame emitted");
                }

                thread::sleep(interval);
            }

            debug!("mock frame source stopped");
        });

        Ok(())
    }

    async fn disconnect(&mut self, _grace: Duration) {
        self.listening.store(false, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

/// One synthetic frame per tick, cycling through the core PGNs with slow
/// sinusoidal values.
fn synth_frame(tick: u64) -> (u32, Vec<u8>) {
    let t = tick as f64;
    match tick % 5 {
        0 => {
            let speed_ms = 6.0 + 2.0 * (t * 0.050).sin();
            let angle_rad = (40.0 + 10.0 * (t * 0.013).sin()).to_radians();
            (130_306, wind_frame(speed_ms, angle_rad))
        }
        1 => {
            let roll_rad = (12.0 * (t * 0.020).sin()).to_radians();
            let pitch_rad = (2.0 * (t * 0.007).sin()).to_radians();
            (127_257, attitude_frame(1.0, pitch_rad, roll_rad))
        }
        2 => {
            let sog_ms = 3.0 + 0.5 * (t * 0.009).sin();
            (129_026, cog_sog_frame(1.0 + 0.1 * (t * 0.004).sin(), sog_ms))
        }
        3 => (127_251, rate_of_turn_frame(0.05 * (t * 0.030).sin())),
        _ => (127_250, heading_frame(1.0 + 0.1 * (t * 0.004).sin())),
    }
}

fn wind_frame(speed_ms: f64, angle_rad: f64) -> Vec<u8> {
    let mut data = vec![0u8; 6];
    data[1..3].copy_from_slice(&((speed_ms * 100.0) as u16).to_le_bytes());
    data[3..5].copy_from_slice(&((angle_rad * 10_000.0) as u16).to_le_bytes());
    data[5] = 2; // apparent reference
    data
}

fn attitude_frame(yaw_rad: f64, pitch_rad: f64, roll_rad: f64) -> Vec<u8> {
    let mut data = vec![0u8; 7];
    data[1..3].copy_from_slice(&((yaw_rad * 10_000.0) as i16).to_le_bytes());
    data[3..5].copy_from_slice(&((pitch_rad * 10_000.0) as i16).to_le_bytes());
    data[5..7].copy_from_slice(&((roll_rad * 10_000.0) as i16).to_le_bytes());
    data
}

fn cog_sog_frame(cog_rad: f64, sog_ms: f64) -> Vec<u8> {
    let mut data = vec![0xFFu8; 8];
    data[0] = 0;
    data[1..3].copy_from_slice(&((cog_rad * 10_000.0) as u16).to_le_bytes());
    data[3..5].copy_from_slice(&((sog_ms * 100.0) as u16).to_le_bytes());
    data
}

fn rate_of_turn_frame(rot_rad_s: f64) -> Vec<u8> {
    let mut data = vec![0xFFu8; 8];
    data[0] = 0;
    data[1..5].copy_from_slice(&((rot_rad_s / 3.125e-8) as i32).to_le_bytes());
    data
}

fn heading_frame(heading_rad: f64) -> Vec<u8> {
    let mut data = vec![0u8; 8];
    data[1..3].copy_from_slice(&((heading_rad * 10_000.0) as u16).to_le_bytes());
    data[3..5].copy_from_slice(&0x7FFFu16.to_le_bytes()); // deviation n/a
    data[5..7].copy_from_slice(&0x7FFFu16.to_le_bytes()); // variation n/a
    data[7] = 1; // magnetic
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_frame;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_mock_source_emits_parseable_frames() {
        let mut source = MockFrameSource::new(MockSourceConfig {
            frequency_hz: 500.0,
            ..MockSourceConfig::default()
        });

        let received: Arc<Mutex<Vec<BrokerMessage>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        source.connect(Duration::from_secs(1)).await.unwrap();
        source
            .subscribe(
                "boats/+/n2k",
                Duration::from_secs(1),
                Arc::new(move |msg| sink.lock().unwrap().push(msg)),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        source.disconnect(Duration::from_millis(10)).await;

        let messages = received.lock().unwrap();
        assert!(messages.len() >= 5, "got {} messages", messages.len());

        for msg in messages.iter() {
            let value: serde_json::Value = serde_json::from_slice(&msg.payload).unwrap();
            let frame = parse_frame(&msg.topic, &value).expect("mock frame must parse");
            assert_eq!(frame.source, 23);
        }
    }

    #[tokio::test]
    async fn test_subscribe_requires_connect() {
        let mut source = MockFrameSource::new(MockSourceConfig::default());
        let result = source
            .subscribe("t", Duration::from_secs(1), Arc::new(|_| {}))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_synth_frames_decode() {
        let decoder = n2k::Decoder::new();
        for tick in 1..=10 {
            let (pgn, data) = synth_frame(tick);
            let fields = decoder.decode(pgn, &data).into_fields();
            assert!(!fields.is_empty(), "tick {tick} pgn {pgn} produced no fields");
        }
    }
}
