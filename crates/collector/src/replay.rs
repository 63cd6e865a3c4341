//! Replay frame source
//!
//! Plays broker payloads back from a JSON-lines file at an adjustable
//! speed. Each line is one payload object; an optional `topic` key carries
//! provenance, and `ts` deltas drive the pacing when present.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use contracts::{BrokerMessage, FrameSource, MessageCallback, TelemetryError};
use tracing::{debug, info, warn};

/// Pacing when records carry no timestamps
const DEFAULT_GAP: Duration = Duration::from_millis(10);

/// Longest gap honored between two records (recording pauses are skipped)
const MAX_GAP_SECS: f64 = 1.0;

#[derive(Debug, Clone)]
struct ReplayRecord {
    topic: String,
    ts_ms: Option<f64>,
    line: String,
}

/// File-backed frame source
pub struct ReplayFrameSource {
    path: PathBuf,
    speed: f64,
    loop_playback: bool,
    records: Vec<ReplayRecord>,
    connected: Arc<AtomicBool>,
    listening: Arc<AtomicBool>,
}

impl ReplayFrameSource {
    pub fn new(path: impl Into<PathBuf>, speed: f64, loop_playback: bool) -> Self {
        Self {
            path: path.into(),
            speed: if speed > 0.0 { speed } else { 1.0 },
            loop_playback,
            records: Vec::new(),
            connected: Arc::new(AtomicBool::new(false)),
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

impl FrameSource for ReplayFrameSource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn connect(&mut self, _timeout: Duration) -> Result<(), TelemetryError> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut skipped = 0usize;
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<serde_json::Value>(&line) {
                Ok(value) => {
                    let topic = value
                        .get("topic")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or("replay")
                        .to_string();
                    let ts_ms = value
                        .get("ts")
                        .or_else(|| value.get("timestamp"))
                        .and_then(serde_json::Value::as_f64);
                    self.records.push(ReplayRecord { topic, ts_ms, line });
                }
                Err(_) => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(skipped, path = %self.path.display(), "skipped unparseable replay lines");
        }

        info!(
            records = self.records.len(),
            path = %self.path.display(),
            speed = self.speed,
            "replay file loaded"
        );
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

        if self.listening.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let records = self.records.clone();
        let speed = self.speed;
        let loop_playback = self.loop_playback;
        let listening = Arc::clone(&self.listening);

        thread::spawn(move || {
            debug!(records = records.len(), "replay started");

            'replay: loop {
                let mut prev_ts: Option<f64> = None;

                for record in &records {
                    if !listening.load(Ordering::Relaxed) {
                        break 'replay;
                    }

                    let gap = match (prev_ts, record.ts_ms) {
                        (Some(prev), Some(now)) if now > prev => {
                            Duration::from_secs_f64(((now - prev) / 1000.0).min(MAX_GAP_SECS))
                        }
                        _ => DEFAULT_GAP,
                    };
                    prev_ts = record.ts_ms;

                    thread::sleep(gap.div_f64(speed));

                    callback(BrokerMessage {
                        topic: record.topic.clone(),
                        payload: Bytes::from(record.line.clone().into_bytes()),
                    });
                }

                if !loop_playback || !listening.load(Ordering::Relaxed) {
                    break;
                }
            }

            debug!("replay finished");
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_replay_delivers_all_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        let mut file = File::create(&path).unwrap();
        writeln!(file, r#"{{"topic":"boats/a/n2k","ts":1000,"pgn":130306,"data":"01c800a00f00"}}"#)
            .unwrap();
        writeln!(file, r#"{{"ts":1020,"pgn":127257,"data":"00ff7fff7f1027"}}"#).unwrap();
        writeln!(file, "not json").unwrap();

        let mut source = ReplayFrameSource::new(&path, 10.0, false);
        source.connect(Duration::from_secs(1)).await.unwrap();
        assert_eq!(source.record_count(), 2);

        let received: Arc<Mutex<Vec<BrokerMessage>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        source
            .subscribe(
                "ignored",
                Duration::from_secs(1),
                Arc::new(move |msg| sink.lock().unwrap().push(msg)),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        source.disconnect(Duration::from_millis(10)).await;

        let messages = received.lock().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].topic, "boats/a/n2k");
        assert_eq!(messages[1].topic, "replay");
    }

    #[tokio::test]
    async fn test_connect_missing_file_errors() {
        let mut source = ReplayFrameSource::new("/nonexistent/session.jsonl", 1.0, false);
        assert!(source.connect(Duration::from_secs(1)).await.is_err());
    }
}
