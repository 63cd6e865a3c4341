//! Collector pipeline - lifecycle, workers, channels
//!
//! One broker connection, N decoder workers pulling from a shared bounded
//! channel (any-of semantics), one storage worker, one stats reporter. A
//! shared `done` signal stops every worker; the broker is disconnected
//! with a fixed grace period.
//!
//! Ordering: within one decoder worker frames stay in order; across
//! workers arrival order is lost, so the latest-by-PGN index reflects
//! "most recently stored". Consumers that need the wall-clock-latest
//! message compare timestamps.

use std::sync::Arc;
use std::time::Duration;

use async_channel::{bounded, Receiver, Sender, TrySendError};
use chrono::Utc;
use contracts::{
    BrokerMessage, CollectorConfig, DecodedMessage, FrameSource, MessageCallback, RawFrame,
    TelemetryError,
};
use n2k::{measurement_class, pgn_name, DecodeOutcome, Decoder};
use observability::{record_buffer_size, record_decode, record_frame_dropped, record_frame_received};
use storage::{CollectorCsv, RingBuffer, StatsCsv, StatsRecord};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::parse::parse_frame;
use crate::stats::Statistics;

/// Broker connect deadline
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Broker subscribe deadline
pub const SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Grace period for in-flight traffic on disconnect
pub const DISCONNECT_GRACE: Duration = Duration::from_millis(1000);

const STATS_INTERVAL: Duration = Duration::from_secs(30);

/// What a decoder worker hands to the storage worker: the decoded message
/// plus the frame it came from (frames.csv provenance).
struct DecodedEnvelope {
    frame: RawFrame,
    msg: DecodedMessage,
}

/// The broker-to-storage ingestion pipeline
pub struct Collector<S: FrameSource> {
    config: CollectorConfig,
    source: S,
    decoder: Arc<Decoder>,
    buffer: Arc<RingBuffer>,
    stats: Arc<Statistics>,
    raw_tx: Sender<RawFrame>,
    raw_rx: Receiver<RawFrame>,
    done_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl<S: FrameSource> Collector<S> {
    /// Create a collector over an injected source and shared ring buffer
    pub fn new(config: CollectorConfig, source: S, buffer: Arc<RingBuffer>) -> Self {
        let (raw_tx, raw_rx) = bounded(config.queue_size);
        let (done_tx, done_rx) = watch::channel(false);

        Self {
            config,
            source,
            decoder: Arc::new(Decoder::new()),
            buffer,
            stats: Arc::new(Statistics::new()),
            raw_tx,
            raw_rx,
            done_tx,
            done_rx,
            workers: Vec::new(),
        }
    }

    /// Connect, subscribe and spawn the worker pool
    pub async fn start(&mut self) -> Result<(), TelemetryError> {
        info!(
            host = %self.config.broker_host,
            port = self.config.broker_port,
            topic = %self.config.topic,
            workers = self.config.decoder_workers,
            "starting collector"
        );

        // CSV outputs first: an unwritable path is fatal at startup
        let (csv, stats_csv) = if self.config.enable_csv {
            (
                Some(CollectorCsv::open(
                    &self.config.csv_frames_path,
                    &self.config.csv_decoded_path,
                )?),
                Some(StatsCsv::open(&self.config.csv_stats_path)?),
            )
        } else {
            (None, None)
        };

        self.source.connect(CONNECT_TIMEOUT).await?;
        info!(source = self.source.name(), "broker connected");

        let raw_tx = self.raw_tx.clone();
        let callback: MessageCallback = Arc::new(move |message: BrokerMessage| {
            let Ok(value) = serde_json::from_slice::<serde_json::Value>(&message.payload) else {
                // Not JSON: skip, this is not a decodable frame
                return;
            };
            let Some(frame) = parse_frame(&message.topic, &value) else {
                return;
            };

            record_frame_received();
            match raw_tx.try_send(frame) {
                Ok(()) => {}
                // Queue full: drop the incoming frame, freshness wins
                Err(TrySendError::Full(_)) => record_frame_dropped("raw"),
                Err(TrySendError::Closed(_)) => {}
            }
        });

        self.source
            .subscribe(&self.config.topic, SUBSCRIBE_TIMEOUT, callback)
            .await?;
        info!(topic = %self.config.topic, "subscribed");

        let (decoded_tx, decoded_rx) = bounded(self.config.queue_size);

        for id in 0..self.config.decoder_workers {
            self.workers.push(tokio::spawn(decode_worker(
                id,
                self.raw_rx.clone(),
                decoded_tx.clone(),
                Arc::clone(&self.decoder),
                Arc::clone(&self.stats),
                self.done_rx.clone(),
            )));
        }
        drop(decoded_tx);

        self.workers.push(tokio::spawn(storage_worker(
            decoded_rx,
            Arc::clone(&self.buffer),
            csv,
            self.done_rx.clone(),
        )));

        self.workers.push(tokio::spawn(stats_reporter(
            Arc::clone(&self.stats),
            Arc::clone(&self.buffer),
            stats_csv,
            self.done_rx.clone(),
        )));

        info!("collector started");
        Ok(())
    }

    /// Signal all workers, disconnect the broker, drain the worker pool
    pub async fn stop(&mut self) {
        info!("stopping collector");
        let _ = self.done_tx.send(true);

        self.source.disconnect(DISCONNECT_GRACE).await;

        for handle in self.workers.drain(..) {
            let _ = handle.await;
        }

        let snap = self.stats.snapshot();
        info!(
            messages = snap.messages_processed,
            success_pct = format!("{:.1}", snap.success_rate_pct),
            "collector stopped"
        );
    }

    pub fn buffer(&self) -> Arc<RingBuffer> {
        Arc::clone(&self.buffer)
    }

    pub fn stats(&self) -> Arc<Statistics> {
        Arc::clone(&self.stats)
    }

    pub fn is_connected(&self) -> bool {
        self.source.is_connected()
    }
}

async fn decode_worker(
    id: usize,
    raw_rx: Receiver<RawFrame>,
    decoded_tx: Sender<DecodedEnvelope>,
    decoder: Arc<Decoder>,
    stats: Arc<Statistics>,
    mut done_rx: watch::Receiver<bool>,
) {
    debug!(worker = id, "decoder worker started");

    loop {
        tokio::select! {
            frame = raw_rx.recv() => {
                let Ok(frame) = frame else { break };

                let outcome = decoder.decode(frame.pgn, &frame.data);
                let success =
                    matches!(&outcome, DecodeOutcome::Decoded(fields) if !fields.is_empty());
                let measurement = measurement_class(frame.pgn);

                let msg = DecodedMessage {
                    timestamp: frame.timestamp,
                    pgn: frame.pgn,
                    pgn_name: pgn_name(frame.pgn).to_string(),
                    source: frame.source,
                    measurement: measurement.to_string(),
                    fields: outcome.into_fields(),
                    raw: Some(frame.data.clone()),
                };

                stats.record_message(frame.pgn, measurement, success);
                record_decode(success);

                match decoded_tx.try_send(DecodedEnvelope { frame, msg }) {
                    Ok(()) => {}
                    // Storage queue full: drop
                    Err(TrySendError::Full(_)) => record_frame_dropped("decoded"),
                    Err(TrySendError::Closed(_)) => break,
                }
            }
            _ = done_rx.changed() => break,
        }
    }

    debug!(worker = id, "decoder worker stopped");
}

async fn storage_worker(
    decoded_rx: Receiver<DecodedEnvelope>,
    buffer: Arc<RingBuffer>,
    mut csv: Option<CollectorCsv>,
    mut done_rx: watch::Receiver<bool>,
) {
    debug!("storage worker started");

    loop {
        tokio::select! {
            envelope = decoded_rx.recv() => {
                let Ok(DecodedEnvelope { frame, msg }) = envelope else { break };

                if let Some(csv) = csv.as_mut() {
                    if let Err(e) = csv.write_frame(&frame) {
                        warn!(error = %e, "frames csv write failed");
                    }
                    if let Err(e) = csv.write_decoded(&msg) {
                        warn!(error = %e, "decoded csv write failed");
                    }
                }

                buffer.push(msg);
                record_buffer_size(buffer.size());
            }
            _ = done_rx.changed() => break,
        }
    }

    if let Some(csv) = csv.as_mut() {
        if let Err(e) = csv.close() {
            warn!(error = %e, "csv close failed");
        }
    }

    debug!("storage worker stopped");
}

async fn stats_reporter(
    stats: Arc<Statistics>,
    buffer: Arc<RingBuffer>,
    mut csv: Option<StatsCsv>,
    mut done_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(STATS_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // interval fires immediately; swallow that first tick
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snap = stats.snapshot();
                info!(
                    messages = snap.messages_processed,
                    per_sec = format!("{:.1}", snap.messages_per_sec),
                    success_pct = format!("{:.1}", snap.success_rate_pct),
                    buffer = buffer.size(),
                    "collector stats"
                );

                if let Some(csv) = csv.as_mut() {
                    let record = StatsRecord {
                        timestamp: Utc::now(),
                        messages_processed: snap.messages_processed,
                        decode_successes: snap.decode_successes,
                        decode_failures: snap.decode_failures,
                        success_rate_pct: snap.success_rate_pct,
                        messages_per_sec: snap.messages_per_sec,
                        buffer_size: buffer.size(),
                    };
                    if let Err(e) = csv.write_record(&record) {
                        warn!(error = %e, "stats csv write failed");
                    }
                }
            }
            _ = done_rx.changed() => break,
        }
    }
}
