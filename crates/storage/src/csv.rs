//! Append-only CSV output
//!
//! `CsvAppender` opens a file in append mode, writes the header only when
//! the file is empty, and flushes after every record so a crash loses at
//! most the row being written.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use contracts::{DecodedMessage, RawFrame, TelemetryError};

/// One file of append-only CSV rows
pub struct CsvAppender {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl CsvAppender {
    /// Open (creating parent directories) and write `header` if the file is
    /// empty.
    pub fn open(path: impl AsRef<Path>, header: &[&str]) -> Result<Self, TelemetryError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_empty = file.metadata()?.len() == 0;
        let mut appender = Self {
            path,
            writer: BufWriter::new(file),
        };

        if is_empty {
            appender.write_row(header.iter().map(|s| s.to_string()))?;
        }

        Ok(appender)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row and flush it to disk.
    pub fn write_row<I, S>(&mut self, values: I) -> Result<(), TelemetryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let row = values
            .into_iter()
            .map(|v| escape(v.as_ref()))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(self.writer, "{row}")?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), TelemetryError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Quote a value when it contains a separator, quote or newline
fn escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One row of the periodic decode-stats output
#[derive(Debug, Clone)]
pub struct StatsRecord {
    pub timestamp: DateTime<Utc>,
    pub messages_processed: u64,
    pub decode_successes: u64,
    pub decode_failures: u64,
    pub success_rate_pct: f64,
    pub messages_per_sec: f64,
    pub buffer_size: usize,
}

/// The storage worker's CSV outputs: raw frames and decoded fields
pub struct CollectorCsv {
    frames: CsvAppender,
    decoded: CsvAppender,
}

impl CollectorCsv {
    pub fn open(
        frames_path: impl AsRef<Path>,
        decoded_path: impl AsRef<Path>,
    ) -> Result<Self, TelemetryError> {
        Ok(Self {
            frames: CsvAppender::open(
                frames_path,
                &["iso8601", "ts_ms", "topic", "pgn", "source", "length", "data_hex"],
            )?,
            decoded: CsvAppender::open(
                decoded_path,
                &["iso8601", "ts_ms", "measurement", "pgn", "pgn_name", "source", "field", "value"],
            )?,
        })
    }

    /// One row per accepted raw frame
    pub fn write_frame(&mut self, frame: &RawFrame) -> Result<(), TelemetryError> {
        let hex: String = frame.data.iter().map(|b| format!("{b:02x}")).collect();
        self.frames.write_row([
            frame.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            frame.timestamp.timestamp_millis().to_string(),
            frame.topic.clone(),
            frame.pgn.to_string(),
            frame.source.to_string(),
            frame.data.len().to_string(),
            hex,
        ])
    }

    /// One row per decoded field (long format)
    pub fn write_decoded(&mut self, msg: &DecodedMessage) -> Result<(), TelemetryError> {
        let iso = msg.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        let ts_ms = msg.timestamp.timestamp_millis().to_string();

        for (field, value) in &msg.fields {
            self.decoded.write_row([
                iso.clone(),
                ts_ms.clone(),
                msg.measurement.clone(),
                msg.pgn.to_string(),
                msg.pgn_name.clone(),
                msg.source.to_string(),
                field.clone(),
                value.to_string(),
            ])?;
        }
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), TelemetryError> {
        self.frames.flush()?;
        self.decoded.flush()?;
        Ok(())
    }
}

/// The stats reporter's CSV output (one row per tick)
pub struct StatsCsv {
    inner: CsvAppender,
}

impl StatsCsv {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TelemetryError> {
        Ok(Self {
            inner: CsvAppender::open(
                path,
                &[
                    "iso8601",
                    "messages_processed",
                    "decode_successes",
                    "decode_failures",
                    "success_rate_pct",
                    "messages_per_sec",
                    "buffer_size",
                ],
            )?,
        })
    }

    pub fn write_record(&mut self, record: &StatsRecord) -> Result<(), TelemetryError> {
        self.inner.write_row([
            record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            record.messages_processed.to_string(),
            record.decode_successes.to_string(),
            record.decode_failures.to_string(),
            format!("{:.1}", record.success_rate_pct),
            format!("{:.2}", record.messages_per_sec),
            record.buffer_size.to_string(),
        ])
    }
}
