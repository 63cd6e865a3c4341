//! Error layering
//!
//! Grouped by origin: config / broker / payload / sink / io

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum TelemetryError {
    // ===== configuration =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== broker =====
    /// Broker connection error (auth failure, refused, ...)
    #[error("broker connect error: {message}")]
    BrokerConnect { message: String },

    /// Broker connection attempt timed out
    #[error("broker connect timed out after {waited_ms}ms")]
    BrokerConnectTimeout { waited_ms: u64 },

    /// Broker subscription error
    #[error("broker subscribe error for '{topic}': {message}")]
    BrokerSubscribe { topic: String, message: String },

    /// Broker subscription attempt timed out
    #[error("broker subscribe timed out after {waited_ms}ms for '{topic}'")]
    BrokerSubscribeTimeout { topic: String, waited_ms: u64 },

    // ===== payload =====
    /// Broker payload could not be parsed into a frame
    #[error("payload parse error on '{topic}': {message}")]
    PayloadParse { topic: String, message: String },

    // ===== sinks / persistence =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Persisted-state read/write error
    #[error("state persistence error for '{path}': {message}")]
    StatePersist { path: String, message: String },

    // ===== generic =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl TelemetryError {
    /// Create a configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a broker connection error
    pub fn broker_connect(message: impl Into<String>) -> Self {
        Self::BrokerConnect {
            message: message.into(),
        }
    }

    /// Create a broker subscription error
    pub fn broker_subscribe(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BrokerSubscribe {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create a payload parse error
    pub fn payload_parse(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PayloadParse {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create a sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create a state persistence error
    pub fn state_persist(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StatePersist {
            path: path.into(),
            message: message.into(),
        }
    }
}
