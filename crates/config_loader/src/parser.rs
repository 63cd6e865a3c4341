//! Configuration parsing
//!
//! Supports TOML (primary) and JSON (optional) formats.

use contracts::{TelemetryConfig, TelemetryError};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<TelemetryConfig, TelemetryError> {
    toml::from_str(content).map_err(|e| TelemetryError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<TelemetryConfig, TelemetryError> {
    serde_json::from_str(content).map_err(|e| TelemetryError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse configuration in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<TelemetryConfig, TelemetryError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_with_defaults() {
        let content = r#"
[collector]
broker_host = "localhost"

[sensor]
boom_axis = "pitch"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.collector.broker_host, "localhost");
        assert_eq!(config.sensor.boom_axis, contracts::BoomAxis::Pitch);
        assert_eq!(config.collector.queue_size, 1_000);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "collector": { "broker_host": "broker.example.net", "decoder_workers": 8 },
            "sensor": { "euler_tau": 0.5 }
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.collector.decoder_workers, 8);
        assert_eq!(config.sensor.euler_tau, 0.5);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, TelemetryError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
