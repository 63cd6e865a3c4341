//! # Config Loader
//!
//! Configuration loading and parsing.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration consistency
//! - Produce a `TelemetryConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("config.toml")).unwrap();
//! println!("Broker: {}", config.collector.broker_host);
//! ```

mod parser;
mod validator;

pub use contracts::TelemetryConfig;
pub use parser::ConfigFormat;

use contracts::TelemetryError;
use std::path::Path;

/// Configuration loader
///
/// Static methods for loading configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file path
    ///
    /// The format is detected from the file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<TelemetryConfig, TelemetryError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from a string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<TelemetryConfig, TelemetryError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize a TelemetryConfig as a TOML string
    pub fn to_toml(config: &TelemetryConfig) -> Result<String, TelemetryError> {
        toml::to_string_pretty(config)
            .map_err(|e| TelemetryError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize a TelemetryConfig as a JSON string
    pub fn to_json(config: &TelemetryConfig) -> Result<String, TelemetryError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| TelemetryError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer the configuration format from the file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, TelemetryError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            TelemetryError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            TelemetryError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read the configuration file content
    fn read_file(path: &Path) -> Result<String, TelemetryError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate the configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<TelemetryConfig, TelemetryError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}
