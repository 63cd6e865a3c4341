//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Replay file not found
    #[error("Replay file not found: {path}")]
    ReplayNotFound { path: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn replay_not_found(path: impl Into<String>) -> Self {
        Self::ReplayNotFound { path: path.into() }
    }
}
