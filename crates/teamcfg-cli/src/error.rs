//! Error types for teamcfg-cli

use std::path::PathBuf;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from teamcfg-core
    #[error(transparent)]
    Core(#[from] teamcfg_core::Error),

    /// Error from teamcfg-model
    #[error(transparent)]
    Model(#[from] teamcfg_model::Error),

    /// A configuration, schema, or edit file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file was read but is not valid JSON
    #[error("Invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON output could not be produced
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
