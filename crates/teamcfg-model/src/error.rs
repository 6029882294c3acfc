//! Error types for teamcfg-model

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid profile key '{key}': {reason}")]
    InvalidProfileKey { key: String, reason: String },

    #[error("Path '{path}' does not point inside a profile")]
    NotAProfilePath { path: String },

    #[error("Invalid layer {id}: {message}")]
    InvalidLayer { id: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidProfileKey {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
