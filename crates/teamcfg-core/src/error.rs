//! Error types for teamcfg-core

use teamcfg_model::ProfileKey;

/// Result type for teamcfg-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in teamcfg-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No layer with this id has been added to the engine
    #[error("Unknown configuration layer: {id}")]
    UnknownLayer { id: String },

    /// A user action was refused; nothing was changed
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Model error from teamcfg-model
    #[error(transparent)]
    Model(#[from] teamcfg_model::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub fn unknown_layer(id: impl ToString) -> Self {
        Self::UnknownLayer { id: id.to_string() }
    }

    /// True when the error is a refused edit the user can correct and retry.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

/// Why an edit was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Profile '{key}' has already been renamed {limit} time(s); save or discard changes first")]
    RenameLimitExceeded { key: ProfileKey, limit: u32 },

    #[error("Cannot rename '{from}' to '{to}': the rename would create a cycle")]
    CircularRename { from: ProfileKey, to: ProfileKey },

    #[error("Cannot use '{name}': it is the pending old name of a renamed profile")]
    NameReserved { name: ProfileKey },

    #[error("Cannot use '{name}': it was deleted in this session; save or discard changes first")]
    NameDeleted { name: ProfileKey },

    #[error("A profile named '{name}' already exists")]
    NameTaken { name: String },

    #[error("Invalid profile name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

impl Rejection {
    /// Message suitable for showing to the user.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}
