//! Edit scripts
//!
//! An edit script is a JSON array of operations replayed against the engine
//! in order, standing in for the user actions an editor would issue:
//!
//! ```json
//! [
//!   { "op": "rename", "layer": "team", "from": "lpar1", "to": "prod" },
//!   { "op": "set", "layer": "team", "path": "profiles.prod.properties.port", "value": 1443 },
//!   { "op": "set-default", "layer": "team", "type": "zosmf", "value": "" }
//! ]
//! ```

use std::path::Path;

use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use teamcfg_core::{Engine, Error as CoreError};
use teamcfg_model::{ConfigPath, LayerId, ProfileKey};

use crate::error::{CliError, Result};

/// One user action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Edit {
    Rename {
        layer: String,
        from: String,
        to: String,
        #[serde(default, rename = "dragDrop")]
        drag_drop: bool,
    },
    Set {
        layer: String,
        path: String,
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secure: Option<bool>,
    },
    Delete {
        layer: String,
        path: String,
    },
    SetDefault {
        layer: String,
        #[serde(rename = "type")]
        kind: String,
        value: String,
    },
    DeleteProfile {
        layer: String,
        profile: String,
    },
    SetSecure {
        layer: String,
        path: String,
        secure: bool,
    },
}

impl Edit {
    pub fn layer(&self) -> &str {
        match self {
            Self::Rename { layer, .. }
            | Self::Set { layer, .. }
            | Self::Delete { layer, .. }
            | Self::SetDefault { layer, .. }
            | Self::DeleteProfile { layer, .. }
            | Self::SetSecure { layer, .. } => layer,
        }
    }

    fn apply(&self, engine: &mut Engine) -> teamcfg_core::Result<()> {
        let id = LayerId::new(self.layer());
        match self {
            Self::Rename {
                from, to, drag_drop, ..
            } => {
                let from = ProfileKey::parse(from)?;
                let to = ProfileKey::parse(to)?;
                engine.rename(&from, &to, &id, *drag_drop)?;
            }
            Self::Set {
                path,
                value,
                secure,
                ..
            } => engine.set_property(&ConfigPath::parse(path), value.clone(), &id, *secure)?,
            Self::Delete { path, .. } => engine.delete_property(&ConfigPath::parse(path), &id)?,
            Self::SetDefault { kind, value, .. } => engine.set_default(kind, value, &id)?,
            Self::DeleteProfile { profile, .. } => {
                engine.delete_profile(&ProfileKey::parse(profile)?, &id)?
            }
            Self::SetSecure { path, secure, .. } => {
                engine.set_secure(&ConfigPath::parse(path), *secure, &id)?
            }
        }
        Ok(())
    }
}

/// Outcome of replaying a script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditReport {
    pub applied: usize,
    /// Rejection messages, in script order
    pub rejected: Vec<String>,
}

/// Read an edit script from disk.
pub fn load(path: &Path) -> Result<Vec<Edit>> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Replay `edits` in order.
///
/// Rejected edits are reported and skipped; any other failure stops the
/// replay.
pub fn apply(engine: &mut Engine, edits: &[Edit]) -> Result<EditReport> {
    let mut report = EditReport::default();
    for (index, edit) in edits.iter().enumerate() {
        match edit.apply(engine) {
            Ok(()) => report.applied += 1,
            Err(CoreError::Rejected(rejection)) => {
                tracing::warn!(index, %rejection, "Edit rejected");
                eprintln!(
                    "{} edit {} skipped: {}",
                    "warning:".yellow().bold(),
                    index + 1,
                    rejection.reason()
                );
                report.rejected.push(rejection.reason());
            }
            Err(e) => {
                return Err(CliError::user(format!("edit {} failed: {e}", index + 1)));
            }
        }
    }
    tracing::debug!(
        applied = report.applied,
        rejected = report.rejected.len(),
        "Replayed edit script"
    );
    Ok(report)
}
