//! Pending edit records

use serde::{Deserialize, Serialize};
use serde_json::Value;
use teamcfg_model::ProfileKey;
use teamcfg_model::path::{PROPERTIES_SEGMENT, TYPE_SEGMENT};

/// An uncommitted value edit inside one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingChange {
    pub value: Value,
    /// Location relative to the owning profile: `["properties", "host"]`,
    /// `["type"]`, or empty for a placeholder that only makes the profile exist
    pub path: Vec<String>,
    /// Owning profile, in its current form when the edit was stored
    pub profile: ProfileKey,
    /// `Some(true)` stores the value securely, `Some(false)` explicitly
    /// clears a persisted secure flag, `None` leaves the flag alone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
}

impl PendingChange {
    /// Top-level property this change writes to, if any.
    pub fn property_name(&self) -> Option<&str> {
        match self.path.as_slice() {
            [section, name, ..] if section == PROPERTIES_SEGMENT => Some(name.as_str()),
            _ => None,
        }
    }

    /// Segments below `properties`, for nested property values.
    pub fn property_path(&self) -> Option<&[String]> {
        match self.path.split_first() {
            Some((section, rest)) if section == PROPERTIES_SEGMENT && !rest.is_empty() => {
                Some(rest)
            }
            _ => None,
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(self.path.as_slice(), [segment] if segment == TYPE_SEGMENT)
    }

    pub fn is_placeholder(&self) -> bool {
        self.path.is_empty()
    }

    pub fn is_secure(&self) -> bool {
        self.secure == Some(true)
    }
}

/// An uncommitted change of the default profile for one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDefault {
    /// New default profile key; empty clears the default
    pub value: String,
    /// Write-back path, `["defaults", <type>]`
    pub path: Vec<String>,
}

impl PendingDefault {
    pub fn new(kind: &str, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            path: vec!["defaults".to_string(), kind.to_string()],
        }
    }

    /// The target profile, `None` when the default is cleared.
    pub fn profile(&self) -> Option<ProfileKey> {
        if self.value.is_empty() {
            return None;
        }
        ProfileKey::parse(&self.value).ok()
    }
}
