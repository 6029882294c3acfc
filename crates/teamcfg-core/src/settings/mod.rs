//! Engine settings
//!
//! Settings are read from `settings.toml` files and merged by
//! [`SettingsResolver`]. Every field has a default, so an empty file is a
//! valid settings file.

mod resolver;

pub use resolver::SettingsResolver;

use crate::Result;
use crate::inherit::MergeMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_max_renames() -> u32 {
    1
}

fn default_max_depth() -> usize {
    8
}

/// Layer ordering overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSettings {
    /// Layer ids in the order they should be searched. Layers not listed
    /// follow in scope precedence order.
    #[serde(default)]
    pub order: Vec<String>,
}

/// Tunables of the resolution engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// How many times a profile may be renamed away from the same name
    /// before the session is committed
    #[serde(default = "default_max_renames")]
    pub max_renames_per_profile: u32,

    /// Longest chain of default profiles followed when resolving merged
    /// properties
    #[serde(default = "default_max_depth")]
    pub max_inheritance_depth: usize,

    #[serde(default)]
    pub default_merge_mode: MergeMode,

    #[serde(default)]
    pub layers: LayerSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_renames_per_profile: default_max_renames(),
            max_inheritance_depth: default_max_depth(),
            default_merge_mode: MergeMode::default(),
            layers: LayerSettings::default(),
        }
    }
}

impl EngineSettings {
    /// Parse settings from TOML content
    ///
    /// # Example
    ///
    /// ```
    /// use teamcfg_core::settings::EngineSettings;
    ///
    /// let settings = EngineSettings::parse(r#"
    /// max_renames_per_profile = 3
    ///
    /// [layers]
    /// order = ["project.user", "project"]
    /// "#).unwrap();
    ///
    /// assert_eq!(settings.max_renames_per_profile, 3);
    /// assert_eq!(settings.max_inheritance_depth, 8);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let settings: EngineSettings = toml::from_str(content)?;
        Ok(settings)
    }

    /// Read and parse a settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Merge another settings file into this one
    ///
    /// Values in `other` that differ from the built-in defaults win; a
    /// non-empty layer order replaces the current one.
    pub fn merge(&mut self, other: &EngineSettings) {
        if other.max_renames_per_profile != default_max_renames() {
            self.max_renames_per_profile = other.max_renames_per_profile;
        }
        if other.max_inheritance_depth != default_max_depth() {
            self.max_inheritance_depth = other.max_inheritance_depth;
        }
        if other.default_merge_mode != MergeMode::default() {
            self.default_merge_mode = other.default_merge_mode;
        }
        if !other.layers.order.is_empty() {
            self.layers.order = other.layers.order.clone();
        }
    }
}
