//! Canned team-config documents and an on-disk [`ConfigDir`].
//!
//! The documents describe a small mainframe estate: a project layer with a
//! base profile and an `lpar1` group holding `zosmf` and `ssh` profiles, a
//! user layer overriding one profile, and a global layer carrying a
//! fallback `zosmf` default.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use teamcfg_model::{ConfigurationLayer, LayerSchema, LayerScope};

pub const PROJECT_LAYER_ID: &str = "team.config.json";
pub const USER_LAYER_ID: &str = "team.config.user.json";
pub const GLOBAL_LAYER_ID: &str = "global.config.json";

/// Project layer: `base`, `lpar1`, `lpar1.zosmf`, `lpar1.ssh`.
pub const PROJECT_CONFIG: &str = r#"{
    "profiles": {
        "base": {
            "type": "base",
            "properties": { "host": "example.com", "rejectUnauthorized": true },
            "secure": ["user", "password"]
        },
        "lpar1": {
            "properties": { "host": "lpar1.example.com" },
            "profiles": {
                "zosmf": { "type": "zosmf", "properties": { "port": 443 } },
                "ssh": { "type": "ssh", "properties": { "port": 22 } }
            }
        }
    },
    "defaults": { "base": "base", "zosmf": "lpar1.zosmf", "ssh": "lpar1.ssh" },
    "autoStore": true
}"#;

/// User layer: a personal `zosmf` profile with no default of its own.
pub const USER_CONFIG: &str = r#"{
    "profiles": {
        "mine": { "type": "zosmf", "properties": { "port": 1443 } }
    },
    "defaults": {}
}"#;

/// Global layer: a fallback `zosmf` default with a secure password.
pub const GLOBAL_CONFIG: &str = r#"{
    "profiles": {
        "zosmf_global": {
            "type": "zosmf",
            "properties": { "host": "global.example.com", "port": 10443, "user": "ibmuser" },
            "secure": ["password"]
        }
    },
    "defaults": { "zosmf": "zosmf_global" }
}"#;

/// JSON schema shared by every fixture layer.
pub const SCHEMA: &str = r#"{
    "$schema": "https://json-schema.org/draft/2020-12/schema",
    "type": "object",
    "properties": {
        "profiles": {
            "type": "object",
            "patternProperties": {
                "^\\S*$": {
                    "type": "object",
                    "allOf": [
                        {
                            "if": { "properties": { "type": { "const": "zosmf" } } },
                            "then": {
                                "properties": {
                                    "properties": {
                                        "type": "object",
                                        "properties": {
                                            "host": { "type": "string", "description": "z/OSMF host name" },
                                            "port": { "type": "number", "default": 443 },
                                            "user": { "type": "string" },
                                            "password": { "type": "string" },
                                            "rejectUnauthorized": { "type": "boolean", "default": true }
                                        }
                                    },
                                    "secure": { "items": { "enum": ["user", "password"] } }
                                }
                            }
                        },
                        {
                            "if": { "properties": { "type": { "const": "ssh" } } },
                            "then": {
                                "properties": {
                                    "properties": {
                                        "type": "object",
                                        "properties": {
                                            "host": { "type": "string" },
                                            "port": { "type": "number", "default": 22 },
                                            "user": { "type": "string" },
                                            "privateKey": { "type": "string" }
                                        }
                                    },
                                    "secure": { "items": { "enum": ["user", "privateKey"] } }
                                }
                            }
                        },
                        {
                            "if": { "properties": { "type": { "const": "base" } } },
                            "then": {
                                "properties": {
                                    "properties": {
                                        "type": "object",
                                        "properties": {
                                            "host": { "type": "string" },
                                            "port": { "type": "number" },
                                            "user": { "type": "string" },
                                            "password": { "type": "string" },
                                            "rejectUnauthorized": { "type": "boolean" }
                                        }
                                    },
                                    "secure": { "items": { "enum": ["user", "password"] } }
                                }
                            }
                        }
                    ]
                }
            }
        },
        "defaults": {
            "type": "object",
            "properties": { "zosmf": {}, "ssh": {}, "base": {} }
        }
    }
}"#;

pub fn project_layer() -> ConfigurationLayer {
    ConfigurationLayer::from_json(PROJECT_LAYER_ID, LayerScope::PROJECT, PROJECT_CONFIG)
        .expect("fixtures: project layer must parse")
}

pub fn user_layer() -> ConfigurationLayer {
    ConfigurationLayer::from_json(USER_LAYER_ID, LayerScope::PROJECT_USER, USER_CONFIG)
        .expect("fixtures: user layer must parse")
}

pub fn global_layer() -> ConfigurationLayer {
    ConfigurationLayer::from_json(GLOBAL_LAYER_ID, LayerScope::GLOBAL, GLOBAL_CONFIG)
        .expect("fixtures: global layer must parse")
}

pub fn schema() -> LayerSchema {
    let document: Value = serde_json::from_str(SCHEMA).expect("fixtures: schema must parse");
    LayerSchema::from_json_schema(&document)
}

/// A temporary directory holding config files for CLI and settings tests.
///
/// # Example
///
/// ```rust
/// use teamcfg_test_utils::fixtures::ConfigDir;
///
/// let dir = ConfigDir::with_fixtures();
/// assert!(dir.path("team.config.json").is_file());
/// assert!(dir.path("team.schema.json").is_file());
/// ```
pub struct ConfigDir {
    temp_dir: TempDir,
}

impl Default for ConfigDir {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigDir {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("ConfigDir::new: failed to create temp dir"),
        }
    }

    /// Create a directory holding every fixture layer plus the schema as
    /// `team.schema.json`.
    pub fn with_fixtures() -> Self {
        let dir = Self::new();
        dir.write(PROJECT_LAYER_ID, PROJECT_CONFIG);
        dir.write(USER_LAYER_ID, USER_CONFIG);
        dir.write(GLOBAL_LAYER_ID, GLOBAL_CONFIG);
        dir.write("team.schema.json", SCHEMA);
        dir
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of a file inside the directory.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write a file, creating parent directories, and return its path.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("ConfigDir::write: failed to create parent");
        }
        fs::write(&path, content).expect("ConfigDir::write: failed to write file");
        path
    }

    /// Write `.teamcfg/settings.toml` below the root.
    pub fn write_settings(&self, content: &str) -> PathBuf {
        self.write(".teamcfg/settings.toml", content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teamcfg_model::ProfileKey;

    #[test]
    fn fixture_layers_parse() {
        let project = project_layer();
        assert_eq!(project.profile_keys().len(), 4);
        assert_eq!(project.default_for("zosmf"), Some("lpar1.zosmf"));
        assert_eq!(project.auto_store, Some(true));

        assert!(user_layer().contains(&ProfileKey::parse("mine").unwrap()));
        assert_eq!(global_layer().scope, LayerScope::GLOBAL);
    }

    #[test]
    fn fixture_schema_declares_types() {
        let schema = schema();
        assert!(schema.allows("zosmf", "host"));
        assert!(schema.is_secure_property("ssh", "privateKey"));
        assert!(schema.is_valid_default_type("base"));
        assert!(!schema.allows("base", "privateKey"));
    }

    #[test]
    fn config_dir_writes_nested_files() {
        let dir = ConfigDir::new();
        let path = dir.write_settings("max_renames_per_profile = 2\n");
        assert!(path.ends_with(".teamcfg/settings.toml"));
        assert_eq!(fs::read_to_string(path).unwrap(), "max_renames_per_profile = 2\n");
    }
}
