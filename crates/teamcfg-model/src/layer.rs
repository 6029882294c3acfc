//! Configuration layers
//!
//! A layer is one loaded team-config document. Layers are immutable once
//! built; every uncommitted edit lives in the engine's per-layer session.

use crate::error::{Error, Result};
use crate::path::{ConfigPath, ProfileKey};
use crate::profile::{self, ProfileNode, ProfileTree};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Identifier of a layer, usually the path of the file it was loaded from
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for LayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Where a layer sits in the precedence order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerScope {
    /// Loaded from the user's home rather than the project
    pub global: bool,
    /// The personal (`.user`) variant of a team file
    pub user: bool,
}

impl LayerScope {
    pub const PROJECT_USER: Self = Self { global: false, user: true };
    pub const PROJECT: Self = Self { global: false, user: false };
    pub const GLOBAL_USER: Self = Self { global: true, user: true };
    pub const GLOBAL: Self = Self { global: true, user: false };

    /// Lower values win: project-user, project, global-user, global.
    pub fn precedence(&self) -> u8 {
        match (self.global, self.user) {
            (false, true) => 0,
            (false, false) => 1,
            (true, true) => 2,
            (true, false) => 3,
        }
    }
}

impl fmt::Display for LayerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match (self.global, self.user) {
            (false, true) => "project-user",
            (false, false) => "project",
            (true, true) => "global-user",
            (true, false) => "global",
        };
        f.write_str(name)
    }
}

impl FromStr for LayerScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "project-user" => Ok(Self::PROJECT_USER),
            "project" => Ok(Self::PROJECT),
            "global-user" => Ok(Self::GLOBAL_USER),
            "global" => Ok(Self::GLOBAL),
            other => Err(Error::InvalidLayer {
                id: other.to_string(),
                message: "scope must be one of project, project-user, global, global-user"
                    .to_string(),
            }),
        }
    }
}

/// On-disk shape of a team-config document
#[derive(Debug, Default, Deserialize)]
struct LayerDocument {
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,
    #[serde(default)]
    profiles: ProfileTree,
    #[serde(default)]
    defaults: BTreeMap<String, String>,
    #[serde(rename = "autoStore", default)]
    auto_store: Option<bool>,
}

/// One persisted configuration layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationLayer {
    pub id: LayerId,
    pub scope: LayerScope,
    pub profiles: ProfileTree,
    /// Profile type to persisted default profile key (as written in the file)
    pub defaults: BTreeMap<String, String>,
    pub auto_store: Option<bool>,
}

impl ConfigurationLayer {
    pub fn new(id: impl Into<LayerId>, scope: LayerScope) -> Self {
        Self {
            id: id.into(),
            scope,
            profiles: ProfileTree::new(),
            defaults: BTreeMap::new(),
            auto_store: None,
        }
    }

    /// Read a layer from team-config JSON.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or when a profile name is not a valid key
    /// segment.
    ///
    /// ```
    /// use teamcfg_model::{ConfigurationLayer, LayerScope};
    ///
    /// let layer = ConfigurationLayer::from_json(
    ///     "team.config.json",
    ///     LayerScope::PROJECT,
    ///     r#"{ "profiles": { "base": { "type": "base" } }, "defaults": { "base": "base" } }"#,
    /// ).unwrap();
    /// assert_eq!(layer.defaults["base"], "base");
    /// ```
    pub fn from_json(id: impl Into<LayerId>, scope: LayerScope, content: &str) -> Result<Self> {
        let id = id.into();
        let document: LayerDocument = serde_json::from_str(content)?;
        validate_names(&id, &document.profiles, &[])?;

        tracing::debug!(layer = %id, profiles = document.profiles.len(), "Loaded layer");
        Ok(Self {
            id,
            scope,
            profiles: document.profiles,
            defaults: document.defaults,
            auto_store: document.auto_store,
        })
    }

    pub fn profile(&self, key: &ProfileKey) -> Option<&ProfileNode> {
        profile::find_profile(&self.profiles, key)
    }

    pub fn contains(&self, key: &ProfileKey) -> bool {
        self.profile(key).is_some()
    }

    /// Every persisted profile key, parents first.
    pub fn profile_keys(&self) -> Vec<ProfileKey> {
        profile::flatten_profiles(&self.profiles)
    }

    /// Persisted default for a type, ignoring empty entries.
    pub fn default_for(&self, kind: &str) -> Option<&str> {
        self.defaults
            .get(kind)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Full path of every property listed in some profile's secure array.
    pub fn secure_keys(&self) -> BTreeSet<ConfigPath> {
        self.profile_keys()
            .into_iter()
            .filter_map(|key| {
                let node = self.profile(&key)?;
                Some(
                    node.secure
                        .iter()
                        .map(|name| ConfigPath::for_property(&key, name))
                        .collect::<Vec<_>>(),
                )
            })
            .flatten()
            .collect()
    }
}

fn validate_names(id: &LayerId, tree: &ProfileTree, prefix: &[String]) -> Result<()> {
    for (name, node) in tree {
        let mut segments = prefix.to_vec();
        segments.push(name.clone());
        ProfileKey::from_segments(segments.clone()).map_err(|e| Error::InvalidLayer {
            id: id.to_string(),
            message: e.to_string(),
        })?;
        validate_names(id, &node.profiles, &segments)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const DOCUMENT: &str = r#"{
        "$schema": "./team.schema.json",
        "profiles": {
            "lpar1": {
                "properties": { "host": "lpar1.example.com" },
                "profiles": {
                    "zosmf": { "type": "zosmf", "properties": { "port": 443 }, "secure": ["password"] }
                }
            },
            "base": { "type": "base", "secure": ["user"] }
        },
        "defaults": { "zosmf": "lpar1.zosmf", "base": "base", "ssh": "" },
        "autoStore": true
    }"#;

    #[test]
    fn test_from_json_reads_document() {
        let layer = ConfigurationLayer::from_json("p", LayerScope::PROJECT, DOCUMENT).unwrap();
        assert_eq!(layer.auto_store, Some(true));
        assert!(layer.contains(&ProfileKey::parse("lpar1.zosmf").unwrap()));
        assert_eq!(layer.default_for("zosmf"), Some("lpar1.zosmf"));
        assert_eq!(layer.default_for("ssh"), None);
    }

    #[test]
    fn test_secure_keys_are_full_paths() {
        let layer = ConfigurationLayer::from_json("p", LayerScope::PROJECT, DOCUMENT).unwrap();
        let keys: Vec<String> = layer.secure_keys().iter().map(ToString::to_string).collect();
        assert_eq!(
            keys,
            vec![
                "profiles.base.properties.user",
                "profiles.lpar1.profiles.zosmf.properties.password",
            ]
        );
    }

    #[rstest]
    #[case(r#"{ "profiles": { "a": { "profiles": { "profiles": {} } } } }"#)]
    #[case(r#"{ "profiles": { "a.b": { "type": "zosmf" } } }"#)]
    #[case(r#"{ "profiles": { "a": { "profiles": { "b.c": {} } } } }"#)]
    fn test_from_json_rejects_unaddressable_profile_names(#[case] doc: &str) {
        let err = ConfigurationLayer::from_json("p", LayerScope::PROJECT, doc).unwrap_err();
        assert!(matches!(err, Error::InvalidLayer { .. }));
    }

    #[test]
    fn test_from_json_rejects_malformed_json() {
        let err = ConfigurationLayer::from_json("p", LayerScope::PROJECT, "{").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[rstest]
    #[case(LayerScope::PROJECT_USER, 0, "project-user")]
    #[case(LayerScope::PROJECT, 1, "project")]
    #[case(LayerScope::GLOBAL_USER, 2, "global-user")]
    #[case(LayerScope::GLOBAL, 3, "global")]
    fn test_scope_precedence(#[case] scope: LayerScope, #[case] rank: u8, #[case] name: &str) {
        assert_eq!(scope.precedence(), rank);
        assert_eq!(scope.to_string(), name);
        assert_eq!(name.parse::<LayerScope>().unwrap(), scope);
    }
}
