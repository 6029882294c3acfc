//! [`LayerBuilder`] for in-memory configuration layers.

use serde_json::{Map, Value};
use teamcfg_model::profile::find_profile;
use teamcfg_model::{ConfigurationLayer, LayerId, LayerScope, ProfileKey, ProfileNode, ProfileTree};

/// Fluent builder for a [`ConfigurationLayer`].
///
/// Profiles are given by dotted key; missing parents are created untyped.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use teamcfg_test_utils::LayerBuilder;
///
/// let layer = LayerBuilder::new("team")
///     .profile("lpar1.zosmf", "zosmf", json!({ "port": 443 }))
///     .secure("lpar1.zosmf", &["password"])
///     .default("zosmf", "lpar1.zosmf")
///     .build();
///
/// assert_eq!(layer.profile_keys().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct LayerBuilder {
    id: LayerId,
    scope: LayerScope,
    profiles: ProfileTree,
    defaults: Vec<(String, String)>,
}

impl LayerBuilder {
    /// Start a project-scope layer with no profiles.
    pub fn new(id: &str) -> Self {
        Self {
            id: LayerId::new(id),
            scope: LayerScope::PROJECT,
            profiles: ProfileTree::new(),
            defaults: Vec::new(),
        }
    }

    pub fn scope(mut self, scope: LayerScope) -> Self {
        self.scope = scope;
        self
    }

    /// Add a typed profile. `properties` must be a JSON object or null.
    pub fn profile(mut self, key: &str, kind: &str, properties: Value) -> Self {
        let node = self.node_mut(key);
        node.kind = Some(kind.to_string());
        node.properties = match properties {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => panic!("LayerBuilder::profile: properties must be an object, got {other}"),
        };
        self
    }

    /// Add an untyped grouping profile.
    pub fn group(mut self, key: &str) -> Self {
        self.node_mut(key);
        self
    }

    /// Mark properties of an existing profile as secure.
    pub fn secure(mut self, key: &str, names: &[&str]) -> Self {
        let node = self.node_mut(key);
        node.secure.extend(names.iter().map(|name| name.to_string()));
        self
    }

    /// Set the persisted default profile of a type.
    pub fn default(mut self, kind: &str, key: &str) -> Self {
        self.defaults.push((kind.to_string(), key.to_string()));
        self
    }

    pub fn build(self) -> ConfigurationLayer {
        let mut layer = ConfigurationLayer::new(self.id, self.scope);
        layer.profiles = self.profiles;
        layer.defaults = self.defaults.into_iter().collect();
        layer
    }

    fn node_mut(&mut self, key: &str) -> &mut ProfileNode {
        let key = ProfileKey::parse(key)
            .unwrap_or_else(|e| panic!("LayerBuilder: invalid profile key {key:?}: {e}"));
        let (first, rest) = key
            .segments()
            .split_first()
            .unwrap_or_else(|| panic!("LayerBuilder: empty profile key"));

        let mut node = self.profiles.entry(first.clone()).or_default();
        for segment in rest {
            node = node.profiles.entry(segment.clone()).or_default();
        }
        node
    }
}

/// Look up a profile of a built layer, panicking with a readable message.
pub fn profile_of<'a>(layer: &'a ConfigurationLayer, key: &str) -> &'a ProfileNode {
    let parsed = ProfileKey::parse(key)
        .unwrap_or_else(|e| panic!("profile_of: invalid profile key {key:?}: {e}"));
    find_profile(&layer.profiles, &parsed)
        .unwrap_or_else(|| panic!("profile_of: layer {} has no profile {key}", layer.id))
}
