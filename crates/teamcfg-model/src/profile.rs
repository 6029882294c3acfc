//! Persisted profile tree
//!
//! A [`ProfileNode`] mirrors one entry of a team-config `profiles` map.
//! Children live in an explicit `profiles` map, so nesting never has to be
//! rediscovered from string keys.

use crate::path::ProfileKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Top-level profile map of a layer, keyed by profile name
pub type ProfileTree = BTreeMap<String, ProfileNode>;

/// A single persisted profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileNode {
    /// Profile type, e.g. "zosmf". Absent for pure grouping profiles.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,

    /// Names of properties whose values live in secure storage
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secure: Vec<String>,

    /// Nested child profiles
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: ProfileTree,
}

impl ProfileNode {
    /// A node with the given type and no properties.
    pub fn typed(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    /// The type, with `None` and blank strings both reading as `""`.
    pub fn type_name(&self) -> &str {
        self.kind.as_deref().map(str::trim).unwrap_or_default()
    }

    pub fn is_secure(&self, property: &str) -> bool {
        self.secure.iter().any(|name| name == property)
    }

    /// True when the property has a value or is listed as secure.
    pub fn has_property(&self, property: &str) -> bool {
        self.properties.contains_key(property) || self.is_secure(property)
    }
}

/// Look up a profile by qualified key.
pub fn find_profile<'a>(tree: &'a ProfileTree, key: &ProfileKey) -> Option<&'a ProfileNode> {
    let (first, rest) = key.segments().split_first()?;
    let mut node = tree.get(first)?;
    for segment in rest {
        node = node.profiles.get(segment)?;
    }
    Some(node)
}

pub fn contains_profile(tree: &ProfileTree, key: &ProfileKey) -> bool {
    find_profile(tree, key).is_some()
}

/// Every profile key in the tree, parents before children, siblings in
/// name order.
///
/// Names that are not valid key segments are skipped together with their
/// subtree.
pub fn flatten_profiles(tree: &ProfileTree) -> Vec<ProfileKey> {
    let mut keys = Vec::new();
    collect_keys(tree, &[], &mut keys);
    keys
}

fn collect_keys(tree: &ProfileTree, prefix: &[String], out: &mut Vec<ProfileKey>) {
    for (name, node) in tree {
        let mut segments = prefix.to_vec();
        segments.push(name.clone());
        let Ok(key) = ProfileKey::from_segments(segments.clone()) else {
            continue;
        };
        out.push(key);
        collect_keys(&node.profiles, &segments, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_tree() -> ProfileTree {
        serde_json::from_value(json!({
            "lpar1": {
                "properties": { "host": "example.com" },
                "profiles": {
                    "zosmf": { "type": "zosmf", "properties": { "port": 443 } },
                    "tso": { "type": "tso", "secure": ["account"] }
                }
            },
            "base": { "type": "base", "secure": ["user", "password"] }
        }))
        .unwrap()
    }

    fn key(s: &str) -> ProfileKey {
        ProfileKey::parse(s).unwrap()
    }

    #[test]
    fn test_find_nested_profile() {
        let tree = sample_tree();
        let node = find_profile(&tree, &key("lpar1.zosmf")).unwrap();
        assert_eq!(node.type_name(), "zosmf");
        assert_eq!(node.properties["port"], json!(443));

        assert!(find_profile(&tree, &key("lpar1.missing")).is_none());
        assert!(!contains_profile(&tree, &key("zosmf")));
    }

    #[test]
    fn test_flatten_is_parent_first() {
        let keys: Vec<String> = flatten_profiles(&sample_tree())
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, vec!["base", "lpar1", "lpar1.tso", "lpar1.zosmf"]);
    }

    #[test]
    fn test_untyped_profile_reads_as_empty_type() {
        let tree = sample_tree();
        assert_eq!(find_profile(&tree, &key("lpar1")).unwrap().type_name(), "");
        assert_eq!(ProfileNode::typed("  ").type_name(), "");
    }

    #[test]
    fn test_secure_names_count_as_present() {
        let tree = sample_tree();
        let base = find_profile(&tree, &key("base")).unwrap();
        assert!(base.has_property("password"));
        assert!(!base.has_property("host"));
    }

    #[test]
    fn test_serialization_omits_empty_sections() {
        let node = ProfileNode::typed("ssh");
        assert_eq!(serde_json::to_value(&node).unwrap(), json!({ "type": "ssh" }));
    }
}
