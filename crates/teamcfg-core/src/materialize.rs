//! Effective profile views
//!
//! A [`LayerView`] borrows one persisted layer together with its rename
//! graph and pending overlay, and answers what a profile looks like as if
//! the session were committed now. Nothing here mutates state.

use crate::overlay::PendingOverlay;
use crate::rename::RenameGraph;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use teamcfg_model::path::{
    PROFILES_SEGMENT, PROPERTIES_SEGMENT, TYPE_SEGMENT, insert_nested, remove_nested,
};
use teamcfg_model::{ConfigPath, ConfigurationLayer, ProfileKey, ProfileNode, ProfileTree};

/// A profile as it would be written if committed now
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    /// Effective type, `""` for untyped profiles
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: Map<String, Value>,
    /// Secure property names, sorted
    pub secure: Vec<String>,
}

impl ProfileView {
    /// The shape returned for profiles that cannot be resolved at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_untyped(&self) -> bool {
        self.kind.trim().is_empty()
    }

    pub fn is_secure(&self, name: &str) -> bool {
        self.secure.iter().any(|secure| secure == name)
    }

    /// True when the property has a local value or is listed as secure.
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name) || self.is_secure(name)
    }
}

/// Read-only view over one layer plus its pending state
#[derive(Debug, Clone, Copy)]
pub struct LayerView<'a> {
    pub layer: &'a ConfigurationLayer,
    pub renames: &'a RenameGraph,
    pub overlay: &'a PendingOverlay,
}

impl<'a> LayerView<'a> {
    pub fn new(
        layer: &'a ConfigurationLayer,
        renames: &'a RenameGraph,
        overlay: &'a PendingOverlay,
    ) -> Self {
        Self {
            layer,
            renames,
            overlay,
        }
    }

    /// Find the persisted node a current key refers to.
    ///
    /// Tries the backward-resolved key, then the key itself, then a
    /// level-by-level walk of the persisted tree. A candidate only counts if
    /// it resolves forward to `key`, so a same-named profile that was renamed
    /// away is never mistaken for this one.
    pub fn locate_persisted(&self, key: &ProfileKey) -> Option<(ProfileKey, &'a ProfileNode)> {
        let accept = |candidate: &ProfileKey| -> Option<(ProfileKey, &'a ProfileNode)> {
            if &self.renames.resolve_forward(candidate) != key {
                return None;
            }
            self.layer.profile(candidate).map(|node| (candidate.clone(), node))
        };

        let original = self.renames.resolve_backward(key);
        if let Some(found) = accept(&original) {
            return Some(found);
        }
        if original != *key
            && let Some(found) = accept(key)
        {
            return Some(found);
        }

        let found = self.walk_levels(&self.layer.profiles, &[], key);
        if let Some((stored, _)) = &found {
            tracing::trace!(%key, %stored, "Located profile by walking the persisted tree");
        }
        found
    }

    fn walk_levels(
        &self,
        tree: &'a ProfileTree,
        prefix: &[String],
        key: &ProfileKey,
    ) -> Option<(ProfileKey, &'a ProfileNode)> {
        for (name, node) in tree {
            let mut segments = prefix.to_vec();
            segments.push(name.clone());
            let Ok(candidate) = ProfileKey::from_segments(segments.clone()) else {
                continue;
            };
            if &self.renames.resolve_forward(&candidate) == key {
                return Some((candidate, node));
            }
            if let Some(found) = self.walk_levels(&node.profiles, &segments, key) {
                return Some(found);
            }
        }
        None
    }

    /// True when the profile (or one of its ancestors) has been deleted.
    pub fn is_profile_deleted(&self, key: &ProfileKey) -> bool {
        self.overlay.is_deleted(&ConfigPath::for_profile(key))
    }

    /// Every document path the profile may be recorded under: its current
    /// path first, then its persisted path when different.
    pub fn profile_paths(&self, key: &ProfileKey) -> Vec<ConfigPath> {
        let mut paths = vec![ConfigPath::for_profile(key)];
        let original = self.renames.resolve_backward(key);
        if &original != key {
            paths.push(ConfigPath::for_profile(&original));
        }
        paths
    }

    /// True when a pending change stored for `owner` belongs to `key`.
    ///
    /// Owners may be recorded before a later rename, so they are compared
    /// in forward-resolved form.
    pub fn owns(&self, owner: &ProfileKey, key: &ProfileKey) -> bool {
        &self.renames.resolve_forward(owner) == key
    }

    /// Effective view of `key`.
    ///
    /// A deleted profile is empty, even when edits were recorded inside it
    /// after the deletion.
    pub fn materialize(&self, key: &ProfileKey) -> ProfileView {
        if self.is_profile_deleted(key) {
            return ProfileView::empty();
        }
        let base = self.locate_persisted(key).map(|(_, node)| node);
        let paths = self.profile_paths(key);

        let mut properties = base.map(|node| node.properties.clone()).unwrap_or_default();
        for path in &paths {
            for deleted in self.overlay.deletions() {
                if let Some([section, names @ ..]) = deleted.relative_to(path)
                    && section == PROPERTIES_SEGMENT
                {
                    remove_nested(&mut properties, names);
                }
            }
        }

        let mut pending_type: Option<String> = None;
        for path in &paths {
            for (change_path, change) in self.overlay.changes_under(path) {
                if !self.owns(&change.profile, key) {
                    continue;
                }
                let Some(rest) = change_path.relative_to(path) else {
                    continue;
                };
                match rest {
                    [] => {}
                    [section, ..] if section == PROFILES_SEGMENT => {}
                    [section] if section == TYPE_SEGMENT => {
                        pending_type = Some(change.value.as_str().unwrap_or_default().to_string());
                    }
                    [section, names @ ..] if section == PROPERTIES_SEGMENT && !names.is_empty() => {
                        if change.is_secure() {
                            if let [name] = names {
                                properties.remove(name);
                            }
                        } else {
                            insert_nested(&mut properties, names, change.value.clone());
                        }
                    }
                    _ => {}
                }
            }
        }

        let base_secure = base.map(|node| node.secure.as_slice()).unwrap_or_default();
        let secure = self.overlay.secure_array(base_secure, &paths);

        let kind = pending_type
            .or_else(|| base.map(|node| node.type_name().to_string()))
            .unwrap_or_default();

        ProfileView {
            kind: kind.trim().to_string(),
            properties,
            secure,
        }
    }

    /// Effective type of `key`, `""` when untyped or unknown.
    pub fn effective_type(&self, key: &ProfileKey) -> String {
        self.materialize(key).kind
    }

    /// Every effective profile key in this layer, parents first.
    pub fn profile_keys(&self) -> BTreeSet<ProfileKey> {
        let mut keys: BTreeSet<ProfileKey> = self
            .layer
            .profile_keys()
            .into_iter()
            .map(|key| self.renames.resolve_forward(&key))
            .filter(|key| !self.is_profile_deleted(key))
            .collect();
        keys.extend(
            self.overlay
                .extract_pending_profiles()
                .into_iter()
                .map(|key| self.renames.resolve_forward(&key))
                .filter(|key| !self.is_profile_deleted(key)),
        );
        keys
    }

    pub fn profile_exists(&self, key: &ProfileKey) -> bool {
        if self.is_profile_deleted(key) {
            return false;
        }
        self.locate_persisted(key).is_some()
            || self
                .overlay
                .changes()
                .any(|(_, change)| self.owns(&change.profile, key))
    }

    /// Default profile for `kind` in this layer.
    ///
    /// A pending default wins (an empty one clears); otherwise the persisted
    /// default is resolved through the rename graph.
    pub fn effective_default(&self, kind: &str) -> Option<ProfileKey> {
        if let Some(pending) = self.overlay.pending_default(kind) {
            return pending
                .profile()
                .map(|key| self.renames.resolve_forward(&key));
        }
        let raw = self.layer.default_for(kind)?;
        let key = ProfileKey::parse(raw).ok()?;
        Some(self.renames.resolve_forward(&key))
    }

    pub fn is_profile_default(&self, key: &ProfileKey) -> bool {
        let kind = self.effective_type(key);
        if kind.is_empty() {
            return false;
        }
        self.effective_default(&kind).as_ref() == Some(key)
    }

    pub fn profiles_of_type(&self, kind: &str) -> Vec<ProfileKey> {
        self.profile_keys()
            .into_iter()
            .filter(|key| self.effective_type(key) == kind)
            .collect()
    }
}
