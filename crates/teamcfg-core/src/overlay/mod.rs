//! Uncommitted edits for one layer
//!
//! [`PendingOverlay`] holds four collections, all keyed in current
//! (post-rename) form:
//!
//! - pending value changes, keyed by full document path
//! - pending default-profile changes, keyed by profile type
//! - deleted paths (property or whole-profile tombstones)
//! - secure properties deleted this session, hidden from secure lists
//!
//! Setting a path and deleting it are mutually exclusive: whichever
//! happened last is the one in effect.

mod entry;
mod snapshot;

pub use entry::{PendingChange, PendingDefault};
pub use snapshot::{OverlaySnapshot, RenameRecord};

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use teamcfg_model::path::{PROFILES_SEGMENT, PROPERTIES_SEGMENT};
use teamcfg_model::{ConfigPath, ProfileKey};

/// Pending changes, defaults, and deletions of one layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingOverlay {
    changes: BTreeMap<ConfigPath, PendingChange>,
    defaults: BTreeMap<String, PendingDefault>,
    deletions: BTreeSet<ConfigPath>,
    hidden_secure: BTreeSet<ConfigPath>,
}

impl PendingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
            && self.defaults.is_empty()
            && self.deletions.is_empty()
            && self.hidden_secure.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn changes(&self) -> impl Iterator<Item = (&ConfigPath, &PendingChange)> {
        self.changes.iter()
    }

    pub fn change(&self, path: &ConfigPath) -> Option<&PendingChange> {
        self.changes.get(path)
    }

    pub fn has_change(&self, path: &ConfigPath) -> bool {
        self.changes.contains_key(path)
    }

    pub fn defaults(&self) -> impl Iterator<Item = (&String, &PendingDefault)> {
        self.defaults.iter()
    }

    pub fn pending_default(&self, kind: &str) -> Option<&PendingDefault> {
        self.defaults.get(kind)
    }

    pub fn deletions(&self) -> impl Iterator<Item = &ConfigPath> {
        self.deletions.iter()
    }

    pub fn hidden_secure(&self) -> impl Iterator<Item = &ConfigPath> {
        self.hidden_secure.iter()
    }

    /// Record a value edit at `path`, owned by `profile`.
    ///
    /// An explicit set always un-deletes the exact path.
    pub fn set_value(
        &mut self,
        path: ConfigPath,
        value: Value,
        profile: ProfileKey,
        secure: Option<bool>,
    ) {
        let relative = path
            .relative_to(&ConfigPath::for_profile(&profile))
            .map(<[String]>::to_vec)
            .unwrap_or_else(|| path.segments().to_vec());

        if self.deletions.remove(&path) {
            tracing::debug!(%path, "Set un-deletes path");
        }
        if secure.is_some() {
            self.hidden_secure.remove(&path);
        }

        tracing::debug!(%path, owner = %profile, ?secure, "Pending change");
        self.changes.insert(
            path,
            PendingChange {
                value,
                path: relative,
                profile,
                secure,
            },
        );
    }

    /// Make `profile` exist without giving it any content.
    pub fn add_placeholder(&mut self, profile: &ProfileKey) {
        let path = ConfigPath::for_profile(profile);
        if self.changes.contains_key(&path) {
            return;
        }
        self.set_value(path, Value::Object(Default::default()), profile.clone(), None);
    }

    /// Tombstone `path`, dropping any pending change stored there.
    ///
    /// `secure` records that the deleted property was secure, so its name
    /// disappears from the profile's secure list as well.
    pub fn delete_value(&mut self, path: ConfigPath, secure: bool) {
        self.changes.remove(&path);
        if secure {
            self.hidden_secure.insert(path.clone());
        }
        tracing::debug!(%path, secure, "Pending deletion");
        self.deletions.insert(path);
    }

    /// Record a default change; an empty `value` clears the default.
    pub fn set_default(&mut self, kind: &str, value: impl Into<String>) {
        let pending = PendingDefault::new(kind, value);
        tracing::debug!(kind, value = %pending.value, "Pending default");
        self.defaults.insert(kind.to_string(), pending);
    }

    /// Forget a pending default, falling back to the persisted one.
    pub fn clear_default(&mut self, kind: &str) -> Option<PendingDefault> {
        self.defaults.remove(kind)
    }

    /// True when `path` or a profile containing it is tombstoned.
    pub fn is_deleted(&self, path: &ConfigPath) -> bool {
        if self.deletions.contains(path) {
            return true;
        }
        let segments = path.segments();
        let mut end = 2;
        while end < segments.len() && segments[end - 2] == PROFILES_SEGMENT {
            if self
                .deletions
                .contains(&ConfigPath::from_segments(segments[..end].iter().cloned()))
            {
                return true;
            }
            end += 2;
        }
        false
    }

    pub fn is_hidden_secure(&self, path: &ConfigPath) -> bool {
        self.hidden_secure.contains(path)
    }

    /// Effective secure list of a profile.
    ///
    /// `profile_paths` are every form of the profile's path (current and
    /// original). Starts from `base`, adds names with pending secure edits,
    /// removes names with pending explicitly insecure edits or secure
    /// deletions. Sorted and free of duplicates.
    pub fn secure_array(&self, base: &[String], profile_paths: &[ConfigPath]) -> Vec<String> {
        let mut names: BTreeSet<String> = base.iter().cloned().collect();

        for profile_path in profile_paths {
            for (path, change) in self.changes_under(profile_path) {
                let name = match path.relative_to(profile_path) {
                    Some([section, name]) if section == PROPERTIES_SEGMENT => name.clone(),
                    _ => continue,
                };
                match change.secure {
                    Some(true) => {
                        names.insert(name);
                    }
                    Some(false) => {
                        names.remove(&name);
                    }
                    None => {}
                }
            }
            names.retain(|name| {
                !self
                    .hidden_secure
                    .contains(&profile_path.join([PROPERTIES_SEGMENT, name.as_str()]))
            });
        }

        names.into_iter().collect()
    }

    /// Pending changes stored at or below `prefix`.
    pub fn changes_under<'a>(
        &'a self,
        prefix: &'a ConfigPath,
    ) -> impl Iterator<Item = (&'a ConfigPath, &'a PendingChange)> + 'a {
        self.changes
            .range(prefix.clone()..)
            .take_while(move |(path, _)| path.starts_with(prefix))
    }

    /// Every profile referenced as an owner by a pending change.
    pub fn extract_pending_profiles(&self) -> BTreeSet<ProfileKey> {
        self.changes
            .values()
            .map(|change| change.profile.clone())
            .collect()
    }

    /// True when some pending change of `profile` touches a secure flag.
    pub fn has_pending_secure_changes(&self, profile: &ProfileKey) -> bool {
        self.changes
            .values()
            .any(|change| &change.profile == profile && change.secure.is_some())
    }

    /// Move everything recorded for `old` (and its descendants) under `new`.
    pub fn rebase_profile(&mut self, old: &ProfileKey, new: &ProfileKey) {
        let rebase_path = |path: ConfigPath| path.rebase_profile(old, new).unwrap_or(path);

        self.changes = std::mem::take(&mut self.changes)
            .into_iter()
            .map(|(path, mut change)| {
                if let Some(owner) = change.profile.rebase(old, new) {
                    change.profile = owner;
                }
                (rebase_path(path), change)
            })
            .collect();

        for pending in self.defaults.values_mut() {
            if let Some(moved) = pending.profile().and_then(|key| key.rebase(old, new)) {
                pending.value = moved.to_string();
            }
        }

        self.deletions = std::mem::take(&mut self.deletions)
            .into_iter()
            .map(rebase_path)
            .collect();
        self.hidden_secure = std::mem::take(&mut self.hidden_secure)
            .into_iter()
            .map(rebase_path)
            .collect();

        tracing::debug!(%old, %new, "Rebased pending edits");
    }

    /// Drop every pending change belonging to `profile` or its descendants.
    pub fn purge_profile(&mut self, profile: &ProfileKey) {
        let profile_path = ConfigPath::for_profile(profile);
        let before = self.changes.len();
        self.changes.retain(|path, change| {
            !change.profile.starts_with(profile) && !path.starts_with(&profile_path)
        });
        self.deletions
            .retain(|path| path == &profile_path || !path.starts_with(&profile_path));
        self.hidden_secure
            .retain(|path| !path.starts_with(&profile_path));
        tracing::debug!(
            %profile,
            removed = before - self.changes.len(),
            "Purged pending edits of profile"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn key(s: &str) -> ProfileKey {
        ProfileKey::parse(s).unwrap()
    }

    fn prop(profile: &str, name: &str) -> ConfigPath {
        ConfigPath::for_property(&key(profile), name)
    }

    #[test]
    fn test_set_stores_relative_path() {
        let mut overlay = PendingOverlay::new();
        overlay.set_value(prop("a.b", "host"), json!("h"), key("a.b"), None);

        let change = overlay.change(&prop("a.b", "host")).unwrap();
        assert_eq!(change.path, vec!["properties", "host"]);
        assert_eq!(change.profile, key("a.b"));
    }

    #[test]
    fn test_set_after_delete_wins() {
        let mut overlay = PendingOverlay::new();
        let path = prop("a", "host");
        overlay.set_value(path.clone(), json!("v1"), key("a"), None);
        overlay.delete_value(path.clone(), false);
        assert!(overlay.change(&path).is_none());
        assert!(overlay.is_deleted(&path));

        overlay.set_value(path.clone(), json!("v2"), key("a"), None);
        assert!(!overlay.is_deleted(&path));
        assert_eq!(overlay.change(&path).unwrap().value, json!("v2"));
    }

    #[test]
    fn test_deleted_profile_deletes_subtree() {
        let mut overlay = PendingOverlay::new();
        overlay.delete_value(ConfigPath::for_profile(&key("a")), false);

        assert!(overlay.is_deleted(&prop("a.b", "host")));
        assert!(overlay.is_deleted(&ConfigPath::for_type(&key("a"))));
        assert!(!overlay.is_deleted(&prop("ab", "host")));
    }

    #[test]
    fn test_secure_array_merges_pending_flags() {
        let mut overlay = PendingOverlay::new();
        overlay.set_value(prop("a", "user"), json!("u"), key("a"), Some(true));
        overlay.set_value(prop("a", "password"), json!("p"), key("a"), Some(false));
        overlay.set_value(prop("a", "host"), json!("h"), key("a"), None);
        overlay.delete_value(prop("a", "token"), true);

        let base = vec![
            "token".to_string(),
            "password".to_string(),
            "account".to_string(),
        ];
        let secure = overlay.secure_array(&base, &[ConfigPath::for_profile(&key("a"))]);
        assert_eq!(secure, vec!["account", "user"]);
    }

    #[test]
    fn test_changes_under_stops_at_siblings() {
        let mut overlay = PendingOverlay::new();
        overlay.set_value(prop("a", "x"), json!(1), key("a"), None);
        overlay.set_value(prop("a.b", "y"), json!(2), key("a.b"), None);
        overlay.set_value(prop("ab", "z"), json!(3), key("ab"), None);

        let prefix = ConfigPath::for_profile(&key("a"));
        let found: Vec<String> = overlay
            .changes_under(&prefix)
            .map(|(path, _)| path.to_string())
            .collect();
        assert_eq!(
            found,
            vec!["profiles.a.profiles.b.properties.y", "profiles.a.properties.x"]
        );
    }

    #[test]
    fn test_rebase_profile_moves_everything() {
        let mut overlay = PendingOverlay::new();
        overlay.set_value(prop("a.c", "host"), json!("h"), key("a.c"), None);
        overlay.delete_value(prop("a", "port"), false);
        overlay.set_default("zosmf", "a.c");
        overlay.set_default("ssh", "other");

        overlay.rebase_profile(&key("a"), &key("b"));

        let change = overlay.change(&prop("b.c", "host")).unwrap();
        assert_eq!(change.profile, key("b.c"));
        assert_eq!(change.path, vec!["properties", "host"]);
        assert!(overlay.is_deleted(&prop("b", "port")));
        assert_eq!(overlay.pending_default("zosmf").unwrap().value, "b.c");
        assert_eq!(overlay.pending_default("ssh").unwrap().value, "other");
    }

    #[test]
    fn test_purge_profile_keeps_own_tombstone() {
        let mut overlay = PendingOverlay::new();
        overlay.set_value(prop("a", "x"), json!(1), key("a"), None);
        overlay.set_value(prop("a.b", "y"), json!(2), key("a.b"), Some(true));
        overlay.set_value(prop("c", "z"), json!(3), key("c"), None);
        overlay.delete_value(prop("a", "w"), false);
        overlay.delete_value(ConfigPath::for_profile(&key("a")), false);

        overlay.purge_profile(&key("a"));

        assert_eq!(overlay.extract_pending_profiles(), BTreeSet::from([key("c")]));
        assert_eq!(
            overlay.deletions().cloned().collect::<Vec<_>>(),
            vec![ConfigPath::for_profile(&key("a"))]
        );
    }

    #[test]
    fn test_placeholder_does_not_overwrite() {
        let mut overlay = PendingOverlay::new();
        overlay.add_placeholder(&key("a"));
        overlay.add_placeholder(&key("a"));
        let placeholder = overlay.change(&ConfigPath::for_profile(&key("a"))).unwrap();
        assert!(placeholder.is_placeholder());
        assert!(!overlay.has_pending_secure_changes(&key("a")));
    }
}
