//! Pending profile renames for one layer
//!
//! [`RenameGraph`] maps original (persisted) profile keys to their current
//! keys. Every command leaves the graph normalized:
//!
//! - targets are always fully current: renaming a profile rebases every
//!   other target nested below it
//! - no chains: `x -> y` plus `y -> z` collapses to `x -> z`
//! - no closed loops: `a -> b -> a` is purged
//! - no redundant entries: an entry whose target is what its renamed
//!   ancestor would produce anyway is dropped
//!
//! Renames are limited per persisted profile: a profile renamed once may
//! only move back to where it came from until the session is committed.

mod resolve;

use crate::error::Rejection;
use resolve::RenameMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use teamcfg_model::ProfileKey;

/// Result of a successful rename request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RenameChange {
    /// The profile already has the requested name
    Unchanged { key: ProfileKey },
    /// The profile moved back to where its persisted name puts it
    Restored { from: ProfileKey, to: ProfileKey },
    /// A new name was recorded
    Renamed { from: ProfileKey, to: ProfileKey },
}

impl RenameChange {
    /// The name the profile had before the request and the name it has now.
    pub fn keys(&self) -> (&ProfileKey, &ProfileKey) {
        match self {
            Self::Unchanged { key } => (key, key),
            Self::Restored { from, to } | Self::Renamed { from, to } => (from, to),
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged { .. })
    }
}

/// Original-to-current profile key map for one layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameGraph {
    entries: RenameMap,
    counts: BTreeMap<ProfileKey, u32>,
}

impl RenameGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from raw entries, normalizing chains and loops.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (ProfileKey, ProfileKey)>,
    {
        let mut graph = Self {
            entries: entries.into_iter().collect(),
            counts: BTreeMap::new(),
        };
        graph.normalize();
        graph
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in original key order.
    pub fn entries(&self) -> impl Iterator<Item = (&ProfileKey, &ProfileKey)> {
        self.entries.iter()
    }

    /// Current name recorded for an original key, if it has an entry.
    pub fn target_of(&self, original: &ProfileKey) -> Option<&ProfileKey> {
        self.entries.get(original)
    }

    /// Current effective name of `key`, which may be stale or already current.
    pub fn resolve_forward(&self, key: &ProfileKey) -> ProfileKey {
        resolve::forward(&self.entries, key, None)
    }

    /// Persisted name that `key` originated from.
    pub fn resolve_backward(&self, key: &ProfileKey) -> ProfileKey {
        resolve::backward(&self.entries, key)
    }

    /// True when a pending rename moves a profile away from or onto `key`.
    pub fn has_pending_rename(&self, key: &ProfileKey) -> bool {
        self.entries.contains_key(key) || self.entries.values().any(|target| target == key)
    }

    /// True when a rename target equals `key` or lies below it.
    pub fn occupies(&self, key: &ProfileKey) -> bool {
        self.entries.values().any(|target| target.starts_with(key))
    }

    /// True when forward resolution would move `key` elsewhere, i.e. the name
    /// (or an ancestor) was vacated by a pending rename.
    pub fn is_reserved(&self, key: &ProfileKey) -> bool {
        &self.resolve_forward(key) != key
    }

    /// How often the profile persisted as `key` was renamed this session.
    pub fn rename_count(&self, key: &ProfileKey) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Forget rename counts, e.g. after the session was committed.
    pub fn reset_counts(&mut self) {
        self.counts.clear();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.counts.clear();
    }

    /// Record that the profile currently known as `original` is now called
    /// `current`.
    ///
    /// `original` may be a stale name; it is resolved forward first. Moving a
    /// profile back to where its persisted name puts it removes the entry and
    /// is never limited. Drag-and-drop moves skip the limit and do not count.
    ///
    /// # Errors
    ///
    /// A [`Rejection`] leaves the graph untouched:
    /// - [`Rejection::RenameLimitExceeded`] when the profile was already
    ///   renamed `limit` times
    /// - [`Rejection::CircularRename`] when `current` is nested below the
    ///   profile itself
    /// - [`Rejection::NameReserved`] when `current` is the pending old name of
    ///   another renamed profile
    pub fn apply(
        &mut self,
        original: &ProfileKey,
        current: &ProfileKey,
        drag_drop: bool,
        limit: u32,
    ) -> Result<RenameChange, Rejection> {
        let source = self.resolve_forward(original);
        if &source == current {
            tracing::debug!(key = %source, "Rename to the same name; nothing to do");
            return Ok(RenameChange::Unchanged { key: source });
        }

        let origin = self.resolve_backward(&source);
        let natural = resolve::forward(&self.entries, &origin, Some(&origin));
        if &natural == current && self.entries.contains_key(&origin) {
            self.entries.remove(&origin);
            self.rebase_targets(&source, current);
            if let Some(count) = self.counts.get_mut(&origin) {
                *count = count.saturating_sub(1);
            }
            self.normalize();
            tracing::debug!(from = %source, to = %current, %origin, "Rename cancelled");
            return Ok(RenameChange::Restored {
                from: source,
                to: current.clone(),
            });
        }

        if !drag_drop && self.rename_count(&origin) >= limit {
            return Err(Rejection::RenameLimitExceeded { key: source, limit });
        }
        if source.is_ancestor_of(current) {
            return Err(Rejection::CircularRename {
                from: source,
                to: current.clone(),
            });
        }
        if self.is_reserved(current) {
            return Err(Rejection::NameReserved {
                name: current.clone(),
            });
        }

        self.entries.insert(origin.clone(), current.clone());
        self.rebase_targets(&source, current);
        if !drag_drop {
            *self.counts.entry(origin.clone()).or_default() += 1;
        }
        self.normalize();

        tracing::debug!(from = %source, to = %current, %origin, "Rename recorded");
        Ok(RenameChange::Renamed {
            from: source,
            to: current.clone(),
        })
    }

    /// Entries forming closed loops. Always empty after a command; exposed for
    /// graphs under inspection.
    pub fn closed_loops(&self) -> Vec<Vec<ProfileKey>> {
        resolve::closed_loops(&self.entries)
    }

    /// Move every target nested below `old` under `new`.
    fn rebase_targets(&mut self, old: &ProfileKey, new: &ProfileKey) {
        for target in self.entries.values_mut() {
            if old.is_ancestor_of(target)
                && let Some(moved) = target.rebase(old, new)
            {
                *target = moved;
            }
        }
    }

    /// Purge loops, collapse chains, drop redundant entries.
    fn normalize(&mut self) {
        self.purge_loops();
        self.collapse_chains();
        self.purge_loops();
        self.prune_redundant();
    }

    fn purge_loops(&mut self) {
        for members in resolve::closed_loops(&self.entries) {
            tracing::warn!(
                members = ?members.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "Purging closed rename loop"
            );
            for key in members {
                self.entries.remove(&key);
            }
        }
    }

    fn collapse_chains(&mut self) {
        loop {
            let link = self.entries.iter().find_map(|(original, target)| {
                (target != original && self.entries.contains_key(target))
                    .then(|| (original.clone(), target.clone()))
            });
            let Some((original, middle)) = link else {
                break;
            };
            let Some(end) = self.entries.remove(&middle) else {
                break;
            };
            tracing::trace!(%original, %middle, %end, "Collapsing rename chain");
            self.entries.insert(original, end);
        }
    }

    fn prune_redundant(&mut self) {
        loop {
            let redundant = self.entries.iter().find_map(|(original, target)| {
                (&resolve::forward(&self.entries, original, Some(original)) == target)
                    .then(|| original.clone())
            });
            match redundant {
                Some(original) => {
                    tracing::trace!(%original, "Dropping redundant rename entry");
                    self.entries.remove(&original);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(s: &str) -> ProfileKey {
        ProfileKey::parse(s).unwrap()
    }

    fn entries(graph: &RenameGraph) -> Vec<(String, String)> {
        graph
            .entries()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    fn pair(a: &str, b: &str) -> (String, String) {
        (a.to_string(), b.to_string())
    }

    #[test]
    fn test_simple_rename_resolves_both_ways() {
        let mut graph = RenameGraph::new();
        let change = graph.apply(&key("base"), &key("renamed"), false, 1).unwrap();

        assert_eq!(change.keys(), (&key("base"), &key("renamed")));
        assert_eq!(graph.resolve_forward(&key("base")), key("renamed"));
        assert_eq!(graph.resolve_backward(&key("renamed")), key("base"));
        assert_eq!(graph.resolve_forward(&key("base.child")), key("renamed.child"));
    }

    #[test]
    fn test_same_name_is_unchanged() {
        let mut graph = RenameGraph::new();
        let change = graph.apply(&key("a"), &key("a"), false, 0).unwrap();
        assert!(!change.is_change());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_cancellation_through_stale_key() {
        let mut graph = RenameGraph::new();
        graph.apply(&key("a"), &key("b"), false, 1).unwrap();
        let change = graph.apply(&key("a"), &key("a"), false, 1).unwrap();

        assert_eq!(
            change,
            RenameChange::Restored {
                from: key("b"),
                to: key("a")
            }
        );
        assert!(graph.is_empty());
    }

    #[test]
    fn test_chain_consolidates_to_single_entry() {
        let mut graph = RenameGraph::new();
        graph.apply(&key("a"), &key("b"), false, 2).unwrap();
        graph.apply(&key("b"), &key("c"), false, 2).unwrap();
        assert_eq!(entries(&graph), vec![pair("a", "c")]);
    }

    #[test]
    fn test_limit_counts_per_persisted_profile() {
        let mut graph = RenameGraph::new();
        graph.apply(&key("a"), &key("b"), false, 1).unwrap();
        graph.apply(&key("b"), &key("a"), false, 1).unwrap();
        assert_eq!(graph.rename_count(&key("a")), 0);

        graph.apply(&key("a"), &key("c"), false, 1).unwrap();
        assert_eq!(graph.rename_count(&key("a")), 1);
        let err = graph.apply(&key("c"), &key("d"), false, 1).unwrap_err();
        assert!(matches!(err, Rejection::RenameLimitExceeded { .. }));
        assert_eq!(graph.rename_count(&key("c")), 0);
    }

    #[test]
    fn test_limit_rejects_without_changes() {
        let mut graph = RenameGraph::from_entries([(key("p"), key("q"))]);
        graph.counts.insert(key("p"), 1);
        let before = graph.clone();

        let err = graph.apply(&key("q"), &key("r"), false, 1).unwrap_err();
        assert_eq!(
            err,
            Rejection::RenameLimitExceeded {
                key: key("q"),
                limit: 1
            }
        );
        assert_eq!(graph, before);
    }

    #[test]
    fn test_drag_drop_skips_limit() {
        let mut graph = RenameGraph::new();
        graph.apply(&key("a"), &key("b"), false, 0).unwrap_err();
        graph.apply(&key("a"), &key("group.a"), true, 0).unwrap();
        assert_eq!(graph.resolve_forward(&key("a")), key("group.a"));
        assert_eq!(graph.rename_count(&key("a")), 0);
    }

    #[test]
    fn test_rename_below_itself_is_circular() {
        let mut graph = RenameGraph::new();
        let err = graph.apply(&key("a"), &key("a.b"), false, 1).unwrap_err();
        assert!(matches!(err, Rejection::CircularRename { .. }));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_vacated_name_is_reserved() {
        let mut graph = RenameGraph::new();
        graph.apply(&key("a"), &key("b"), false, 1).unwrap();

        let err = graph.apply(&key("c"), &key("a"), false, 1).unwrap_err();
        assert_eq!(err, Rejection::NameReserved { name: key("a") });
        let err = graph.apply(&key("c"), &key("a.x"), false, 1).unwrap_err();
        assert_eq!(err, Rejection::NameReserved { name: key("a.x") });
    }

    #[test]
    fn test_parent_rename_rebases_child_targets() {
        let mut graph = RenameGraph::new();
        graph.apply(&key("a.c"), &key("a.d"), false, 1).unwrap();
        graph.apply(&key("a"), &key("b"), false, 1).unwrap();

        assert_eq!(entries(&graph), vec![pair("a", "b"), pair("a.c", "b.d")]);
        assert_eq!(graph.resolve_forward(&key("a.c")), key("b.d"));
        assert_eq!(graph.resolve_backward(&key("b.d")), key("a.c"));
    }

    #[test]
    fn test_moving_child_back_under_renamed_parent_prunes_entry() {
        let mut graph = RenameGraph::new();
        graph.apply(&key("a"), &key("b"), false, 1).unwrap();
        graph.apply(&key("b.c"), &key("x"), false, 1).unwrap();
        assert_eq!(entries(&graph), vec![pair("a", "b"), pair("a.c", "x")]);

        let change = graph.apply(&key("x"), &key("b.c"), false, 1).unwrap();
        assert!(matches!(change, RenameChange::Restored { .. }));
        assert_eq!(entries(&graph), vec![pair("a", "b")]);
    }

    #[test]
    fn test_from_entries_collapses_and_purges() {
        let graph = RenameGraph::from_entries([
            (key("a"), key("b")),
            (key("b"), key("c")),
            (key("x"), key("y")),
            (key("y"), key("x")),
        ]);
        assert_eq!(entries(&graph), vec![pair("a", "c")]);
        assert!(graph.closed_loops().is_empty());
    }

    #[test]
    fn test_occupies_and_pending_rename() {
        let mut graph = RenameGraph::new();
        graph.apply(&key("a"), &key("b.c"), false, 1).unwrap();

        assert!(graph.occupies(&key("b")));
        assert!(!graph.occupies(&key("b.c.d")));
        assert!(!graph.occupies(&key("bc")));
        assert!(graph.has_pending_rename(&key("a")));
        assert!(graph.has_pending_rename(&key("b.c")));
        assert!(!graph.has_pending_rename(&key("b")));
        assert!(graph.is_reserved(&key("a.z")));
    }

    #[test]
    fn test_reset_counts_keeps_entries() {
        let mut graph = RenameGraph::new();
        graph.apply(&key("a"), &key("b"), false, 1).unwrap();
        graph.reset_counts();
        assert_eq!(graph.rename_count(&key("a")), 0);
        assert_eq!(graph.len(), 1);
    }
}
