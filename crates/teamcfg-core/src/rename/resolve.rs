//! Traversals over a rename map
//!
//! The map is a directed graph from original keys to current keys. Edges
//! apply to a key either exactly or through its longest renamed ancestor
//! (`a.b` follows `a -> x` to `x.b`). Every traversal tracks the edges it
//! has already taken, so stale or self-referential entries cannot make it
//! loop.

use std::collections::{BTreeMap, BTreeSet};
use teamcfg_model::ProfileKey;

pub(crate) type RenameMap = BTreeMap<ProfileKey, ProfileKey>;

/// Follow edges from `key` until none applies.
///
/// `skip` excludes one entry, which lets callers ask where a key would end
/// up without that entry.
pub(crate) fn forward(map: &RenameMap, key: &ProfileKey, skip: Option<&ProfileKey>) -> ProfileKey {
    let mut current = key.clone();
    let mut taken: BTreeSet<&ProfileKey> = BTreeSet::new();

    loop {
        let usable = |original: &ProfileKey| Some(original) != skip && !taken.contains(original);

        if let Some((original, target)) = map.get_key_value(&current)
            && usable(original)
        {
            tracing::trace!(from = %current, to = %target, "Forward exact");
            taken.insert(original);
            current = target.clone();
            continue;
        }

        let ancestor = current
            .ancestors()
            .into_iter()
            .rev()
            .find_map(|candidate| map.get_key_value(&candidate).filter(|&(o, _)| usable(o)));

        match ancestor {
            Some((original, target)) => {
                let Some(next) = current.rebase(original, target) else {
                    break;
                };
                tracing::trace!(from = %current, to = %next, "Forward through ancestor");
                taken.insert(original);
                current = next;
            }
            None => break,
        }
    }

    current
}

/// Walk edges in reverse from `key` back towards its original name.
///
/// An entry whose target equals `key` wins over one whose target is an
/// ancestor of `key`; among ancestors the deepest target wins.
pub(crate) fn backward(map: &RenameMap, key: &ProfileKey) -> ProfileKey {
    let mut current = key.clone();
    let mut taken: BTreeSet<&ProfileKey> = BTreeSet::new();

    loop {
        let exact = map
            .iter()
            .find(|(original, target)| **target == current && !taken.contains(original));
        if let Some((original, _)) = exact {
            tracing::trace!(from = %current, to = %original, "Backward exact");
            taken.insert(original);
            current = original.clone();
            continue;
        }

        let ancestor = map
            .iter()
            .filter(|(original, target)| target.is_ancestor_of(&current) && !taken.contains(original))
            .max_by_key(|(_, target)| target.depth());

        match ancestor {
            Some((original, target)) => {
                let Some(next) = current.rebase(target, original) else {
                    break;
                };
                tracing::trace!(from = %current, to = %next, "Backward through ancestor");
                taken.insert(original);
                current = next;
            }
            None => break,
        }
    }

    current
}

/// Every set of entries that maps back onto itself (`a -> b -> a`),
/// including single self-maps. Each loop is listed once, starting from its
/// smallest key.
pub(crate) fn closed_loops(map: &RenameMap) -> Vec<Vec<ProfileKey>> {
    let mut loops = Vec::new();

    for start in map.keys() {
        let mut path = vec![start.clone()];
        let mut next = map.get(start);

        while let Some(node) = next {
            if node == start {
                if path.iter().all(|member| member >= start) {
                    loops.push(path);
                }
                break;
            }
            if path.contains(node) {
                // Runs into a loop that does not include `start`.
                break;
            }
            path.push(node.clone());
            next = map.get(node);
        }
    }

    loops
}
