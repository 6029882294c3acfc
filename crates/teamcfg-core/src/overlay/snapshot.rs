//! Commit hand-off format
//!
//! An [`OverlaySnapshot`] is everything a persistence layer needs to write a
//! session back: apply `renames` first (parents before children), then
//! `deletions`, then `pending_changes` and `pending_defaults`. All paths
//! are in post-rename form.

use super::{PendingChange, PendingDefault, PendingOverlay};
use crate::rename::RenameGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use teamcfg_model::{ConfigPath, LayerId, ProfileKey};

/// One pending rename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRecord {
    pub original: ProfileKey,
    pub current: ProfileKey,
}

/// Serialized form of one layer's uncommitted edits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySnapshot {
    pub layer: LayerId,
    pub pending_changes: BTreeMap<ConfigPath, PendingChange>,
    pub pending_defaults: BTreeMap<String, PendingDefault>,
    pub deletions: Vec<ConfigPath>,
    pub renames: Vec<RenameRecord>,
}

impl OverlaySnapshot {
    pub fn capture(layer: &LayerId, renames: &RenameGraph, overlay: &PendingOverlay) -> Self {
        let mut records: Vec<RenameRecord> = renames
            .entries()
            .map(|(original, current)| RenameRecord {
                original: original.clone(),
                current: current.clone(),
            })
            .collect();
        records.sort_by(|a, b| {
            a.original
                .depth()
                .cmp(&b.original.depth())
                .then_with(|| a.original.cmp(&b.original))
        });

        Self {
            layer: layer.clone(),
            pending_changes: overlay
                .changes()
                .map(|(path, change)| (path.clone(), change.clone()))
                .collect(),
            pending_defaults: overlay
                .defaults()
                .map(|(kind, pending)| (kind.clone(), pending.clone()))
                .collect(),
            deletions: overlay.deletions().cloned().collect(),
            renames: records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending_changes.is_empty()
            && self.pending_defaults.is_empty()
            && self.deletions.is_empty()
            && self.renames.is_empty()
    }
}
