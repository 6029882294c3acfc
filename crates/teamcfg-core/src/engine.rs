//! Engine facade
//!
//! [`Engine`] owns the immutable layers, their schemas, and one
//! [`LayerSession`] (rename graph plus pending overlay) per layer. Commands
//! mutate sessions; queries read through [`LayerView`] and
//! [`InheritanceResolver`] and never fail.

use crate::error::{Error, Rejection, Result};
use crate::inherit::{InheritanceResolver, MergeMode, MergedProperty, ResolverLayer};
use crate::materialize::{LayerView, ProfileView};
use crate::overlay::{OverlaySnapshot, PendingOverlay};
use crate::rename::{RenameChange, RenameGraph};
use crate::settings::EngineSettings;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use teamcfg_model::path::TYPE_SEGMENT;
use teamcfg_model::{ConfigPath, ConfigurationLayer, LayerId, LayerSchema, ProfileKey};

/// Uncommitted state of one layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerSession {
    pub renames: RenameGraph,
    pub overlay: PendingOverlay,
}

impl LayerSession {
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty() && self.overlay.is_empty()
    }

    fn reset(&mut self) {
        self.renames.clear();
        self.overlay.clear();
    }
}

/// Layered configuration resolution engine
#[derive(Debug, Clone, Default)]
pub struct Engine {
    /// Sorted by search order, highest precedence first
    layers: Vec<ConfigurationLayer>,
    schemas: BTreeMap<LayerId, LayerSchema>,
    sessions: BTreeMap<LayerId, LayerSession>,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // ========================================================================
    // Layers and schemas
    // ========================================================================

    /// Add a layer, replacing any layer with the same id and its session.
    pub fn add_layer(&mut self, layer: ConfigurationLayer) {
        tracing::debug!(layer = %layer.id, scope = %layer.scope, "Adding layer");
        self.layers.retain(|existing| existing.id != layer.id);
        self.sessions.insert(layer.id.clone(), LayerSession::default());
        self.layers.push(layer);
        self.sort_layers();
    }

    fn sort_layers(&mut self) {
        let order = &self.settings.layers.order;
        self.layers.sort_by_key(|layer| {
            let position = order
                .iter()
                .position(|id| id == layer.id.as_str())
                .unwrap_or(usize::MAX);
            (position, layer.scope.precedence(), layer.id.clone())
        });
    }

    pub fn set_schema(&mut self, id: &LayerId, schema: LayerSchema) -> Result<()> {
        if self.layer(id).is_none() {
            return Err(Error::unknown_layer(id));
        }
        self.schemas.insert(id.clone(), schema);
        Ok(())
    }

    pub fn layer(&self, id: &LayerId) -> Option<&ConfigurationLayer> {
        self.layers.iter().find(|layer| &layer.id == id)
    }

    /// Layers in search order.
    pub fn layers(&self) -> &[ConfigurationLayer] {
        &self.layers
    }

    /// `None` means the schema is unavailable; filtering then knows no
    /// properties.
    pub fn schema_for(&self, id: &LayerId) -> Option<&LayerSchema> {
        self.schemas.get(id)
    }

    pub fn renames(&self, id: &LayerId) -> Option<&RenameGraph> {
        self.sessions.get(id).map(|session| &session.renames)
    }

    pub fn overlay(&self, id: &LayerId) -> Option<&PendingOverlay> {
        self.sessions.get(id).map(|session| &session.overlay)
    }

    pub fn session(&self, id: &LayerId) -> Option<&LayerSession> {
        self.sessions.get(id)
    }

    fn view(&self, id: &LayerId) -> Option<LayerView<'_>> {
        let layer = self.layer(id)?;
        let session = self.sessions.get(id)?;
        Some(LayerView::new(layer, &session.renames, &session.overlay))
    }

    fn require_view(&self, id: &LayerId) -> Result<LayerView<'_>> {
        self.view(id).ok_or_else(|| Error::unknown_layer(id))
    }

    fn session_mut(&mut self, id: &LayerId) -> Result<&mut LayerSession> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| Error::unknown_layer(id))
    }

    fn resolver(&self) -> InheritanceResolver<'_> {
        let layers = self
            .layers
            .iter()
            .filter_map(|layer| {
                let session = self.sessions.get(&layer.id)?;
                Some(ResolverLayer {
                    view: LayerView::new(layer, &session.renames, &session.overlay),
                    schema: self.schemas.get(&layer.id),
                })
            })
            .collect();
        InheritanceResolver::new(layers, self.settings.max_inheritance_depth)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn materialize_profile(&self, key: &ProfileKey, id: &LayerId) -> ProfileView {
        self.view(id)
            .map(|view| view.materialize(key))
            .unwrap_or_default()
    }

    /// Merged properties of a profile, searching every layer for the default.
    pub fn resolve_merged_properties(
        &self,
        key: &ProfileKey,
        id: &LayerId,
        mode: MergeMode,
    ) -> BTreeMap<String, MergedProperty> {
        self.resolver().resolve(key, id, mode, None)
    }

    /// Merged properties with the default-profile search limited to
    /// `source_layer`.
    pub fn resolve_merged_properties_from(
        &self,
        key: &ProfileKey,
        id: &LayerId,
        mode: MergeMode,
        source_layer: &LayerId,
    ) -> BTreeMap<String, MergedProperty> {
        self.resolver().resolve(key, id, mode, Some(source_layer))
    }

    pub fn is_profile_default(&self, key: &ProfileKey, id: &LayerId) -> bool {
        self.view(id)
            .is_some_and(|view| view.is_profile_default(key))
    }

    pub fn is_profile_untyped(&self, key: &ProfileKey, id: &LayerId) -> bool {
        self.materialize_profile(key, id).is_untyped()
    }

    pub fn profile_keys(&self, id: &LayerId) -> Vec<ProfileKey> {
        self.view(id)
            .map(|view| view.profile_keys().into_iter().collect())
            .unwrap_or_default()
    }

    pub fn profile_exists(&self, key: &ProfileKey, id: &LayerId) -> bool {
        self.view(id).is_some_and(|view| view.profile_exists(key))
    }

    pub fn effective_default(&self, kind: &str, id: &LayerId) -> Option<ProfileKey> {
        self.view(id)?.effective_default(kind)
    }

    pub fn profiles_of_type(&self, kind: &str, id: &LayerId) -> Vec<ProfileKey> {
        self.view(id)
            .map(|view| view.profiles_of_type(kind))
            .unwrap_or_default()
    }

    /// Profiles referenced by pending changes of a layer.
    pub fn extract_pending_profiles(&self, id: &LayerId) -> BTreeSet<ProfileKey> {
        self.overlay(id)
            .map(PendingOverlay::extract_pending_profiles)
            .unwrap_or_default()
    }

    /// Check whether a new profile called `name` (below `parent`) could be
    /// created, returning its full key.
    pub fn validate_profile_name(
        &self,
        name: &str,
        parent: Option<&ProfileKey>,
        id: &LayerId,
    ) -> Result<ProfileKey> {
        let view = self.require_view(id)?;
        let full = match parent {
            Some(parent) => format!("{parent}.{name}"),
            None => name.to_string(),
        };
        let key = ProfileKey::parse(&full).map_err(|e| Rejection::InvalidName {
            name: name.to_string(),
            reason: match e {
                teamcfg_model::Error::InvalidProfileKey { reason, .. } => reason,
                other => other.to_string(),
            },
        })?;

        if view.profile_exists(&key) || view.renames.occupies(&key) {
            return Err(Rejection::NameTaken {
                name: key.to_string(),
            }
            .into());
        }
        if view.renames.is_reserved(&key) {
            return Err(Rejection::NameReserved { name: key }.into());
        }
        if view.is_profile_deleted(&key) {
            return Err(Rejection::NameDeleted { name: key }.into());
        }
        Ok(key)
    }

    /// Commit format of a layer's session.
    pub fn serialize_overlay(&self, id: &LayerId) -> Option<OverlaySnapshot> {
        let session = self.sessions.get(id)?;
        Some(OverlaySnapshot::capture(
            id,
            &session.renames,
            &session.overlay,
        ))
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Rename the profile currently known as `original` to `current`.
    ///
    /// On success the overlay follows the profile: pending edits are
    /// rebased, persisted defaults that pointed at it get pending defaults,
    /// missing parents of the new name are created, and defaults are
    /// reconciled if the rename changed the profile's type.
    pub fn rename(
        &mut self,
        original: &ProfileKey,
        current: &ProfileKey,
        id: &LayerId,
        drag_drop: bool,
    ) -> Result<RenameChange> {
        let limit = self.settings.max_renames_per_profile;
        let view = self.require_view(id)?;
        let source = view.renames.resolve_forward(original);

        if !view.profile_exists(&source) {
            return Err(Self::reject(Rejection::InvalidName {
                name: source.to_string(),
                reason: "no such profile".to_string(),
            }));
        }
        if &source != current && view.profile_exists(current) {
            return Err(Self::reject(Rejection::NameTaken {
                name: current.to_string(),
            }));
        }
        if view.is_profile_deleted(current) {
            return Err(Self::reject(Rejection::NameDeleted {
                name: current.clone(),
            }));
        }
        let old_type = view.effective_type(&source);

        let session = self.session_mut(id)?;
        let change = match session.renames.apply(original, current, drag_drop, limit) {
            Ok(change) => change,
            Err(rejection) => return Err(Self::reject(rejection)),
        };
        if !change.is_change() {
            return Ok(change);
        }

        let (from, to) = change.keys();
        let (from, to) = (from.clone(), to.clone());
        session.overlay.rebase_profile(&from, &to);
        self.sync_persisted_defaults(id)?;
        self.create_missing_parents(&to, id)?;

        let new_type = self.require_view(id)?.effective_type(&to);
        if new_type != old_type {
            self.reconcile_type_change(&to, &old_type, &new_type, id)?;
        }

        tracing::debug!(layer = %id, %from, %to, "Renamed profile");
        Ok(change)
    }

    /// Record a value edit at a document path inside a profile.
    ///
    /// The owning profile may be named by a stale key. Editing `type`
    /// reconciles defaults for the old and new types.
    pub fn set_property(
        &mut self,
        path: &ConfigPath,
        value: Value,
        id: &LayerId,
        secure: Option<bool>,
    ) -> Result<()> {
        let view = self.require_view(id)?;
        let (owner, rest) = split_owner(path)?;
        let owner = view.renames.resolve_forward(&owner);
        let path = ConfigPath::for_profile(&owner).join(rest.iter().cloned());
        let is_type = matches!(rest.as_slice(), [segment] if segment == TYPE_SEGMENT);
        let old_type = view.effective_type(&owner);

        self.create_missing_parents(&owner, id)?;
        self.session_mut(id)?
            .overlay
            .set_value(path, value, owner.clone(), secure);

        if is_type {
            let new_type = self.require_view(id)?.effective_type(&owner);
            if new_type != old_type {
                self.reconcile_type_change(&owner, &old_type, &new_type, id)?;
            }
        }
        Ok(())
    }

    /// Toggle the secure flag of a property, keeping its current value.
    pub fn set_secure(&mut self, path: &ConfigPath, secure: bool, id: &LayerId) -> Result<()> {
        let view = self.require_view(id)?;
        let (owner, rest) = split_owner(path)?;
        let owner = view.renames.resolve_forward(&owner);
        let current_path = ConfigPath::for_profile(&owner).join(rest.iter().cloned());
        let pending = view
            .overlay
            .change(&current_path)
            .map(|change| change.value.clone());
        let value = match rest.as_slice() {
            [_, name] => pending.or_else(|| view.materialize(&owner).properties.get(name).cloned()),
            _ => pending,
        }
        .unwrap_or(Value::Null);
        self.set_property(path, value, id, Some(secure))
    }

    /// Delete a property (or any path inside a profile).
    pub fn delete_property(&mut self, path: &ConfigPath, id: &LayerId) -> Result<()> {
        let view = self.require_view(id)?;
        let (owner, rest) = split_owner(path)?;
        let owner = view.renames.resolve_forward(&owner);
        let secure = match rest.as_slice() {
            [_, name] => view.materialize(&owner).is_secure(name),
            _ => false,
        };
        let path = ConfigPath::for_profile(&owner).join(rest);

        self.session_mut(id)?.overlay.delete_value(path, secure);
        Ok(())
    }

    /// Change the default profile of a type; `""` clears it.
    pub fn set_default(&mut self, kind: &str, value: &str, id: &LayerId) -> Result<()> {
        let view = self.require_view(id)?;
        let value = if value.is_empty() {
            String::new()
        } else {
            let key = ProfileKey::parse(value)?;
            view.renames.resolve_forward(&key).to_string()
        };
        self.session_mut(id)?.overlay.set_default(kind, value);
        Ok(())
    }

    /// Delete a profile and everything below it.
    ///
    /// Pending edits owned by the profile are dropped; if it was the default
    /// for its type the default is cleared.
    pub fn delete_profile(&mut self, key: &ProfileKey, id: &LayerId) -> Result<()> {
        let view = self.require_view(id)?;
        let effective = view.renames.resolve_forward(key);
        let kind = view.effective_type(&effective);
        let was_default = !kind.is_empty() && view.effective_default(&kind).as_ref() == Some(&effective);

        let overlay = &mut self.session_mut(id)?.overlay;
        overlay.purge_profile(&effective);
        if key != &effective {
            overlay.purge_profile(key);
        }
        overlay.delete_value(ConfigPath::for_profile(&effective), false);
        if was_default {
            overlay.set_default(&kind, "");
        }

        tracing::debug!(layer = %id, profile = %effective, was_default, "Deleted profile");
        Ok(())
    }

    /// Hand off a layer's session and start a fresh one.
    pub fn commit(&mut self, id: &LayerId) -> Result<OverlaySnapshot> {
        let snapshot = self
            .serialize_overlay(id)
            .ok_or_else(|| Error::unknown_layer(id))?;
        self.session_mut(id)?.reset();
        tracing::debug!(layer = %id, empty = snapshot.is_empty(), "Committed session");
        Ok(snapshot)
    }

    /// Drop a layer's session without handing it off.
    pub fn discard(&mut self, id: &LayerId) -> Result<()> {
        self.session_mut(id)?.reset();
        tracing::debug!(layer = %id, "Discarded session");
        Ok(())
    }

    // ========================================================================
    // Rename and type-change side effects
    // ========================================================================

    fn reject(rejection: Rejection) -> Error {
        tracing::warn!(reason = %rejection, "Edit rejected");
        Error::Rejected(rejection)
    }

    /// Give every persisted default whose profile moved a pending default
    /// naming the new key, and drop pending defaults that now equal the
    /// persisted value.
    fn sync_persisted_defaults(&mut self, id: &LayerId) -> Result<()> {
        let view = self.require_view(id)?;
        let mut updates: Vec<(String, Option<String>)> = Vec::new();

        for (kind, raw) in &view.layer.defaults {
            if let Some(pending) = view.overlay.pending_default(kind) {
                if &pending.value == raw {
                    updates.push((kind.clone(), None));
                }
                continue;
            }
            let Ok(persisted) = ProfileKey::parse(raw) else {
                continue;
            };
            let resolved = view.renames.resolve_forward(&persisted);
            if resolved != persisted {
                updates.push((kind.clone(), Some(resolved.to_string())));
            }
        }

        let overlay = &mut self.session_mut(id)?.overlay;
        for (kind, value) in updates {
            match value {
                Some(value) => overlay.set_default(&kind, value),
                None => {
                    overlay.clear_default(&kind);
                }
            }
        }
        Ok(())
    }

    /// Add placeholders for ancestors of `key` that do not exist.
    fn create_missing_parents(&mut self, key: &ProfileKey, id: &LayerId) -> Result<()> {
        let view = self.require_view(id)?;
        let missing: Vec<ProfileKey> = key
            .ancestors()
            .into_iter()
            .filter(|ancestor| !view.profile_exists(ancestor))
            .collect();

        let overlay = &mut self.session_mut(id)?.overlay;
        for ancestor in &missing {
            tracing::debug!(profile = %ancestor, "Creating virtual parent profile");
            overlay.add_placeholder(ancestor);
        }
        Ok(())
    }

    /// Keep "is default" consistent when a profile's type changes: it stops
    /// being the default of its old type, and becomes the default of its new
    /// type if that type has none.
    fn reconcile_type_change(
        &mut self,
        key: &ProfileKey,
        old_type: &str,
        new_type: &str,
        id: &LayerId,
    ) -> Result<()> {
        let view = self.require_view(id)?;
        let clear_old =
            !old_type.is_empty() && view.effective_default(old_type).as_ref() == Some(key);
        let schema_allows_default = self
            .schema_for(id)
            .is_none_or(|schema| schema.is_valid_default_type(new_type));
        let adopt_new = !new_type.is_empty()
            && schema_allows_default
            && view.effective_default(new_type).is_none();

        let overlay = &mut self.session_mut(id)?.overlay;
        if clear_old {
            overlay.set_default(old_type, "");
        }
        if adopt_new {
            overlay.set_default(new_type, key.to_string());
        }
        tracing::debug!(%key, old_type, new_type, clear_old, adopt_new, "Reconciled defaults after type change");
        Ok(())
    }
}

fn split_owner(path: &ConfigPath) -> Result<(ProfileKey, Vec<String>)> {
    path.split_profile().ok_or_else(|| {
        teamcfg_model::Error::NotAProfilePath {
            path: path.to_string(),
        }
        .into()
    })
}
