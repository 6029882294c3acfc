//! Merged (inherited) properties
//!
//! A typed profile inherits every property it does not set itself from the
//! default profile of its type. The default may live in any layer; layers
//! are searched in precedence order. Profiles are identified by
//! `(layer id, original key)`, so renames never make a profile look like
//! its own source and same-named profiles in different layers stay apart.

use crate::materialize::{LayerView, ProfileView};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use teamcfg_model::path::PROPERTIES_SEGMENT;
use teamcfg_model::{LayerId, LayerSchema, ProfileKey};

/// How merged properties are displayed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Merged properties are not shown at all
    Hide,
    /// Only properties the viewed profile's type declares
    #[default]
    Show,
    /// Every inherited property
    Unfiltered,
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hide => "hide",
            Self::Show => "show",
            Self::Unfiltered => "unfiltered",
        };
        f.write_str(name)
    }
}

impl FromStr for MergeMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "hide" => Ok(Self::Hide),
            "show" => Ok(Self::Show),
            "unfiltered" => Ok(Self::Unfiltered),
            other => Err(format!(
                "unknown merge mode '{other}' (expected hide, show, or unfiltered)"
            )),
        }
    }
}

/// An inherited property and where it comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedProperty {
    /// `null` for secure properties whose value is not known here
    pub value: Value,
    pub source_profile: ProfileKey,
    pub source_layer: LayerId,
    pub secure: bool,
}

/// One layer as seen by the resolver
#[derive(Debug, Clone, Copy)]
pub struct ResolverLayer<'a> {
    pub view: LayerView<'a>,
    pub schema: Option<&'a LayerSchema>,
}

impl ResolverLayer<'_> {
    fn id(&self) -> &LayerId {
        &self.view.layer.id
    }
}

/// Computes merged properties across layers
pub struct InheritanceResolver<'a> {
    /// Highest precedence first
    layers: Vec<ResolverLayer<'a>>,
    max_depth: usize,
}

struct Target<'v> {
    layer: ResolverLayer<'v>,
    key: &'v ProfileKey,
    kind: &'v str,
    view: &'v ProfileView,
    mode: MergeMode,
}

impl<'a> InheritanceResolver<'a> {
    pub fn new(layers: Vec<ResolverLayer<'a>>, max_depth: usize) -> Self {
        Self { layers, max_depth }
    }

    /// Merged properties of `key` in layer `layer_id`.
    ///
    /// `source_layer` restricts the default-profile search to one layer.
    pub fn resolve(
        &self,
        key: &ProfileKey,
        layer_id: &LayerId,
        mode: MergeMode,
        source_layer: Option<&LayerId>,
    ) -> BTreeMap<String, MergedProperty> {
        let mut merged = BTreeMap::new();
        if mode == MergeMode::Hide {
            return merged;
        }
        let Some(layer) = self.layers.iter().find(|l| l.id() == layer_id).copied() else {
            tracing::debug!(%layer_id, "Merged properties requested for unknown layer");
            return merged;
        };

        let view = layer.view.materialize(key);
        if view.is_untyped() {
            tracing::trace!(%key, "Untyped profile inherits nothing");
            return merged;
        }

        let target = Target {
            layer,
            key,
            kind: &view.kind,
            view: &view,
            mode,
        };
        let mut visited = BTreeSet::new();
        visited.insert((layer_id.clone(), layer.view.renames.resolve_backward(key)));

        self.collect(&target, &view.kind, source_layer, &mut visited, &mut merged, 0);
        merged
    }

    /// Where the default profile for `kind` lives.
    pub fn find_source(
        &self,
        kind: &str,
        source_layer: Option<&LayerId>,
    ) -> Option<(ResolverLayer<'a>, ProfileKey)> {
        self.layers
            .iter()
            .filter(|layer| source_layer.is_none_or(|id| layer.id() == id))
            .find_map(|layer| {
                let key = layer.view.effective_default(kind)?;
                layer
                    .view
                    .profile_exists(&key)
                    .then(|| (*layer, key))
            })
    }

    fn collect(
        &self,
        target: &Target<'_>,
        kind: &str,
        source_layer: Option<&LayerId>,
        visited: &mut BTreeSet<(LayerId, ProfileKey)>,
        merged: &mut BTreeMap<String, MergedProperty>,
        depth: usize,
    ) {
        if depth >= self.max_depth {
            tracing::warn!(
                profile = %target.key,
                depth,
                "Default-profile chain too deep; stopping inheritance"
            );
            return;
        }

        let Some((source, source_key)) = self.find_source(kind, source_layer) else {
            tracing::trace!(kind, "No default profile for type");
            return;
        };
        let identity = (
            source.id().clone(),
            source.view.renames.resolve_backward(&source_key),
        );
        if !visited.insert(identity) {
            tracing::trace!(source = %source_key, "Default profile already visited");
            return;
        }

        let source_view = source.view.materialize(&source_key);
        let values = source_view
            .properties
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .chain(
                source_view
                    .secure
                    .iter()
                    .filter(|name| !source_view.properties.contains_key(*name))
                    .map(|name| (name.clone(), Value::Null)),
            );

        for (name, value) in values {
            if merged.contains_key(&name) || self.is_local(target, &name) {
                continue;
            }
            if target.mode == MergeMode::Show && !Self::schema_allows(target, &name) {
                continue;
            }
            merged.insert(
                name.clone(),
                MergedProperty {
                    secure: source_view.is_secure(&name),
                    value,
                    source_profile: source_key.clone(),
                    source_layer: source.id().clone(),
                },
            );
        }

        if !source_view.is_untyped() && source_view.kind != kind {
            self.collect(target, &source_view.kind, source_layer, visited, merged, depth + 1);
        }
    }

    /// True when the viewed profile sets `name` itself, as a pending edit
    /// under its current or original path or as a live local value.
    fn is_local(&self, target: &Target<'_>, name: &str) -> bool {
        let pending = target
            .layer
            .view
            .profile_paths(target.key)
            .iter()
            .any(|path| {
                let property = path.join([PROPERTIES_SEGMENT, name]);
                target.layer.view.overlay.changes_under(&property).next().is_some()
            });
        pending || target.view.has_property(name)
    }

    /// Missing schemas and undeclared types allow nothing.
    fn schema_allows(target: &Target<'_>, name: &str) -> bool {
        target
            .layer
            .schema
            .is_some_and(|schema| schema.allows(target.kind, name))
    }
}
