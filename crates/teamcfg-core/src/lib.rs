//! Resolution engine for layered team configuration
//!
//! This crate lets a caller accumulate uncommitted edits against immutable
//! configuration layers and query the effective result at any time:
//!
//! - **Rename graph**: original-to-current profile keys per layer, kept
//!   free of chains and loops
//! - **Pending overlay**: value edits, default changes, and deletions per
//!   layer
//! - **Materialization**: the effective type, properties, and secure list of
//!   a profile as if the edits were committed
//! - **Inheritance**: properties a profile picks up from its type's default
//!   profile, possibly in another layer
//! - **Settings**: engine tunables loaded from `settings.toml` files
//!
//! # Architecture
//!
//! ```text
//!                 teamcfg-cli
//!                      |
//!                 teamcfg-core
//!    +--------+--------+---------+---------+
//!    |        |        |         |         |
//!  rename  overlay  materialize inherit  settings
//!                      |
//!                teamcfg-model
//! ```
//!
//! # Example
//!
//! ```
//! use teamcfg_core::{Engine, MergeMode};
//! use teamcfg_model::{ConfigurationLayer, LayerScope, ProfileKey};
//!
//! let layer = ConfigurationLayer::from_json(
//!     "team.config.json",
//!     LayerScope::PROJECT,
//!     r#"{ "profiles": { "base": { "type": "zowe" } }, "defaults": { "zowe": "base" } }"#,
//! ).unwrap();
//! let id = layer.id.clone();
//!
//! let mut engine = Engine::default();
//! engine.add_layer(layer);
//!
//! let base = ProfileKey::parse("base").unwrap();
//! let renamed = ProfileKey::parse("shared").unwrap();
//! engine.rename(&base, &renamed, &id, false).unwrap();
//!
//! assert!(engine.is_profile_default(&renamed, &id));
//! assert!(engine.resolve_merged_properties(&renamed, &id, MergeMode::Show).is_empty());
//! ```

pub mod engine;
pub mod error;
pub mod inherit;
pub mod materialize;
pub mod overlay;
pub mod rename;
pub mod settings;

pub use engine::{Engine, LayerSession};
pub use error::{Error, Rejection, Result};
pub use inherit::{InheritanceResolver, MergeMode, MergedProperty, ResolverLayer};
pub use materialize::{LayerView, ProfileView};
pub use overlay::{OverlaySnapshot, PendingChange, PendingDefault, PendingOverlay, RenameRecord};
pub use rename::{RenameChange, RenameGraph};
pub use settings::{EngineSettings, LayerSettings, SettingsResolver};
