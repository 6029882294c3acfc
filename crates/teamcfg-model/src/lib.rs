//! Data model for layered team configuration files
//!
//! A team configuration file ("layer") holds a tree of named profiles. Each
//! profile has an optional type, a property map, a list of secure property
//! names, and child profiles. This crate provides:
//!
//! - **Path model**: [`ProfileKey`] (`parent.child`) and [`ConfigPath`]
//!   (`profiles.parent.profiles.child.properties.host`) with one canonical
//!   conversion between them
//! - **Profile tree**: [`ProfileNode`] and lookup helpers
//! - **Layers**: [`ConfigurationLayer`] with scope-based precedence
//! - **Schema**: [`LayerSchema`], the per-type property map used for filtering
//!
//! Nothing in this crate knows about pending edits; see `teamcfg-core`.

pub mod error;
pub mod layer;
pub mod path;
pub mod profile;
pub mod schema;

pub use error::{Error, Result};
pub use layer::{ConfigurationLayer, LayerId, LayerScope};
pub use path::{ConfigPath, ProfileKey};
pub use profile::{ProfileNode, ProfileTree};
pub use schema::{LayerSchema, PropertySchema};
