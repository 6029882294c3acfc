//! Shared test utilities for the teamcfg workspace.
//!
//! This crate provides standardised fixtures so crate test suites do not
//! each hand-roll layer documents. It is a dev-dependency only, never
//! published.
//!
//! # Modules
//!
//! - [`layer`]: [`LayerBuilder`] for in-memory configuration layers
//! - [`schema`]: [`SchemaBuilder`] for per-type property schemas
//! - [`fixtures`]: canned team-config documents and an on-disk
//!   [`fixtures::ConfigDir`]

pub mod fixtures;
pub mod layer;
pub mod schema;

pub use fixtures::ConfigDir;
pub use layer::LayerBuilder;
pub use schema::SchemaBuilder;
