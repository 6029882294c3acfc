//! Engine construction from command-line arguments
//!
//! Loads settings, every `--config` layer, every `--schema`, and replays the
//! `--edits` script, leaving an [`Engine`] ready for a query command.

use std::path::Path;

use serde_json::Value;
use teamcfg_core::{Engine, EngineSettings, SettingsResolver};
use teamcfg_model::{ConfigurationLayer, LayerId, LayerSchema};

use crate::cli::{Cli, LayerSource, SchemaSource};
use crate::edits::{self, EditReport};
use crate::error::{CliError, Result};

/// A loaded engine plus what the edit script did to it
pub struct Context {
    pub engine: Engine,
    pub report: EditReport,
}

impl Context {
    /// Build the engine described by `cli`, resolving relative settings
    /// lookups against `cwd`.
    pub fn load(cwd: &Path, cli: &Cli) -> Result<Self> {
        let settings = match &cli.settings {
            Some(path) => EngineSettings::load(path)?,
            None => SettingsResolver::new(cwd).resolve()?,
        };
        tracing::debug!(?settings, "Resolved settings");

        let mut engine = Engine::new(settings);
        for source in &cli.configs {
            engine.add_layer(load_layer(source)?);
        }
        for source in &cli.schemas {
            let schema = load_schema(source)?;
            engine.set_schema(&LayerId::new(&source.id), schema)?;
        }

        let report = match &cli.edits {
            Some(path) => edits::apply(&mut engine, &edits::load(path)?)?,
            None => EditReport::default(),
        };

        Ok(Self { engine, report })
    }

    /// Id of a loaded layer, or a user error naming the loaded ones.
    pub fn layer_id(&self, id: &str) -> Result<LayerId> {
        let id = LayerId::new(id);
        if self.engine.layer(&id).is_some() {
            return Ok(id);
        }
        let loaded: Vec<&str> = self.engine.layers().iter().map(|l| l.id.as_str()).collect();
        Err(CliError::user(if loaded.is_empty() {
            format!("Unknown layer '{id}': no layers loaded (use --config ID=FILE)")
        } else {
            format!("Unknown layer '{id}'; loaded: {}", loaded.join(", "))
        }))
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn load_layer(source: &LayerSource) -> Result<ConfigurationLayer> {
    let content = read(&source.file)?;
    let layer = ConfigurationLayer::from_json(source.id.as_str(), source.scope, &content)?;
    tracing::debug!(layer = %layer.id, scope = %layer.scope, file = ?source.file, "Loaded layer");
    Ok(layer)
}

fn load_schema(source: &SchemaSource) -> Result<LayerSchema> {
    let content = read(&source.file)?;
    let document: Value = serde_json::from_str(&content).map_err(|e| CliError::Parse {
        path: source.file.clone(),
        source: e,
    })?;
    Ok(LayerSchema::from_json_schema(&document))
}
