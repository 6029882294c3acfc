//! Settings resolution with hierarchical merge
//!
//! The `SettingsResolver` loads and merges engine settings from a global
//! and a project file, with the project file overriding the global one.

use crate::Result;
use std::path::{Path, PathBuf};

use super::EngineSettings;

/// Resolves engine settings by merging multiple sources
///
/// Settings are loaded from:
/// 1. Built-in defaults
/// 2. Global settings (`<config_dir>/teamcfg/settings.toml`)
/// 3. Project settings (`<project>/.teamcfg/settings.toml`)
///
/// Later sources override earlier ones.
pub struct SettingsResolver {
    /// Project root directory
    root: PathBuf,

    /// Override for the global settings directory (used for testing).
    /// When `None`, `dirs::config_dir()` is used.
    global_config_dir_override: Option<PathBuf>,
}

impl SettingsResolver {
    /// Create a resolver for the given project root.
    ///
    /// The global directory is platform dependent:
    /// - Linux: `~/.config/teamcfg/`
    /// - macOS: `~/Library/Application Support/teamcfg/`
    /// - Windows: `%APPDATA%\teamcfg\`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            global_config_dir_override: None,
        }
    }

    /// Create a resolver with a custom global settings directory.
    pub fn with_global_config_dir(root: impl Into<PathBuf>, global_config_dir: PathBuf) -> Self {
        Self {
            root: root.into(),
            global_config_dir_override: Some(global_config_dir),
        }
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref override_dir) = self.global_config_dir_override {
            return Some(override_dir.clone());
        }
        dirs::config_dir().map(|d| d.join("teamcfg"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the project settings file, whether or not it exists.
    pub fn project_settings_path(&self) -> PathBuf {
        self.root.join(".teamcfg").join("settings.toml")
    }

    /// Resolve the settings by merging all sources
    ///
    /// Missing files are skipped. Invalid TOML in any file is an error.
    pub fn resolve(&self) -> Result<EngineSettings> {
        let mut settings = EngineSettings::default();

        if let Some(global_dir) = self.global_config_dir() {
            let global_settings_path = global_dir.join("settings.toml");
            if global_settings_path.is_file() {
                tracing::debug!(?global_settings_path, "Loading global settings");
                settings.merge(&EngineSettings::load(&global_settings_path)?);
            } else {
                tracing::debug!(?global_settings_path, "No global settings found, skipping");
            }
        }

        let project_settings_path = self.project_settings_path();
        if project_settings_path.is_file() {
            tracing::debug!(?project_settings_path, "Loading project settings");
            settings.merge(&EngineSettings::load(&project_settings_path)?);
        } else {
            tracing::debug!(?project_settings_path, "No project settings found, skipping");
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolve_returns_defaults_when_no_settings_exist() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        let resolver =
            SettingsResolver::with_global_config_dir(project.path(), global.path().to_path_buf());

        assert_eq!(resolver.resolve().unwrap(), EngineSettings::default());
    }

    #[test]
    fn resolve_project_overrides_global() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        std::fs::write(
            global.path().join("settings.toml"),
            "max_renames_per_profile = 5\nmax_inheritance_depth = 3\n",
        )
        .unwrap();
        std::fs::create_dir_all(project.path().join(".teamcfg")).unwrap();
        std::fs::write(
            project.path().join(".teamcfg/settings.toml"),
            "max_inheritance_depth = 4\n",
        )
        .unwrap();

        let resolver =
            SettingsResolver::with_global_config_dir(project.path(), global.path().to_path_buf());
        let settings = resolver.resolve().unwrap();

        assert_eq!(settings.max_renames_per_profile, 5);
        assert_eq!(settings.max_inheritance_depth, 4);
    }

    #[test]
    fn resolve_reports_invalid_toml() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        std::fs::write(global.path().join("settings.toml"), "not = [valid").unwrap();

        let resolver =
            SettingsResolver::with_global_config_dir(project.path(), global.path().to_path_buf());
        assert!(resolver.resolve().is_err());
    }
}
