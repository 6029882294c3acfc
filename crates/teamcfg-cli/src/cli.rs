//! CLI argument parsing using clap derive

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use teamcfg_core::MergeMode;
use teamcfg_model::LayerScope;

/// Team configuration inspector - query layered profiles with pending edits applied
#[derive(Parser, Debug)]
#[command(name = "teamcfg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Engine settings file; defaults to the global and project settings.toml
    #[arg(long, global = true, env = "TEAMCFG_SETTINGS", value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Configuration layer to load (repeatable)
    #[arg(short, long = "config", global = true, value_name = "ID=FILE[:SCOPE]")]
    pub configs: Vec<LayerSource>,

    /// JSON schema for a loaded layer (repeatable)
    #[arg(long = "schema", global = true, value_name = "ID=FILE")]
    pub schemas: Vec<SchemaSource>,

    /// Edit script replayed against the layers before the command runs
    #[arg(short, long, global = true, value_name = "FILE")]
    pub edits: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List the effective profiles of a layer
    Profiles {
        /// Layer to list
        #[arg(short, long)]
        layer: String,
    },

    /// Show a profile as it would be written if committed now
    Show {
        /// Profile key, e.g. `lpar1.zosmf`
        profile: String,

        #[arg(short, long)]
        layer: String,
    },

    /// Show the properties a profile inherits from default profiles
    ///
    /// Examples:
    ///   teamcfg -c team=team.config.json merged lpar1.zosmf -l team
    ///   teamcfg -c team=team.config.json merged mine -l team --mode unfiltered
    Merged {
        profile: String,

        #[arg(short, long)]
        layer: String,

        /// hide, show, or unfiltered; defaults to the configured merge mode
        #[arg(short, long)]
        mode: Option<MergeMode>,

        /// Only look for default profiles in this layer
        #[arg(long, value_name = "LAYER")]
        from: Option<String>,
    },

    /// Print the pending edits of a layer in commit form
    Overlay {
        #[arg(short, long)]
        layer: String,
    },

    /// Check whether a new profile name is available
    CheckName {
        /// Name of the new profile (a single segment or a dotted key)
        name: String,

        #[arg(short, long)]
        layer: String,

        /// Existing profile the new one is created under
        #[arg(short, long)]
        parent: Option<String>,
    },
}

/// `ID=FILE[:SCOPE]` argument of `--config`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSource {
    pub id: String,
    pub file: PathBuf,
    pub scope: LayerScope,
}

impl FromStr for LayerSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, rest) = split_assignment(s)?;
        // A trailing `:scope` is only taken when it names a scope, so
        // `C:\config.json` stays a path.
        let (file, scope) = match rest.rsplit_once(':') {
            Some((file, scope)) if !file.is_empty() => match scope.parse::<LayerScope>() {
                Ok(scope) => (file, scope),
                Err(_) => (rest, LayerScope::PROJECT),
            },
            _ => (rest, LayerScope::PROJECT),
        };
        Ok(Self {
            id: id.to_string(),
            file: PathBuf::from(file),
            scope,
        })
    }
}

/// `ID=FILE` argument of `--schema`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSource {
    pub id: String,
    pub file: PathBuf,
}

impl FromStr for SchemaSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, file) = split_assignment(s)?;
        Ok(Self {
            id: id.to_string(),
            file: PathBuf::from(file),
        })
    }
}

fn split_assignment(s: &str) -> Result<(&str, &str), String> {
    match s.split_once('=') {
        Some((id, file)) if !id.is_empty() && !file.is_empty() => Ok((id, file)),
        _ => Err(format!("expected ID=FILE, got '{s}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_no_args() {
        let cli = Cli::parse_from(["teamcfg"]);
        assert!(!cli.verbose);
        assert!(cli.configs.is_empty());
        assert!(cli.command.is_none());
    }

    #[test]
    fn parse_global_flags_after_command() {
        let cli = Cli::parse_from([
            "teamcfg",
            "profiles",
            "--layer",
            "team",
            "-c",
            "team=team.config.json",
            "--json",
            "-v",
        ]);
        assert!(cli.verbose);
        assert!(cli.json);
        assert_eq!(cli.configs.len(), 1);
        assert_eq!(
            cli.command,
            Some(Commands::Profiles {
                layer: "team".to_string()
            })
        );
    }

    #[test]
    fn parse_merged_mode() {
        let cli = Cli::parse_from([
            "teamcfg", "merged", "lpar1.zosmf", "-l", "team", "--mode", "unfiltered",
        ]);
        assert!(matches!(
            cli.command,
            Some(Commands::Merged {
                mode: Some(MergeMode::Unfiltered),
                from: None,
                ..
            })
        ));
    }

    #[test]
    fn parse_merged_rejects_unknown_mode() {
        let result = Cli::try_parse_from(["teamcfg", "merged", "p", "-l", "t", "--mode", "loud"]);
        assert!(result.is_err());
    }

    #[test]
    fn layer_source_with_scope() {
        let source: LayerSource = "user=team.config.user.json:project-user".parse().unwrap();
        assert_eq!(source.id, "user");
        assert_eq!(source.file, PathBuf::from("team.config.user.json"));
        assert_eq!(source.scope, LayerScope::PROJECT_USER);
    }

    #[test]
    fn layer_source_defaults_to_project_scope() {
        let source: LayerSource = "team=C:\\cfg\\team.config.json".parse().unwrap();
        assert_eq!(source.file, PathBuf::from("C:\\cfg\\team.config.json"));
        assert_eq!(source.scope, LayerScope::PROJECT);
    }

    #[test]
    fn layer_source_requires_id_and_file() {
        assert!("team.config.json".parse::<LayerSource>().is_err());
        assert!("=file".parse::<LayerSource>().is_err());
        assert!("id=".parse::<SchemaSource>().is_err());
    }
}
