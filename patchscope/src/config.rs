//! User configuration and command-line arguments.
//!
//! Settings come from `$XDG_CONFIG_HOME/patchscope/config.toml` (falling back to
//! `~/.config/patchscope/config.toml`). A missing file means defaults; a file
//! that fails to parse is reported and also falls back to defaults, so a typo
//! never prevents startup.

use std::path::PathBuf;

use clap::Parser;
use patchscope_core::SimilarityOptions;
use serde::Deserialize;

/// Browse the commits of a git repository and the patches they introduce.
#[derive(Debug, Parser)]
#[command(name = "patchscope", version)]
pub struct Cli {
    /// Repository to open (any directory inside it works).
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Revision the history starts from instead of HEAD.
    #[arg(long)]
    pub rev: Option<String>,

    /// Theme name, overriding the config file.
    #[arg(long)]
    pub theme: Option<String>,

    /// Alternative config file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: String,
    /// Maximum number of commits loaded into the history panel.
    pub history_limit: usize,
    /// `tracing` filter directive used when `PATCHSCOPE_LOG` is unset.
    pub log_level: String,
    /// Where the log file goes; defaults to the platform state directory.
    pub log_dir: Option<PathBuf>,
    pub similarity: SimilarityOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "catppuccin-mocha".to_owned(),
            history_limit: 500,
            log_level: "info".to_owned(),
            log_dir: None,
            similarity: SimilarityOptions::default(),
        }
    }
}

impl Config {
    /// Reads the config at `path`, or the default location when `None`.
    ///
    /// Returns the config and, if the file existed but was unusable, the
    /// reason it was ignored. Logging is not up yet at this point, so the
    /// caller reports that warning once the subscriber is installed.
    pub fn load(path: Option<PathBuf>) -> (Self, Option<String>) {
        let path = path.unwrap_or_else(config_path);
        let raw = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(_) => return (Self::default(), None),
        };
        match Self::parse(&raw) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(format!("config parse error in {}: {e}", path.display()))),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

fn config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"))
}

/// Default config file location.
pub fn config_path() -> PathBuf {
    config_home().join("patchscope").join("config.toml")
}

/// Default log directory: `$XDG_STATE_HOME/patchscope`, else `~/.local/state/patchscope`.
pub fn default_log_dir() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".local").join("state"))
        })
        .unwrap_or_else(std::env::temp_dir)
        .join("patchscope")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_similarity_table_keeps_other_defaults() {
        let config = Config::parse(
            r#"
            theme = "dark"
            history_limit = 20

            [similarity]
            copies = true
            rename_threshold = 70
            "#,
        )
        .unwrap();
        assert_eq!(config.theme, "dark");
        assert_eq!(config.history_limit, 20);
        assert!(config.similarity.renames);
        assert!(config.similarity.copies);
        assert_eq!(config.similarity.rename_threshold, Some(70));
        assert_eq!(config.similarity.copy_threshold, None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(Config::parse("history_limit = \"lots\"").is_err());
    }

    #[test]
    fn cli_defaults_to_current_directory() {
        let cli = Cli::parse_from(["patchscope"]);
        assert_eq!(cli.path, PathBuf::from("."));
        assert!(cli.rev.is_none());

        let cli = Cli::parse_from(["patchscope", "/tmp/repo", "--rev", "v1.0", "--theme", "dark"]);
        assert_eq!(cli.path, PathBuf::from("/tmp/repo"));
        assert_eq!(cli.rev.as_deref(), Some("v1.0"));
        assert_eq!(cli.theme.as_deref(), Some("dark"));
    }
}
