//! Bot configuration
//!
//! Loaded from TOML with a search chain (explicit path, `./autopilot.toml`,
//! user config dir) and falling back to built-in defaults. A file that exists
//! but fails to parse degrades to defaults with a warning rather than failing
//! the run.

use crate::logger;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Complete configuration for a run.
///
/// Branch entries control which branches release at all and whether they do so
/// as prereleases on a dist-tag channel.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_bot_name")]
    pub bot_name: String,

    #[serde(default = "default_branches")]
    pub branches: Vec<BranchEntry>,

    /// Synthesize changeset records from commit history when none exist.
    #[serde(default)]
    pub auto_changeset: bool,

    #[serde(default = "default_true")]
    pub create_release: bool,

    #[serde(default = "default_true")]
    pub push_tags: bool,

    /// Emit one GitHub release per package group instead of per package.
    #[serde(default)]
    pub group_releases: bool,

    /// Explicit package-name to group-name assignments for grouped releases.
    #[serde(default)]
    pub package_groups: HashMap<String, String>,
}

/// A releasing branch: either a bare name or a name with prerelease settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum BranchEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        prerelease: Option<String>,
        #[serde(default)]
        channel: Option<String>,
    },
}

impl BranchEntry {
    pub fn name(&self) -> &str {
        match self {
            BranchEntry::Name(name) => name,
            BranchEntry::Detailed { name, .. } => name,
        }
    }
}

/// Branch configuration resolved against the currently checked-out branch.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBranchConfig {
    pub name: String,
    /// Prerelease tag (e.g. `rc`) when this branch releases prereleases
    pub prerelease: Option<String>,
    /// npm dist-tag channel for publishes from this branch
    pub channel: Option<String>,
    /// False when the current branch is not configured to release
    pub is_match: bool,
}

fn default_bot_name() -> String {
    "changeset-autopilot".to_string()
}

fn default_branches() -> Vec<BranchEntry> {
    vec![
        BranchEntry::Name("main".to_string()),
        BranchEntry::Detailed {
            name: "next".to_string(),
            prerelease: Some("rc".to_string()),
            channel: Some("next".to_string()),
        },
    ]
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bot_name: default_bot_name(),
            branches: default_branches(),
            auto_changeset: false,
            create_release: true,
            push_tags: true,
            group_releases: false,
            package_groups: HashMap::new(),
        }
    }
}

impl Config {
    /// Match the current branch against the configured branch list.
    pub fn resolve_branch(&self, current: &str) -> ResolvedBranchConfig {
        for entry in &self.branches {
            if entry.name() != current {
                continue;
            }
            let (prerelease, channel) = match entry {
                BranchEntry::Name(_) => (None, None),
                BranchEntry::Detailed {
                    prerelease, channel, ..
                } => (prerelease.clone(), channel.clone()),
            };
            return ResolvedBranchConfig {
                name: current.to_string(),
                prerelease,
                channel,
                is_match: true,
            };
        }

        ResolvedBranchConfig {
            name: current.to_string(),
            prerelease: None,
            channel: None,
            is_match: false,
        }
    }
}

/// Load configuration from file or return defaults.
///
/// Search order:
/// 1. Custom path provided as parameter
/// 2. `autopilot.toml` in the workspace root
/// 3. `.autopilot.toml` in the user config directory
/// 4. Built-in defaults
///
/// Unreadable or unparsable files degrade to defaults with a warning.
pub fn load_config(config_path: Option<&Path>, workspace_root: &Path) -> Config {
    let candidate = if let Some(path) = config_path {
        Some(path.to_path_buf())
    } else {
        let local = workspace_root.join("autopilot.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs::config_dir()
                .map(|dir| dir.join(".autopilot.toml"))
                .filter(|path| path.exists())
        }
    };

    let Some(path) = candidate else {
        return Config::default();
    };

    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) => {
            logger::warn(&format!(
                "Cannot read config {}: {}. Using defaults.",
                path.display(),
                e
            ));
            return Config::default();
        }
    };

    match toml::from_str(&raw) {
        Ok(config) => config,
        Err(e) => {
            logger::warn(&format!(
                "Cannot parse config {}: {}. Using defaults.",
                path.display(),
                e
            ));
            Config::default()
        }
    }
}
