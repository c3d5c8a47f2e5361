use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Result, SackError};
use super::source::{list_from_value, ConfigLoader, ConfigSource, RawConfig};

/// Disable-excludes sentinel that turns off every exclude and include rule
pub const DISABLE_ALL: &str = "*";

/// Disable-excludes sentinel that turns off only the main (global) rules
pub const DISABLE_MAIN: &str = "main";

fn default_true() -> bool {
    true
}

fn deserialize_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    list_from_value(&value)
        .ok_or_else(|| serde::de::Error::custom("expected a list of strings or a delimited string"))
}

/// Per-repository configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default, deserialize_with = "deserialize_list")]
    pub includepkgs: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_list")]
    pub excludepkgs: Vec<String>,
}

impl Default for RepoConfig {
    fn default() -> Self {
        RepoConfig {
            enabled: true,
            includepkgs: Vec::new(),
            excludepkgs: Vec::new(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scopes whose excludes are disabled: `*`, `main`, or repository id globs
    #[serde(default, deserialize_with = "deserialize_list")]
    pub disable_excludes: Vec<String>,

    /// Global include patterns
    #[serde(default, deserialize_with = "deserialize_list")]
    pub includepkgs: Vec<String>,

    /// Global exclude patterns
    #[serde(default, deserialize_with = "deserialize_list")]
    pub excludepkgs: Vec<String>,

    /// Directory for solv caches, see [`JsonSolvCache::from_config`](crate::repo::JsonSolvCache::from_config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cachedir: Option<PathBuf>,

    /// Repository sections, in file order
    #[serde(default)]
    pub repos: IndexMap<String, RepoConfig>,

    /// Tracks where each configuration value came from
    #[serde(skip)]
    sources: HashMap<String, ConfigSource>,
}

impl Config {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Build configuration from all sources
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (`SIEVE_*`)
    /// 2. Configuration file
    /// 3. Built-in defaults
    pub fn build<P: AsRef<Path>>(config_file: Option<P>, use_environment: bool) -> Result<Self> {
        let loader = ConfigLoader::new(use_environment);
        let mut config = Config::default();

        if let Some(path) = config_file {
            let path = path.as_ref();
            let raw = loader.load_config_file(path)?;
            config.merge_raw_config(raw, ConfigSource::File(path.to_path_buf()))?;
        }

        config.apply_env_overrides(&loader);
        config.resolve_paths(&loader);

        log::debug!(
            "Configuration built: {} repo sections, {} global excludes, {} global includes",
            config.repos.len(),
            config.excludepkgs.len(),
            config.includepkgs.len()
        );

        Ok(config)
    }

    /// Get the source of a configuration value
    pub fn get_source(&self, key: &str) -> Option<&ConfigSource> {
        self.sources.get(key)
    }

    /// Set a list option programmatically
    pub fn set_list(&mut self, key: &str, values: Vec<String>) -> Result<()> {
        let value = serde_json::Value::from(values);
        self.merge_config_value(key, &value, ConfigSource::Command)
    }

    /// Configuration of a repository section, if present
    pub fn repo(&self, repo_id: &str) -> Option<&RepoConfig> {
        self.repos.get(repo_id)
    }

    /// True if `*` is among the disabled exclude scopes
    pub fn disables_all_excludes(&self) -> bool {
        self.disable_excludes.iter().any(|s| s == DISABLE_ALL)
    }

    /// True if `main` is among the disabled exclude scopes
    pub fn disables_main_excludes(&self) -> bool {
        self.disable_excludes.iter().any(|s| s == DISABLE_MAIN)
    }

    /// True if `repo_id` matches any disabled exclude scope (glob match)
    pub fn disables_repo_excludes(&self, repo_id: &str) -> bool {
        self.disable_excludes.iter().any(|scope| match glob::Pattern::new(scope) {
            Ok(pattern) => pattern.matches(repo_id),
            Err(_) => scope == repo_id,
        })
    }

    /// Merge a raw config into this config
    fn merge_raw_config(&mut self, raw: RawConfig, source: ConfigSource) -> Result<()> {
        if let Some(main) = raw.main {
            for (key, value) in main {
                self.merge_config_value(&key, &value, source.clone())?;
            }
        }

        if let Some(repos) = raw.repos {
            for (id, repo) in repos {
                self.sources.insert(format!("repos.{}", id), source.clone());
                self.repos.insert(id, repo);
            }
        }

        Ok(())
    }

    /// Merge a single configuration value
    fn merge_config_value(&mut self, key: &str, value: &serde_json::Value, source: ConfigSource) -> Result<()> {
        let list = |value: &serde_json::Value| {
            list_from_value(value)
                .ok_or_else(|| SackError::Config(format!("{} must be a list of strings", key)))
        };

        match key {
            "disable_excludes" | "disableexcludes" => {
                self.disable_excludes = list(value)?;
            }
            "includepkgs" => {
                self.includepkgs = list(value)?;
            }
            "excludepkgs" | "exclude" => {
                self.excludepkgs = list(value)?;
            }
            "cachedir" => {
                let Some(path) = value.as_str() else {
                    return Err(SackError::Config("cachedir must be a string".to_string()));
                };
                self.cachedir = Some(PathBuf::from(path));
            }
            _ => {
                log::warn!("Unknown configuration option \"{}\" ignored", key);
                return Ok(());
            }
        }

        let key = match key {
            "disableexcludes" => "disable_excludes",
            "exclude" => "excludepkgs",
            other => other,
        };
        self.sources.insert(key.to_string(), source);
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self, loader: &ConfigLoader) {
        for key in ["disable_excludes", "includepkgs", "excludepkgs"] {
            if let Some(values) = loader.get_env_list(key) {
                match key {
                    "disable_excludes" => self.disable_excludes = values,
                    "includepkgs" => self.includepkgs = values,
                    _ => self.excludepkgs = values,
                }
                self.sources.insert(
                    key.to_string(),
                    ConfigSource::Environment(format!("SIEVE_{}", key.to_uppercase())),
                );
            }
        }

        if let Some(cachedir) = loader.get_env_path("cachedir") {
            self.cachedir = Some(cachedir);
            self.sources.insert(
                "cachedir".to_string(),
                ConfigSource::Environment("SIEVE_CACHEDIR".to_string()),
            );
        }
    }

    /// Fill in computed defaults
    fn resolve_paths(&mut self, loader: &ConfigLoader) {
        if self.cachedir.is_none() {
            self.cachedir = Some(loader.get_cache_dir());
            self.sources.insert("cachedir".to_string(), ConfigSource::Default);
        }
    }
}
