use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SackError};
use super::config::RepoConfig;

/// Prefix of every environment variable the loader consults
pub const ENV_PREFIX: &str = "SIEVE_";

/// Represents the source of a configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Default built-in value
    Default,
    /// From a configuration file
    File(PathBuf),
    /// From environment variable
    Environment(String),
    /// Programmatically set
    Command,
}

impl ConfigSource {
    pub fn as_str(&self) -> String {
        match self {
            ConfigSource::Default => "default".to_string(),
            ConfigSource::File(path) => path.display().to_string(),
            ConfigSource::Environment(var) => var.clone(),
            ConfigSource::Command => "command".to_string(),
        }
    }
}

/// Raw configuration data as stored in a JSON file
///
/// ```json
/// {
///   "main": { "excludepkgs": ["kernel*"], "disable_excludes": [] },
///   "repos": { "updates": { "includepkgs": "bash, coreutils" } }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<HashMap<String, serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repos: Option<IndexMap<String, RepoConfig>>,
}

/// Loads configuration from files and the environment
#[derive(Debug)]
pub struct ConfigLoader {
    use_environment: bool,
}

impl ConfigLoader {
    pub fn new(use_environment: bool) -> Self {
        Self { use_environment }
    }

    /// Get a raw environment variable, ignoring empty values
    pub fn get_env(&self, var: &str) -> Option<String> {
        if !self.use_environment {
            return None;
        }

        env::var(var).ok().filter(|s| !s.is_empty())
    }

    /// Get a configuration value from environment variable
    /// Converts "disable_excludes" to "SIEVE_DISABLE_EXCLUDES"
    pub fn get_env_config(&self, key: &str) -> Option<String> {
        let env_var = format!("{}{}", ENV_PREFIX, key.replace('-', "_").to_uppercase());
        self.get_env(&env_var)
    }

    /// Get a list value from environment variable
    pub fn get_env_list(&self, key: &str) -> Option<Vec<String>> {
        self.get_env_config(key).map(|val| split_list(&val))
    }

    /// Get a path value from environment variable
    pub fn get_env_path(&self, key: &str) -> Option<PathBuf> {
        self.get_env_config(key).map(PathBuf::from)
    }

    /// Get the default cache directory
    pub fn get_cache_dir(&self) -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "sieve") {
            proj_dirs.cache_dir().to_path_buf()
        } else {
            PathBuf::from(".sieve-cache")
        }
    }

    /// Load configuration from a JSON file. A missing file yields an empty config.
    pub fn load_config_file<P: AsRef<Path>>(&self, path: P) -> Result<RawConfig> {
        let path = path.as_ref();

        if !path.exists() {
            log::debug!("Config file {} does not exist, using defaults", path.display());
            return Ok(RawConfig::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| SackError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let config: RawConfig = serde_json::from_str(&contents)
            .map_err(|e| SackError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        Ok(config)
    }
}

/// Split a dnf-style list option ("a, b c") into its items
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Interpret a JSON value as a list option: an array of strings or a delimited string
pub fn list_from_value(value: &serde_json::Value) -> Option<Vec<String>> {
    match value {
        serde_json::Value::String(s) => Some(split_list(s)),
        serde_json::Value::Array(arr) => {
            let mut items = Vec::with_capacity(arr.len());
            for item in arr {
                items.push(item.as_str()?.to_string());
            }
            Some(items)
        }
        serde_json::Value::Null => Some(Vec::new()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_source_as_str() {
        assert_eq!(ConfigSource::Default.as_str(), "default");
        assert_eq!(ConfigSource::Command.as_str(), "command");
        assert_eq!(
            ConfigSource::Environment("SIEVE_EXCLUDEPKGS".to_string()).as_str(),
            "SIEVE_EXCLUDEPKGS"
        );
        assert_eq!(
            ConfigSource::File(PathBuf::from("/etc/sieve.json")).as_str(),
            "/etc/sieve.json"
        );
    }

    #[test]
    fn test_config_loader_new() {
        let loader = ConfigLoader::new(true);
        assert!(loader.use_environment);

        let loader = ConfigLoader::new(false);
        assert!(!loader.use_environment);
    }

    #[test]
    fn test_env_disabled_returns_none() {
        let loader = ConfigLoader::new(false);
        assert_eq!(loader.get_env_config("excludepkgs"), None);
        assert_eq!(loader.get_env_list("includepkgs"), None);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a, b  c,,d"), vec!["a", "b", "c", "d"]);
        assert!(split_list("  ").is_empty());
    }

    #[test]
    fn test_list_from_value() {
        assert_eq!(list_from_value(&json!(["x", "y"])), Some(vec!["x".to_string(), "y".to_string()]));
        assert_eq!(list_from_value(&json!("x y")), Some(vec!["x".to_string(), "y".to_string()]));
        assert_eq!(list_from_value(&json!(null)), Some(vec![]));
        assert_eq!(list_from_value(&json!([1, 2])), None);
        assert_eq!(list_from_value(&json!(true)), None);
    }
}
