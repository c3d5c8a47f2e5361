use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{Config, RepoConfig};
use crate::error::{Result, SackError};

/// What a repository represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepoKind {
    /// A remote or local repository of available packages
    Available,
    /// The installed system
    System,
}

/// File provides added to one package during a provides-index build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileProvides {
    /// Full NEVRA of the package
    pub package: String,
    /// File paths the package now provides
    pub files: Vec<String>,
}

/// Persistent per-repository index that stores added file provides
pub trait SolvCache {
    fn write_file_provides(&self, repo_id: &str, entries: &[FileProvides]) -> Result<()>;
}

/// [`SolvCache`] writing `<dir>/<repo>-filenames.json`
#[derive(Debug, Clone)]
pub struct JsonSolvCache {
    dir: PathBuf,
}

impl JsonSolvCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Cache in the configured `cachedir`; `None` when no directory is set
    pub fn from_config(config: &Config) -> Option<Self> {
        config.cachedir.as_deref().map(Self::new)
    }

    pub fn path_for(&self, repo_id: &str) -> PathBuf {
        self.dir.join(format!("{}-filenames.json", repo_id))
    }

    /// Read back what was stored for a repository; a missing file reads as empty
    pub fn read(&self, repo_id: &str) -> Result<Vec<FileProvides>> {
        let path = self.path_for(repo_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read(&path)?;
        Ok(serde_json::from_slice(&contents)?)
    }
}

impl SolvCache for JsonSolvCache {
    fn write_file_provides(&self, repo_id: &str, entries: &[FileProvides]) -> Result<()> {
        let to_error = |reason: String| SackError::SolvCache {
            repo: repo_id.to_string(),
            reason,
        };

        fs::create_dir_all(&self.dir).map_err(|e| to_error(e.to_string()))?;
        let json = serde_json::to_vec_pretty(entries).map_err(|e| to_error(e.to_string()))?;
        let path = self.path_for(repo_id);
        fs::write(&path, json).map_err(|e| to_error(format!("{}: {}", path.display(), e)))?;

        log::debug!("Wrote {} file provides entries to {}", entries.len(), path.display());
        Ok(())
    }
}

/// A repository registered in the pool
pub struct Repo {
    /// Repository id (unique within a pool)
    id: String,

    kind: RepoKind,

    /// Configuration section, including include/exclude patterns
    config: RepoConfig,

    /// Whether this repository's packages are subject to the include layer
    use_includes: bool,

    /// False while packages were added since the last internalization
    pub(crate) internalized: bool,

    cache: Option<Box<dyn SolvCache>>,
}

impl fmt::Debug for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repo")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("config", &self.config)
            .field("use_includes", &self.use_includes)
            .field("internalized", &self.internalized)
            .field("has_cache", &self.cache.is_some())
            .finish()
    }
}

impl Repo {
    /// Create an enabled repository of available packages
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: RepoKind::Available,
            config: RepoConfig::default(),
            use_includes: false,
            internalized: true,
            cache: None,
        }
    }

    /// Create the installed-system repository
    pub fn system() -> Self {
        Self::new("@System").with_kind(RepoKind::System)
    }

    pub fn with_kind(mut self, kind: RepoKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_config(mut self, config: RepoConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cache(mut self, cache: Box<dyn SolvCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> RepoKind {
        self.kind
    }

    pub fn is_system(&self) -> bool {
        self.kind == RepoKind::System
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RepoConfig {
        &mut self.config
    }

    pub fn use_includes(&self) -> bool {
        self.use_includes
    }

    pub fn set_use_includes(&mut self, use_includes: bool) {
        self.use_includes = use_includes;
    }

    pub(crate) fn cache(&self) -> Option<&dyn SolvCache> {
        self.cache.as_deref()
    }
}
