use thiserror::Error;

#[derive(Error, Debug)]
pub enum SackError {
    // Configuration errors
    #[error("Failed to parse configuration: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Package set errors
    #[error("Package set belongs to a different pool (expected pool {expected}, got pool {found})")]
    DifferentPool { expected: u64, found: u64 },

    // Repository errors
    #[error("Repository not found: {name}")]
    RepoNotFound { name: String },

    #[error("Failed to write solv cache for repository {repo}: {reason}")]
    SolvCache { repo: String, reason: String },
}

pub type Result<T> = std::result::Result<T, SackError>;
