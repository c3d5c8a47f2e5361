//! Configuration for exclude and include policies
//!
//! Configuration is merged from several sources in priority order (highest first):
//!
//! 1. Environment variables (`SIEVE_DISABLE_EXCLUDES`, `SIEVE_INCLUDEPKGS`,
//!    `SIEVE_EXCLUDEPKGS`, `SIEVE_CACHEDIR`)
//! 2. A JSON configuration file with a `main` section and per-repository `repos` sections
//! 3. Built-in defaults
//!
//! # Example
//!
//! ```rust,no_run
//! use sieve_pm::config::Config;
//! use std::path::Path;
//!
//! let config = Config::build(Some(Path::new("/etc/sieve/sieve.json")), true).unwrap();
//!
//! if config.disables_all_excludes() {
//!     println!("all excludes disabled");
//! }
//! for (id, repo) in &config.repos {
//!     println!("{}: {} include patterns", id, repo.includepkgs.len());
//! }
//! ```

mod config;
mod source;

pub use config::{Config, RepoConfig, DISABLE_ALL, DISABLE_MAIN};
pub use source::{split_list, ConfigLoader, ConfigSource, RawConfig, ENV_PREFIX};
