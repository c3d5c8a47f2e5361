pub mod config;
pub mod error;
pub mod exclude_flags;
pub mod nevra;
pub mod package_set;
pub mod pool;
pub mod query;
pub mod reldep;
pub mod repo;
pub mod sack;

pub use error::{SackError, Result};
pub use config::{Config, RepoConfig};
pub use exclude_flags::ExcludeFlags;
pub use nevra::{Nevra, NevraForm};
pub use package_set::PackageSet;
pub use pool::{PackageId, Pool, RepoId, Solvable};
pub use query::{PackageQuery, ResolveSpecSettings};
pub use reldep::{CmpType, Reldep};
pub use repo::{JsonSolvCache, Repo, RepoKind, SolvCache};
pub use sack::PackageSack;
