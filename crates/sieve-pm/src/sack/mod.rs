//! The considered-set engine.
//!
//! A [`PackageSack`] owns a [`Pool`](crate::pool::Pool) and decides which of
//! its package records are visible to queries and to the solver.
//!
//! # Layers
//!
//! Visibility is composed from four optional layers, each mutated by a
//! different actor:
//!
//! - module excludes: records hidden by modular content rules
//! - repo excludes: records of disabled repositories
//! - package excludes: explicit excludes from the API or configuration
//! - package includes: if present, restricts visibility to these records for
//!   repositories with `use_includes` set
//!
//! An absent layer means "no restriction". A present but empty include layer
//! hides every record of the repositories that opted into includes.
//!
//! # Composition
//!
//! ```text
//! considered = (all - module - repo - pkg_excludes)
//!              ∩ (pkg_includes ∪ records of repos without use_includes)
//! ```
//!
//! Mutations only mark the published map stale. The map is recomputed on the
//! next [`PackageSack::query`] or explicit
//! [`PackageSack::recompute_considered_in_pool`].
//!
//! # Example
//!
//! ```
//! use sieve_pm::pool::{Pool, Solvable};
//! use sieve_pm::repo::Repo;
//! use sieve_pm::{PackageSack, PackageSet};
//!
//! let mut pool = Pool::new();
//! pool.add_repo(Repo::new("fedora"));
//! let bash = pool.add_solvable("fedora", Solvable::new("bash", "5.2", "1", "x86_64")).unwrap();
//! pool.add_solvable("fedora", Solvable::new("zsh", "5.9", "1", "x86_64")).unwrap();
//!
//! let mut sack = PackageSack::new(pool);
//! let excludes = PackageSet::from_ids(sack.pool(), [bash]);
//! sack.add_excludes(&excludes).unwrap();
//!
//! assert_eq!(sack.query().len(), 1);
//! ```

mod excludes;
mod package_sack;
mod provides;


pub use package_sack::PackageSack;
