//! Queries over the visible part of a pool.
//!
//! A [`PackageQuery`] starts from a visibility view (the published considered
//! map, or a map composed under bypass flags) and is narrowed in place by
//! filters.

use sieve_bitmap::Bitmap;

use crate::nevra::{glob_matches, Nevra, PKG_SPEC_FORMS};
use crate::package_set::PackageSet;
use crate::pool::{PackageId, Pool, Solvable};
use crate::reldep::Reldep;

/// How [`PackageQuery::resolve_pkg_spec`] interprets a spec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveSpecSettings {
    pub ignore_case: bool,
    /// Try the NEVRA forms
    pub with_nevra: bool,
    /// Try the spec as a capability
    pub with_provides: bool,
    /// Try the spec as a file path
    pub with_filenames: bool,
}

impl Default for ResolveSpecSettings {
    fn default() -> Self {
        Self {
            ignore_case: false,
            with_nevra: true,
            with_provides: true,
            with_filenames: true,
        }
    }
}

impl ResolveSpecSettings {
    /// NEVRA forms only, case sensitive
    pub fn nevra_only() -> Self {
        Self {
            ignore_case: false,
            with_nevra: true,
            with_provides: false,
            with_filenames: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PackageQuery<'a> {
    pool: &'a Pool,
    set: PackageSet,
}

impl<'a> PackageQuery<'a> {
    /// Query over the records visible under the pool's active view
    pub fn new(pool: &'a Pool) -> Self {
        Self::with_view(pool, pool.considered())
    }

    /// Query over the records visible under `view`; `None` means every record
    pub fn with_view(pool: &'a Pool, view: Option<&Bitmap>) -> Self {
        let set = match view {
            Some(map) => PackageSet::from_map(pool, map.clone()),
            None => PackageSet::from_ids(pool, pool.package_ids()),
        };
        Self { pool, set }
    }

    pub fn pool(&self) -> &'a Pool {
        self.pool
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn contains(&self, id: PackageId) -> bool {
        self.set.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = PackageId> + '_ {
        self.set.iter()
    }

    /// Records of the query, for inspection
    pub fn solvables(&self) -> impl Iterator<Item = (PackageId, &'a Solvable)> + '_ {
        let pool = self.pool;
        self.set.iter().filter_map(move |id| pool.solvable(id).map(|s| (id, s)))
    }

    pub fn as_set(&self) -> &PackageSet {
        &self.set
    }

    pub fn into_set(self) -> PackageSet {
        self.set
    }

    fn retain<F>(&mut self, keep: F)
    where
        F: Fn(PackageId, &Solvable) -> bool,
    {
        let drop: Vec<PackageId> = self
            .set
            .iter()
            .filter(|id| match self.pool.solvable(*id) {
                Some(solvable) => !keep(*id, solvable),
                None => true,
            })
            .collect();
        for id in drop {
            self.set.remove(id);
        }
    }

    /// Keep records of the repository with this id
    pub fn filter_repo_id(&mut self, repo_id: &str) -> &mut Self {
        match self.pool.repo_id(repo_id) {
            Some(repo) => self.retain(|_, s| s.repo() == repo),
            None => self.retain(|_, _| false),
        }
        self
    }

    /// Keep records whose name matches a glob pattern
    pub fn filter_name(&mut self, pattern: &str) -> &mut Self {
        self.retain(|_, s| glob_matches(pattern, &s.name, false));
        self
    }

    /// Keep records providing a capability matching `dep`.
    ///
    /// Uses the provides index, so the pool's provides must be ready.
    pub fn filter_provides(&mut self, dep: &Reldep) -> &mut Self {
        let providers = PackageSet::from_ids(self.pool, self.pool.what_provides(dep));
        self.retain(|id, _| providers.contains(id));
        self
    }

    /// Resolve a package spec, narrowing the query to its matches.
    ///
    /// The NEVRA forms are tried in order, then the spec as a capability, then
    /// as a file path. The first interpretation with matches wins. On no match
    /// the query is left unchanged and `(false, None)` is returned.
    pub fn resolve_pkg_spec(&mut self, spec: &str, settings: &ResolveSpecSettings) -> (bool, Option<Nevra>) {
        if settings.with_nevra {
            for form in PKG_SPEC_FORMS {
                let Some(nevra) = Nevra::parse(spec, form) else {
                    continue;
                };
                let matched = self.matching(|s| nevra.matches(s, settings.ignore_case));
                if !matched.is_empty() {
                    self.set = matched;
                    return (true, Some(nevra));
                }
            }
        }

        if settings.with_provides {
            if let Some(dep) = Reldep::parse(spec) {
                let matched = self.matching(|s| provides_match(s, &dep, settings.ignore_case));
                if !matched.is_empty() {
                    self.set = matched;
                    return (true, None);
                }
            }
        }

        if settings.with_filenames && spec.starts_with('/') {
            let matched = self.matching(|s| s.files.iter().any(|f| glob_matches(spec, f, settings.ignore_case)));
            if !matched.is_empty() {
                self.set = matched;
                return (true, None);
            }
        }

        (false, None)
    }

    fn matching<F>(&self, pred: F) -> PackageSet
    where
        F: Fn(&Solvable) -> bool,
    {
        let ids = self.solvables().filter(|(_, s)| pred(s)).map(|(id, _)| id);
        PackageSet::from_ids(self.pool, ids)
    }
}

fn provides_match(solvable: &Solvable, dep: &Reldep, ignore_case: bool) -> bool {
    solvable.provides.iter().filter_map(|p| Reldep::parse(p)).any(|provide| {
        if dep.cmp_type().is_some() {
            dep.matches(&provide)
        } else {
            glob_matches(dep.name(), provide.name(), ignore_case)
        }
    })
}
