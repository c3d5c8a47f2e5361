use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use sieve_bitmap::Bitmap;

use crate::error::{Result, SackError};
use crate::repo::{FileProvides, Repo};
use crate::reldep::Reldep;

/// Index of a package record in the pool. Id 0 is reserved.
pub type PackageId = usize;

/// Index of a repository in the pool
pub type RepoId = usize;

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// One package record: a specific build of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solvable {
    pub name: String,
    pub epoch: u32,
    pub version: String,
    pub release: String,
    pub arch: String,
    /// Capabilities, e.g. `libfoo.so.1` or `foo = 1.0-1`
    pub provides: Vec<String>,
    pub requires: Vec<String>,
    /// Files shipped by the package
    pub files: Vec<String>,
    repo: RepoId,
}

impl Solvable {
    pub fn new(name: &str, version: &str, release: &str, arch: &str) -> Self {
        Self {
            name: name.to_string(),
            epoch: 0,
            version: version.to_string(),
            release: release.to_string(),
            arch: arch.to_string(),
            provides: Vec::new(),
            requires: Vec::new(),
            files: Vec::new(),
            repo: 0,
        }
    }

    pub fn with_epoch(mut self, epoch: u32) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn with_provides<I, S>(mut self, provides: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provides.extend(provides.into_iter().map(Into::into));
        self
    }

    pub fn with_requires<I, S>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires.extend(requires.into_iter().map(Into::into));
        self
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }

    /// Repository this record belongs to
    pub fn repo(&self) -> RepoId {
        self.repo
    }

    /// `[epoch:]version-release`, epoch omitted when zero
    pub fn evr(&self) -> String {
        if self.epoch == 0 {
            format!("{}-{}", self.version, self.release)
        } else {
            format!("{}:{}-{}", self.epoch, self.version, self.release)
        }
    }

    /// `name-[epoch:]version-release.arch`
    pub fn nevra(&self) -> String {
        format!("{}-{}.{}", self.name, self.evr(), self.arch)
    }

    fn provides_capability(&self, capability: &str) -> bool {
        self.provides
            .iter()
            .any(|p| Reldep::parse(p).is_some_and(|dep| dep.name() == capability))
    }
}

/// File provides discovered by [`Pool::add_file_provides`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddedFileProvides {
    /// Paths shipped by packages of regular repositories
    pub available: Vec<String>,
    /// Paths shipped by installed packages
    pub installed: Vec<String>,
}

/// The package universe.
///
/// The pool indexes package records by id (1-based) and owns the repository
/// list, the published considered map (the active view) and the provides
/// index. Everything that iterates records for queries or indexing honors
/// the active view.
pub struct Pool {
    /// Unique identity of this pool instance
    id: u64,

    /// All records indexed by id (index 0 is a reserved placeholder)
    solvables: Vec<Solvable>,

    /// Registered repositories
    repos: Vec<Repo>,

    /// The installed-system repository, if any
    installed: Option<RepoId>,

    /// Published considered map; `None` means every record is visible
    considered: Option<Bitmap>,

    /// Capability name -> records providing it
    whatprovides: HashMap<String, Vec<PackageId>>,
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.id)
            .field("solvables", &(self.solvables.len() - 1))
            .field("repos", &self.repos)
            .field("installed", &self.installed)
            .field("considered", &self.considered.as_ref().map(Bitmap::count))
            .field("whatprovides", &self.whatprovides.len())
            .finish()
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            solvables: vec![Solvable::new("__reserved__", "0", "0", "noarch")],
            repos: Vec::new(),
            installed: None,
            considered: None,
            whatprovides: HashMap::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Register a repository. The first system repository becomes the installed one.
    pub fn add_repo(&mut self, repo: Repo) -> RepoId {
        let id = self.repos.len();
        if repo.is_system() && self.installed.is_none() {
            self.installed = Some(id);
        }
        self.repos.push(repo);
        id
    }

    pub fn repo(&self, id: RepoId) -> Option<&Repo> {
        self.repos.get(id)
    }

    pub fn repo_mut(&mut self, id: RepoId) -> Option<&mut Repo> {
        self.repos.get_mut(id)
    }

    pub fn repos(&self) -> &[Repo] {
        &self.repos
    }

    pub(crate) fn repos_mut(&mut self) -> &mut [Repo] {
        &mut self.repos
    }

    /// Find a repository by its id string
    pub fn repo_id(&self, name: &str) -> Option<RepoId> {
        self.repos.iter().position(|r| r.id() == name)
    }

    pub fn installed(&self) -> Option<RepoId> {
        self.installed
    }

    /// Add a record to the named repository, returning its id
    pub fn add_solvable(&mut self, repo_name: &str, mut solvable: Solvable) -> Result<PackageId> {
        let repo = self.repo_id(repo_name).ok_or_else(|| SackError::RepoNotFound {
            name: repo_name.to_string(),
        })?;
        solvable.repo = repo;
        self.repos[repo].internalized = false;

        let id = self.solvables.len();
        self.solvables.push(solvable);
        Ok(id)
    }

    pub fn solvable(&self, id: PackageId) -> Option<&Solvable> {
        if id > 0 {
            self.solvables.get(id)
        } else {
            None
        }
    }

    /// Number of id slots, including the reserved one. Bitmaps over the
    /// pool are sized to this.
    pub fn nsolvables(&self) -> usize {
        self.solvables.len()
    }

    /// Number of real package records
    pub fn len(&self) -> usize {
        self.solvables.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All record ids, regardless of visibility
    pub fn package_ids(&self) -> impl Iterator<Item = PackageId> + '_ {
        1..self.solvables.len()
    }

    /// Every record of a repository, regardless of visibility
    pub fn repo_packages(&self, repo: RepoId) -> Bitmap {
        let mut map = Bitmap::new(self.nsolvables());
        for (id, solvable) in self.solvables.iter().enumerate().skip(1) {
            if solvable.repo == repo {
                map.add(id);
            }
        }
        map
    }

    /// The published considered map
    pub fn considered(&self) -> Option<&Bitmap> {
        self.considered.as_ref()
    }

    /// True if the record exists and is visible under the active view
    pub fn is_considered(&self, id: PackageId) -> bool {
        id > 0
            && id < self.solvables.len()
            && self.considered.as_ref().map_or(true, |map| map.contains(id))
    }

    /// Exchange the active view with `map`
    pub fn swap_considered_map(&mut self, map: &mut Option<Bitmap>) {
        std::mem::swap(&mut self.considered, map);
    }

    /// Finalize records added since the last call: every record provides
    /// itself, and provides are sorted and deduplicated.
    pub fn internalize_repos(&mut self) {
        let pending: Vec<bool> = self.repos.iter().map(|r| !r.internalized).collect();
        if !pending.iter().any(|p| *p) {
            return;
        }

        for solvable in self.solvables.iter_mut().skip(1) {
            if !pending[solvable.repo] {
                continue;
            }
            let self_provide = format!("{} = {}", solvable.name, solvable.evr());
            solvable.provides.push(self_provide);
            solvable.provides.sort();
            solvable.provides.dedup();
        }

        for repo in &mut self.repos {
            if !repo.internalized {
                log::trace!("Internalized repository {}", repo.id());
                repo.internalized = true;
            }
        }
    }

    /// Find file dependencies satisfied by a shipped file that is not yet
    /// listed as a provide. Only visible records are inspected.
    pub fn add_file_provides(&self) -> AddedFileProvides {
        let visible = || {
            self.package_ids()
                .filter(|id| self.is_considered(*id))
                .map(|id| &self.solvables[id])
        };

        let file_deps: BTreeSet<String> = visible()
            .flat_map(|s| s.requires.iter())
            .filter_map(|dep| Reldep::parse(dep))
            .map(|dep| dep.name().to_string())
            .filter(|name| name.starts_with('/'))
            .collect();

        let mut available = BTreeSet::new();
        let mut installed = BTreeSet::new();

        for solvable in visible() {
            for file in &solvable.files {
                if !file_deps.contains(file) || solvable.provides_capability(file) {
                    continue;
                }
                if Some(solvable.repo) == self.installed {
                    installed.insert(file.clone());
                } else {
                    available.insert(file.clone());
                }
            }
        }

        AddedFileProvides {
            available: available.into_iter().collect(),
            installed: installed.into_iter().collect(),
        }
    }

    /// Add `files` as provides to the records of `repo` that ship them and
    /// persist the additions through the repository's solv cache.
    ///
    /// Returns the number of records that gained provides.
    pub fn rewrite_repo(&mut self, repo: RepoId, files: &[String]) -> Result<usize> {
        let repo_name = match self.repos.get(repo) {
            Some(r) => r.id().to_string(),
            None => {
                return Err(SackError::RepoNotFound {
                    name: repo.to_string(),
                })
            }
        };

        let wanted: BTreeSet<&str> = files.iter().map(String::as_str).collect();
        let mut entries = Vec::new();

        for id in 1..self.solvables.len() {
            if self.solvables[id].repo != repo || !self.is_considered(id) {
                continue;
            }
            let solvable = &mut self.solvables[id];
            let new_files: Vec<String> = solvable
                .files
                .iter()
                .filter(|f| wanted.contains(f.as_str()))
                .filter(|f| !solvable.provides.iter().any(|p| p == *f))
                .cloned()
                .collect();
            if new_files.is_empty() {
                continue;
            }
            solvable.provides.extend(new_files.iter().cloned());
            solvable.provides.sort();
            entries.push(FileProvides {
                package: solvable.nevra(),
                files: new_files,
            });
        }

        if entries.is_empty() {
            return Ok(0);
        }

        if let Some(cache) = self.repos[repo].cache() {
            cache.write_file_provides(&repo_name, &entries)?;
        }

        log::debug!("Rewrote repository {}: {} packages gained file provides", repo_name, entries.len());
        Ok(entries.len())
    }

    /// Rebuild the capability index over the visible records
    pub fn create_whatprovides(&mut self) {
        let mut index: HashMap<String, Vec<PackageId>> = HashMap::new();
        for id in self.package_ids() {
            if !self.is_considered(id) {
                continue;
            }
            let solvable = &self.solvables[id];
            index.entry(solvable.name.clone()).or_default().push(id);
            for provide in &solvable.provides {
                if let Some(dep) = Reldep::parse(provide) {
                    index.entry(dep.name().to_string()).or_default().push(id);
                }
            }
        }
        for ids in index.values_mut() {
            ids.dedup();
        }
        log::debug!("Provides index rebuilt with {} capabilities", index.len());
        self.whatprovides = index;
    }

    /// Records providing a capability matching `dep`.
    ///
    /// Looks only at the index built by [`Pool::create_whatprovides`], so the
    /// result covers the records that were visible when it was built.
    pub fn what_provides(&self, dep: &Reldep) -> Vec<PackageId> {
        let Some(ids) = self.whatprovides.get(dep.name()) else {
            return Vec::new();
        };
        ids.iter()
            .copied()
            .filter(|id| {
                let solvable = &self.solvables[*id];
                (solvable.name == dep.name() && dep.cmp_type().is_none())
                    || solvable
                        .provides
                        .iter()
                        .filter_map(|p| Reldep::parse(p))
                        .any(|provide| dep.matches(&provide))
            })
            .collect()
    }
}
