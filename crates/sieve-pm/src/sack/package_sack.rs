use sieve_bitmap::Bitmap;

use crate::error::{Result, SackError};
use crate::exclude_flags::ExcludeFlags;
use crate::package_set::PackageSet;
use crate::pool::Pool;
use crate::query::PackageQuery;
use crate::repo::Repo;

/// Package sack: the pool plus the exclusion layers that decide what is visible.
pub struct PackageSack {
    pub(super) pool: Pool,

    /// Records hidden by modular content rules
    pub(super) module_excludes: Option<Bitmap>,

    /// Records hidden by the repository collaborator. Records of disabled
    /// repositories are added to this layer whenever it is composed.
    pub(super) repo_excludes: Option<Bitmap>,

    /// Explicitly excluded records
    pub(super) pkg_excludes: Option<Bitmap>,

    /// Included records, for repositories with `use_includes`
    pub(super) pkg_includes: Option<Bitmap>,

    /// True only right after a publish with no mutation since
    pub(super) considered_uptodate: bool,

    /// True once the provides index has been built
    pub(super) provides_ready: bool,
}

impl std::fmt::Debug for PackageSack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let layer = |map: &Option<Bitmap>| map.as_ref().map(Bitmap::count);
        f.debug_struct("PackageSack")
            .field("pool", &self.pool)
            .field("module_excludes", &layer(&self.module_excludes))
            .field("repo_excludes", &layer(&self.repo_excludes))
            .field("pkg_excludes", &layer(&self.pkg_excludes))
            .field("pkg_includes", &layer(&self.pkg_includes))
            .field("considered_uptodate", &self.considered_uptodate)
            .field("provides_ready", &self.provides_ready)
            .finish()
    }
}

impl PackageSack {
    /// Wrap a pool. No layer is present, so everything is visible.
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            module_excludes: None,
            repo_excludes: None,
            pkg_excludes: None,
            pkg_includes: None,
            considered_uptodate: false,
            provides_ready: false,
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Mutable access to the pool.
    ///
    /// Adding records or repositories may change any layer's meaning, so the
    /// published map and the provides index are both marked stale.
    pub fn pool_mut(&mut self) -> &mut Pool {
        self.considered_uptodate = false;
        self.provides_ready = false;
        &mut self.pool
    }

    pub fn into_pool(self) -> Pool {
        self.pool
    }

    pub fn is_considered_uptodate(&self) -> bool {
        self.considered_uptodate
    }

    pub fn is_provides_ready(&self) -> bool {
        self.provides_ready
    }

    fn snapshot(&self, layer: &Option<Bitmap>) -> PackageSet {
        match layer {
            Some(map) => PackageSet::from_map(&self.pool, map.clone()),
            None => PackageSet::new(&self.pool),
        }
    }

    fn check(&self, set: &PackageSet) -> Result<()> {
        set.check_pool(self.pool.id())
    }

    /// Snapshot of the package excludes; empty if the layer is absent
    pub fn get_excludes(&self) -> PackageSet {
        self.snapshot(&self.pkg_excludes)
    }

    /// Snapshot of the package includes; empty if the layer is absent
    pub fn get_includes(&self) -> PackageSet {
        self.snapshot(&self.pkg_includes)
    }

    /// Snapshot of the module excludes; empty if the layer is absent
    pub fn get_module_excludes(&self) -> PackageSet {
        self.snapshot(&self.module_excludes)
    }

    /// Snapshot of the disabled-repository excludes, including every record
    /// of a currently disabled repository; empty if the layer is absent
    pub fn get_repo_excludes(&self) -> PackageSet {
        self.snapshot(&self.repo_layer())
    }

    pub fn add_excludes(&mut self, excludes: &PackageSet) -> Result<()> {
        self.check(excludes)?;
        match &mut self.pkg_excludes {
            Some(map) => map.union_with(excludes.as_map()),
            None => self.pkg_excludes = Some(excludes.as_map().clone()),
        }
        log::trace!("Added {} package excludes", excludes.len());
        self.considered_uptodate = false;
        Ok(())
    }

    /// Remove records from the package excludes. A no-op, leaving the
    /// published map current, when the layer is absent.
    pub fn remove_excludes(&mut self, excludes: &PackageSet) -> Result<()> {
        self.check(excludes)?;
        if let Some(map) = &mut self.pkg_excludes {
            map.difference_with(excludes.as_map());
            log::trace!("Removed {} package excludes", excludes.len());
            self.considered_uptodate = false;
        }
        Ok(())
    }

    pub fn set_excludes(&mut self, excludes: &PackageSet) -> Result<()> {
        self.check(excludes)?;
        self.pkg_excludes = Some(excludes.as_map().clone());
        log::trace!("Set {} package excludes", excludes.len());
        self.considered_uptodate = false;
        Ok(())
    }

    /// Add records to the package includes. When the layer is absent this
    /// behaves like [`PackageSack::set_includes`], including its effect on
    /// every repository.
    pub fn add_includes(&mut self, includes: &PackageSet) -> Result<()> {
        self.check(includes)?;
        match &mut self.pkg_includes {
            Some(map) => {
                map.union_with(includes.as_map());
                log::trace!("Added {} package includes", includes.len());
                self.considered_uptodate = false;
                Ok(())
            }
            None => self.set_includes(includes),
        }
    }

    /// Remove records from the package includes. A no-op, leaving the
    /// published map current, when the layer is absent.
    pub fn remove_includes(&mut self, includes: &PackageSet) -> Result<()> {
        self.check(includes)?;
        if let Some(map) = &mut self.pkg_includes {
            map.difference_with(includes.as_map());
            log::trace!("Removed {} package includes", includes.len());
            self.considered_uptodate = false;
        }
        Ok(())
    }

    /// Replace the package includes.
    ///
    /// Sets `use_includes` on every repository currently in the pool, so the
    /// include layer applies to all of them. Opting a repository out again
    /// takes an explicit [`PackageSack::setup_excludes_includes`] or
    /// [`Repo::set_use_includes`](crate::repo::Repo::set_use_includes).
    pub fn set_includes(&mut self, includes: &PackageSet) -> Result<()> {
        self.check(includes)?;
        self.pkg_includes = Some(includes.as_map().clone());
        for repo in self.pool.repos_mut() {
            repo.set_use_includes(true);
        }
        log::trace!("Set {} package includes, includes enabled on all repositories", includes.len());
        self.considered_uptodate = false;
        Ok(())
    }

    /// Replace the module excludes; `None` removes the layer
    pub fn set_module_excludes(&mut self, excludes: Option<&PackageSet>) -> Result<()> {
        if let Some(set) = excludes {
            self.check(set)?;
        }
        self.module_excludes = excludes.map(|set| set.as_map().clone());
        self.considered_uptodate = false;
        Ok(())
    }

    /// Replace the disabled-repository excludes; `None` removes the layer
    pub fn set_repo_excludes(&mut self, excludes: Option<&PackageSet>) -> Result<()> {
        if let Some(set) = excludes {
            self.check(set)?;
        }
        self.repo_excludes = excludes.map(|set| set.as_map().clone());
        self.considered_uptodate = false;
        Ok(())
    }

    /// Enable or disable a repository.
    ///
    /// Records of disabled repositories join the disabled-repository layer at
    /// composition time, so records added later are hidden as well.
    pub fn set_repo_enabled(&mut self, repo_id: &str, enabled: bool) -> Result<()> {
        let repo = self.pool.repo_id(repo_id).ok_or_else(|| SackError::RepoNotFound {
            name: repo_id.to_string(),
        })?;
        if let Some(repo) = self.pool.repo_mut(repo) {
            repo.set_enabled(enabled);
        }

        log::debug!(
            "Repository {} {}",
            repo_id,
            if enabled { "enabled" } else { "disabled" }
        );
        self.considered_uptodate = false;
        Ok(())
    }

    /// Add every record of the repositories selected by `pick` to `map` in a
    /// single pass over the records. `map` must hold the whole universe.
    /// Returns false, leaving `map` untouched, when no repository is selected.
    fn add_repo_records<F>(&self, map: &mut Bitmap, pick: F) -> bool
    where
        F: Fn(&Repo) -> bool,
    {
        let picked: Vec<bool> = self.pool.repos().iter().map(pick).collect();
        if !picked.contains(&true) {
            return false;
        }
        for id in self.pool.package_ids() {
            if let Some(solvable) = self.pool.solvable(id) {
                if picked.get(solvable.repo()).copied().unwrap_or(false) {
                    map.add(id);
                }
            }
        }
        true
    }

    /// The disabled-repository layer: the collaborator's records plus every
    /// record of a disabled repository. `None` when both are absent.
    fn repo_layer(&self) -> Option<Bitmap> {
        let mut map = match &self.repo_excludes {
            Some(map) => {
                let mut map = map.clone();
                map.grow(self.pool.nsolvables());
                map
            }
            None => Bitmap::new(self.pool.nsolvables()),
        };
        let disabled = self.add_repo_records(&mut map, |repo| !repo.is_enabled());
        (disabled || self.repo_excludes.is_some()).then_some(map)
    }

    /// Compose the considered map under `flags`.
    ///
    /// Returns `None` when no layer applies under the flags, meaning every
    /// record is visible.
    pub fn compute_considered_map(&self, flags: ExcludeFlags) -> Option<Bitmap> {
        let module_excludes = self
            .module_excludes
            .as_ref()
            .filter(|_| !flags.contains(ExcludeFlags::IGNORE_MODULAR_EXCLUDES));
        let repo_excludes = if flags.contains(ExcludeFlags::USE_DISABLED_REPOSITORIES) {
            None
        } else {
            self.repo_layer()
        };
        let (pkg_excludes, pkg_includes) = if flags.contains(ExcludeFlags::IGNORE_REGULAR_EXCLUDES) {
            (None, None)
        } else {
            (self.pkg_excludes.as_ref(), self.pkg_includes.as_ref())
        };

        if module_excludes.is_none() && repo_excludes.is_none() && pkg_excludes.is_none() && pkg_includes.is_none() {
            return None;
        }

        let nsolvables = self.pool.nsolvables();
        let mut considered = Bitmap::full(nsolvables);
        // slot 0 is reserved
        considered.remove(0);

        if let Some(map) = module_excludes {
            considered.difference_with(map);
        }
        if let Some(map) = &repo_excludes {
            considered.difference_with(map);
        }
        if let Some(map) = pkg_excludes {
            considered.difference_with(map);
        }
        if let Some(map) = pkg_includes {
            let mut includes = map.clone();
            includes.grow(nsolvables);
            self.add_repo_records(&mut includes, |repo| !repo.use_includes());
            considered.intersect_with(&includes);
        }

        Some(considered)
    }

    /// Publish the considered map into the pool if any layer changed since
    /// the last publish.
    pub fn recompute_considered_in_pool(&mut self) {
        if self.considered_uptodate {
            return;
        }

        let mut considered = self.compute_considered_map(ExcludeFlags::APPLY_EXCLUDES);
        match &considered {
            Some(map) => log::debug!("Publishing considered map: {} of {} packages visible", map.count(), self.pool.len()),
            None => log::debug!("Publishing considered map: no restriction"),
        }
        self.pool.swap_considered_map(&mut considered);
        self.considered_uptodate = true;
    }

    /// Query over the published view, publishing first if stale
    pub fn query(&mut self) -> PackageQuery<'_> {
        self.recompute_considered_in_pool();
        PackageQuery::new(&self.pool)
    }

    /// Query over a view composed fresh under `flags`. The published map is
    /// not touched.
    pub fn query_with_flags(&self, flags: ExcludeFlags) -> PackageQuery<'_> {
        let view = self.compute_considered_map(flags);
        PackageQuery::with_view(&self.pool, view.as_ref())
    }
}
