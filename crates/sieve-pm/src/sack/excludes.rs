use sieve_bitmap::Bitmap;

use crate::config::Config;
use crate::exclude_flags::ExcludeFlags;
use crate::query::{PackageQuery, ResolveSpecSettings};

use super::PackageSack;

/// Matches of a list of patterns within one query
struct Resolved {
    map: Bitmap,
    found: bool,
}

fn resolve_patterns(base: &PackageQuery<'_>, patterns: &[String], settings: &ResolveSpecSettings) -> Resolved {
    let mut map = Bitmap::new(base.pool().nsolvables());
    let mut found = false;
    for pattern in patterns {
        let mut query = base.clone();
        let (matched, _) = query.resolve_pkg_spec(pattern, settings);
        if matched {
            map.union_with(query.as_set().as_map());
            found = true;
        } else {
            log::debug!("Pattern \"{}\" matched no packages", pattern);
        }
    }
    Resolved { map, found }
}

impl PackageSack {
    /// Rebuild the package exclude and include layers from configuration.
    ///
    /// Repository sections are evaluated first (skipped when `only_main` is
    /// set), then the main section, whose rules can mask repository ones.
    /// Patterns are resolved with package excludes and module excludes
    /// ignored, so previous layers never hide what a rule should match.
    /// Repository sections of `config` first set the enabled state of their
    /// repositories (see [`PackageSack::apply_repo_sections`]); records of
    /// disabled repositories stay hidden and their patterns are skipped.
    ///
    /// `use_includes` is recomputed for every repository: it is set where the
    /// repository has include patterns, and everywhere when the main section
    /// has include patterns.
    pub fn setup_excludes_includes(&mut self, config: &Config, only_main: bool) {
        self.apply_repo_sections(config);
        self.considered_uptodate = false;

        if config.disables_all_excludes() {
            log::debug!("All excludes disabled by configuration");
            self.pkg_excludes = None;
            self.pkg_includes = None;
            return;
        }

        for repo in self.pool.repos_mut() {
            repo.set_use_includes(false);
        }

        let settings = ResolveSpecSettings::nevra_only();
        let mut includes = Bitmap::new(self.pool.nsolvables());
        let mut excludes = Bitmap::new(self.pool.nsolvables());
        let mut includes_used = false;
        let mut excludes_exist = false;
        let mut opted_in = Vec::new();

        if !only_main {
            let base = self.query_with_flags(ExcludeFlags::IGNORE_EXCLUDES);
            for (id, repo) in self.pool.repos().iter().enumerate() {
                if !repo.is_enabled() {
                    continue;
                }
                if config.disables_repo_excludes(repo.id()) {
                    log::debug!("Excludes disabled for repository {}", repo.id());
                    continue;
                }

                let repo_config = config.repo(repo.id()).unwrap_or_else(|| repo.config());
                if !repo_config.includepkgs.is_empty() {
                    opted_in.push(id);
                    includes_used = true;
                }

                let mut repo_query = base.clone();
                repo_query.filter_repo_id(repo.id());

                let repo_includes = resolve_patterns(&repo_query, &repo_config.includepkgs, &settings);
                let repo_excludes = resolve_patterns(&repo_query, &repo_config.excludepkgs, &settings);
                log::debug!(
                    "Repository {}: {} included, {} excluded",
                    repo.id(),
                    repo_includes.map.count(),
                    repo_excludes.map.count()
                );

                includes.union_with(&repo_includes.map);
                if repo_excludes.found {
                    excludes.union_with(&repo_excludes.map);
                    excludes_exist = true;
                }
            }
        }

        if !config.disables_main_excludes() {
            let base = self.query_with_flags(ExcludeFlags::IGNORE_EXCLUDES);
            let main_includes = resolve_patterns(&base, &config.includepkgs, &settings);
            let main_excludes = resolve_patterns(&base, &config.excludepkgs, &settings);
            log::debug!(
                "Main configuration: {} included, {} excluded",
                main_includes.map.count(),
                main_excludes.map.count()
            );

            includes.union_with(&main_includes.map);
            if main_excludes.found {
                excludes.union_with(&main_excludes.map);
                excludes_exist = true;
            }

            if !config.includepkgs.is_empty() {
                opted_in = (0..self.pool.repos().len()).collect();
                includes_used = true;
            }
        } else {
            log::debug!("Main excludes disabled by configuration");
        }

        for id in opted_in {
            if let Some(repo) = self.pool.repo_mut(id) {
                repo.set_use_includes(true);
            }
        }

        self.pkg_includes = includes_used.then_some(includes);
        self.pkg_excludes = excludes_exist.then_some(excludes);
    }

    /// Enable or disable repositories as their configuration sections say.
    /// Sections naming no registered repository are ignored.
    pub fn apply_repo_sections(&mut self, config: &Config) {
        for (repo_id, section) in &config.repos {
            let Some(id) = self.pool.repo_id(repo_id) else {
                log::debug!("Configuration section for unknown repository {} ignored", repo_id);
                continue;
            };
            if let Some(repo) = self.pool.repo_mut(id) {
                if repo.is_enabled() != section.enabled {
                    repo.set_enabled(section.enabled);
                    self.considered_uptodate = false;
                }
            }
        }
    }
}
