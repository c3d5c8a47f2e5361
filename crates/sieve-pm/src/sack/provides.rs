use std::ops::{Deref, DerefMut};

use sieve_bitmap::Bitmap;

use crate::error::Result;
use crate::pool::Pool;

use super::PackageSack;

/// Scoped unrestricted view of a pool.
///
/// Swaps the published considered map out on creation and swaps it back on
/// drop, so the previous view is restored on every exit path, including
/// early returns through `?`.
struct UnrestrictedView<'a> {
    pool: &'a mut Pool,
    saved: Option<Bitmap>,
}

impl<'a> UnrestrictedView<'a> {
    fn new(pool: &'a mut Pool) -> Self {
        let mut saved = None;
        pool.swap_considered_map(&mut saved);
        Self { pool, saved }
    }
}

impl Deref for UnrestrictedView<'_> {
    type Target = Pool;

    fn deref(&self) -> &Pool {
        &*self.pool
    }
}

impl DerefMut for UnrestrictedView<'_> {
    fn deref_mut(&mut self) -> &mut Pool {
        &mut *self.pool
    }
}

impl Drop for UnrestrictedView<'_> {
    fn drop(&mut self) {
        self.pool.swap_considered_map(&mut self.saved);
    }
}

impl PackageSack {
    /// Build the provides index over every record of the pool.
    ///
    /// Runs at most once until [`PackageSack::invalidate_provides`] or
    /// [`PackageSack::pool_mut`] re-arms it. The considered map is bypassed
    /// while the index is built and restored afterwards, also when a solv
    /// cache write fails.
    pub fn make_provides_ready(&mut self) -> Result<()> {
        if self.provides_ready {
            return Ok(());
        }

        {
            let mut pool = UnrestrictedView::new(&mut self.pool);

            pool.internalize_repos();
            let added = pool.add_file_provides();
            log::debug!(
                "Found {} file provides for installed packages, {} for available packages",
                added.installed.len(),
                added.available.len()
            );

            let installed = pool.installed();
            for repo in 0..pool.repos().len() {
                let files = if Some(repo) == installed {
                    &added.installed
                } else {
                    &added.available
                };
                if files.is_empty() {
                    continue;
                }
                pool.rewrite_repo(repo, files)?;
            }

            pool.create_whatprovides();
        }

        self.provides_ready = true;
        Ok(())
    }

    /// Force the next [`PackageSack::make_provides_ready`] to rebuild
    pub fn invalidate_provides(&mut self) {
        self.provides_ready = false;
    }
}
