use std::fmt;

use sieve_bitmap::Bitmap;

use crate::error::{Result, SackError};
use crate::pool::{PackageId, Pool};

/// A set of package records tied to the pool it was computed against.
///
/// The bitmap is owned, never shared: sets handed out by the sack are
/// snapshots and mutating them does not affect any layer.
#[derive(Clone, PartialEq, Eq)]
pub struct PackageSet {
    pool: u64,
    map: Bitmap,
}

impl PackageSet {
    /// Empty set sized to the pool
    pub fn new(pool: &Pool) -> Self {
        Self {
            pool: pool.id(),
            map: Bitmap::new(pool.nsolvables()),
        }
    }

    pub fn from_ids<I>(pool: &Pool, ids: I) -> Self
    where
        I: IntoIterator<Item = PackageId>,
    {
        let mut set = Self::new(pool);
        for id in ids {
            set.add(id);
        }
        set
    }

    pub(crate) fn from_map(pool: &Pool, mut map: Bitmap) -> Self {
        map.grow(pool.nsolvables());
        map.remove(0);
        Self { pool: pool.id(), map }
    }

    /// Identity of the pool this set belongs to
    pub fn pool_id(&self) -> u64 {
        self.pool
    }

    pub fn len(&self) -> usize {
        self.map.count()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, id: PackageId) -> bool {
        self.map.contains(id)
    }

    /// Insert a record id. Id 0 is reserved and ignored.
    pub fn add(&mut self, id: PackageId) {
        if id > 0 {
            self.map.add_grow(id);
        }
    }

    pub fn remove(&mut self, id: PackageId) {
        self.map.remove(id);
    }

    pub fn iter(&self) -> impl Iterator<Item = PackageId> + '_ {
        self.map.iter().filter(|id| *id > 0)
    }

    pub fn as_map(&self) -> &Bitmap {
        &self.map
    }

    pub fn into_map(self) -> Bitmap {
        self.map
    }

    pub(crate) fn check_pool(&self, pool_id: u64) -> Result<()> {
        if self.pool != pool_id {
            return Err(SackError::DifferentPool {
                expected: pool_id,
                found: self.pool,
            });
        }
        Ok(())
    }

    pub fn union_with(&mut self, other: &PackageSet) -> Result<()> {
        other.check_pool(self.pool)?;
        self.map.union_with(&other.map);
        Ok(())
    }

    pub fn difference_with(&mut self, other: &PackageSet) -> Result<()> {
        other.check_pool(self.pool)?;
        self.map.difference_with(&other.map);
        Ok(())
    }

    pub fn intersect_with(&mut self, other: &PackageSet) -> Result<()> {
        other.check_pool(self.pool)?;
        self.map.intersect_with(&other.map);
        Ok(())
    }
}

impl fmt::Debug for PackageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageSet")
            .field("pool", &self.pool)
            .field("ids", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}
