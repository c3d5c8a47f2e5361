//! Growable bitmap over package ids.
//!
//! A [`Bitmap`] holds one bit per package id in the range `0..capacity`. It is
//! the substrate for every visibility layer of the package sack: exclude and
//! include sets, disabled-repository sets, modular exclusions and the
//! published considered map are all bitmaps.
//!
//! All set operations are total. Operands of different capacities are allowed;
//! the narrower one is treated as zero-extended.

use std::fmt;

const WORD_BITS: usize = 64;

#[inline]
fn words_for(capacity: usize) -> usize {
    capacity.div_ceil(WORD_BITS)
}

/// A bit per package id, 0-indexed, growable.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Bitmap {
    capacity: usize,
    words: Vec<u64>,
}

impl Bitmap {
    /// Create an empty bitmap able to hold ids `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            words: vec![0; words_for(capacity)],
        }
    }

    /// Create a bitmap with every id in `0..capacity` set.
    pub fn full(capacity: usize) -> Self {
        let mut map = Self::new(capacity);
        map.set_all();
        map
    }

    /// Number of ids this bitmap can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Grow to hold ids `0..capacity`.
    ///
    /// Never shrinks. New bits start cleared and existing bits are kept.
    pub fn grow(&mut self, capacity: usize) {
        if capacity <= self.capacity {
            return;
        }
        self.words.resize(words_for(capacity), 0);
        self.capacity = capacity;
    }

    /// Set every bit below the current capacity.
    pub fn set_all(&mut self) {
        for word in &mut self.words {
            *word = u64::MAX;
        }
        self.mask_tail();
    }

    /// Clear every bit, keeping the capacity.
    pub fn clear(&mut self) {
        for word in &mut self.words {
            *word = 0;
        }
    }

    /// Insert `id`.
    ///
    /// The caller must have grown the bitmap so that `id < capacity`; hot
    /// loops grow once up front and then insert without per-call checks.
    /// Release builds do not check this.
    #[inline]
    pub fn add(&mut self, id: usize) {
        debug_assert!(
            id < self.capacity,
            "id {} out of bitmap capacity {}",
            id,
            self.capacity
        );
        self.words[id / WORD_BITS] |= 1u64 << (id % WORD_BITS);
    }

    /// Insert `id`, growing first if needed.
    pub fn add_grow(&mut self, id: usize) {
        if id >= self.capacity {
            self.grow(id + 1);
        }
        self.add(id);
    }

    /// Remove `id`. Ids outside the capacity are already absent.
    #[inline]
    pub fn remove(&mut self, id: usize) {
        if id < self.capacity {
            self.words[id / WORD_BITS] &= !(1u64 << (id % WORD_BITS));
        }
    }

    /// Test membership. Ids beyond the capacity are never members.
    #[inline]
    pub fn contains(&self, id: usize) -> bool {
        id < self.capacity && self.words[id / WORD_BITS] & (1u64 << (id % WORD_BITS)) != 0
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// True if no bit is set.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// `self ∪= other`. Grows `self` when `other` is wider.
    pub fn union_with(&mut self, other: &Bitmap) {
        if other.capacity > self.capacity {
            self.grow(other.capacity);
        }
        for (dst, src) in self.words.iter_mut().zip(&other.words) {
            *dst |= *src;
        }
    }

    /// `self −= other`.
    pub fn difference_with(&mut self, other: &Bitmap) {
        for (dst, src) in self.words.iter_mut().zip(&other.words) {
            *dst &= !*src;
        }
    }

    /// `self ∩= other`. Bits beyond `other`'s capacity are cleared.
    pub fn intersect_with(&mut self, other: &Bitmap) {
        let shared = self.words.len().min(other.words.len());
        for (dst, src) in self.words[..shared].iter_mut().zip(&other.words) {
            *dst &= *src;
        }
        for word in &mut self.words[shared..] {
            *word = 0;
        }
    }

    /// Iterate over the set ids in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            words: &self.words,
            index: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    fn mask_tail(&mut self) {
        let rem = self.capacity % WORD_BITS;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("capacity", &self.capacity)
            .field("ids", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

impl FromIterator<usize> for Bitmap {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut map = Bitmap::new(0);
        for id in iter {
            map.add_grow(id);
        }
        map
    }
}

impl<'a> IntoIterator for &'a Bitmap {
    type Item = usize;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over the ids set in a [`Bitmap`].
pub struct Iter<'a> {
    words: &'a [u64],
    index: usize,
    current: u64,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                // clear lowest set bit
                self.current &= self.current - 1;
                return Some(self.index * WORD_BITS + bit);
            }
            self.index += 1;
            self.current = *self.words.get(self.index)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(map: &Bitmap) -> Vec<usize> {
        map.iter().collect()
    }

    #[test]
    fn test_new_is_empty() {
        let map = Bitmap::new(130);
        assert_eq!(map.capacity(), 130);
        assert_eq!(map.count(), 0);
        assert!(map.is_empty());
        assert!(!map.contains(0));
        assert!(!map.contains(500));
    }

    #[test]
    fn test_set_all_respects_capacity() {
        let mut map = Bitmap::new(70);
        map.set_all();
        assert_eq!(map.count(), 70);
        assert!(map.contains(69));
        assert!(!map.contains(70));

        // growing after set_all must not expose the masked tail
        map.grow(128);
        assert_eq!(map.count(), 70);
        assert!(!map.contains(70));
        assert!(!map.contains(127));
    }

    #[test]
    fn test_grow_keeps_bits_and_never_shrinks() {
        let mut map = Bitmap::new(10);
        map.add(3);
        map.add(9);
        map.grow(200);
        assert_eq!(map.capacity(), 200);
        assert_eq!(ids(&map), vec![3, 9]);

        map.grow(5);
        assert_eq!(map.capacity(), 200);
        assert_eq!(ids(&map), vec![3, 9]);
    }

    #[test]
    fn test_add_remove_contains() {
        let mut map = Bitmap::new(64);
        map.add(0);
        map.add(63);
        assert!(map.contains(0));
        assert!(map.contains(63));
        map.remove(0);
        map.remove(1000);
        assert!(!map.contains(0));
        assert_eq!(map.count(), 1);
    }

    #[test]
    fn test_add_grow() {
        let mut map = Bitmap::new(0);
        map.add_grow(150);
        assert!(map.capacity() > 150);
        assert!(map.contains(150));
    }

    #[test]
    fn test_union_with_wider_operand() {
        let mut a: Bitmap = [1, 2].into_iter().collect();
        let b: Bitmap = [2, 100].into_iter().collect();
        a.union_with(&b);
        assert_eq!(ids(&a), vec![1, 2, 100]);
        assert!(a.capacity() >= 101);
    }

    #[test]
    fn test_difference_with_mixed_capacities() {
        let mut a: Bitmap = [1, 5, 80].into_iter().collect();
        let narrow: Bitmap = [5].into_iter().collect();
        a.difference_with(&narrow);
        assert_eq!(ids(&a), vec![1, 80]);

        let mut small: Bitmap = [1, 2].into_iter().collect();
        let wide: Bitmap = [2, 300].into_iter().collect();
        small.difference_with(&wide);
        assert_eq!(ids(&small), vec![1]);
    }

    #[test]
    fn test_intersect_with_narrower_operand_clears_tail() {
        let mut a: Bitmap = [1, 2, 90, 200].into_iter().collect();
        let b: Bitmap = [2, 3].into_iter().collect();
        a.intersect_with(&b);
        assert_eq!(ids(&a), vec![2]);
    }

    #[test]
    fn test_iter_crosses_word_boundaries() {
        let map: Bitmap = [0, 63, 64, 127, 128, 1000].into_iter().collect();
        assert_eq!(ids(&map), vec![0, 63, 64, 127, 128, 1000]);
        assert_eq!(map.count(), 6);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut map = Bitmap::full(40);
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.capacity(), 40);
    }

    #[test]
    fn test_debug_lists_ids() {
        let map: Bitmap = [4, 7].into_iter().collect();
        let out = format!("{:?}", map);
        assert!(out.contains("[4, 7]"));
    }
}
