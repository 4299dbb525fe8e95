//! Sorted delta buffers.
//!
//! A [`SortedDelta`] is a growable pair of parallel arrays holding
//! `(index, value)` entries with strictly increasing indices. It backs the
//! sequential sparse vector and doubles as the staging area for updates to
//! representations that cannot insert in O(1): a strategy records its
//! results here in one pass and the target folds them in with a single
//! linear [`merge`](SortedDelta::merge).
//!
//! In no-default mode (the default) a value equal to `0.0` is never stored:
//! writing zero deletes the entry. Staging buffers are created with
//! [`SortedDelta::allowing_defaults`] so that a zero result can override a
//! stored value when merged.

use itertools::Itertools;

use crate::error::{Result, VectorError};

/// Initial capacity of [`SortedDelta::new`].
pub const DEFAULT_CAPACITY: usize = 11;

/// The implied value of every absent index.
pub const DEFAULT_VALUE: f64 = 0.0;

/// Sorted `(index, value)` entries with binary-search lookup.
#[derive(Clone, Debug)]
pub struct SortedDelta {
    indices: Vec<usize>,
    values: Vec<f64>,
    /// If true, `DEFAULT_VALUE` is never stored
    no_default: bool,
}

impl SortedDelta {
    /// Create an empty no-default delta.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty no-default delta with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            indices: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            no_default: true,
        }
    }

    /// Create an empty delta that stores zeros like any other value.
    pub fn allowing_defaults() -> Self {
        Self {
            no_default: false,
            ..Self::new()
        }
    }

    /// Build a no-default delta from entries in any order; later entries win.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (usize, f64)>) -> Self {
        let mut delta = Self::new();
        for (index, value) in pairs {
            delta.set(index, value);
        }
        delta
    }

    /// Build from parallel arrays that must already be strictly increasing.
    pub fn from_sorted(indices: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(VectorError::InvalidArgument(format!(
                "{} indices but {} values",
                indices.len(),
                values.len()
            )));
        }
        if let Some(w) = indices.windows(2).find(|w| w[0] >= w[1]) {
            return Err(VectorError::InvalidArgument(format!(
                "indices not strictly increasing at {} -> {}",
                w[0], w[1]
            )));
        }
        let mut delta = Self {
            indices,
            values,
            no_default: true,
        };
        delta.retain_nonzero();
        Ok(delta)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.indices.capacity()
    }

    pub fn is_no_default(&self) -> bool {
        self.no_default
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Stored values, for in-place rewriting. Indices stay fixed.
    ///
    /// Writing zero here leaves a stored default behind; call
    /// [`retain_nonzero`](Self::retain_nonzero) afterwards in no-default mode.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Entries in ascending index order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// `Ok(position)` of `index`, or `Err(insertion point)`.
    #[inline]
    pub fn find(&self, index: usize) -> std::result::Result<usize, usize> {
        self.indices.binary_search(&index)
    }

    /// Position of the first entry whose index is `>= index`.
    #[inline]
    pub fn first_at_or_after(&self, index: usize) -> usize {
        self.indices.partition_point(|&i| i < index)
    }

    /// Value at `index`, or [`DEFAULT_VALUE`].
    pub fn get(&self, index: usize) -> f64 {
        match self.find(index) {
            Ok(pos) => self.values[pos],
            Err(_) => DEFAULT_VALUE,
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Ensure room for `capacity` entries without further allocation.
    pub fn grow_to(&mut self, capacity: usize) {
        if capacity > self.indices.capacity() {
            let additional = capacity - self.indices.len();
            self.indices.reserve_exact(additional);
            self.values.reserve_exact(additional);
        }
    }

    /// Grow by a factor of 1.2 (at least one entry) when full.
    fn reserve_one(&mut self) {
        let len = self.len();
        if len >= self.indices.capacity() {
            self.grow_to(((1.2 * len as f64) as usize).max(len + 1));
        }
    }

    #[inline]
    fn is_dropped(&self, value: f64) -> bool {
        self.no_default && value == DEFAULT_VALUE
    }

    /// Store `value` at `index`.
    ///
    /// Appending past the current maximum index is O(1); anything else
    /// binary-searches and may shift entries. In no-default mode a zero
    /// removes the entry.
    pub fn set(&mut self, index: usize, value: f64) {
        let appends = self.indices.last().map_or(true, |&last| index > last);
        if appends {
            if !self.is_dropped(value) {
                self.reserve_one();
                self.indices.push(index);
                self.values.push(value);
            }
            return;
        }

        match self.find(index) {
            Ok(pos) => self.update_at(pos, value),
            Err(pos) => self.insert_at(pos, index, value),
        }
    }

    /// Add `delta` to the value at `index`.
    pub fn increment(&mut self, index: usize, delta: f64) {
        match self.find(index) {
            Ok(pos) => {
                let value = self.values[pos] + delta;
                self.update_at(pos, value);
            }
            Err(pos) => self.insert_at(pos, index, delta),
        }
    }

    fn update_at(&mut self, pos: usize, value: f64) {
        if self.is_dropped(value) {
            self.indices.remove(pos);
            self.values.remove(pos);
        } else {
            self.values[pos] = value;
        }
    }

    fn insert_at(&mut self, pos: usize, index: usize, value: f64) {
        if !self.is_dropped(value) {
            self.reserve_one();
            self.indices.insert(pos, index);
            self.values.insert(pos, value);
        }
    }

    /// Drop every stored zero, keeping order.
    pub fn retain_nonzero(&mut self) {
        let mut kept = 0;
        for read in 0..self.len() {
            if self.values[read] != DEFAULT_VALUE {
                self.indices[kept] = self.indices[read];
                self.values[kept] = self.values[read];
                kept += 1;
            }
        }
        self.indices.truncate(kept);
        self.values.truncate(kept);
    }

    pub fn clear(&mut self) {
        self.indices.clear();
        self.values.clear();
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// Fold `updates` into `self` in one linear pass.
    ///
    /// The result is the sorted union of both index sets; where both hold an
    /// index the value from `updates` wins. In no-default mode an incoming
    /// zero deletes the index.
    pub fn merge(&mut self, updates: &SortedDelta) {
        self.merge_entries(&updates.indices, &updates.values);
    }

    /// Merge only the entries `updates[from..=to]`.
    ///
    /// The range is checked before anything is copied.
    pub fn merge_range(&mut self, updates: &SortedDelta, from: usize, to: usize) -> Result<()> {
        if from > to || to >= updates.len() {
            return Err(VectorError::InvalidRange {
                from,
                to,
                len: updates.len(),
            });
        }
        self.merge_entries(&updates.indices[from..=to], &updates.values[from..=to]);
        Ok(())
    }

    fn merge_entries(&mut self, other_indices: &[usize], other_values: &[f64]) {
        if other_indices.is_empty() {
            return;
        }
        let total = self.len() + other_indices.len();
        let capacity = ((1.2 * total as f64) as usize).max(total + 1);
        let mut indices = Vec::with_capacity(capacity);
        let mut values = Vec::with_capacity(capacity);

        let ours = self.indices.iter().zip(self.values.iter());
        let theirs = other_indices.iter().zip(other_values.iter());
        let merged = ours.merge_join_by(theirs, |a: &(&usize, &f64), b: &(&usize, &f64)| {
            a.0.cmp(b.0)
        });

        for entry in merged {
            // an update replaces the entry it collides with
            let (&index, &value) = entry.reduce(|_, theirs| theirs);
            if self.is_dropped(value) {
                continue;
            }
            indices.push(index);
            values.push(value);
        }

        self.indices = indices;
        self.values = values;
    }
}

impl Default for SortedDelta {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for SortedDelta {
    fn eq(&self, other: &Self) -> bool {
        self.indices == other.indices && self.values == other.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(entries: &[(usize, f64)]) -> SortedDelta {
        SortedDelta::from_pairs(entries.iter().copied())
    }

    #[test]
    fn test_merge_prefers_updates() {
        let mut a = delta(&[(1, 10.0), (3, 30.0), (5, 50.0)]);
        let b = delta(&[(2, 20.0), (3, 33.0), (4, 44.0)]);
        a.merge(&b);
        assert_eq!(a.indices(), &[1, 2, 3, 4, 5]);
        assert_eq!(a.values(), &[10.0, 20.0, 33.0, 44.0, 50.0]);
    }

    #[test]
    fn test_merge_zero_update_deletes() {
        let mut a = delta(&[(1, 1.0), (2, 2.0)]);
        let mut updates = SortedDelta::allowing_defaults();
        updates.set(1, 0.0);
        updates.set(7, 0.0);
        assert_eq!(updates.len(), 2);
        a.merge(&updates);
        assert_eq!(a.indices(), &[2]);
    }

    #[test]
    fn test_set_paths() {
        let mut d = SortedDelta::with_capacity(0);
        d.set(4, 4.0); // append
        d.set(9, 9.0); // append
        d.set(1, 1.0); // shift insert at front
        d.set(6, 6.0); // shift insert in the middle
        d.set(4, 40.0); // overwrite
        assert_eq!(d.indices(), &[1, 4, 6, 9]);
        assert_eq!(d.values(), &[1.0, 40.0, 6.0, 9.0]);

        d.set(6, 0.0); // delete
        d.set(3, 0.0); // zero for an absent index is a no-op
        d.set(100, 0.0);
        assert_eq!(d.indices(), &[1, 4, 9]);
        assert_eq!(d.get(6), 0.0);
        assert_eq!(d.get(9), 9.0);
    }

    #[test]
    fn test_growth_is_at_least_one() {
        let mut d = SortedDelta::with_capacity(0);
        assert_eq!(d.capacity(), 0);
        for i in 0..50 {
            d.set(i, 1.0);
            assert!(d.capacity() >= d.len());
        }
        assert_eq!(d.len(), 50);
    }

    #[test]
    fn test_allowing_defaults_keeps_zeros() {
        let mut d = SortedDelta::allowing_defaults();
        d.set(2, 0.0);
        d.set(1, 0.0);
        assert_eq!(d.indices(), &[1, 2]);
        d.increment(2, 0.0);
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn test_increment() {
        let mut d = delta(&[(3, 1.0)]);
        d.increment(3, 2.0);
        d.increment(1, 5.0);
        assert_eq!(d.get(3), 3.0);
        assert_eq!(d.get(1), 5.0);
        d.increment(3, -3.0);
        assert_eq!(d.indices(), &[1]);
    }

    #[test]
    fn test_merge_range() {
        let updates = delta(&[(0, 1.0), (2, 2.0), (4, 4.0), (6, 6.0)]);

        let mut d = delta(&[(3, 3.0)]);
        d.merge_range(&updates, 1, 2).unwrap();
        assert_eq!(d.indices(), &[2, 3, 4]);

        let before = d.clone();
        assert_eq!(
            d.merge_range(&updates, 3, 2),
            Err(VectorError::InvalidRange { from: 3, to: 2, len: 4 })
        );
        assert!(d.merge_range(&updates, 0, 4).is_err());
        assert_eq!(d, before);
    }

    #[test]
    fn test_from_sorted_validates() {
        assert!(SortedDelta::from_sorted(vec![1, 1], vec![1.0, 2.0]).is_err());
        assert!(SortedDelta::from_sorted(vec![2, 1], vec![1.0, 2.0]).is_err());
        assert!(SortedDelta::from_sorted(vec![1], vec![]).is_err());
        let d = SortedDelta::from_sorted(vec![1, 2, 5], vec![1.0, 0.0, 5.0]).unwrap();
        assert_eq!(d.indices(), &[1, 5]);
    }

    #[test]
    fn test_seek() {
        let d = delta(&[(2, 1.0), (5, 1.0), (9, 1.0)]);
        assert_eq!(d.first_at_or_after(0), 0);
        assert_eq!(d.first_at_or_after(5), 1);
        assert_eq!(d.first_at_or_after(6), 2);
        assert_eq!(d.first_at_or_after(10), 3);
        assert_eq!(d.find(9), Ok(2));
        assert_eq!(d.find(3), Err(1));
    }
}
