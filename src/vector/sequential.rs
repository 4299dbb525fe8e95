//! Sparse vector backed by a sorted delta.

use crate::delta::SortedDelta;
use crate::error::{Result, VectorError};

use super::{values_equal, Element, LengthCache, Vector};

/// Nonzeros stored in ascending index order in a [`SortedDelta`].
///
/// Iteration is sequential and cheap; random lookups binary-search and
/// inserting a new nonzero in the middle shifts the tail.
#[derive(Clone, Debug)]
pub struct SequentialAccessSparseVector {
    size: usize,
    values: SortedDelta,
    length_squared: LengthCache,
}

impl SequentialAccessSparseVector {
    /// Empty vector of dimension `size`.
    pub fn new(size: usize) -> Self {
        Self::from_delta(size, SortedDelta::new())
    }

    /// Empty vector with room for `nonzeros` entries.
    pub fn with_capacity(size: usize, nonzeros: usize) -> Self {
        Self::from_delta(size, SortedDelta::with_capacity(nonzeros))
    }

    /// Build from `(index, value)` pairs in any order. Later pairs win.
    pub fn from_pairs(size: usize, pairs: impl IntoIterator<Item = (usize, f64)>) -> Result<Self> {
        let mut v = Self::new(size);
        for (index, value) in pairs {
            VectorError::check_index(index, size)?;
            v.values.set(index, value);
        }
        Ok(v)
    }

    pub fn from_slice(values: &[f64]) -> Self {
        let nonzeros = values
            .iter()
            .enumerate()
            .filter(|(_, &value)| value != 0.0)
            .map(|(index, &value)| (index, value));
        Self::from_delta(values.len(), SortedDelta::from_pairs(nonzeros))
    }

    /// Copy the nonzeros of any vector, sorting them if needed.
    pub fn copy_of<V: Vector + ?Sized>(other: &V) -> Self {
        let mut pairs: Vec<(usize, f64)> = other.non_zeroes().map(|e| (e.index, e.value)).collect();
        if !other.is_sequential_access() {
            pairs.sort_unstable_by_key(|&(index, _)| index);
        }
        Self::from_delta(other.size(), SortedDelta::from_pairs(pairs))
    }

    fn from_delta(size: usize, values: SortedDelta) -> Self {
        Self {
            size,
            values,
            length_squared: LengthCache::new(),
        }
    }

    /// The underlying sorted entries.
    pub fn delta(&self) -> &SortedDelta {
        &self.values
    }
}

impl Vector for SequentialAccessSparseVector {
    fn size(&self) -> usize {
        self.size
    }

    fn is_dense(&self) -> bool {
        false
    }

    fn is_sequential_access(&self) -> bool {
        true
    }

    fn is_add_constant_time(&self) -> bool {
        false
    }

    /// Binary search depth.
    fn lookup_cost(&self) -> f64 {
        (self.values.len() as f64).log2().round().max(1.0)
    }

    fn iterator_advance_cost(&self) -> f64 {
        1.0
    }

    fn num_nondefault_elements(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn get_quick(&self, index: usize) -> f64 {
        self.values.get(index)
    }

    fn set_quick(&mut self, index: usize, value: f64) {
        self.length_squared.invalidate();
        self.values.set(index, value);
    }

    fn increment_quick(&mut self, index: usize, delta: f64) {
        self.length_squared.invalidate();
        self.values.increment(index, delta);
    }

    fn all(&self) -> Box<dyn Iterator<Item = Element> + '_> {
        let mut entries = self.values.iter().peekable();
        Box::new((0..self.size).map(move |index| {
            let value = entries
                .next_if(|&(i, _)| i == index)
                .map_or(0.0, |(_, value)| value);
            Element::new(index, value)
        }))
    }

    fn non_zeroes(&self) -> Box<dyn Iterator<Item = Element> + '_> {
        Box::new(
            self.values
                .iter()
                .filter(|&(_, value)| value != 0.0)
                .map(|(index, value)| Element::new(index, value)),
        )
    }

    fn next_nonzero_from(&self, from: usize) -> Option<Element> {
        let start = self.values.first_at_or_after(from);
        self.values
            .iter()
            .skip(start)
            .find(|&(_, value)| value != 0.0)
            .map(|(index, value)| Element::new(index, value))
    }

    fn for_each_nonzero_mut(&mut self, f: &mut dyn FnMut(usize, &mut f64)) {
        self.length_squared.invalidate();
        let indices = self.values.indices().to_vec();
        for (index, value) in indices.into_iter().zip(self.values.values_mut()) {
            f(index, value);
        }
        self.values.retain_nonzero();
    }

    fn merge_updates(&mut self, updates: &SortedDelta) {
        self.length_squared.invalidate();
        self.values.merge(updates);
    }

    fn length_cache(&self) -> &LengthCache {
        &self.length_squared
    }

    fn like(&self) -> Box<dyn Vector> {
        Box::new(Self::new(self.size))
    }

    fn clone_boxed(&self) -> Box<dyn Vector> {
        Box::new(self.clone())
    }
}

impl<V: Vector + ?Sized> PartialEq<V> for SequentialAccessSparseVector {
    fn eq(&self, other: &V) -> bool {
        values_equal(self, other)
    }
}
