//! Sparse vector backed by an open-addressing hash map.

use crate::delta::SortedDelta;
use crate::error::Result;
use crate::map::{HashConfig, OpenHashMap};

use super::{values_equal, Element, LengthCache, Vector};

/// Nonzero capacity reserved by [`RandomAccessSparseVector::new`].
const INITIAL_NONZEROS: usize = 11;

/// Nonzeros stored by index in an [`OpenHashMap`].
///
/// O(1) lookup and insertion; iteration visits nonzeros in slot order, so
/// it is not sequential.
#[derive(Clone, Debug)]
pub struct RandomAccessSparseVector {
    size: usize,
    values: OpenHashMap<usize, f64>,
    length_squared: LengthCache,
}

impl RandomAccessSparseVector {
    /// Empty vector of dimension `size`.
    pub fn new(size: usize) -> Self {
        let capacity = INITIAL_NONZEROS.min(size);
        Self::from_map(size, OpenHashMap::with_capacity(capacity).unwrap_or_default())
    }

    /// Empty vector with room for `nonzeros` entries before the first rehash.
    pub fn with_capacity(size: usize, nonzeros: usize) -> Result<Self> {
        Ok(Self::from_map(size, OpenHashMap::with_capacity(nonzeros)?))
    }

    /// Empty vector whose map uses the given sizing policy.
    pub fn with_config(size: usize, config: HashConfig) -> Result<Self> {
        Ok(Self::from_map(size, OpenHashMap::with_config(config)?))
    }

    /// Build from `(index, value)` pairs. Later pairs win; zeros are skipped.
    pub fn from_pairs(size: usize, pairs: impl IntoIterator<Item = (usize, f64)>) -> Result<Self> {
        let mut v = Self::new(size);
        for (index, value) in pairs {
            v.set(index, value)?;
        }
        Ok(v)
    }

    pub fn from_slice(values: &[f64]) -> Self {
        let mut v = Self::new(values.len());
        for (index, &value) in values.iter().enumerate() {
            if value != 0.0 {
                v.values.put(index, value);
            }
        }
        v
    }

    /// Copy the nonzeros of any vector.
    pub fn copy_of<V: Vector + ?Sized>(other: &V) -> Self {
        let nonzeros = other.num_nondefault_elements();
        let map = OpenHashMap::with_capacity(nonzeros).unwrap_or_default();
        let mut v = Self::from_map(other.size(), map);
        for e in other.non_zeroes() {
            v.values.put(e.index, e.value);
        }
        v
    }

    fn from_map(size: usize, values: OpenHashMap<usize, f64>) -> Self {
        Self {
            size,
            values,
            length_squared: LengthCache::new(),
        }
    }
}

impl Vector for RandomAccessSparseVector {
    fn size(&self) -> usize {
        self.size
    }

    fn is_dense(&self) -> bool {
        false
    }

    fn is_sequential_access(&self) -> bool {
        false
    }

    fn is_add_constant_time(&self) -> bool {
        true
    }

    fn lookup_cost(&self) -> f64 {
        1.0
    }

    /// Walking the slot array also passes over free and removed slots.
    fn iterator_advance_cost(&self) -> f64 {
        1.0 + (self.values.min_load_factor() + self.values.max_load_factor()) / 2.0
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
        if value == 0.0 {
            self.values.remove(index);
        } else {
            self.values.put(index, value);
        }
    }

    fn increment_quick(&mut self, index: usize, delta: f64) {
        self.length_squared.invalidate();
        if self.values.adjust_or_put_value(index, delta, delta) == 0.0 {
            self.values.remove(index);
        }
    }

    fn all(&self) -> Box<dyn Iterator<Item = Element> + '_> {
        Box::new((0..self.size).map(|index| Element::new(index, self.values.get(index))))
    }

    fn non_zeroes(&self) -> Box<dyn Iterator<Item = Element> + '_> {
        Box::new(
            self.values
                .iter()
                .filter(|&(_, value)| value != 0.0)
                .map(|(index, value)| Element::new(index, value)),
        )
    }

    fn for_each_nonzero_mut(&mut self, f: &mut dyn FnMut(usize, &mut f64)) {
        self.length_squared.invalidate();
        self.values.for_each_value_mut(|index, value| f(index, value));
        self.values.retain(|_, value| value != 0.0);
    }

    fn merge_updates(&mut self, updates: &SortedDelta) {
        self.length_squared.invalidate();
        for (index, value) in updates.iter() {
            if value == 0.0 {
                self.values.remove(index);
            } else {
                self.values.put(index, value);
            }
        }
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

impl<V: Vector + ?Sized> PartialEq<V> for RandomAccessSparseVector {
    fn eq(&self, other: &V) -> bool {
        values_equal(self, other)
    }
}
