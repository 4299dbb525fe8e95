//! Dense vector backed by a contiguous array.

use crate::delta::SortedDelta;

use super::{values_equal, Element, LengthCache, Vector};

/// Every position stored in a `Vec<f64>`.
#[derive(Clone, Debug, Default)]
pub struct DenseVector {
    values: Vec<f64>,
    length_squared: LengthCache,
}

impl DenseVector {
    /// All-zero vector of dimension `size`.
    pub fn new(size: usize) -> Self {
        Self::from_vec(vec![0.0; size])
    }

    pub fn from_vec(values: Vec<f64>) -> Self {
        Self {
            values,
            length_squared: LengthCache::new(),
        }
    }

    pub fn from_slice(values: &[f64]) -> Self {
        Self::from_vec(values.to_vec())
    }

    /// Copy any vector into dense storage.
    pub fn copy_of<V: Vector + ?Sized>(other: &V) -> Self {
        let mut values = vec![0.0; other.size()];
        for e in other.non_zeroes() {
            values[e.index] = e.value;
        }
        Self::from_vec(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

impl Vector for DenseVector {
    fn size(&self) -> usize {
        self.values.len()
    }

    fn is_dense(&self) -> bool {
        true
    }

    fn is_sequential_access(&self) -> bool {
        true
    }

    fn is_add_constant_time(&self) -> bool {
        true
    }

    fn lookup_cost(&self) -> f64 {
        1.0
    }

    fn iterator_advance_cost(&self) -> f64 {
        1.0
    }

    fn num_nondefault_elements(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn get_quick(&self, index: usize) -> f64 {
        self.values[index]
    }

    #[inline]
    fn set_quick(&mut self, index: usize, value: f64) {
        self.length_squared.invalidate();
        self.values[index] = value;
    }

    fn all(&self) -> Box<dyn Iterator<Item = Element> + '_> {
        Box::new(
            self.values
                .iter()
                .enumerate()
                .map(|(index, &value)| Element::new(index, value)),
        )
    }

    fn non_zeroes(&self) -> Box<dyn Iterator<Item = Element> + '_> {
        Box::new(
            self.values
                .iter()
                .enumerate()
                .filter(|(_, &value)| value != 0.0)
                .map(|(index, &value)| Element::new(index, value)),
        )
    }

    fn for_each_nonzero_mut(&mut self, f: &mut dyn FnMut(usize, &mut f64)) {
        self.length_squared.invalidate();
        for (index, value) in self.values.iter_mut().enumerate() {
            if *value != 0.0 {
                f(index, value);
            }
        }
    }

    fn for_each_mut(&mut self, f: &mut dyn FnMut(usize, &mut f64)) {
        self.length_squared.invalidate();
        for (index, value) in self.values.iter_mut().enumerate() {
            f(index, value);
        }
    }

    fn merge_updates(&mut self, updates: &SortedDelta) {
        self.length_squared.invalidate();
        for (index, value) in updates.iter() {
            self.values[index] = value;
        }
    }

    fn length_cache(&self) -> &LengthCache {
        &self.length_squared
    }

    fn like(&self) -> Box<dyn Vector> {
        Box::new(Self::new(self.size()))
    }

    fn clone_boxed(&self) -> Box<dyn Vector> {
        Box::new(self.clone())
    }
}

impl<V: Vector + ?Sized> PartialEq<V> for DenseVector {
    fn eq(&self, other: &V) -> bool {
        values_equal(self, other)
    }
}

impl From<Vec<f64>> for DenseVector {
    fn from(values: Vec<f64>) -> Self {
        Self::from_vec(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        let v = DenseVector::from_slice(&[0.0, 2.0, 0.0, -1.0]);
        assert!(v.is_dense() && v.is_sequential_access() && v.is_add_constant_time());
        assert_eq!(v.num_nondefault_elements(), 4);
        assert_eq!(v.num_nonzero_elements(), 2);
    }

    #[test]
    fn test_iteration() {
        let v = DenseVector::from_slice(&[0.0, 2.0, 0.0, -1.0]);
        let all: Vec<usize> = v.all().map(|e| e.index).collect();
        assert_eq!(all, vec![0, 1, 2, 3]);
        let nz: Vec<Element> = v.non_zeroes().collect();
        assert_eq!(nz, vec![Element::new(1, 2.0), Element::new(3, -1.0)]);
        assert_eq!(v.next_nonzero_from(2), Some(Element::new(3, -1.0)));
    }

    #[test]
    fn test_mutation_invalidates_cache() {
        let mut v = DenseVector::from_slice(&[1.0, 2.0]);
        v.length_cache().set(5.0);
        v.set_quick(0, 3.0);
        assert_eq!(v.length_cache().get(), None);

        v.length_cache().set(13.0);
        v.for_each_nonzero_mut(&mut |_, x| *x *= 2.0);
        assert_eq!(v.length_cache().get(), None);
        assert_eq!(v.as_slice(), &[6.0, 4.0]);
    }

    #[test]
    fn test_merge_updates_scatters() {
        let mut v = DenseVector::from_slice(&[1.0, 2.0, 3.0]);
        let mut updates = SortedDelta::allowing_defaults();
        updates.set(0, 0.0);
        updates.set(2, 7.0);
        v.merge_updates(&updates);
        assert_eq!(v.as_slice(), &[0.0, 2.0, 7.0]);
    }
}
