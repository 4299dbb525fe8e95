//! Numeric vectors and their capability contract.
//!
//! Three representations share the [`Vector`] trait:
//!
//! - [`DenseVector`]: a contiguous array holding every position
//! - [`RandomAccessSparseVector`]: nonzeros in an [`OpenHashMap`](crate::map::OpenHashMap)
//! - [`SequentialAccessSparseVector`]: nonzeros in a [`SortedDelta`]
//!
//! Beyond element access, each representation reports the handful of
//! capabilities the dispatcher prices strategies with: whether iteration is
//! ordered, whether inserting a new nonzero is O(1), and rough costs for a
//! lookup and for advancing an iterator.
//!
//! Elementwise arithmetic lives in [`VectorOps`], which every `Vector`
//! gets for free.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::delta::SortedDelta;
use crate::error::{Result, VectorError};

mod dense;
mod ops;
mod random_access;
mod sequential;

pub use dense::DenseVector;
pub use ops::VectorOps;
pub use random_access::RandomAccessSparseVector;
pub use sequential::SequentialAccessSparseVector;

/// A position and its value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Element {
    pub index: usize,
    pub value: f64,
}

impl Element {
    pub fn new(index: usize, value: f64) -> Self {
        Self { index, value }
    }
}

// ============================================================================
// LENGTH CACHE
// ============================================================================

/// Bit pattern marking an empty cache. Never produced by arithmetic.
const UNSET: u64 = u64::MAX;

/// Cached squared length of a vector.
///
/// Set lazily by [`VectorOps::get_length_squared`], cleared by every
/// mutating call. Stored as raw `f64` bits in an atomic so that concurrent
/// readers of an unmodified vector may fill it in.
pub struct LengthCache(AtomicU64);

impl LengthCache {
    pub fn new() -> Self {
        Self(AtomicU64::new(UNSET))
    }

    pub fn get(&self) -> Option<f64> {
        match self.0.load(Ordering::Relaxed) {
            UNSET => None,
            bits => Some(f64::from_bits(bits)),
        }
    }

    pub fn set(&self, length_squared: f64) {
        self.0.store(length_squared.to_bits(), Ordering::Relaxed);
    }

    pub fn invalidate(&self) {
        self.0.store(UNSET, Ordering::Relaxed);
    }
}

impl Default for LengthCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LengthCache {
    // A deep copy has the same length, so the cached value carries over.
    fn clone(&self) -> Self {
        Self(AtomicU64::new(self.0.load(Ordering::Relaxed)))
    }
}

impl fmt::Debug for LengthCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LengthCache").field(&self.get()).finish()
    }
}

// ============================================================================
// VECTOR TRAIT
// ============================================================================

/// A fixed-size vector of `f64` whose unset positions read as zero.
///
/// Object safe: the dispatcher and the arithmetic in [`VectorOps`] work on
/// `dyn Vector` as well as on the concrete types.
pub trait Vector: fmt::Debug + Send + Sync {
    /// Dimension. Fixed at construction.
    fn size(&self) -> usize;

    /// True if every position is stored.
    fn is_dense(&self) -> bool;

    /// True if [`non_zeroes`](Vector::non_zeroes) yields ascending indices.
    fn is_sequential_access(&self) -> bool;

    /// True if writing a previously-zero position is O(1).
    fn is_add_constant_time(&self) -> bool;

    /// Relative cost of one [`get_quick`](Vector::get_quick).
    fn lookup_cost(&self) -> f64;

    /// Relative cost of one step of a nonzero iterator.
    fn iterator_advance_cost(&self) -> f64;

    /// Number of stored positions. A dense vector stores all of them.
    fn num_nondefault_elements(&self) -> usize;

    /// Value at `index` without a bounds check against [`size`](Vector::size).
    fn get_quick(&self, index: usize) -> f64;

    /// Store `value` at `index` without a bounds check. Zero deletes a
    /// sparse entry.
    fn set_quick(&mut self, index: usize, value: f64);

    /// Every position in ascending order, zeros included.
    fn all(&self) -> Box<dyn Iterator<Item = Element> + '_>;

    /// Every nonzero position. Ascending iff the vector is sequential.
    fn non_zeroes(&self) -> Box<dyn Iterator<Item = Element> + '_>;

    /// Rewrite the value of every nonzero position in place.
    ///
    /// Positions that become zero are dropped from sparse storage.
    fn for_each_nonzero_mut(&mut self, f: &mut dyn FnMut(usize, &mut f64));

    /// Fold staged updates into this vector. Staged zeros clear positions.
    fn merge_updates(&mut self, updates: &SortedDelta);

    fn length_cache(&self) -> &LengthCache;

    /// An all-zero vector of the same representation and size.
    fn like(&self) -> Box<dyn Vector>;

    fn clone_boxed(&self) -> Box<dyn Vector>;

    /// First nonzero at or after `from`.
    fn next_nonzero_from(&self, from: usize) -> Option<Element> {
        (from..self.size())
            .map(|index| Element::new(index, self.get_quick(index)))
            .find(|e| e.value != 0.0)
    }

    /// Rewrite every position, zeros included, in ascending order.
    fn for_each_mut(&mut self, f: &mut dyn FnMut(usize, &mut f64)) {
        for index in 0..self.size() {
            let mut value = self.get_quick(index);
            f(index, &mut value);
            self.set_quick(index, value);
        }
    }

    fn increment_quick(&mut self, index: usize, delta: f64) {
        let value = self.get_quick(index);
        self.set_quick(index, value + delta);
    }

    /// Bounds-checked read.
    fn get(&self, index: usize) -> Result<f64> {
        VectorError::check_index(index, self.size())?;
        Ok(self.get_quick(index))
    }

    /// Bounds-checked write.
    fn set(&mut self, index: usize, value: f64) -> Result<()> {
        VectorError::check_index(index, self.size())?;
        self.set_quick(index, value);
        Ok(())
    }

    /// Number of positions holding a nonzero value.
    fn num_nonzero_elements(&self) -> usize {
        self.non_zeroes().count()
    }
}

impl Clone for Box<dyn Vector> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

/// Value-wise comparison across representations.
pub(crate) fn values_equal<A, B>(a: &A, b: &B) -> bool
where
    A: Vector + ?Sized,
    B: Vector + ?Sized,
{
    a.size() == b.size()
        && a.non_zeroes().all(|e| b.get_quick(e.index) == e.value)
        && b.non_zeroes().all(|e| a.get_quick(e.index) == e.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_cache() {
        let cache = LengthCache::new();
        assert_eq!(cache.get(), None);
        cache.set(4.5);
        assert_eq!(cache.get(), Some(4.5));
        assert_eq!(cache.clone().get(), Some(4.5));
        cache.invalidate();
        assert_eq!(cache.get(), None);

        cache.set(0.0);
        assert_eq!(cache.get(), Some(0.0));
    }

    #[test]
    fn test_checked_access() {
        let mut v = DenseVector::new(3);
        assert!(v.set(2, 1.0).is_ok());
        assert_eq!(v.get(2), Ok(1.0));
        assert_eq!(
            v.set(3, 1.0),
            Err(VectorError::IndexOutOfRange { index: 3, size: 3 })
        );
        assert!(v.get(7).is_err());
    }

    #[test]
    fn test_default_seek_and_increment() {
        let mut v = RandomAccessSparseVector::new(10);
        v.set_quick(4, 2.0);
        v.set_quick(8, 3.0);
        assert_eq!(v.next_nonzero_from(0), Some(Element::new(4, 2.0)));
        assert_eq!(v.next_nonzero_from(5), Some(Element::new(8, 3.0)));
        assert_eq!(v.next_nonzero_from(9), None);

        v.increment_quick(4, -2.0);
        assert_eq!(v.num_nondefault_elements(), 1);
        v.increment_quick(0, 1.5);
        assert_eq!(v.get_quick(0), 1.5);
    }

    #[test]
    fn test_boxed_clone_is_deep() {
        let a: Box<dyn Vector> = Box::new(DenseVector::from_slice(&[1.0, 2.0]));
        let mut b = a.clone();
        b.set_quick(0, 9.0);
        assert_eq!(a.get_quick(0), 1.0);
        assert_eq!(b.get_quick(0), 9.0);
    }

    #[test]
    fn test_like_keeps_representation() {
        let v = SequentialAccessSparseVector::from_slice(&[0.0, 3.0, 0.0]);
        let empty = v.like();
        assert_eq!(empty.size(), 3);
        assert_eq!(empty.num_nondefault_elements(), 0);
        assert!(empty.is_sequential_access());
        assert!(!empty.is_add_constant_time());
    }
}
