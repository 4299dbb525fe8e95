//! Elementwise arithmetic over any [`Vector`].
//!
//! Everything here is expressed through the dispatcher or through the
//! nonzero iterators, so it works unchanged for every representation and
//! for `dyn Vector`. Methods that return a new vector need `Self: Clone`.
//!
//! The `std::ops` operators on the concrete types are thin wrappers over
//! the fallible methods and panic on a dimension mismatch.

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

use crate::dispatch;
use crate::error::{Result, VectorError};
use crate::function::{
    bind_second, chain_unary, Abs, BinaryFunction, Divide, FnUnary, Identity, Log1p, Max, Minus,
    MinusSquared, Plus, Second, Times, UnaryFunction,
};

use super::{
    values_equal, DenseVector, Element, RandomAccessSparseVector, SequentialAccessSparseVector,
    Vector,
};

/// Relative threshold under which the dot-product distance estimate is
/// replaced by an exact sum.
const DISTANCE_ESTIMATE_TOLERANCE: f64 = 1.0e-3;

/// Arithmetic available on every [`Vector`].
pub trait VectorOps: Vector {
    // ========================================================================
    // Assignment
    // ========================================================================

    /// Set every position to `value`.
    fn assign_value(&mut self, value: f64) {
        if value == 0.0 {
            self.for_each_nonzero_mut(&mut |_, v| *v = 0.0);
        } else {
            self.for_each_mut(&mut |_, v| *v = value);
        }
    }

    /// Copy `values` position by position.
    fn assign_slice(&mut self, values: &[f64]) -> Result<()> {
        VectorError::check_dimensions(self.size(), values.len())?;
        self.for_each_mut(&mut |index, v| *v = values[index]);
        Ok(())
    }

    /// Copy another vector position by position.
    fn assign_from<Y: Vector + ?Sized>(&mut self, other: &Y) -> Result<()> {
        self.assign_with(other, &Second)
    }

    /// `x[i] = f(x[i])`. Zeros are skipped unless `f(0) != 0`.
    fn assign_unary(&mut self, f: &dyn UnaryFunction) {
        if f.is_densifying() {
            self.for_each_mut(&mut |_, v| *v = f.apply(*v));
        } else {
            self.for_each_nonzero_mut(&mut |_, v| *v = f.apply(*v));
        }
    }

    /// `x[i] = f(x[i], y[i])` through the cheapest valid strategy.
    fn assign_with<Y: Vector + ?Sized>(&mut self, y: &Y, f: &dyn BinaryFunction) -> Result<()> {
        dispatch::assign(self, y, f)?;
        self.length_cache().invalidate();
        Ok(())
    }

    // ========================================================================
    // New vectors
    // ========================================================================

    fn plus<Y: Vector + ?Sized>(&self, y: &Y) -> Result<Self>
    where
        Self: Clone + Sized,
    {
        let mut result = self.clone();
        result.assign_with(y, &Plus)?;
        Ok(result)
    }

    fn minus<Y: Vector + ?Sized>(&self, y: &Y) -> Result<Self>
    where
        Self: Clone + Sized,
    {
        let mut result = self.clone();
        result.assign_with(y, &Minus)?;
        Ok(result)
    }

    /// Elementwise product.
    fn times<Y: Vector + ?Sized>(&self, y: &Y) -> Result<Self>
    where
        Self: Clone + Sized,
    {
        let mut result = self.clone();
        result.assign_with(y, &Times)?;
        Ok(result)
    }

    /// Elementwise quotient. Positions where both sides are zero become NaN.
    fn divide<Y: Vector + ?Sized>(&self, y: &Y) -> Result<Self>
    where
        Self: Clone + Sized,
    {
        let mut result = self.clone();
        result.assign_with(y, &Divide)?;
        Ok(result)
    }

    /// Add `value` to every position, zeros included.
    fn plus_scalar(&self, value: f64) -> Self
    where
        Self: Clone + Sized,
    {
        let mut result = self.clone();
        if value != 0.0 {
            result.assign_unary(&bind_second(Plus, value));
        }
        result
    }

    fn minus_scalar(&self, value: f64) -> Self
    where
        Self: Clone + Sized,
    {
        self.plus_scalar(-value)
    }

    fn times_scalar(&self, value: f64) -> Self
    where
        Self: Clone + Sized,
    {
        let mut result = self.clone();
        result.assign_unary(&bind_second(Times, value));
        result
    }

    /// Divide the nonzeros by `value`. Zeros stay zero even for `value == 0`.
    fn divide_scalar(&self, value: f64) -> Self
    where
        Self: Clone + Sized,
    {
        let mut result = self.clone();
        if value != 1.0 {
            result.for_each_nonzero_mut(&mut |_, v| *v /= value);
        }
        result
    }

    /// Scale to unit Euclidean length.
    fn normalize(&self) -> Self
    where
        Self: Clone + Sized,
    {
        self.divide_scalar(self.get_length_squared().sqrt())
    }

    /// Scale to unit `power`-norm.
    fn normalize_power(&self, power: f64) -> Result<Self>
    where
        Self: Clone + Sized,
    {
        Ok(self.divide_scalar(self.norm(power)?))
    }

    /// `ln(1 + x) / (‖x‖₂ · ln 2)` on every nonzero.
    fn log_normalize(&self) -> Self
    where
        Self: Clone + Sized,
    {
        log_normalized(self, 2.0, self.get_length_squared().sqrt())
    }

    /// `ln(1 + x) / (‖x‖ₚ · ln p)` on every nonzero. Requires `1 < p < ∞`.
    fn log_normalize_power(&self, power: f64) -> Result<Self>
    where
        Self: Clone + Sized,
    {
        if power.is_infinite() || power <= 1.0 {
            return Err(VectorError::InvalidArgument(format!(
                "log normalization power must be finite and greater than 1, got {power}"
            )));
        }
        Ok(log_normalized(self, power, self.norm(power)?))
    }

    // ========================================================================
    // Reductions
    // ========================================================================

    /// `Σ x[i] · y[i]`.
    fn dot<Y: Vector + ?Sized>(&self, y: &Y) -> Result<f64> {
        VectorError::check_dimensions(self.size(), y.size())?;
        if std::ptr::addr_eq(self as *const Self, y as *const Y) {
            return Ok(self.get_length_squared());
        }
        dispatch::aggregate(self, y, &Plus, &Times)
    }

    /// `Σ x[i]`.
    fn zsum(&self) -> f64 {
        self.aggregate(&Plus, &Identity)
    }

    /// `Σ x[i]²`, cached until the next mutation.
    fn get_length_squared(&self) -> f64 {
        if let Some(cached) = self.length_cache().get() {
            return cached;
        }
        let length_squared: f64 = self.non_zeroes().map(|e| e.value * e.value).sum();
        self.length_cache().set(length_squared);
        length_squared
    }

    /// `‖x - y‖²`.
    ///
    /// Uses `‖x‖² + ‖y‖² - 2x·y` unless cancellation makes that estimate
    /// unreliable, in which case the squared differences are summed exactly.
    fn get_distance_squared<Y: Vector + ?Sized>(&self, y: &Y) -> Result<f64> {
        VectorError::check_dimensions(self.size(), y.size())?;
        let this_length = self.get_length_squared();
        let that_length = y.get_length_squared();
        let estimate = this_length + that_length - 2.0 * self.dot(y)?;
        if estimate > DISTANCE_ESTIMATE_TOLERANCE * (this_length + that_length) {
            Ok(estimate.max(0.0))
        } else {
            dispatch::aggregate(self, y, &Plus, &MinusSquared)
        }
    }

    /// The `power`-norm.
    ///
    /// `0` counts nonzeros, `∞` takes the largest magnitude.
    fn norm(&self, power: f64) -> Result<f64> {
        if power < 0.0 || power.is_nan() {
            return Err(VectorError::InvalidArgument(format!(
                "norm power must be non-negative, got {power}"
            )));
        }
        let norm = if power.is_infinite() {
            self.aggregate(&Max, &Abs)
        } else if power == 2.0 {
            self.get_length_squared().sqrt()
        } else if power == 1.0 {
            self.aggregate(&Plus, &Abs)
        } else if power == 0.0 {
            self.num_nonzero_elements() as f64
        } else {
            self.aggregate(&Plus, &FnUnary(|v: f64| v.abs().powf(power)))
                .powf(1.0 / power)
        };
        Ok(norm)
    }

    /// Fold `fm(x[i])` with `fa` over the vector.
    ///
    /// Zeros are skipped when they provably cannot change the result. If
    /// `fa` absorbs zero from the left and at least one position is zero,
    /// the answer is zero without looking at anything.
    fn aggregate(&self, fa: &dyn BinaryFunction, fm: &dyn UnaryFunction) -> f64 {
        if self.size() == 0 {
            return 0.0;
        }
        if fa.is_associative_and_commutative()
            && fa.is_like_left_mult()
            && self.num_nondefault_elements() < self.size()
            && !fm.is_densifying()
        {
            return 0.0;
        }
        let skip_zeros = !fm.is_densifying()
            && fa.is_like_right_plus()
            && (fa.is_associative_and_commutative() || self.is_sequential_access());
        let elements = if skip_zeros { self.non_zeroes() } else { self.all() };
        dispatch::fold_visited(fa, None, elements.map(|e| (e.index, fm.apply(e.value))))
            .unwrap_or(0.0)
    }

    /// Fold `fc(x[i], y[i])` with `fa` through the cheapest valid strategy.
    fn aggregate_with<Y: Vector + ?Sized>(
        &self,
        y: &Y,
        fa: &dyn BinaryFunction,
        fc: &dyn BinaryFunction,
    ) -> Result<f64> {
        dispatch::aggregate(self, y, fa, fc)
    }

    /// Largest value; `-∞` for an empty vector.
    fn max_value(&self) -> f64 {
        self.max_value_index()
            .map_or(f64::NEG_INFINITY, |index| self.get_quick(index))
    }

    /// Position of the largest value, preferring the lowest index among
    /// zeros.
    fn max_value_index(&self) -> Option<usize> {
        extreme_index(self, |candidate, best| candidate > best)
    }

    /// Smallest value; `∞` for an empty vector.
    fn min_value(&self) -> f64 {
        self.min_value_index()
            .map_or(f64::INFINITY, |index| self.get_quick(index))
    }

    fn min_value_index(&self) -> Option<usize> {
        extreme_index(self, |candidate, best| candidate < best)
    }

    // ========================================================================
    // Comparison and export
    // ========================================================================

    /// Same size and the same value at every position.
    fn equals<Y: Vector + ?Sized>(&self, other: &Y) -> bool {
        values_equal(self, other)
    }

    fn to_dense_vec(&self) -> Vec<f64> {
        let mut values = vec![0.0; self.size()];
        for e in self.non_zeroes() {
            values[e.index] = e.value;
        }
        values
    }
}

impl<V: Vector + ?Sized> VectorOps for V {}

/// Index of the value preferred by `better` over all positions.
///
/// Nonzeros are scanned first; an implicit zero wins only if it beats
/// every nonzero, in which case the first zero position is reported.
fn extreme_index<V, F>(v: &V, better: F) -> Option<usize>
where
    V: Vector + ?Sized,
    F: Fn(f64, f64) -> bool,
{
    let best = v.non_zeroes().fold(None, |best: Option<Element>, e| match best {
        Some(b) if !better(e.value, b.value) => Some(b),
        _ => Some(e),
    });
    let has_zero = v.num_nonzero_elements() < v.size();
    match best {
        Some(b) if !has_zero || better(b.value, 0.0) => Some(b.index),
        _ => v.all().find(|e| e.value == 0.0).map(|e| e.index),
    }
}

fn log_normalized<V: Vector + Clone>(v: &V, power: f64, norm: f64) -> V {
    let denominator = norm * power.ln();
    let mut result = v.clone();
    result.assign_unary(&chain_unary(bind_second(Divide, denominator), Log1p));
    result
}

fn expect_ok<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("{e}"),
    }
}

/// Operator impls for the concrete representations.
///
/// # Panics
///
/// Vector-vector operators panic on a dimension mismatch. Use the
/// [`VectorOps`] methods to get a `Result` instead.
macro_rules! impl_operators {
    ($($ty:ty),* $(,)?) => {$(
        impl<Y: Vector + ?Sized> AddAssign<&Y> for $ty {
            fn add_assign(&mut self, rhs: &Y) {
                expect_ok(self.assign_with(rhs, &Plus))
            }
        }

        impl<Y: Vector + ?Sized> SubAssign<&Y> for $ty {
            fn sub_assign(&mut self, rhs: &Y) {
                expect_ok(self.assign_with(rhs, &Minus))
            }
        }

        impl<Y: Vector + ?Sized> MulAssign<&Y> for $ty {
            fn mul_assign(&mut self, rhs: &Y) {
                expect_ok(self.assign_with(rhs, &Times))
            }
        }

        impl<Y: Vector + ?Sized> DivAssign<&Y> for $ty {
            fn div_assign(&mut self, rhs: &Y) {
                expect_ok(self.assign_with(rhs, &Divide))
            }
        }

        impl<Y: Vector + ?Sized> Add<&Y> for &$ty {
            type Output = $ty;
            fn add(self, rhs: &Y) -> $ty {
                expect_ok(self.plus(rhs))
            }
        }

        impl<Y: Vector + ?Sized> Sub<&Y> for &$ty {
            type Output = $ty;
            fn sub(self, rhs: &Y) -> $ty {
                expect_ok(self.minus(rhs))
            }
        }

        impl<Y: Vector + ?Sized> Mul<&Y> for &$ty {
            type Output = $ty;
            fn mul(self, rhs: &Y) -> $ty {
                expect_ok(self.times(rhs))
            }
        }

        impl<Y: Vector + ?Sized> Div<&Y> for &$ty {
            type Output = $ty;
            fn div(self, rhs: &Y) -> $ty {
                expect_ok(self.divide(rhs))
            }
        }

        impl Add<f64> for &$ty {
            type Output = $ty;
            fn add(self, rhs: f64) -> $ty {
                self.plus_scalar(rhs)
            }
        }

        impl Sub<f64> for &$ty {
            type Output = $ty;
            fn sub(self, rhs: f64) -> $ty {
                self.minus_scalar(rhs)
            }
        }

        impl Mul<f64> for &$ty {
            type Output = $ty;
            fn mul(self, rhs: f64) -> $ty {
                self.times_scalar(rhs)
            }
        }

        impl Div<f64> for &$ty {
            type Output = $ty;
            fn div(self, rhs: f64) -> $ty {
                self.divide_scalar(rhs)
            }
        }

        impl MulAssign<f64> for $ty {
            fn mul_assign(&mut self, rhs: f64) {
                self.assign_unary(&bind_second(Times, rhs));
            }
        }

        impl AddAssign<f64> for $ty {
            fn add_assign(&mut self, rhs: f64) {
                if rhs != 0.0 {
                    self.assign_unary(&bind_second(Plus, rhs));
                }
            }
        }
    )*};
}

impl_operators!(
    DenseVector,
    RandomAccessSparseVector,
    SequentialAccessSparseVector,
);
