//! Proptest generators for vectorcore data structures
//!
//! Provides `Strategy` implementations for vectors in every representation,
//! plus pools of scalar functions whose results are exact on small integers
//! (so strategies that visit positions in different orders agree bit for bit).

#![allow(dead_code)]

use proptest::collection::vec;
use proptest::prelude::*;
use vectorcore::function::{
    chain, BinaryFunction, First, Max, Min, Minus, MinusAbs, MinusSquared, Negate, Plus, PlusAbs,
    PlusMult, Second, Times,
};
use vectorcore::{DenseVector, RandomAccessSparseVector, SequentialAccessSparseVector, Vector};

// ============================================================================
// Vector Generation
// ============================================================================

/// Which representation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorKind {
    Dense,
    RandomAccess,
    Sequential,
}

pub fn arb_kind() -> impl Strategy<Value = VectorKind> {
    prop_oneof![
        Just(VectorKind::Dense),
        Just(VectorKind::RandomAccess),
        Just(VectorKind::Sequential),
    ]
}

/// Small integers, zero more often than not.
pub fn arb_value() -> impl Strategy<Value = f64> {
    prop_oneof![
        3 => Just(0.0),
        2 => (-5i32..=5).prop_map(f64::from),
    ]
}

/// Values for a vector of exactly `size` positions.
pub fn arb_values(size: usize) -> impl Strategy<Value = Vec<f64>> {
    vec(arb_value(), size..=size)
}

/// Build a vector of the given representation.
pub fn build(kind: VectorKind, values: &[f64]) -> Box<dyn Vector> {
    match kind {
        VectorKind::Dense => Box::new(DenseVector::from_slice(values)),
        VectorKind::RandomAccess => Box::new(RandomAccessSparseVector::from_slice(values)),
        VectorKind::Sequential => Box::new(SequentialAccessSparseVector::from_slice(values)),
    }
}

/// Parameters for vector pair generation
#[derive(Debug, Clone)]
pub struct PairParams {
    pub max_size: usize,
}

impl Default for PairParams {
    fn default() -> Self {
        Self { max_size: 16 }
    }
}

/// Two same-size vectors, each with its own representation, along with
/// their plain values.
#[derive(Debug)]
pub struct VectorPair {
    pub x: Box<dyn Vector>,
    pub y: Box<dyn Vector>,
    pub x_values: Vec<f64>,
    pub y_values: Vec<f64>,
}

pub fn arb_vector_pair(params: PairParams) -> impl Strategy<Value = VectorPair> {
    (0..=params.max_size)
        .prop_flat_map(|size| (arb_kind(), arb_kind(), arb_values(size), arb_values(size)))
        .prop_map(|(kx, ky, x_values, y_values)| VectorPair {
            x: build(kx, &x_values),
            y: build(ky, &y_values),
            x_values,
            y_values,
        })
}

// ============================================================================
// Function Pools
// ============================================================================

/// Binary functions that never produce NaN on finite input.
pub fn binary_functions() -> Vec<(&'static str, Box<dyn BinaryFunction>)> {
    vec![
        ("plus", Box::new(Plus)),
        ("minus", Box::new(Minus)),
        ("times", Box::new(Times)),
        ("max", Box::new(Max)),
        ("min", Box::new(Min)),
        ("first", Box::new(First)),
        ("second", Box::new(Second)),
        ("plus_abs", Box::new(PlusAbs)),
        ("minus_abs", Box::new(MinusAbs)),
        ("minus_squared", Box::new(MinusSquared)),
        ("plus_mult", Box::new(PlusMult(2.0))),
        ("neg_times", Box::new(chain(Negate, Times))),
    ]
}

/// Accumulators for two-vector aggregation.
pub fn accumulators() -> Vec<(&'static str, Box<dyn BinaryFunction>)> {
    vec![
        ("plus", Box::new(Plus)),
        ("max", Box::new(Max)),
        ("min", Box::new(Min)),
        ("plus_abs", Box::new(PlusAbs)),
        // order-sensitive folds
        ("minus", Box::new(Minus)),
        ("first", Box::new(First)),
        ("plus_mult", Box::new(PlusMult(2.0))),
    ]
}

pub fn arb_function_index() -> impl Strategy<Value = usize> {
    0..binary_functions().len()
}

pub fn arb_accumulator_index() -> impl Strategy<Value = usize> {
    0..accumulators().len()
}

// ============================================================================
// Reference Semantics
// ============================================================================

/// `f(x[i], y[i])` for every position.
pub fn reference_assign(x: &[f64], y: &[f64], f: &dyn BinaryFunction) -> Vec<f64> {
    x.iter().zip(y).map(|(&a, &b)| f.apply(a, b)).collect()
}

/// Left fold of `fc(x[i], y[i])` with `fa` over every position; `0.0` if empty.
pub fn reference_aggregate(
    x: &[f64],
    y: &[f64],
    fa: &dyn BinaryFunction,
    fc: &dyn BinaryFunction,
) -> f64 {
    x.iter()
        .zip(y)
        .map(|(&a, &b)| fc.apply(a, b))
        .reduce(|r, v| fa.apply(r, v))
        .unwrap_or(0.0)
}

/// Values of every position in order.
pub fn values_of(v: &dyn Vector) -> Vec<f64> {
    v.all().map(|e| e.value).collect()
}
