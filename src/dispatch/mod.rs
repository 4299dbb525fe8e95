//! Cost-based dispatch of elementwise binary operations.
//!
//! Two operations go through here:
//!
//! - **assign** `x[i] = f(x[i], y[i])`, mutating `x`
//! - **aggregate** `fa(...fa(fc(x[0], y[0]), fc(x[1], y[1]))..., fc(x[n-1], y[n-1]))`
//!
//! Each has a fixed catalogue of strategies that differ in which positions
//! they visit (nonzeros of one side, the intersection or union of both, or
//! everything) and, for assign, in how they write back (in place when `x`
//! inserts in O(1), otherwise staged in a [`SortedDelta`](crate::delta::SortedDelta)
//! and merged once). A strategy is *valid* for a call when the algebra of
//! the functions and the capabilities of the vectors prove it visits every
//! position that could change the result. Among valid strategies the one
//! with the lowest estimated cost runs.
//!
//! Validity and cost are computed from a [`VectorProfile`] snapshot, so
//! selection never touches vector contents.

use std::cmp::Ordering;

use roaring::RoaringTreemap;
use tracing::trace;

use crate::error::{Result, VectorError};
use crate::function::BinaryFunction;
use crate::vector::{Element, Vector};

mod aggregate;
mod assign;

pub use aggregate::{AggregateStrategy, AGGREGATE_STRATEGIES};
pub use assign::{AssignStrategy, ASSIGN_STRATEGIES};

/// The capabilities and size of a vector, as seen by strategy selection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VectorProfile {
    pub size: usize,
    pub is_dense: bool,
    pub is_sequential_access: bool,
    pub is_add_constant_time: bool,
    pub lookup_cost: f64,
    pub iterator_advance_cost: f64,
    /// Stored positions; every position for a dense vector
    pub nondefault_elements: usize,
}

impl VectorProfile {
    pub fn of<V: Vector + ?Sized>(v: &V) -> Self {
        Self {
            size: v.size(),
            is_dense: v.is_dense(),
            is_sequential_access: v.is_sequential_access(),
            is_add_constant_time: v.is_add_constant_time(),
            lookup_cost: v.lookup_cost(),
            iterator_advance_cost: v.iterator_advance_cost(),
            nondefault_elements: v.num_nondefault_elements(),
        }
    }

    /// Cost of walking the stored positions once.
    pub fn nonzero_walk_cost(&self) -> f64 {
        self.nondefault_elements as f64 * self.iterator_advance_cost
    }

    /// Cost of walking every position once.
    pub fn full_walk_cost(&self) -> f64 {
        self.size as f64 * self.iterator_advance_cost
    }
}

/// `x[i] = f(x[i], y[i])` for every `i`, through the cheapest valid
/// strategy.
///
/// Fails before touching `x` if the dimensions differ.
pub fn assign<X, Y>(x: &mut X, y: &Y, f: &dyn BinaryFunction) -> Result<()>
where
    X: Vector + ?Sized,
    Y: Vector + ?Sized,
{
    VectorError::check_dimensions(x.size(), y.size())?;
    if x.size() == 0 {
        return Ok(());
    }
    let strategy = AssignStrategy::best(&VectorProfile::of(x), &VectorProfile::of(y), f);
    strategy.execute(x, y, f)
}

/// Fold `fc(x[i], y[i])` with `fa`, through the cheapest valid strategy.
///
/// Returns `0.0` for empty vectors without selecting a strategy.
pub fn aggregate<X, Y>(
    x: &X,
    y: &Y,
    fa: &dyn BinaryFunction,
    fc: &dyn BinaryFunction,
) -> Result<f64>
where
    X: Vector + ?Sized,
    Y: Vector + ?Sized,
{
    VectorError::check_dimensions(x.size(), y.size())?;
    if x.size() == 0 {
        return Ok(0.0);
    }
    let strategy = AggregateStrategy::best(&VectorProfile::of(x), &VectorProfile::of(y), fa, fc);
    strategy.execute(x, y, fa, fc)
}

/// Lowest-cost valid entry of a catalogue, or `fallback`.
///
/// Ties keep the earlier entry.
fn cheapest<S: Copy + std::fmt::Debug>(
    catalogue: &[S],
    fallback: S,
    is_valid: impl Fn(S) -> bool,
    cost: impl Fn(S) -> f64,
) -> S {
    let mut best = fallback;
    let mut best_cost = f64::INFINITY;
    for &strategy in catalogue {
        if !is_valid(strategy) {
            continue;
        }
        let c = cost(strategy);
        if c < best_cost {
            best = strategy;
            best_cost = c;
        }
    }
    trace!(strategy = ?best, cost = best_cost, "selected strategy");
    best
}

/// Continue a left fold with `fa` over `(index, value)` pairs. `None` means
/// nothing has been visited yet.
///
/// A walk that skips positions only skips ones contributing zero, and
/// `fa(r, 0) = r` makes later gaps vanish. Gaps ahead of the first visited
/// position do not vanish: the fold there is already `0.0`, so the first
/// value is folded onto it rather than taken as is.
pub(crate) fn fold_visited(
    fa: &dyn BinaryFunction,
    init: Option<f64>,
    values: impl Iterator<Item = (usize, f64)>,
) -> Option<f64> {
    values.fold(init, |acc, (index, v)| match acc {
        Some(r) => Some(fa.apply(r, v)),
        None if index > 0 => Some(fa.apply(0.0, v)),
        None => Some(v),
    })
}

/// Merge order for two ascending nonzero walks.
fn by_index(a: &Element, b: &Element) -> Ordering {
    a.index.cmp(&b.index)
}

/// Set of visited positions for the random-order union walk.
#[derive(Default)]
struct Visited(RoaringTreemap);

impl Visited {
    fn insert(&mut self, index: usize) {
        self.0.insert(index as u64);
    }

    fn contains(&self, index: usize) -> bool {
        self.0.contains(index as u64)
    }
}
