//! Strategies for folding `fc(x[i], y[i])` with `fa`.

use itertools::{EitherOrBoth, Itertools};

use crate::error::{Result, VectorError};
use crate::function::BinaryFunction;
use crate::vector::Vector;

use super::{by_index, cheapest, fold_visited, VectorProfile, Visited};

/// One way of carrying out an aggregation.
///
/// Strategies that skip positions need `fa(r, 0) = r`; strategies that
/// visit positions out of order need `fa` associative and commutative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggregateStrategy {
    NonzerosIterateThisLookupThat,
    NonzerosIterateThatLookupThis,
    IterateIntersection,
    IterateUnionSequential,
    IterateUnionRandom,
    AllIterateSequential,
    AllIterateThisLookupThat,
    AllIterateThatLookupThis,
    /// Always valid.
    AllLoop,
}

/// Every aggregate strategy, in the order ties are broken.
pub const AGGREGATE_STRATEGIES: [AggregateStrategy; 9] = [
    AggregateStrategy::NonzerosIterateThisLookupThat,
    AggregateStrategy::NonzerosIterateThatLookupThis,
    AggregateStrategy::IterateIntersection,
    AggregateStrategy::IterateUnionSequential,
    AggregateStrategy::IterateUnionRandom,
    AggregateStrategy::AllIterateSequential,
    AggregateStrategy::AllIterateThisLookupThat,
    AggregateStrategy::AllIterateThatLookupThis,
    AggregateStrategy::AllLoop,
];

impl AggregateStrategy {
    pub fn is_valid(
        self,
        x: &VectorProfile,
        y: &VectorProfile,
        fa: &dyn BinaryFunction,
        fc: &dyn BinaryFunction,
    ) -> bool {
        use AggregateStrategy::*;
        let skips_zeros = fa.is_like_right_plus();
        let any_order = fa.is_associative_and_commutative();
        let both_sequential = x.is_sequential_access && y.is_sequential_access;
        match self {
            NonzerosIterateThisLookupThat => {
                skips_zeros && fc.is_like_left_mult() && (any_order || x.is_sequential_access)
            }
            NonzerosIterateThatLookupThis => {
                skips_zeros && fc.is_like_right_mult() && (any_order || y.is_sequential_access)
            }
            IterateIntersection => skips_zeros && fc.is_like_mult() && both_sequential,
            IterateUnionSequential => skips_zeros && !fc.is_densifying() && both_sequential,
            IterateUnionRandom => skips_zeros && !fc.is_densifying() && any_order,
            AllIterateSequential => both_sequential,
            AllIterateThisLookupThat => x.is_sequential_access || any_order,
            AllIterateThatLookupThis => y.is_sequential_access || any_order,
            AllLoop => true,
        }
    }

    pub fn cost(self, x: &VectorProfile, y: &VectorProfile) -> f64 {
        use AggregateStrategy::*;
        match self {
            NonzerosIterateThisLookupThat => x.nonzero_walk_cost() * y.lookup_cost,
            NonzerosIterateThatLookupThis => y.nonzero_walk_cost() * x.lookup_cost,
            IterateIntersection => x.nonzero_walk_cost().min(y.nonzero_walk_cost()),
            IterateUnionSequential => x.nonzero_walk_cost() + y.nonzero_walk_cost(),
            IterateUnionRandom => {
                x.nonzero_walk_cost() * y.lookup_cost + y.nonzero_walk_cost() * x.lookup_cost
            }
            AllIterateSequential => x.full_walk_cost() + y.full_walk_cost(),
            AllIterateThisLookupThat => x.full_walk_cost() * y.lookup_cost,
            AllIterateThatLookupThis => y.full_walk_cost() * x.lookup_cost,
            AllLoop => x.size as f64 * x.lookup_cost * y.lookup_cost,
        }
    }

    pub fn best(
        x: &VectorProfile,
        y: &VectorProfile,
        fa: &dyn BinaryFunction,
        fc: &dyn BinaryFunction,
    ) -> Self {
        Self::best_by(x, y, fa, fc, |strategy| strategy.cost(x, y))
    }

    /// Cheapest valid strategy under a caller-supplied cost model.
    pub fn best_by(
        x: &VectorProfile,
        y: &VectorProfile,
        fa: &dyn BinaryFunction,
        fc: &dyn BinaryFunction,
        cost: impl Fn(Self) -> f64,
    ) -> Self {
        cheapest(
            &AGGREGATE_STRATEGIES,
            AggregateStrategy::AllLoop,
            |strategy| strategy.is_valid(x, y, fa, fc),
            cost,
        )
    }

    /// Run this strategy. Returns `0.0` if it visits no position.
    pub fn execute<X, Y>(
        self,
        x: &X,
        y: &Y,
        fa: &dyn BinaryFunction,
        fc: &dyn BinaryFunction,
    ) -> Result<f64>
    where
        X: Vector + ?Sized,
        Y: Vector + ?Sized,
    {
        use AggregateStrategy::*;
        VectorError::check_dimensions(x.size(), y.size())?;
        let result = match self {
            NonzerosIterateThisLookupThat => fold_visited(
                fa,
                None,
                x.non_zeroes()
                    .map(|a| (a.index, fc.apply(a.value, y.get_quick(a.index)))),
            ),
            NonzerosIterateThatLookupThis => fold_visited(
                fa,
                None,
                y.non_zeroes()
                    .map(|b| (b.index, fc.apply(x.get_quick(b.index), b.value))),
            ),
            IterateIntersection => fold_visited(
                fa,
                None,
                x.non_zeroes()
                    .merge_join_by(y.non_zeroes(), by_index)
                    .filter_map(|pair| match pair {
                        EitherOrBoth::Both(a, b) => Some((a.index, fc.apply(a.value, b.value))),
                        _ => None,
                    }),
            ),
            IterateUnionSequential => fold_visited(
                fa,
                None,
                x.non_zeroes()
                    .merge_join_by(y.non_zeroes(), by_index)
                    .map(|pair| match pair {
                        EitherOrBoth::Left(a) => (a.index, fc.apply(a.value, 0.0)),
                        EitherOrBoth::Right(b) => (b.index, fc.apply(0.0, b.value)),
                        EitherOrBoth::Both(a, b) => (a.index, fc.apply(a.value, b.value)),
                    }),
            ),
            IterateUnionRandom => {
                let mut visited = Visited::default();
                let this_side = fold_visited(
                    fa,
                    None,
                    x.non_zeroes().map(|a| {
                        visited.insert(a.index);
                        (a.index, fc.apply(a.value, y.get_quick(a.index)))
                    }),
                );
                fold_visited(
                    fa,
                    this_side,
                    y.non_zeroes()
                        .filter(|b| !visited.contains(b.index))
                        .map(|b| (b.index, fc.apply(0.0, b.value))),
                )
            }
            AllIterateSequential => fold_visited(
                fa,
                None,
                x.all()
                    .zip(y.all())
                    .map(|(a, b)| (a.index, fc.apply(a.value, b.value))),
            ),
            AllIterateThisLookupThat => fold_visited(
                fa,
                None,
                x.all()
                    .map(|a| (a.index, fc.apply(a.value, y.get_quick(a.index)))),
            ),
            AllIterateThatLookupThis => fold_visited(
                fa,
                None,
                y.all()
                    .map(|b| (b.index, fc.apply(x.get_quick(b.index), b.value))),
            ),
            AllLoop => fold_visited(
                fa,
                None,
                (0..x.size()).map(|i| (i, fc.apply(x.get_quick(i), y.get_quick(i)))),
            ),
        };
        Ok(result.unwrap_or(0.0))
    }
}
