//! Strategies for `x[i] = f(x[i], y[i])`.

use itertools::{EitherOrBoth, Itertools};

use crate::delta::SortedDelta;
use crate::error::{Result, VectorError};
use crate::function::BinaryFunction;
use crate::vector::Vector;

use super::{by_index, cheapest, VectorProfile, Visited};

/// One way of carrying out an assignment.
///
/// `Merge` variants stage results in a [`SortedDelta`] and fold them into
/// `x` once at the end; they are only considered when `x` cannot insert in
/// O(1). `Inplace` variants write straight into `x` and require that it can.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssignStrategy {
    /// Visit x's nonzeros, look up y. Needs `f(0, b) = 0`.
    NonzerosIterateThisLookupThat,
    /// Visit y's nonzeros, look up x. Needs `f(a, 0) = a`.
    NonzerosIterateThatLookupThisMergeUpdates,
    NonzerosIterateThatLookupThisInplaceUpdates,
    /// Walk both sorted nonzero sets, touching only shared positions.
    IterateIntersection,
    /// Walk both sorted nonzero sets, touching every position either holds.
    IterateUnionSequentialMergeUpdates,
    IterateUnionSequentialInplaceUpdates,
    /// Visit x's nonzeros, then y's nonzeros not already seen.
    IterateUnionRandomMergeUpdates,
    IterateUnionRandomInplaceUpdates,
    /// Walk every position of both vectors in lockstep.
    AllIterateSequentialMergeUpdates,
    AllIterateSequentialInplaceUpdates,
    /// Walk every position of x, look up y.
    AllIterateThisLookupThatMergeUpdates,
    AllIterateThisLookupThatInplaceUpdates,
    /// Walk every position of y, look up x.
    AllIterateThatLookupThisMergeUpdates,
    AllIterateThatLookupThisInplaceUpdates,
    /// Look up both vectors at every index.
    AllLoopMergeUpdates,
    /// Always valid.
    AllLoopInplaceUpdates,
}

/// Every assign strategy, in the order ties are broken.
pub const ASSIGN_STRATEGIES: [AssignStrategy; 16] = [
    AssignStrategy::NonzerosIterateThisLookupThat,
    AssignStrategy::NonzerosIterateThatLookupThisMergeUpdates,
    AssignStrategy::NonzerosIterateThatLookupThisInplaceUpdates,
    AssignStrategy::IterateIntersection,
    AssignStrategy::IterateUnionSequentialMergeUpdates,
    AssignStrategy::IterateUnionSequentialInplaceUpdates,
    AssignStrategy::IterateUnionRandomMergeUpdates,
    AssignStrategy::IterateUnionRandomInplaceUpdates,
    AssignStrategy::AllIterateSequentialMergeUpdates,
    AssignStrategy::AllIterateSequentialInplaceUpdates,
    AssignStrategy::AllIterateThisLookupThatMergeUpdates,
    AssignStrategy::AllIterateThisLookupThatInplaceUpdates,
    AssignStrategy::AllIterateThatLookupThisMergeUpdates,
    AssignStrategy::AllIterateThatLookupThisInplaceUpdates,
    AssignStrategy::AllLoopMergeUpdates,
    AssignStrategy::AllLoopInplaceUpdates,
];

impl AssignStrategy {
    /// Whether this strategy writes through a staged [`SortedDelta`].
    pub fn stages_updates(self) -> bool {
        use AssignStrategy::*;
        matches!(
            self,
            NonzerosIterateThatLookupThisMergeUpdates
                | IterateUnionSequentialMergeUpdates
                | IterateUnionRandomMergeUpdates
                | AllIterateSequentialMergeUpdates
                | AllIterateThisLookupThatMergeUpdates
                | AllIterateThatLookupThisMergeUpdates
                | AllLoopMergeUpdates
        )
    }

    /// Whether this strategy computes the right answer for `x`, `y`, `f`.
    pub fn is_valid(self, x: &VectorProfile, y: &VectorProfile, f: &dyn BinaryFunction) -> bool {
        use AssignStrategy::*;
        let add = x.is_add_constant_time;
        let both_sequential = x.is_sequential_access && y.is_sequential_access;
        match self {
            NonzerosIterateThisLookupThat => f.is_like_left_mult(),
            NonzerosIterateThatLookupThisMergeUpdates => f.is_like_right_plus() && !add,
            NonzerosIterateThatLookupThisInplaceUpdates => f.is_like_right_plus() && add,
            IterateIntersection => {
                f.is_like_left_mult() && f.is_like_right_plus() && both_sequential
            }
            IterateUnionSequentialMergeUpdates => !f.is_densifying() && both_sequential && !add,
            IterateUnionSequentialInplaceUpdates => !f.is_densifying() && both_sequential && add,
            IterateUnionRandomMergeUpdates => !f.is_densifying() && !add,
            IterateUnionRandomInplaceUpdates => !f.is_densifying() && add,
            AllIterateSequentialMergeUpdates => both_sequential && !add,
            AllIterateSequentialInplaceUpdates => both_sequential && add,
            AllIterateThisLookupThatMergeUpdates
            | AllIterateThatLookupThisMergeUpdates
            | AllLoopMergeUpdates => !add,
            AllIterateThisLookupThatInplaceUpdates | AllIterateThatLookupThisInplaceUpdates => add,
            AllLoopInplaceUpdates => true,
        }
    }

    /// Estimated work: positions visited × advance cost × lookup cost.
    pub fn cost(self, x: &VectorProfile, y: &VectorProfile) -> f64 {
        use AssignStrategy::*;
        match self {
            NonzerosIterateThisLookupThat => x.nonzero_walk_cost() * y.lookup_cost,
            NonzerosIterateThatLookupThisMergeUpdates
            | NonzerosIterateThatLookupThisInplaceUpdates => {
                y.nonzero_walk_cost() * x.lookup_cost
            }
            IterateIntersection => x.nonzero_walk_cost().min(y.nonzero_walk_cost()),
            IterateUnionSequentialMergeUpdates | IterateUnionSequentialInplaceUpdates => {
                x.nonzero_walk_cost() + y.nonzero_walk_cost()
            }
            IterateUnionRandomMergeUpdates | IterateUnionRandomInplaceUpdates => {
                x.nonzero_walk_cost() * y.lookup_cost + y.nonzero_walk_cost() * x.lookup_cost
            }
            AllIterateSequentialMergeUpdates | AllIterateSequentialInplaceUpdates => {
                x.full_walk_cost() + y.full_walk_cost()
            }
            AllIterateThisLookupThatMergeUpdates | AllIterateThisLookupThatInplaceUpdates => {
                x.full_walk_cost() * y.lookup_cost
            }
            AllIterateThatLookupThisMergeUpdates | AllIterateThatLookupThisInplaceUpdates => {
                y.full_walk_cost() * x.lookup_cost
            }
            AllLoopMergeUpdates | AllLoopInplaceUpdates => {
                x.size as f64 * x.lookup_cost * y.lookup_cost
            }
        }
    }

    /// Cheapest valid strategy under the built-in cost model.
    pub fn best(x: &VectorProfile, y: &VectorProfile, f: &dyn BinaryFunction) -> Self {
        Self::best_by(x, y, f, |strategy| strategy.cost(x, y))
    }

    /// Cheapest valid strategy under a caller-supplied cost model.
    ///
    /// Ties go to the strategy listed first in [`ASSIGN_STRATEGIES`]. If no
    /// strategy gets a finite cost the full loop is chosen.
    pub fn best_by(
        x: &VectorProfile,
        y: &VectorProfile,
        f: &dyn BinaryFunction,
        cost: impl Fn(Self) -> f64,
    ) -> Self {
        cheapest(
            &ASSIGN_STRATEGIES,
            AssignStrategy::AllLoopInplaceUpdates,
            |strategy| strategy.is_valid(x, y, f),
            cost,
        )
    }

    /// Run this strategy. The caller is responsible for validity.
    pub fn execute<X, Y>(self, x: &mut X, y: &Y, f: &dyn BinaryFunction) -> Result<()>
    where
        X: Vector + ?Sized,
        Y: Vector + ?Sized,
    {
        use AssignStrategy::*;
        VectorError::check_dimensions(x.size(), y.size())?;
        match self {
            NonzerosIterateThisLookupThat => {
                x.for_each_nonzero_mut(&mut |i, a| *a = f.apply(*a, y.get_quick(i)));
            }
            NonzerosIterateThatLookupThisMergeUpdates => {
                let updates = stage(
                    y.non_zeroes()
                        .map(|b| (b.index, f.apply(x.get_quick(b.index), b.value))),
                );
                x.merge_updates(&updates);
            }
            NonzerosIterateThatLookupThisInplaceUpdates => {
                for b in y.non_zeroes() {
                    let a = x.get_quick(b.index);
                    x.set_quick(b.index, f.apply(a, b.value));
                }
            }
            IterateIntersection => {
                let shared = x
                    .non_zeroes()
                    .merge_join_by(y.non_zeroes(), by_index)
                    .filter_map(|pair| match pair {
                        EitherOrBoth::Both(a, b) => Some((a.index, f.apply(a.value, b.value))),
                        _ => None,
                    });
                let updates = stage(shared);
                x.merge_updates(&updates);
            }
            IterateUnionSequentialMergeUpdates => {
                let union = x
                    .non_zeroes()
                    .merge_join_by(y.non_zeroes(), by_index)
                    .map(|pair| match pair {
                        EitherOrBoth::Left(a) => (a.index, f.apply(a.value, 0.0)),
                        EitherOrBoth::Right(b) => (b.index, f.apply(0.0, b.value)),
                        EitherOrBoth::Both(a, b) => (a.index, f.apply(a.value, b.value)),
                    });
                let updates = stage(union);
                x.merge_updates(&updates);
            }
            IterateUnionSequentialInplaceUpdates => union_sequential_inplace(x, y, f),
            IterateUnionRandomMergeUpdates => {
                let mut visited = Visited::default();
                let mut updates = stage(x.non_zeroes().map(|a| {
                    visited.insert(a.index);
                    (a.index, f.apply(a.value, y.get_quick(a.index)))
                }));
                for b in y.non_zeroes().filter(|b| !visited.contains(b.index)) {
                    updates.set(b.index, f.apply(0.0, b.value));
                }
                x.merge_updates(&updates);
            }
            IterateUnionRandomInplaceUpdates => {
                let mut visited = Visited::default();
                x.for_each_nonzero_mut(&mut |i, a| {
                    visited.insert(i);
                    *a = f.apply(*a, y.get_quick(i));
                });
                for b in y.non_zeroes().filter(|b| !visited.contains(b.index)) {
                    x.set_quick(b.index, f.apply(0.0, b.value));
                }
            }
            AllIterateSequentialMergeUpdates => {
                let updates = stage(
                    x.all()
                        .zip(y.all())
                        .map(|(a, b)| (a.index, f.apply(a.value, b.value))),
                );
                x.merge_updates(&updates);
            }
            AllIterateSequentialInplaceUpdates => {
                let mut ys = y.all();
                x.for_each_mut(&mut |_, a| {
                    let b = ys.next().map_or(0.0, |b| b.value);
                    *a = f.apply(*a, b);
                });
            }
            AllIterateThisLookupThatMergeUpdates => {
                let updates = stage(
                    x.all()
                        .map(|a| (a.index, f.apply(a.value, y.get_quick(a.index)))),
                );
                x.merge_updates(&updates);
            }
            AllIterateThisLookupThatInplaceUpdates => {
                x.for_each_mut(&mut |i, a| *a = f.apply(*a, y.get_quick(i)));
            }
            AllIterateThatLookupThisMergeUpdates => {
                let updates = stage(
                    y.all()
                        .map(|b| (b.index, f.apply(x.get_quick(b.index), b.value))),
                );
                x.merge_updates(&updates);
            }
            AllIterateThatLookupThisInplaceUpdates => {
                for b in y.all() {
                    let a = x.get_quick(b.index);
                    x.set_quick(b.index, f.apply(a, b.value));
                }
            }
            AllLoopMergeUpdates => {
                let updates = stage(
                    (0..x.size()).map(|i| (i, f.apply(x.get_quick(i), y.get_quick(i)))),
                );
                x.merge_updates(&updates);
            }
            AllLoopInplaceUpdates => {
                for i in 0..x.size() {
                    let value = f.apply(x.get_quick(i), y.get_quick(i));
                    x.set_quick(i, value);
                }
            }
        }
        Ok(())
    }
}

/// Collect results into a delta that keeps zeros, so that a zero result
/// clears the position when merged.
fn stage(entries: impl Iterator<Item = (usize, f64)>) -> SortedDelta {
    let mut updates = SortedDelta::allowing_defaults();
    for (index, value) in entries {
        updates.set(index, value);
    }
    updates
}

/// Union walk that writes into `x` while advancing a seek cursor over it.
///
/// Writes only land at or behind the cursor, so the positions still ahead
/// of it are unaffected.
fn union_sequential_inplace<X, Y>(x: &mut X, y: &Y, f: &dyn BinaryFunction)
where
    X: Vector + ?Sized,
    Y: Vector + ?Sized,
{
    let mut next_x = x.next_nonzero_from(0);
    for b in y.non_zeroes() {
        while let Some(a) = next_x.filter(|a| a.index < b.index) {
            x.set_quick(a.index, f.apply(a.value, 0.0));
            next_x = x.next_nonzero_from(a.index + 1);
        }
        match next_x {
            Some(a) if a.index == b.index => {
                x.set_quick(b.index, f.apply(a.value, b.value));
                next_x = x.next_nonzero_from(b.index + 1);
            }
            _ => x.set_quick(b.index, f.apply(0.0, b.value)),
        }
    }
    while let Some(a) = next_x {
        x.set_quick(a.index, f.apply(a.value, 0.0));
        next_x = x.next_nonzero_from(a.index + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{Divide, First, Max, Minus, Plus, Times};
    use crate::vector::{DenseVector, RandomAccessSparseVector, SequentialAccessSparseVector};

    fn dense() -> DenseVector {
        DenseVector::from_slice(&[1.0, 2.0, 3.0])
    }

    fn random() -> RandomAccessSparseVector {
        RandomAccessSparseVector::from_slice(&[10.0, 0.0, 0.0])
    }

    #[test]
    fn test_catalogue_order_and_fallback() {
        assert_eq!(ASSIGN_STRATEGIES.len(), 16);
        assert_eq!(ASSIGN_STRATEGIES[15], AssignStrategy::AllLoopInplaceUpdates);
        let x = VectorProfile::of(&SequentialAccessSparseVector::new(4));
        let y = VectorProfile::of(&RandomAccessSparseVector::new(4));
        // densifying and not add-constant-time: only full scans remain
        let valid: Vec<_> = ASSIGN_STRATEGIES
            .iter()
            .copied()
            .filter(|s| s.is_valid(&x, &y, &Divide))
            .collect();
        assert_eq!(
            valid,
            vec![
                AssignStrategy::AllIterateThisLookupThatMergeUpdates,
                AssignStrategy::AllIterateThatLookupThisMergeUpdates,
                AssignStrategy::AllLoopMergeUpdates,
                AssignStrategy::AllLoopInplaceUpdates,
            ]
        );
    }

    #[test]
    fn test_merge_variants_need_slow_inserts() {
        let x = VectorProfile::of(&dense());
        let y = VectorProfile::of(&random());
        for s in ASSIGN_STRATEGIES {
            if s.stages_updates() {
                assert!(!s.is_valid(&x, &y, &Plus), "{s:?}");
            }
        }
    }

    #[test]
    fn test_dense_plus_sparse_picks_nonzero_walk() {
        let x = VectorProfile::of(&dense());
        let y = VectorProfile::of(&random());
        assert_eq!(
            AssignStrategy::best(&x, &y, &Plus),
            AssignStrategy::NonzerosIterateThatLookupThisInplaceUpdates
        );

        let mut v = dense();
        crate::dispatch::assign(&mut v, &random(), &Plus).unwrap();
        assert_eq!(v.as_slice(), &[11.0, 2.0, 3.0]);
    }

    #[test]
    fn test_best_by_forces_strategy() {
        let x = VectorProfile::of(&dense());
        let y = VectorProfile::of(&random());
        let target = AssignStrategy::AllIterateThatLookupThisInplaceUpdates;
        let chosen =
            AssignStrategy::best_by(&x, &y, &Plus, |s| if s == target { 0.0 } else { 1.0 });
        assert_eq!(chosen, target);

        // an invalid favourite is never picked
        let invalid = AssignStrategy::AllLoopMergeUpdates;
        let chosen =
            AssignStrategy::best_by(&x, &y, &Plus, |s| if s == invalid { 0.0 } else { 1.0 });
        assert_ne!(chosen, invalid);
    }

    #[test]
    fn test_every_valid_strategy_agrees() {
        let xs: Vec<Box<dyn Vector>> = vec![
            Box::new(DenseVector::from_slice(&[1.0, 0.0, 3.0, 0.0, -2.0])),
            Box::new(RandomAccessSparseVector::from_slice(&[1.0, 0.0, 3.0, 0.0, -2.0])),
            Box::new(SequentialAccessSparseVector::from_slice(&[1.0, 0.0, 3.0, 0.0, -2.0])),
        ];
        let y = SequentialAccessSparseVector::from_slice(&[0.0, 4.0, 3.0, 0.0, 2.0]);
        let functions: [&dyn BinaryFunction; 5] = [&Plus, &Minus, &Times, &Max, &First];
        for f in functions {
            let expected: Vec<f64> = (0..5)
                .map(|i| f.apply(xs[0].get_quick(i), y.get_quick(i)))
                .collect();
            for x in &xs {
                let px = VectorProfile::of(&**x);
                let py = VectorProfile::of(&y);
                for s in ASSIGN_STRATEGIES.iter().filter(|s| s.is_valid(&px, &py, f)) {
                    let mut target = x.clone();
                    s.execute(&mut *target, &y, f).unwrap();
                    let got: Vec<f64> = target.all().map(|e| e.value).collect();
                    assert_eq!(got, expected, "{s:?} on {x:?}");
                }
            }
        }
    }

    #[test]
    fn test_union_inplace_cursor() {
        let mut x = DenseVector::from_slice(&[0.0, 5.0, 0.0, 7.0, 0.0, 1.0]);
        let y = SequentialAccessSparseVector::from_slice(&[2.0, 0.0, 0.0, 1.0, 4.0, 0.0]);
        AssignStrategy::IterateUnionSequentialInplaceUpdates
            .execute(&mut x, &y, &Minus)
            .unwrap();
        assert_eq!(x.as_slice(), &[-2.0, 5.0, 0.0, 6.0, -4.0, 1.0]);
    }
}
