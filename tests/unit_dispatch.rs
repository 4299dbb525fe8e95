//! Unit tests for strategy selection

use vectorcore::dispatch::{self, ASSIGN_STRATEGIES};
use vectorcore::function::{
    chain, Algebra, BinaryFunction, FnBinary, Max, MinusSquared, Negate, Plus, Second, Times,
};
use vectorcore::{
    AggregateStrategy, AssignStrategy, DenseVector, RandomAccessSparseVector,
    SequentialAccessSparseVector, Vector, VectorOps, VectorProfile,
};

/// `a · (1 + b)`: zero on the left stays zero, zero on the right is an identity.
fn scale_by_successor() -> impl BinaryFunction {
    FnBinary::with_algebra(
        |a: f64, b: f64| a * (1.0 + b),
        Algebra {
            like_right_plus: true,
            like_left_mult: true,
            ..Algebra::default()
        },
    )
}

fn ones_at(size: usize, indices: impl Iterator<Item = usize>) -> SequentialAccessSparseVector {
    SequentialAccessSparseVector::from_pairs(size, indices.map(|i| (i, 1.0))).unwrap()
}

#[test]
fn test_short_sparse_walks_the_intersection() {
    let mut x = ones_at(1000, [3, 500].into_iter());
    let y = ones_at(1000, (0..1000).step_by(10));
    let f = scale_by_successor();

    let best = AssignStrategy::best(&VectorProfile::of(&x), &VectorProfile::of(&y), &f);
    assert_eq!(best, AssignStrategy::IterateIntersection);

    x.assign_with(&y, &f).unwrap();
    assert_eq!(x.get_quick(3), 1.0);
    assert_eq!(x.get_quick(500), 2.0);
    assert_eq!(x.num_nonzero_elements(), 2);
}

#[test]
fn test_dense_target_walks_sparse_nonzeros() {
    let x = DenseVector::new(1000);
    let y = RandomAccessSparseVector::from_pairs(1000, [(7, 1.0)]).unwrap();
    let best = AssignStrategy::best(&VectorProfile::of(&x), &VectorProfile::of(&y), &Plus);
    assert_eq!(best, AssignStrategy::NonzerosIterateThatLookupThisInplaceUpdates);
}

#[test]
fn test_sequential_target_stages_updates() {
    let x = SequentialAccessSparseVector::new(100);
    let y = RandomAccessSparseVector::from_pairs(100, [(7, 1.0)]).unwrap();
    let best = AssignStrategy::best(&VectorProfile::of(&x), &VectorProfile::of(&y), &Plus);
    assert_eq!(best, AssignStrategy::NonzerosIterateThatLookupThisMergeUpdates);
    assert!(best.stages_updates());
}

#[test]
fn test_densifying_function_visits_everything() {
    let x = VectorProfile::of(&RandomAccessSparseVector::new(10));
    let y = VectorProfile::of(&RandomAccessSparseVector::new(10));
    let plus_one = FnBinary::new(|a: f64, b: f64| a + b + 1.0);
    for strategy in ASSIGN_STRATEGIES.iter().filter(|s| s.is_valid(&x, &y, &plus_one)) {
        assert!(
            format!("{strategy:?}").starts_with("All"),
            "{strategy:?} skips positions"
        );
    }

    let mut v = RandomAccessSparseVector::new(3);
    v.assign_with(&RandomAccessSparseVector::new(3), &plus_one).unwrap();
    assert_eq!(v.to_dense_vec(), vec![1.0, 1.0, 1.0]);
}

#[test]
fn test_copy_through_second() {
    let mut x = SequentialAccessSparseVector::from_slice(&[1.0, 2.0, 0.0, 4.0]);
    let y = RandomAccessSparseVector::from_slice(&[0.0, 5.0, 6.0, 0.0]);
    x.assign_with(&y, &Second).unwrap();
    assert_eq!(x.to_dense_vec(), vec![0.0, 5.0, 6.0, 0.0]);
    assert_eq!(x.num_nondefault_elements(), 2);
}

#[test]
fn test_negated_product_keeps_sparsity() {
    let f = chain(Negate, Times);
    assert!(f.is_like_left_mult() && f.is_like_right_mult());
    let mut x = RandomAccessSparseVector::from_slice(&[2.0, 0.0, 3.0]);
    let y = DenseVector::from_slice(&[4.0, 9.0, 0.0]);
    x.assign_with(&y, &f).unwrap();
    assert_eq!(x.to_dense_vec(), vec![-8.0, 0.0, 0.0]);
    assert_eq!(x.num_nondefault_elements(), 1);
}

#[test]
fn test_aggregate_example_and_selection() {
    let x = SequentialAccessSparseVector::from_pairs(3, [(0, 2.0), (2, 3.0)]).unwrap();
    let y = SequentialAccessSparseVector::from_pairs(3, [(0, 4.0), (1, 5.0)]).unwrap();
    assert_eq!(dispatch::aggregate(&x, &y, &Plus, &Times), Ok(8.0));

    // Max does not ignore zeros, so every position is visited
    let px = VectorProfile::of(&x);
    let py = VectorProfile::of(&y);
    let best = AggregateStrategy::best(&px, &py, &Max, &MinusSquared);
    assert!(matches!(
        best,
        AggregateStrategy::AllIterateSequential
            | AggregateStrategy::AllIterateThisLookupThat
            | AggregateStrategy::AllIterateThatLookupThis
            | AggregateStrategy::AllLoop
    ));
    assert_eq!(dispatch::aggregate(&x, &y, &Max, &MinusSquared), Ok(25.0));
}

#[test]
fn test_empty_vectors_never_apply() {
    let boom = FnBinary::new(|_: f64, _: f64| -> f64 { panic!("applied to an empty vector") });
    let mut x = RandomAccessSparseVector::new(0);
    let y = SequentialAccessSparseVector::new(0);
    assert_eq!(dispatch::aggregate(&x, &y, &boom, &boom), Ok(0.0));
    assert_eq!(dispatch::assign(&mut x, &y, &boom), Ok(()));
}

#[test]
fn test_custom_cost_model_forces_choice() {
    let x = DenseVector::from_slice(&[1.0, 2.0]);
    let y = DenseVector::from_slice(&[3.0, 4.0]);
    let px = VectorProfile::of(&x);
    let py = VectorProfile::of(&y);

    let forced = AggregateStrategy::best_by(&px, &py, &Plus, &Times, |s| {
        if s == AggregateStrategy::AllLoop {
            0.0
        } else {
            1.0
        }
    });
    assert_eq!(forced, AggregateStrategy::AllLoop);
    assert_eq!(forced.execute(&x, &y, &Plus, &Times), Ok(11.0));

    // no finite cost anywhere: fall back to the full loop
    let fallback = AssignStrategy::best_by(&px, &py, &Plus, |_| f64::INFINITY);
    assert_eq!(fallback, AssignStrategy::AllLoopInplaceUpdates);
}
