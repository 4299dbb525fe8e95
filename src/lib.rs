//! Vectorcore: dense and sparse numeric vectors
//!
//! Elementwise operations between vectors of different representations are
//! routed through a cost-based dispatcher. Each scalar function declares
//! which algebraic identities it satisfies (`f(a, 0) = a`, `f(0, b) = 0`,
//! `f(0, 0) = 0`, ...), each vector declares its access capabilities, and
//! the dispatcher picks the cheapest iteration strategy those facts prove
//! correct.
//!
//! ```
//! use vectorcore::{DenseVector, RandomAccessSparseVector, VectorOps};
//!
//! let mut x = DenseVector::from_slice(&[1.0, 2.0, 3.0]);
//! let y = RandomAccessSparseVector::from_pairs(3, [(0, 10.0)]).unwrap();
//! x += &y;
//! assert_eq!(x.to_dense_vec(), vec![11.0, 2.0, 3.0]);
//! assert_eq!(x.dot(&y).unwrap(), 110.0);
//! ```

pub mod delta;
pub mod dispatch;
pub mod error;
pub mod function;
pub mod map;
pub mod vector;

pub use delta::SortedDelta;
pub use dispatch::{AggregateStrategy, AssignStrategy, VectorProfile};
pub use error::{Result, VectorError};
pub use function::{Algebra, BinaryFunction, UnaryFunction};
pub use map::{HashConfig, OpenHashMap, OpenIntDoubleHashMap};
pub use vector::{
    DenseVector, Element, RandomAccessSparseVector, SequentialAccessSparseVector, Vector,
    VectorOps,
};
