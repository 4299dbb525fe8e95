//! Error types for vectorcore
//!
//! Every fallible operation in the crate reports through [`VectorError`].
//! Failures are local: nothing is retried and no partial mutation is left
//! behind when an error is returned.

use thiserror::Error;

/// Errors raised by vectors, hash maps and sorted deltas.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VectorError {
    /// A binary operation was given two vectors of different dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the receiver
        expected: usize,
        /// Dimension of the argument
        actual: usize,
    },

    /// A bounds-checked accessor was given an index outside `0..size`.
    #[error("index {index} out of range for vector of size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    /// Hash map capacity or load factors are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An entry range of a sorted delta is empty, reversed or out of bounds.
    #[error("invalid range {from}..={to} for delta with {len} entries")]
    InvalidRange { from: usize, to: usize, len: usize },

    /// An argument outside the domain of an operation (e.g. a negative norm power).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl VectorError {
    /// Fail unless both dimensions agree.
    pub fn check_dimensions(expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(VectorError::DimensionMismatch { expected, actual })
        }
    }

    /// Fail unless `index < size`.
    pub fn check_index(index: usize, size: usize) -> Result<()> {
        if index < size {
            Ok(())
        } else {
            Err(VectorError::IndexOutOfRange { index, size })
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_check() {
        assert!(VectorError::check_dimensions(3, 3).is_ok());
        let err = VectorError::check_dimensions(3, 4).unwrap_err();
        assert_eq!(err, VectorError::DimensionMismatch { expected: 3, actual: 4 });
        assert!(err.to_string().contains("expected 3"));
    }

    #[test]
    fn test_index_check() {
        assert!(VectorError::check_index(0, 1).is_ok());
        assert!(VectorError::check_index(1, 1).is_err());
        assert!(VectorError::check_index(0, 0).is_err());
    }
}
