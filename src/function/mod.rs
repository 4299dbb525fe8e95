//! Scalar functions that report their own algebra.
//!
//! The dispatcher never inspects what a function computes. It only asks the
//! function which identities it satisfies, and uses those answers to prove
//! that skipping zero positions cannot change the result:
//!
//! | property | identity | lets the dispatcher |
//! |---|---|---|
//! | like right plus | `f(a, 0) = a` | iterate only the nonzeros of `y` |
//! | like left mult  | `f(0, b) = 0` | iterate only the nonzeros of `x` |
//! | like right mult | `f(a, 0) = 0` | iterate only the nonzeros of `y` (aggregation) |
//! | not densifying  | `f(0, 0) = 0` | iterate the union of both nonzero sets |
//! | associative + commutative | | visit positions in any order |
//!
//! A function that answers `false` is always safe: it only removes
//! strategies from consideration. Answering `true` wrongly produces wrong
//! results.
//!
//! New functions are built from old ones with the combinators in this module
//! ([`Chain`], [`ChainUnary`], [`BindFirst`], [`BindSecond`]) rather than by
//! subclassing.

mod builtin;

pub use builtin::*;

/// A function `f(a, b) -> f64` with queryable algebraic properties.
pub trait BinaryFunction: Send + Sync {
    fn apply(&self, a: f64, b: f64) -> f64;

    /// `f(a, 0) = a` for every `a`.
    fn is_like_right_plus(&self) -> bool {
        false
    }

    /// `f(0, b) = 0` for every `b`.
    fn is_like_left_mult(&self) -> bool {
        false
    }

    /// `f(a, 0) = 0` for every `a`.
    fn is_like_right_mult(&self) -> bool {
        false
    }

    /// `f(0, b) = f(a, 0) = 0` for every `a`, `b`.
    fn is_like_mult(&self) -> bool {
        self.is_like_left_mult() && self.is_like_right_mult()
    }

    /// `f(a, b) = f(b, a)`.
    fn is_commutative(&self) -> bool {
        false
    }

    /// `f(a, f(b, c)) = f(f(a, b), c)`.
    fn is_associative(&self) -> bool {
        false
    }

    fn is_associative_and_commutative(&self) -> bool {
        self.is_associative() && self.is_commutative()
    }

    /// `f(0, 0) != 0`: applying `f` elementwise populates zero positions.
    fn is_densifying(&self) -> bool {
        self.apply(0.0, 0.0) != 0.0
    }
}

/// A function `f(a) -> f64`.
pub trait UnaryFunction: Send + Sync {
    fn apply(&self, a: f64) -> f64;

    /// `f(0) != 0`.
    fn is_densifying(&self) -> bool {
        self.apply(0.0) != 0.0
    }
}

// ============================================================================
// Algebra flags
// ============================================================================

/// Snapshot of the flags a [`BinaryFunction`] reports.
///
/// Also the flag set carried by [`FnBinary`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Algebra {
    pub like_right_plus: bool,
    pub like_left_mult: bool,
    pub like_right_mult: bool,
    pub commutative: bool,
    pub associative: bool,
}

impl Algebra {
    /// Flags reported by `f`.
    pub fn of(f: &dyn BinaryFunction) -> Self {
        Self {
            like_right_plus: f.is_like_right_plus(),
            like_left_mult: f.is_like_left_mult(),
            like_right_mult: f.is_like_right_mult(),
            commutative: f.is_commutative(),
            associative: f.is_associative(),
        }
    }
}

/// A binary closure with explicitly declared algebra.
pub struct FnBinary<F> {
    f: F,
    algebra: Algebra,
}

impl<F: Fn(f64, f64) -> f64 + Send + Sync> FnBinary<F> {
    /// Wrap `f`, claiming no algebraic properties.
    pub fn new(f: F) -> Self {
        Self {
            f,
            algebra: Algebra::default(),
        }
    }

    /// Wrap `f` with the given flags. The caller vouches for them.
    pub fn with_algebra(f: F, algebra: Algebra) -> Self {
        Self { f, algebra }
    }
}

impl<F: Fn(f64, f64) -> f64 + Send + Sync> BinaryFunction for FnBinary<F> {
    fn apply(&self, a: f64, b: f64) -> f64 {
        (self.f)(a, b)
    }
    fn is_like_right_plus(&self) -> bool {
        self.algebra.like_right_plus
    }
    fn is_like_left_mult(&self) -> bool {
        self.algebra.like_left_mult
    }
    fn is_like_right_mult(&self) -> bool {
        self.algebra.like_right_mult
    }
    fn is_commutative(&self) -> bool {
        self.algebra.commutative
    }
    fn is_associative(&self) -> bool {
        self.algebra.associative
    }
}

/// A unary closure.
pub struct FnUnary<F>(pub F);

impl<F: Fn(f64) -> f64 + Send + Sync> UnaryFunction for FnUnary<F> {
    fn apply(&self, a: f64) -> f64 {
        (self.0)(a)
    }
}

// ============================================================================
// Combinators
// ============================================================================

/// `g(h(a, b))`.
pub struct Chain<G, H> {
    pub outer: G,
    pub inner: H,
}

/// Compose a unary function after a binary one.
pub fn chain<G: UnaryFunction, H: BinaryFunction>(outer: G, inner: H) -> Chain<G, H> {
    Chain { outer, inner }
}

impl<G: UnaryFunction, H: BinaryFunction> BinaryFunction for Chain<G, H> {
    fn apply(&self, a: f64, b: f64) -> f64 {
        self.outer.apply(self.inner.apply(a, b))
    }

    // Zero-absorbing identities survive iff g(0) = 0.
    fn is_like_left_mult(&self) -> bool {
        !self.outer.is_densifying() && self.inner.is_like_left_mult()
    }

    fn is_like_right_mult(&self) -> bool {
        !self.outer.is_densifying() && self.inner.is_like_right_mult()
    }

    fn is_commutative(&self) -> bool {
        self.inner.is_commutative()
    }
}

/// `g(h(a))`.
pub struct ChainUnary<G, H> {
    pub outer: G,
    pub inner: H,
}

/// Compose two unary functions.
pub fn chain_unary<G: UnaryFunction, H: UnaryFunction>(outer: G, inner: H) -> ChainUnary<G, H> {
    ChainUnary { outer, inner }
}

impl<G: UnaryFunction, H: UnaryFunction> UnaryFunction for ChainUnary<G, H> {
    fn apply(&self, a: f64) -> f64 {
        self.outer.apply(self.inner.apply(a))
    }
}

/// `b ↦ f(a, b)` for a fixed first argument.
pub struct BindFirst<F> {
    pub first: f64,
    pub f: F,
}

/// Fix the first argument of `f`.
pub fn bind_first<F: BinaryFunction>(first: f64, f: F) -> BindFirst<F> {
    BindFirst { first, f }
}

impl<F: BinaryFunction> UnaryFunction for BindFirst<F> {
    fn apply(&self, b: f64) -> f64 {
        self.f.apply(self.first, b)
    }
}

/// `a ↦ f(a, b)` for a fixed second argument.
pub struct BindSecond<F> {
    pub f: F,
    pub second: f64,
}

/// Fix the second argument of `f`.
pub fn bind_second<F: BinaryFunction>(f: F, second: f64) -> BindSecond<F> {
    BindSecond { f, second }
}

impl<F: BinaryFunction> UnaryFunction for BindSecond<F> {
    fn apply(&self, a: f64) -> f64 {
        self.f.apply(a, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_flags_hold() {
        let samples = [-3.5, -1.0, 0.0, 0.5, 2.0, 7.25];
        let functions: Vec<Box<dyn BinaryFunction>> = vec![
            Box::new(Plus),
            Box::new(Minus),
            Box::new(Times),
            Box::new(Max),
            Box::new(Min),
            Box::new(First),
            Box::new(Second),
            Box::new(PlusAbs),
            Box::new(MinusAbs),
            Box::new(MinusSquared),
            Box::new(PlusMult(3.0)),
            Box::new(PlusMult(1.0)),
            Box::new(chain(Negate, Times)),
        ];
        for f in &functions {
            for &a in &samples {
                if f.is_like_right_plus() {
                    assert_eq!(f.apply(a, 0.0), a);
                }
                if f.is_like_right_mult() {
                    assert_eq!(f.apply(a, 0.0), 0.0);
                }
                if f.is_like_left_mult() {
                    assert_eq!(f.apply(0.0, a), 0.0);
                }
                for &b in &samples {
                    if f.is_commutative() {
                        assert_eq!(f.apply(a, b), f.apply(b, a));
                    }
                    for &c in &samples {
                        if f.is_associative() {
                            assert_eq!(f.apply(a, f.apply(b, c)), f.apply(f.apply(a, b), c));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_densifying() {
        assert!(!Plus.is_densifying());
        assert!(Divide.is_densifying());
        assert!(Power.is_densifying());
        assert!(bind_second(Plus, 1.0).is_densifying());
        assert!(!bind_second(Times, 4.0).is_densifying());
        assert!(!Abs.is_densifying());
        assert!(Exp.is_densifying());
    }

    #[test]
    fn test_combinators() {
        let neg_times = chain(Negate, Times);
        assert_eq!(neg_times.apply(2.0, 3.0), -6.0);
        assert!(neg_times.is_like_mult());
        assert!(neg_times.is_commutative());
        assert!(!neg_times.is_associative());

        // exp(0) = 1 breaks zero absorption
        let exp_times = chain(Exp, Times);
        assert!(!exp_times.is_like_left_mult());

        assert_eq!(bind_first(10.0, Minus).apply(4.0), 6.0);
        assert_eq!(bind_second(Minus, 4.0).apply(10.0), 6.0);
        assert_eq!(chain_unary(Square, bind_second(Plus, 1.0)).apply(2.0), 9.0);
    }

    #[test]
    fn test_fn_binary_algebra() {
        let f = FnBinary::with_algebra(
            |a, b| a * (1.0 + b),
            Algebra {
                like_right_plus: true,
                like_left_mult: true,
                ..Algebra::default()
            },
        );
        assert_eq!(f.apply(2.0, 1.0), 4.0);
        let algebra = Algebra::of(&f);
        assert!(algebra.like_right_plus && algebra.like_left_mult);
        assert!(!algebra.commutative);
        assert_eq!(Algebra::of(&FnBinary::new(|a, _| a)), Algebra::default());
    }
}
