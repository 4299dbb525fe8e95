//! Built-in scalar functions.

use super::{BinaryFunction, UnaryFunction};

/// `a + b`
#[derive(Clone, Copy, Debug, Default)]
pub struct Plus;

impl BinaryFunction for Plus {
    fn apply(&self, a: f64, b: f64) -> f64 {
        a + b
    }
    fn is_like_right_plus(&self) -> bool {
        true
    }
    fn is_commutative(&self) -> bool {
        true
    }
    fn is_associative(&self) -> bool {
        true
    }
}

/// `a - b`
#[derive(Clone, Copy, Debug, Default)]
pub struct Minus;

impl BinaryFunction for Minus {
    fn apply(&self, a: f64, b: f64) -> f64 {
        a - b
    }
    fn is_like_right_plus(&self) -> bool {
        true
    }
}

/// `a * b`
#[derive(Clone, Copy, Debug, Default)]
pub struct Times;

impl BinaryFunction for Times {
    fn apply(&self, a: f64, b: f64) -> f64 {
        a * b
    }
    fn is_like_left_mult(&self) -> bool {
        true
    }
    fn is_like_right_mult(&self) -> bool {
        true
    }
    fn is_commutative(&self) -> bool {
        true
    }
    fn is_associative(&self) -> bool {
        true
    }
}

/// `a / b`
///
/// Claims nothing: `0 / 0` is NaN, so neither zero identity holds.
#[derive(Clone, Copy, Debug, Default)]
pub struct Divide;

impl BinaryFunction for Divide {
    fn apply(&self, a: f64, b: f64) -> f64 {
        a / b
    }
}

/// `max(a, b)`
#[derive(Clone, Copy, Debug, Default)]
pub struct Max;

impl BinaryFunction for Max {
    fn apply(&self, a: f64, b: f64) -> f64 {
        a.max(b)
    }
    fn is_commutative(&self) -> bool {
        true
    }
    fn is_associative(&self) -> bool {
        true
    }
}

/// `min(a, b)`
#[derive(Clone, Copy, Debug, Default)]
pub struct Min;

impl BinaryFunction for Min {
    fn apply(&self, a: f64, b: f64) -> f64 {
        a.min(b)
    }
    fn is_commutative(&self) -> bool {
        true
    }
    fn is_associative(&self) -> bool {
        true
    }
}

/// `a`
#[derive(Clone, Copy, Debug, Default)]
pub struct First;

impl BinaryFunction for First {
    fn apply(&self, a: f64, _b: f64) -> f64 {
        a
    }
    fn is_like_right_plus(&self) -> bool {
        true
    }
    fn is_like_left_mult(&self) -> bool {
        true
    }
    fn is_associative(&self) -> bool {
        true
    }
}

/// `b`
#[derive(Clone, Copy, Debug, Default)]
pub struct Second;

impl BinaryFunction for Second {
    fn apply(&self, _a: f64, b: f64) -> f64 {
        b
    }
    fn is_like_right_mult(&self) -> bool {
        true
    }
    fn is_associative(&self) -> bool {
        true
    }
}

/// `a ^ b`
#[derive(Clone, Copy, Debug, Default)]
pub struct Power;

impl BinaryFunction for Power {
    fn apply(&self, a: f64, b: f64) -> f64 {
        a.powf(b)
    }
}

/// `|a| + |b|`, the L1 accumulator.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlusAbs;

impl BinaryFunction for PlusAbs {
    fn apply(&self, a: f64, b: f64) -> f64 {
        a.abs() + b.abs()
    }
    fn is_commutative(&self) -> bool {
        true
    }
    fn is_associative(&self) -> bool {
        true
    }
}

/// `|a - b|`
#[derive(Clone, Copy, Debug, Default)]
pub struct MinusAbs;

impl BinaryFunction for MinusAbs {
    fn apply(&self, a: f64, b: f64) -> f64 {
        (a - b).abs()
    }
    fn is_commutative(&self) -> bool {
        true
    }
}

/// `(a - b)²`
#[derive(Clone, Copy, Debug, Default)]
pub struct MinusSquared;

impl BinaryFunction for MinusSquared {
    fn apply(&self, a: f64, b: f64) -> f64 {
        let d = a - b;
        d * d
    }
    fn is_commutative(&self) -> bool {
        true
    }
}

/// `a + k·b`
#[derive(Clone, Copy, Debug)]
pub struct PlusMult(pub f64);

/// `a - k·b`
pub fn minus_mult(k: f64) -> PlusMult {
    PlusMult(-k)
}

impl BinaryFunction for PlusMult {
    fn apply(&self, a: f64, b: f64) -> f64 {
        a + self.0 * b
    }
    fn is_like_right_plus(&self) -> bool {
        true
    }
    fn is_like_left_mult(&self) -> bool {
        self.0 == 0.0
    }
    fn is_commutative(&self) -> bool {
        self.0 == 1.0
    }
    fn is_associative(&self) -> bool {
        self.0 == 1.0 || self.0 == 0.0
    }
}

// ============================================================================
// Unary
// ============================================================================

#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl UnaryFunction for Identity {
    fn apply(&self, a: f64) -> f64 {
        a
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Abs;

impl UnaryFunction for Abs {
    fn apply(&self, a: f64) -> f64 {
        a.abs()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Negate;

impl UnaryFunction for Negate {
    fn apply(&self, a: f64) -> f64 {
        -a
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Square;

impl UnaryFunction for Square {
    fn apply(&self, a: f64) -> f64 {
        a * a
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Sqrt;

impl UnaryFunction for Sqrt {
    fn apply(&self, a: f64) -> f64 {
        a.sqrt()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Exp;

impl UnaryFunction for Exp {
    fn apply(&self, a: f64) -> f64 {
        a.exp()
    }
}

/// `ln(1 + a)`
#[derive(Clone, Copy, Debug, Default)]
pub struct Log1p;

impl UnaryFunction for Log1p {
    fn apply(&self, a: f64) -> f64 {
        a.ln_1p()
    }
}

/// `1 / a`
#[derive(Clone, Copy, Debug, Default)]
pub struct Inverse;

impl UnaryFunction for Inverse {
    fn apply(&self, a: f64) -> f64 {
        1.0 / a
    }
}
