//! Floating point comparison helpers built on the `approx` crate, plus the tolerances the
//! generating-function checks use.

use approx::AbsDiffEq;

/// Maximum tolerated deviation of a generating function from 1 at argument 1.
pub const PGF_TOLERANCE: f64 = 1e-9;

/// Compares if two floats are close via `approx::abs_diff_eq` using a maximum absolute difference
/// (epsilon) of `acc`.
#[must_use]
pub fn almost_eq(a: f64, b: f64, acc: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a == b;
    }
    a.abs_diff_eq(&b, acc)
}

/// Returns true if `value` is a finite probability, allowing `acc` of slack on either side of
/// `[0, 1]` for rounding.
#[must_use]
pub fn is_probability(value: f64, acc: f64) -> bool {
    value.is_finite() && value >= -acc && value <= 1.0 + acc
}
