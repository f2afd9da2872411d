//! Bisection search for the smallest fixed point `g = G(g)` of a generating function.
//!
//! For a convex, non-decreasing `G` on `[0, 1]` with `G(1) = 1`, `G(g) > g` holds below the
//! smallest fixed point `q` and `G(g) < g` between `q` and `1`. Bisection on the sign of
//! `G(g) − g` therefore homes in on `q`, which is the extinction probability of the branching
//! process. In the subcritical case there is no fixed point below `1` and the search converges
//! to the upper bound.
//!
//! The search runs for a fixed number of halvings rather than testing for convergence. After
//! [`DEFAULT_ITERATIONS`] halvings the bracket width is `2⁻¹⁰⁰⁰`, far below `f64` resolution, so
//! the bracket has long since collapsed onto adjacent floats and the remaining iterations leave
//! it unchanged.

use crate::error::ExtinctionError;
use crate::log::trace;

/// Number of bisection steps performed by default.
pub const DEFAULT_ITERATIONS: usize = 1000;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FixedPointSolver {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub iterations: usize,
}

impl Default for FixedPointSolver {
    fn default() -> Self {
        FixedPointSolver {
            lower_bound: 0.0,
            upper_bound: 1.0,
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl FixedPointSolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bounds(self, lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            lower_bound,
            upper_bound,
            ..self
        }
    }

    #[must_use]
    pub fn with_iterations(self, iterations: usize) -> Self {
        Self { iterations, ..self }
    }

    /// Runs the bisection and returns the last midpoint evaluated. With zero iterations the lower
    /// bound is returned.
    pub fn solve<G>(&self, generating_function: G) -> f64
    where
        G: Fn(f64) -> f64,
    {
        let mut lower = self.lower_bound;
        let mut upper = self.upper_bound;
        let mut g = lower;
        for _ in 0..self.iterations {
            g = (upper + lower) / 2.0;
            let next = generating_function(g);
            if next < g {
                // The fixed point lies below `g`.
                upper = g;
            } else {
                lower = g;
            }
        }
        trace!(
            "bisection on [{}, {}] finished after {} iterations at {}",
            self.lower_bound,
            self.upper_bound,
            self.iterations,
            g
        );
        g
    }

    /// Like [`FixedPointSolver::solve`], but rejects bounds that are not a finite, ordered
    /// interval and results that are not finite or fall outside the bounds.
    ///
    /// # Errors
    ///
    /// Returns `ExtinctionError::ExtinctionError` for invalid bounds and
    /// `ExtinctionError::NumericalAnomaly` for an unusable result.
    pub fn solve_checked<G>(&self, generating_function: G) -> Result<f64, ExtinctionError>
    where
        G: Fn(f64) -> f64,
    {
        if !(self.lower_bound.is_finite()
            && self.upper_bound.is_finite()
            && self.lower_bound <= self.upper_bound)
        {
            return Err(format!(
                "invalid solver bounds [{}, {}]",
                self.lower_bound, self.upper_bound
            )
            .into());
        }
        let g = self.solve(generating_function);
        if !g.is_finite() || g < self.lower_bound || g > self.upper_bound {
            return Err(ExtinctionError::NumericalAnomaly(format!(
                "bisection result {g} outside [{}, {}]",
                self.lower_bound, self.upper_bound
            )));
        }
        Ok(g)
    }
}
