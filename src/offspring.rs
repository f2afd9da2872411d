//! Offspring distributions of the branching process, expressed through their probability
//! generating functions (PGFs).
//!
//! Each infected individual is hotspot-exposed with probability `p` (the risk-tolerance mean)
//! and otherwise only exposed to community transmission. With `a = β_c`, `b = β_h` and `N` the
//! population size, the two variants are
//!
//! ```text
//! Binomial: G(g) = p·((1 − p·b)(1 − a) + (1 − (1 − p·b)(1 − a))·g)^N + (1 − p)·(1 − a + a·g)^N
//! Poisson:  G(g) = (1 − p)·exp(N·a·(g − 1)) + p·exp(N·(a + b·p)·(g − 1))
//! ```
//!
//! The Poisson variant is the `N → ∞` limit of the binomial one; there `N` is only the scaling
//! constant shared with [`crate::rates::map_rates`].
//!
//! Every variant satisfies `G(1) = 1` and, for non-negative rates that keep the binomial base in
//! `[0, 1]`, is non-decreasing and convex on `[0, 1]`.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::rates::BranchingRates;

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OffspringModel {
    /// Finite population: each of the `N` contacts transmits independently.
    Binomial,
    /// Infinite-population limit of `Binomial`.
    #[default]
    Poisson,
}

impl OffspringModel {
    /// Evaluates the generating function at `g`.
    #[must_use]
    pub fn evaluate(
        self,
        g: f64,
        rates: &BranchingRates,
        risk_tolerance_mean: f64,
        population_size: usize,
    ) -> f64 {
        let (a, b, p) = (
            rates.community_rate,
            rates.hotspot_rate,
            risk_tolerance_mean,
        );
        #[allow(clippy::cast_precision_loss)]
        let n = population_size as f64;
        match self {
            OffspringModel::Binomial => {
                // Probability that a hotspot-exposed contact escapes infection.
                let escape = (1.0 - p * b) * (1.0 - a);
                p * (escape + (1.0 - escape) * g).powf(n) + (1.0 - p) * (1.0 - a + a * g).powf(n)
            }
            OffspringModel::Poisson => {
                (1.0 - p) * (n * a * (g - 1.0)).exp() + p * (n * (a + b * p) * (g - 1.0)).exp()
            }
        }
    }

    /// Binds the rates and population so the generating function can be handed to a solver.
    pub fn generating_function(
        self,
        rates: BranchingRates,
        risk_tolerance_mean: f64,
        population_size: usize,
    ) -> impl Fn(f64) -> f64 {
        move |g| self.evaluate(g, &rates, risk_tolerance_mean, population_size)
    }
}

/// Generating function of a Poisson offspring distribution with mean `r0`. This is the
/// homogeneous (no hotspot) case and the control baseline.
#[must_use]
pub fn homogeneous_poisson(g: f64, r0: f64) -> f64 {
    (r0 * (g - 1.0)).exp()
}
