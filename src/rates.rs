//! Maps epidemiological inputs onto per-contact branching rates.
//!
//! For a population of `N`, basic reproduction number `R0`, hotspot fraction `h` and
//! risk-tolerance mean `p`:
//!
//! ```text
//! β_c = R0 / N × (1 − h)
//! β_h = R0 / N × h / p / p
//! ```
//!
//! The hotspot rate is scaled by `1/p²` so that the expected number of secondary infections
//! stays `R0` once the offspring models weight hotspot exposure by `p` twice (once as the
//! share of exposed individuals, once as their own risk multiplier).

use serde::{Deserialize, Serialize};

use crate::error::ExtinctionError;
use crate::log::trace;
use crate::parameters::{
    validate_hotspot_fraction, validate_population_size, validate_r0,
    validate_risk_tolerance_mean, EpidemicParameters,
};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BranchingRates {
    /// `β_c`, the per-contact community transmission rate.
    pub community_rate: f64,
    /// `β_h`, the per-contact hotspot transmission rate.
    pub hotspot_rate: f64,
}

impl BranchingRates {
    /// Rates for a population without hotspot structure: every contact transmits at `R0 / N`.
    ///
    /// # Errors
    ///
    /// Returns `ExtinctionError::Domain` if `r0` is negative or not finite, or the population is
    /// empty.
    pub fn homogeneous(r0: f64, population_size: usize) -> Result<Self, ExtinctionError> {
        validate_r0(r0)?;
        validate_population_size(population_size)?;
        #[allow(clippy::cast_precision_loss)]
        let community_rate = r0 / population_size as f64;
        Ok(BranchingRates {
            community_rate,
            hotspot_rate: 0.0,
        })
    }

    /// # Errors
    ///
    /// See [`map_rates`].
    pub fn from_parameters(parameters: &EpidemicParameters) -> Result<Self, ExtinctionError> {
        map_rates(
            parameters.r0,
            parameters.hotspot_fraction,
            parameters.risk_tolerance_mean,
            parameters.population_size,
        )
    }
}

/// Converts `(R0, hotspot fraction, risk-tolerance mean, population size)` into community and
/// hotspot branching rates.
///
/// # Errors
///
/// Returns `ExtinctionError::Domain` if `risk_tolerance_mean` is not strictly positive, if
/// `hotspot_fraction` is outside `[0, 1]`, if `r0` is negative or not finite, or if
/// `population_size` is zero.
pub fn map_rates(
    r0: f64,
    hotspot_fraction: f64,
    risk_tolerance_mean: f64,
    population_size: usize,
) -> Result<BranchingRates, ExtinctionError> {
    validate_r0(r0)?;
    validate_hotspot_fraction(hotspot_fraction)?;
    validate_risk_tolerance_mean(risk_tolerance_mean)?;
    validate_population_size(population_size)?;

    #[allow(clippy::cast_precision_loss)]
    let per_capita = r0 / population_size as f64;
    let rates = BranchingRates {
        community_rate: per_capita * (1.0 - hotspot_fraction),
        hotspot_rate: per_capita * hotspot_fraction / risk_tolerance_mean / risk_tolerance_mean,
    };
    trace!(
        "mapped r0={} hotspot_fraction={} risk_tolerance_mean={} N={} to {:?}",
        r0,
        hotspot_fraction,
        risk_tolerance_mean,
        population_size,
        rates
    );
    Ok(rates)
}
