//! Epidemiological inputs to the extinction calculation.
//!
//! An `EpidemicParameters` value is usually built with [`EpidemicParametersBuilder`], whose
//! defaults match the reference setup used throughout the figures (a population of 1000 with no
//! hotspot transmission), or loaded from a JSON file:
//!
//! ```json
//! {
//!     "r0": 3.0,
//!     "hotspot_fraction": 0.5,
//!     "risk_tolerance_mean": 0.25
//! }
//! ```
//!
//! `population_size` may be omitted, in which case it defaults to
//! [`DEFAULT_POPULATION_SIZE`].

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ExtinctionError;
use crate::log::debug;

/// Reference population size. The Poisson model uses it only as a scaling constant that cancels
/// against the same factor in the rate mapping.
pub const DEFAULT_POPULATION_SIZE: usize = 1000;

fn default_population_size() -> usize {
    DEFAULT_POPULATION_SIZE
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Builder)]
#[serde(deny_unknown_fields)]
pub struct EpidemicParameters {
    /// Basic reproduction number.
    #[builder(default = "1.5")]
    pub r0: f64,

    /// Share of transmission that happens in hotspots, in `[0, 1]`.
    #[builder(default = "0.0")]
    #[serde(default)]
    pub hotspot_fraction: f64,

    /// Mean of the risk-tolerance distribution. This single value is both the divisor of the
    /// hotspot rate and the mixture weight of the offspring models.
    #[builder(default = "1.0")]
    pub risk_tolerance_mean: f64,

    #[builder(default = "DEFAULT_POPULATION_SIZE")]
    #[serde(default = "default_population_size")]
    pub population_size: usize,
}

impl Default for EpidemicParameters {
    fn default() -> Self {
        EpidemicParametersBuilder::default().build().unwrap()
    }
}

impl EpidemicParameters {
    /// Checks every field against the domain the rate mapping and offspring models are defined
    /// on.
    ///
    /// # Errors
    ///
    /// Returns `ExtinctionError::Domain` naming the first offending field.
    pub fn validate(&self) -> Result<(), ExtinctionError> {
        validate_r0(self.r0)?;
        validate_hotspot_fraction(self.hotspot_fraction)?;
        validate_risk_tolerance_mean(self.risk_tolerance_mean)?;
        validate_population_size(self.population_size)?;
        Ok(())
    }

    /// Returns a copy with `r0` replaced. Used when sweeping over an R0 grid.
    #[must_use]
    pub fn with_r0(&self, r0: f64) -> Self {
        Self { r0, ..*self }
    }

    /// Loads parameters from a JSON file and validates them.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or contains values outside
    /// the model's domain.
    pub fn from_json_file(path: &Path) -> Result<Self, ExtinctionError> {
        debug!("loading epidemic parameters from {}", path.display());
        let file = File::open(path)?;
        let parameters: EpidemicParameters = serde_json::from_reader(BufReader::new(file))?;
        parameters.validate()?;
        Ok(parameters)
    }
}

pub(crate) fn validate_r0(r0: f64) -> Result<(), ExtinctionError> {
    if !r0.is_finite() || r0 < 0.0 {
        return Err(ExtinctionError::domain(
            "r0",
            r0,
            "must be finite and non-negative",
        ));
    }
    Ok(())
}

pub(crate) fn validate_hotspot_fraction(hotspot_fraction: f64) -> Result<(), ExtinctionError> {
    // Written this way so that NaN is rejected.
    if !(0.0..=1.0).contains(&hotspot_fraction) {
        return Err(ExtinctionError::domain(
            "hotspot_fraction",
            hotspot_fraction,
            "is outside [0, 1]",
        ));
    }
    Ok(())
}

pub(crate) fn validate_risk_tolerance_mean(risk_tolerance_mean: f64) -> Result<(), ExtinctionError> {
    if !risk_tolerance_mean.is_finite() || risk_tolerance_mean <= 0.0 {
        return Err(ExtinctionError::domain(
            "risk_tolerance_mean",
            risk_tolerance_mean,
            "must be finite and strictly positive",
        ));
    }
    Ok(())
}

pub(crate) fn validate_population_size(population_size: usize) -> Result<(), ExtinctionError> {
    if population_size == 0 {
        return Err(ExtinctionError::domain(
            "population_size",
            0.0,
            "must be at least 1",
        ));
    }
    Ok(())
}
