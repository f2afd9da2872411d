//! Extinction and outbreak probabilities for branching processes with hotspot transmission.
//!
//! An outbreak seeded by a single infection either dies out or grows. The probability that it
//! dies out is the smallest fixed point `q = G(q)` on `[0, 1]` of the offspring
//! probability-generating function `G`. This crate evaluates `G` for a population split between
//! community transmission and transmission in hotspots, where each individual visits hotspots
//! with a probability drawn from a risk-tolerance distribution with mean `p`:
//!
//! * [`rates`] turns `(R0, h, p, N)` into per-pair community and hotspot transmission rates.
//! * [`offspring`] evaluates the binomial and Poisson forms of `G`.
//! * [`solver`] locates the fixed point by bisection with a fixed iteration budget.
//! * [`extinction`] combines these into extinction and outbreak probabilities.
//! * [`curve`] sweeps R0 over a grid, for single parameter sets or whole families.
//! * [`cache`] memoizes curves and [`report`] writes them as CSV.
//!
//! ```
//! use riskysir::{EpidemicParameters, ExtinctionCalculator, OffspringModel};
//!
//! let parameters = EpidemicParameters {
//!     r0: 3.0,
//!     hotspot_fraction: 0.5,
//!     risk_tolerance_mean: 0.25,
//!     ..EpidemicParameters::default()
//! };
//! let calculator = ExtinctionCalculator::default();
//! let q = calculator
//!     .extinction_probability(&parameters, OffspringModel::Poisson)
//!     .unwrap();
//! assert!((q - 0.2411).abs() < 1e-4);
//! ```
pub mod cache;
pub mod curve;
pub mod error;
pub mod extinction;
pub mod log;
pub mod numeric;
pub mod offspring;
pub mod parameters;
pub mod rates;
pub mod report;
pub mod runner;
pub mod solver;

mod macros;

pub use cache::CurveCache;
pub use curve::{CancellationToken, CurveBuilder, CurveFamilyMember, CurveGrid, CurvePoint};
pub use error::ExtinctionError;
pub use extinction::{
    extinction_probability, homogeneous_extinction_probability, outbreak_probability,
    ExtinctionCalculator, ExtinctionRecord,
};
pub use crate::log::{debug, error, info, trace, warn};
pub use offspring::{homogeneous_poisson, OffspringModel};
pub use parameters::{EpidemicParameters, EpidemicParametersBuilder, DEFAULT_POPULATION_SIZE};
pub use rates::{map_rates, BranchingRates};
pub use solver::{FixedPointSolver, DEFAULT_ITERATIONS};
