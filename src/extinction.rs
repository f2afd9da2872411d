//! Extinction and outbreak probabilities for one parameter set.
//!
//! [`ExtinctionCalculator`] maps the epidemiological parameters to branching rates, binds them
//! into the chosen offspring model's generating function and hands that to a
//! [`FixedPointSolver`]. The outbreak probability is always computed as `1 − extinction`, never
//! independently.
//!
//! ```
//! use riskysir::{ExtinctionCalculator, EpidemicParameters, OffspringModel};
//!
//! let parameters = EpidemicParameters {
//!     r0: 2.0,
//!     hotspot_fraction: 0.0,
//!     risk_tolerance_mean: 0.25,
//!     population_size: 1000,
//! };
//! let calculator = ExtinctionCalculator::default();
//! let q = calculator
//!     .extinction_probability(&parameters, OffspringModel::Poisson)
//!     .unwrap();
//! assert!((q - 0.2032).abs() < 1e-4);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ExtinctionError;
use crate::log::{debug, warn};
use crate::numeric::{almost_eq, is_probability, PGF_TOLERANCE};
use crate::offspring::{homogeneous_poisson, OffspringModel};
use crate::parameters::{validate_population_size, validate_r0, EpidemicParameters};
use crate::rates::BranchingRates;
use crate::solver::FixedPointSolver;

/// One evaluated parameter set, laid out for CSV output.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtinctionRecord {
    pub model: OffspringModel,
    pub r0: f64,
    pub hotspot_fraction: f64,
    pub risk_tolerance_mean: f64,
    pub population_size: usize,
    pub extinction_probability: f64,
    pub outbreak_probability: f64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ExtinctionCalculator {
    solver: FixedPointSolver,
}

impl ExtinctionCalculator {
    #[must_use]
    pub fn new(solver: FixedPointSolver) -> Self {
        ExtinctionCalculator { solver }
    }

    #[must_use]
    pub fn solver(&self) -> &FixedPointSolver {
        &self.solver
    }

    /// Returns the smallest fixed point in `[0, 1]` of the model's generating function.
    ///
    /// # Errors
    ///
    /// Returns `ExtinctionError::Domain` if the parameters are invalid and
    /// `ExtinctionError::NumericalAnomaly` if the mixture weight or, for the binomial model, a
    /// per-contact probability lies outside `[0, 1]`, or if the generating function leaves
    /// `[0, 1]` for these rates.
    pub fn extinction_probability(
        &self,
        parameters: &EpidemicParameters,
        model: OffspringModel,
    ) -> Result<f64, ExtinctionError> {
        let rates = BranchingRates::from_parameters(parameters)?;
        check_mixture(model, &rates, parameters.risk_tolerance_mean)?;
        let generating_function = model.generating_function(
            rates,
            parameters.risk_tolerance_mean,
            parameters.population_size,
        );
        let q = self.solve(&generating_function, model)?;
        debug!(
            "{} extinction probability {} for {:?}",
            model,
            q,
            parameters
        );
        Ok(q)
    }

    /// `1 − extinction_probability`.
    ///
    /// # Errors
    ///
    /// See [`ExtinctionCalculator::extinction_probability`].
    pub fn outbreak_probability(
        &self,
        parameters: &EpidemicParameters,
        model: OffspringModel,
    ) -> Result<f64, ExtinctionError> {
        Ok(1.0 - self.extinction_probability(parameters, model)?)
    }

    /// Computes both probabilities and packages them with their inputs.
    ///
    /// # Errors
    ///
    /// See [`ExtinctionCalculator::extinction_probability`].
    pub fn evaluate(
        &self,
        parameters: &EpidemicParameters,
        model: OffspringModel,
    ) -> Result<ExtinctionRecord, ExtinctionError> {
        let extinction_probability = self.extinction_probability(parameters, model)?;
        Ok(ExtinctionRecord {
            model,
            r0: parameters.r0,
            hotspot_fraction: parameters.hotspot_fraction,
            risk_tolerance_mean: parameters.risk_tolerance_mean,
            population_size: parameters.population_size,
            extinction_probability,
            outbreak_probability: 1.0 - extinction_probability,
        })
    }

    /// Extinction probability for a Poisson offspring distribution with mean `r0`, the fixed
    /// point of `g = exp(r0·(g − 1))`. Solved with the same solver as the structured models so
    /// the control curve lines up with them.
    ///
    /// # Errors
    ///
    /// Returns `ExtinctionError::Domain` if `r0` is negative or not finite.
    pub fn homogeneous_extinction_probability(&self, r0: f64) -> Result<f64, ExtinctionError> {
        validate_r0(r0)?;
        self.solve(&|g| homogeneous_poisson(g, r0), OffspringModel::Poisson)
    }

    /// # Errors
    ///
    /// See [`ExtinctionCalculator::homogeneous_extinction_probability`].
    pub fn homogeneous_outbreak_probability(&self, r0: f64) -> Result<f64, ExtinctionError> {
        Ok(1.0 - self.homogeneous_extinction_probability(r0)?)
    }

    /// Extinction probability of the homogeneous binomial model in a population of
    /// `population_size`, with every contact transmitting at `r0 / N`. As `N` grows this
    /// approaches [`ExtinctionCalculator::homogeneous_extinction_probability`].
    ///
    /// # Errors
    ///
    /// Returns `ExtinctionError::Domain` for an invalid `r0` or an empty population, and
    /// `ExtinctionError::NumericalAnomaly` if `r0 > N` pushes the per-contact probability above 1.
    pub fn binomial_homogeneous_extinction_probability(
        &self,
        r0: f64,
        population_size: usize,
    ) -> Result<f64, ExtinctionError> {
        validate_population_size(population_size)?;
        let rates = BranchingRates::homogeneous(r0, population_size)?;
        // A mixture weight of zero removes the hotspot term entirely.
        check_mixture(OffspringModel::Binomial, &rates, 0.0)?;
        let generating_function =
            OffspringModel::Binomial.generating_function(rates, 0.0, population_size);
        self.solve(&generating_function, OffspringModel::Binomial)
    }

    fn solve(
        &self,
        generating_function: &dyn Fn(f64) -> f64,
        model: OffspringModel,
    ) -> Result<f64, ExtinctionError> {
        check_generating_function(generating_function, model)?;
        let q = self.solver.solve_checked(generating_function)?;
        let at_q = generating_function(q);
        if !is_probability(q, 0.0) || !is_probability(at_q, PGF_TOLERANCE) {
            return Err(anomaly(format!(
                "{model} fixed point {q} maps to {at_q}, outside [0, 1]"
            )));
        }
        Ok(q)
    }
}

/// The mixture weights `p` and `1 − p` must be probabilities. The binomial model also treats
/// `β_c` and `p·β_h` as per-contact transmission probabilities. An even population exponent
/// hides a negative base from the generating-function checks, so these are tested directly.
fn check_mixture(
    model: OffspringModel,
    rates: &BranchingRates,
    risk_tolerance_mean: f64,
) -> Result<(), ExtinctionError> {
    if !is_probability(risk_tolerance_mean, 0.0) {
        return Err(anomaly(format!(
            "{model} mixture weight {risk_tolerance_mean} is outside [0, 1]"
        )));
    }
    if model == OffspringModel::Binomial {
        let community = rates.community_rate;
        let hotspot = risk_tolerance_mean * rates.hotspot_rate;
        if !is_probability(community, 0.0) {
            return Err(anomaly(format!(
                "binomial community transmission probability {community} is outside [0, 1]"
            )));
        }
        if !is_probability(hotspot, 0.0) {
            return Err(anomaly(format!(
                "binomial hotspot transmission probability {hotspot} is outside [0, 1]"
            )));
        }
    }
    Ok(())
}

/// A generating function must equal 1 at 1 and stay within `[0, 1]` at 0; anything else means
/// the rates have left the model's domain.
fn check_generating_function(
    generating_function: &dyn Fn(f64) -> f64,
    model: OffspringModel,
) -> Result<(), ExtinctionError> {
    let at_one = generating_function(1.0);
    if !almost_eq(at_one, 1.0, PGF_TOLERANCE) {
        return Err(anomaly(format!("{model} generating function is {at_one} at 1")));
    }
    let at_zero = generating_function(0.0);
    if !is_probability(at_zero, PGF_TOLERANCE) {
        return Err(anomaly(format!(
            "{model} generating function is {at_zero} at 0"
        )));
    }
    Ok(())
}

fn anomaly(message: String) -> ExtinctionError {
    warn!("{}", message);
    ExtinctionError::NumericalAnomaly(message)
}

/// Extinction probability using the default solver.
///
/// # Errors
///
/// See [`ExtinctionCalculator::extinction_probability`].
pub fn extinction_probability(
    parameters: &EpidemicParameters,
    model: OffspringModel,
) -> Result<f64, ExtinctionError> {
    ExtinctionCalculator::default().extinction_probability(parameters, model)
}

/// Outbreak probability using the default solver.
///
/// # Errors
///
/// See [`ExtinctionCalculator::extinction_probability`].
pub fn outbreak_probability(
    parameters: &EpidemicParameters,
    model: OffspringModel,
) -> Result<f64, ExtinctionError> {
    ExtinctionCalculator::default().outbreak_probability(parameters, model)
}

/// Homogeneous extinction probability using the default solver.
///
/// # Errors
///
/// See [`ExtinctionCalculator::homogeneous_extinction_probability`].
pub fn homogeneous_extinction_probability(r0: f64) -> Result<f64, ExtinctionError> {
    ExtinctionCalculator::default().homogeneous_extinction_probability(r0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::parameters::EpidemicParametersBuilder;
    use assert_approx_eq::assert_approx_eq;

    fn parameters(r0: f64, hotspot_fraction: f64, risk_tolerance_mean: f64) -> EpidemicParameters {
        EpidemicParametersBuilder::default()
            .r0(r0)
            .hotspot_fraction(hotspot_fraction)
            .risk_tolerance_mean(risk_tolerance_mean)
            .build()
            .unwrap()
    }

    #[test]
    fn homogeneous_reference_scenario() {
        let q = extinction_probability(&parameters(2.0, 0.0, 0.25), OffspringModel::Poisson)
            .unwrap();
        assert_approx_eq!(q, 0.2032, 1e-4);
    }

    #[test]
    fn zero_hotspot_fraction_matches_closed_form() {
        let calculator = ExtinctionCalculator::default();
        for r0 in [0.5, 1.0, 2.0, 5.0] {
            for risk_tolerance_mean in [0.125, 0.25, 0.5] {
                let structured = calculator
                    .extinction_probability(
                        &parameters(r0, 0.0, risk_tolerance_mean),
                        OffspringModel::Poisson,
                    )
                    .unwrap();
                let closed_form = calculator.homogeneous_extinction_probability(r0).unwrap();
                assert_almost_eq!(structured, closed_form, 1e-6);
            }
        }
    }

    #[test]
    fn probabilities_sum_to_one_and_stay_in_unit_interval() {
        let calculator = ExtinctionCalculator::default();
        for model in [OffspringModel::Binomial, OffspringModel::Poisson] {
            for r0 in [0.0, 0.5, 1.0, 2.0, 4.0, 8.0] {
                for hotspot_fraction in [0.0, 0.25, 0.5, 0.75] {
                    for risk_tolerance_mean in [0.125, 0.25, 0.5] {
                        let record = calculator
                            .evaluate(
                                &parameters(r0, hotspot_fraction, risk_tolerance_mean),
                                model,
                            )
                            .unwrap();
                        assert!((0.0..=1.0).contains(&record.extinction_probability));
                        assert_eq!(
                            record.outbreak_probability,
                            1.0 - record.extinction_probability
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn outbreak_probability_is_non_decreasing_in_r0() {
        let calculator = ExtinctionCalculator::default();
        for model in [OffspringModel::Binomial, OffspringModel::Poisson] {
            for (hotspot_fraction, risk_tolerance_mean) in [(0.0, 0.25), (0.5, 0.25), (0.75, 0.125)]
            {
                let mut previous = 0.0;
                for i in 0..=80 {
                    let r0 = f64::from(i) / 10.0;
                    let outbreak = calculator
                        .outbreak_probability(
                            &parameters(r0, hotspot_fraction, risk_tolerance_mean),
                            model,
                        )
                        .unwrap();
                    assert!(
                        outbreak >= previous - 1e-12,
                        "{model} outbreak probability decreased at r0={r0}"
                    );
                    previous = outbreak;
                }
            }
        }
    }

    #[test]
    fn zero_r0_never_breaks_out() {
        for hotspot_fraction in [0.0, 0.5, 1.0] {
            for risk_tolerance_mean in [0.125, 0.5, 1.0] {
                let outbreak = outbreak_probability(
                    &parameters(0.0, hotspot_fraction, risk_tolerance_mean),
                    OffspringModel::Poisson,
                )
                .unwrap();
                assert_almost_eq!(outbreak, 0.0, 1e-12);
            }
        }
    }

    #[test]
    fn large_r0_almost_surely_breaks_out() {
        let outbreak =
            outbreak_probability(&parameters(50.0, 0.0, 0.25), OffspringModel::Poisson).unwrap();
        assert_almost_eq!(outbreak, 1.0, 1e-12);
        let outbreak =
            outbreak_probability(&parameters(50.0, 0.5, 0.25), OffspringModel::Poisson).unwrap();
        assert!(outbreak > 0.74);
    }

    #[test]
    fn hotspot_structure_changes_outbreak_probability_at_fixed_r0() {
        // The mixture keeps the mean offspring count at R0 but adds variance, which raises
        // the chance of early extinction.
        let homogeneous =
            outbreak_probability(&parameters(3.0, 0.0, 0.25), OffspringModel::Poisson).unwrap();
        let hotspot =
            outbreak_probability(&parameters(3.0, 0.5, 0.25), OffspringModel::Poisson).unwrap();
        assert_almost_eq!(homogeneous, 1.0 - 0.059_520_209_292_640_375, 1e-10);
        assert_almost_eq!(hotspot, 1.0 - 0.241_105_984_790_117_5, 1e-10);
        assert!(hotspot < homogeneous);
    }

    #[test]
    fn binomial_and_poisson_agree_for_reference_population() {
        let calculator = ExtinctionCalculator::default();
        let p = parameters(3.0, 0.5, 0.25);
        let binomial = calculator
            .extinction_probability(&p, OffspringModel::Binomial)
            .unwrap();
        let poisson = calculator
            .extinction_probability(&p, OffspringModel::Poisson)
            .unwrap();
        assert_approx_eq!(binomial, 0.240_847_587_879_906_9, 1e-10);
        assert!((binomial - poisson).abs() < 1e-3);
    }

    #[test]
    fn binomial_homogeneous_converges_to_poisson() {
        let calculator = ExtinctionCalculator::default();
        let poisson = calculator.homogeneous_extinction_probability(2.0).unwrap();
        let mut previous_gap = f64::INFINITY;
        for population_size in [5, 10, 100, 1000] {
            let binomial = calculator
                .binomial_homogeneous_extinction_probability(2.0, population_size)
                .unwrap();
            let gap = (binomial - poisson).abs();
            assert!(gap < previous_gap);
            previous_gap = gap;
        }
        assert!(previous_gap < 1e-3);
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let calculator = ExtinctionCalculator::default();
        let p = parameters(3.0, 0.75, 0.125);
        let first = calculator
            .extinction_probability(&p, OffspringModel::Binomial)
            .unwrap();
        let second = calculator
            .extinction_probability(&p, OffspringModel::Binomial)
            .unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn invalid_parameters_are_domain_errors() {
        let result =
            extinction_probability(&parameters(2.0, 0.5, 0.0), OffspringModel::Poisson);
        assert!(matches!(result, Err(ExtinctionError::Domain { .. })));
        let result = homogeneous_extinction_probability(-1.0);
        assert!(matches!(result, Err(ExtinctionError::Domain { .. })));
    }

    #[test]
    fn extreme_binomial_rates_are_numerical_anomalies() {
        // p·β_h = 12.8 drives the binomial base far below zero.
        let p = EpidemicParameters {
            r0: 8.0,
            hotspot_fraction: 1.0,
            risk_tolerance_mean: 0.125,
            population_size: 5,
        };
        let result = extinction_probability(&p, OffspringModel::Binomial);
        assert!(matches!(result, Err(ExtinctionError::NumericalAnomaly(_))));
    }

    #[test]
    fn even_population_does_not_hide_out_of_range_probabilities() {
        let calculator = ExtinctionCalculator::default();
        // β_c = 1.5 with N = 2 squares a negative base into a plausible-looking value.
        let result = calculator.binomial_homogeneous_extinction_probability(3.0, 2);
        assert!(matches!(result, Err(ExtinctionError::NumericalAnomaly(_))));
        assert!(calculator
            .binomial_homogeneous_extinction_probability(2.0, 2)
            .is_ok());

        // p·β_h = 1.6 in a population of 1000.
        let p = EpidemicParameters {
            r0: 200.0,
            hotspot_fraction: 1.0,
            risk_tolerance_mean: 0.125,
            population_size: 1000,
        };
        let result = calculator.extinction_probability(&p, OffspringModel::Binomial);
        assert!(matches!(result, Err(ExtinctionError::NumericalAnomaly(_))));
    }

    #[test]
    fn mixture_weight_above_one_is_a_numerical_anomaly() {
        for model in [OffspringModel::Binomial, OffspringModel::Poisson] {
            let result = extinction_probability(&parameters(2.0, 0.25, 1.5), model);
            assert!(matches!(result, Err(ExtinctionError::NumericalAnomaly(_))));
        }
        assert!(
            extinction_probability(&parameters(2.0, 0.25, 1.0), OffspringModel::Binomial).is_ok()
        );
    }

    #[test]
    fn reduced_iteration_budget_is_honored() {
        let coarse = ExtinctionCalculator::new(FixedPointSolver::default().with_iterations(8));
        let q = coarse.homogeneous_extinction_probability(2.0).unwrap();
        assert!((q - 0.203_187_869_979_98).abs() <= 2.0f64.powi(-8));
        assert_eq!(coarse.solver().iterations, 8);
    }
}
