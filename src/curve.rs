//! Outbreak probability as a function of R0.
//!
//! A [`CurveBuilder`] sweeps R0 over a [`CurveGrid`] in increasing order, evaluating one
//! extinction probability per grid point. The default grid, `0.0, 0.1, …, 8.0`, is the one the
//! figures overlay on the simulated outbreak data.
//!
//! Curves are computed lazily through [`CurveBuilder::iter`], which can be restarted by calling it
//! again, or collected eagerly with [`CurveBuilder::build`]. Long sweeps can be stopped with a
//! [`CancellationToken`]; the token is checked between grid points only, since a single
//! bisection is cheap and bounded.
//!
//! Every grid point is independent of every other, so [`CurveBuilder::family`] computes the
//! curves for several (hotspot fraction, risk-tolerance mean) pairs on separate threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::error::ExtinctionError;
use crate::extinction::ExtinctionCalculator;
use crate::log::{debug, info};
use crate::offspring::OffspringModel;
use crate::parameters::EpidemicParameters;
use crate::solver::FixedPointSolver;

pub const DEFAULT_GRID_START: f64 = 0.0;
pub const DEFAULT_GRID_END: f64 = 8.0;
pub const DEFAULT_GRID_STEP: f64 = 0.1;

/// Largest number of points a grid may have.
pub const MAX_GRID_POINTS: usize = 10_000_000;

/// An evenly spaced set of R0 values `start + i·step` for `i = 0..=round((end − start) / step)`.
/// The end point is included when it lies on the grid.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CurveGrid {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl Default for CurveGrid {
    fn default() -> Self {
        CurveGrid {
            start: DEFAULT_GRID_START,
            end: DEFAULT_GRID_END,
            step: DEFAULT_GRID_STEP,
        }
    }
}

impl CurveGrid {
    /// # Errors
    ///
    /// Returns `ExtinctionError::InvalidGrid` if the grid is malformed. See
    /// [`CurveGrid::validate`].
    pub fn new(start: f64, end: f64, step: f64) -> Result<Self, ExtinctionError> {
        let grid = CurveGrid { start, end, step };
        grid.validate()?;
        Ok(grid)
    }

    /// # Errors
    ///
    /// Returns `ExtinctionError::InvalidGrid` if any bound is not finite, if `step` is not
    /// positive, if `end < start`, if `start` is negative (R0 cannot be), or if the grid would
    /// have more than [`MAX_GRID_POINTS`] points.
    pub fn validate(&self) -> Result<(), ExtinctionError> {
        if !(self.start.is_finite() && self.end.is_finite() && self.step.is_finite()) {
            return Err(ExtinctionError::InvalidGrid(format!(
                "bounds and step must be finite, got {self:?}"
            )));
        }
        if self.step <= 0.0 {
            return Err(ExtinctionError::InvalidGrid(format!(
                "step must be positive, got {}",
                self.step
            )));
        }
        if self.end < self.start {
            return Err(ExtinctionError::InvalidGrid(format!(
                "end {} is before start {}",
                self.end, self.start
            )));
        }
        if self.start < 0.0 {
            return Err(ExtinctionError::InvalidGrid(format!(
                "start {} is negative",
                self.start
            )));
        }
        let intervals = ((self.end - self.start) / self.step).round();
        #[allow(clippy::cast_precision_loss)]
        let limit = MAX_GRID_POINTS as f64;
        if !intervals.is_finite() || intervals >= limit {
            return Err(ExtinctionError::InvalidGrid(format!(
                "{intervals} intervals exceed the limit of {MAX_GRID_POINTS} points"
            )));
        }
        Ok(())
    }

    /// Number of points on the grid. Saturates at `usize::MAX` for grids that fail
    /// [`CurveGrid::validate`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn len(&self) -> usize {
        let intervals = ((self.end - self.start) / self.step).round() as usize;
        intervals.checked_add(1).unwrap_or(usize::MAX)
    }

    /// A grid always contains its start point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The `index`-th R0 value, `start + index·step`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self, index: usize) -> f64 {
        self.start + index as f64 * self.step
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(|index| self.value(index))
    }
}

/// One point on a curve.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub r0: f64,
    pub extinction_probability: f64,
    pub outbreak_probability: f64,
}

impl CurvePoint {
    fn from_extinction(r0: f64, extinction_probability: f64) -> Self {
        CurvePoint {
            r0,
            extinction_probability,
            outbreak_probability: 1.0 - extinction_probability,
        }
    }
}

/// The curve for one (hotspot fraction, risk-tolerance mean) pair of a family sweep.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveFamilyMember {
    pub hotspot_fraction: f64,
    pub risk_tolerance_mean: f64,
    pub points: Vec<CurvePoint>,
}

/// A cloneable flag that asks a running sweep to stop before its next grid point.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug)]
pub struct CurveBuilder {
    calculator: ExtinctionCalculator,
    model: OffspringModel,
    grid: CurveGrid,
    cancellation: Option<CancellationToken>,
}

impl CurveBuilder {
    /// # Errors
    ///
    /// Returns `ExtinctionError::InvalidGrid` if `grid` is malformed.
    pub fn new(model: OffspringModel, grid: CurveGrid) -> Result<Self, ExtinctionError> {
        grid.validate()?;
        Ok(CurveBuilder {
            calculator: ExtinctionCalculator::default(),
            model,
            grid,
            cancellation: None,
        })
    }

    #[must_use]
    pub fn with_solver(mut self, solver: FixedPointSolver) -> Self {
        self.calculator = ExtinctionCalculator::new(solver);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    #[must_use]
    pub fn model(&self) -> OffspringModel {
        self.model
    }

    #[must_use]
    pub fn grid(&self) -> &CurveGrid {
        &self.grid
    }

    #[must_use]
    pub fn solver(&self) -> &FixedPointSolver {
        self.calculator.solver()
    }

    /// Lazily evaluates the curve for `template`, whose `r0` is replaced by each grid value in
    /// turn. Calling `iter` again restarts the sweep from the first grid point.
    ///
    /// # Errors
    ///
    /// Returns `ExtinctionError::Domain` if the non-R0 fields of `template` are invalid.
    pub fn iter(&self, template: &EpidemicParameters) -> Result<CurveIter<'_>, ExtinctionError> {
        template.with_r0(self.grid.start).validate()?;
        Ok(CurveIter {
            builder: self,
            source: CurveSource::Structured(*template),
            index: 0,
            finished: false,
        })
    }

    /// Lazily evaluates the homogeneous (no hotspot) control curve.
    #[must_use]
    pub fn homogeneous_iter(&self) -> CurveIter<'_> {
        CurveIter {
            builder: self,
            source: CurveSource::Homogeneous,
            index: 0,
            finished: false,
        }
    }

    /// Evaluates every grid point for `template`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised at any grid point, or `ExtinctionError::Cancelled` if the
    /// sweep was cancelled.
    pub fn build(&self, template: &EpidemicParameters) -> Result<Vec<CurvePoint>, ExtinctionError> {
        debug!(
            "building {} curve over {} grid points for {:?}",
            self.model,
            self.grid.len(),
            template
        );
        self.iter(template)?.collect()
    }

    /// Evaluates the homogeneous control curve on every grid point.
    ///
    /// # Errors
    ///
    /// Returns `ExtinctionError::Cancelled` if the sweep was cancelled.
    pub fn homogeneous_curve(&self) -> Result<Vec<CurvePoint>, ExtinctionError> {
        self.homogeneous_iter().collect()
    }

    /// Builds one curve per (hotspot fraction, risk-tolerance mean) pair, the pairs taken in
    /// row-major order (`hotspot_fractions` outer). Each pair runs on its own scoped thread; the
    /// result is identical to building the curves one after another.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing pair in row-major order.
    pub fn family(
        &self,
        template: &EpidemicParameters,
        hotspot_fractions: &[f64],
        risk_tolerance_means: &[f64],
    ) -> Result<Vec<CurveFamilyMember>, ExtinctionError> {
        let pairs: Vec<(f64, f64)> = hotspot_fractions
            .iter()
            .flat_map(|&h| risk_tolerance_means.iter().map(move |&p| (h, p)))
            .collect();
        info!(
            "sweeping {} curves of {} points each",
            pairs.len(),
            self.grid.len()
        );

        let results: Vec<Result<Vec<CurvePoint>, ExtinctionError>> = thread::scope(|scope| {
            let handles: Vec<_> = pairs
                .iter()
                .map(|&(hotspot_fraction, risk_tolerance_mean)| {
                    let member_template = EpidemicParameters {
                        hotspot_fraction,
                        risk_tolerance_mean,
                        ..*template
                    };
                    scope.spawn(move || self.build(&member_template))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err("curve worker panicked".into()))
                })
                .collect()
        });

        pairs
            .into_iter()
            .zip(results)
            .map(|((hotspot_fraction, risk_tolerance_mean), points)| {
                Ok(CurveFamilyMember {
                    hotspot_fraction,
                    risk_tolerance_mean,
                    points: points?,
                })
            })
            .collect()
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

#[derive(Copy, Clone, Debug)]
enum CurveSource {
    Structured(EpidemicParameters),
    Homogeneous,
}

/// Iterator over the points of a curve, produced by [`CurveBuilder::iter`] and
/// [`CurveBuilder::homogeneous_iter`]. Stops after the first error.
pub struct CurveIter<'a> {
    builder: &'a CurveBuilder,
    source: CurveSource,
    index: usize,
    finished: bool,
}

impl Iterator for CurveIter<'_> {
    type Item = Result<CurvePoint, ExtinctionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.index >= self.builder.grid.len() {
            return None;
        }
        if self.builder.is_cancelled() {
            self.finished = true;
            debug!("curve sweep cancelled after {} points", self.index);
            return Some(Err(ExtinctionError::Cancelled {
                completed: self.index,
            }));
        }

        let r0 = self.builder.grid.value(self.index);
        self.index += 1;
        let calculator = &self.builder.calculator;
        let extinction_probability = match self.source {
            CurveSource::Structured(template) => {
                calculator.extinction_probability(&template.with_r0(r0), self.builder.model)
            }
            CurveSource::Homogeneous => calculator.homogeneous_extinction_probability(r0),
        };
        match extinction_probability {
            Ok(q) => Some(Ok(CurvePoint::from_extinction(r0, q))),
            Err(error) => {
                self.finished = true;
                Some(Err(error))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            return (0, Some(0));
        }
        let remaining = self.builder.grid.len() - self.index;
        (0, Some(remaining))
    }
}
