//! Opt-in memoization of curves.
//!
//! A [`CurveCache`] wraps a [`CurveBuilder`] and remembers every curve it has built, keyed by the
//! complete set of inputs that determine it: the offspring model, the non-R0 epidemic
//! parameters, the grid and the solver settings. Cached curves are immutable and shared through
//! `Arc`; entries only go away through [`CurveCache::invalidate`] or [`CurveCache::clear`].
//!
//! Floats are keyed by their bit patterns, so `0.1` and `0.1000000000000001` are different keys
//! and `-0.0` is distinct from `0.0`.

use std::sync::{Arc, Mutex, MutexGuard};

use rustc_hash::FxHashMap;

use crate::curve::{CurveBuilder, CurvePoint};
use crate::error::ExtinctionError;
use crate::log::trace;
use crate::offspring::OffspringModel;
use crate::parameters::EpidemicParameters;

/// Everything that determines a curve.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CurveKey {
    /// `None` for the homogeneous control curve.
    model: Option<OffspringModel>,
    hotspot_fraction: u64,
    risk_tolerance_mean: u64,
    population_size: usize,
    grid_start: u64,
    grid_end: u64,
    grid_step: u64,
    solver_lower_bound: u64,
    solver_upper_bound: u64,
    solver_iterations: usize,
}

impl CurveKey {
    fn new(builder: &CurveBuilder, template: Option<&EpidemicParameters>) -> Self {
        let grid = builder.grid();
        let solver = builder.solver();
        let (model, hotspot_fraction, risk_tolerance_mean, population_size) = match template {
            Some(t) => (
                Some(builder.model()),
                t.hotspot_fraction.to_bits(),
                t.risk_tolerance_mean.to_bits(),
                t.population_size,
            ),
            None => (None, 0, 0, 0),
        };
        CurveKey {
            model,
            hotspot_fraction,
            risk_tolerance_mean,
            population_size,
            grid_start: grid.start.to_bits(),
            grid_end: grid.end.to_bits(),
            grid_step: grid.step.to_bits(),
            solver_lower_bound: solver.lower_bound.to_bits(),
            solver_upper_bound: solver.upper_bound.to_bits(),
            solver_iterations: solver.iterations,
        }
    }
}

pub type CachedCurve = Arc<[CurvePoint]>;

pub struct CurveCache {
    builder: CurveBuilder,
    entries: Mutex<FxHashMap<CurveKey, CachedCurve>>,
}

impl CurveCache {
    #[must_use]
    pub fn new(builder: CurveBuilder) -> Self {
        CurveCache {
            builder,
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    #[must_use]
    pub fn builder(&self) -> &CurveBuilder {
        &self.builder
    }

    /// Returns the cached curve for `template`, building and caching it on a miss. The `r0`
    /// field of `template` is ignored.
    ///
    /// # Errors
    ///
    /// Returns any error raised while building the curve; nothing is cached in that case.
    pub fn get_or_build(
        &self,
        template: &EpidemicParameters,
    ) -> Result<CachedCurve, ExtinctionError> {
        let key = CurveKey::new(&self.builder, Some(template));
        self.get_or_insert_with(key, || self.builder.build(template))
    }

    /// Returns the cached homogeneous control curve, building it on a miss.
    ///
    /// # Errors
    ///
    /// Returns any error raised while building the curve.
    pub fn get_or_build_homogeneous(&self) -> Result<CachedCurve, ExtinctionError> {
        let key = CurveKey::new(&self.builder, None);
        self.get_or_insert_with(key, || self.builder.homogeneous_curve())
    }

    /// Removes the curve for `template`. Returns true if an entry was removed.
    pub fn invalidate(&self, template: &EpidemicParameters) -> bool {
        let key = CurveKey::new(&self.builder, Some(template));
        self.lock().remove(&key).is_some()
    }

    /// Removes the homogeneous control curve. Returns true if an entry was removed.
    pub fn invalidate_homogeneous(&self) -> bool {
        let key = CurveKey::new(&self.builder, None);
        self.lock().remove(&key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn get_or_insert_with<F>(&self, key: CurveKey, build: F) -> Result<CachedCurve, ExtinctionError>
    where
        F: FnOnce() -> Result<Vec<CurvePoint>, ExtinctionError>,
    {
        if let Some(curve) = self.lock().get(&key) {
            trace!("curve cache hit for {:?}", key);
            return Ok(Arc::clone(curve));
        }
        trace!("curve cache miss for {:?}", key);

        // Built without holding the lock. If another thread inserted the same key in the
        // meantime, its entry wins; both are bit-identical.
        let curve: CachedCurve = build()?.into();
        let mut entries = self.lock();
        Ok(Arc::clone(entries.entry(key).or_insert(curve)))
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<CurveKey, CachedCurve>> {
        self.entries.lock().expect("Mutex poisoned")
    }
}
