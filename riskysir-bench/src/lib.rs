//! Shared fixtures for the criterion benchmarks.

use riskysir::{CurveBuilder, CurveGrid, EpidemicParameters, ExtinctionError, OffspringModel};

/// Hotspot fractions of the published figure sweep.
pub const HOTSPOT_FRACTIONS: [f64; 3] = [0.25, 0.5, 0.75];

/// Risk-tolerance means of the published figure sweep.
pub const RISK_TOLERANCE_MEANS: [f64; 3] = [0.125, 0.25, 0.5];

/// A mid-range scenario: R0 = 3 with half of transmission in hotspots.
#[must_use]
pub fn scenario() -> EpidemicParameters {
    EpidemicParameters {
        r0: 3.0,
        hotspot_fraction: 0.5,
        risk_tolerance_mean: 0.25,
        ..EpidemicParameters::default()
    }
}

/// A builder over the default 0..=8 grid.
///
/// # Errors
///
/// Never for the default grid; kept fallible to mirror `CurveBuilder::new`.
pub fn default_builder(model: OffspringModel) -> Result<CurveBuilder, ExtinctionError> {
    CurveBuilder::new(model, CurveGrid::default())
}
