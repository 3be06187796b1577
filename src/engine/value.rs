//! Candidate objective: distance-decayed contribution of each target company,
//! and the strategy seam between explicit summation and the learned surrogate.

use crate::data::company::Company;
use crate::predictor::ValuePredictor;

/// Default cutoff M: targets farther than this contribute nothing.
pub const DEFAULT_MAX_CONTRIBUTING_DISTANCE_KM: f64 = 1_000.0;

/// Normalized distance-decayed contribution of one target: 1 at distance 0,
/// linearly down to 0 at `max_distance_km`, clipped non-negative beyond.
pub fn vicinity(distance_km: f64, max_distance_km: f64) -> f64 {
    ((max_distance_km - distance_km) / max_distance_km).max(0.0)
}

/// Per-target weight in the value sum. Constant for now; the seam exists so
/// weighting (e.g. by company size) can change without touching selection.
pub fn potential(_target: &Company) -> f64 {
    1.0
}

/// How candidate values are computed, fixed once at engine construction so
/// the hot path carries no initialization checks.
#[derive(Debug, Clone)]
pub enum ValueStrategy {
    /// Sum `vicinity * potential` over all targets, memoized in the value cache.
    ExplicitSum,
    /// O(1) approximation through the learned predictor.
    Surrogate(ValuePredictor),
}

impl ValueStrategy {
    /// Pick the strategy for an optional predictor. An absent or
    /// uninitialized artifact falls back to explicit summation, a normal
    /// degraded mode, never an error.
    pub fn from_predictor(predictor: Option<ValuePredictor>) -> Self {
        match predictor {
            Some(p) if p.is_initialized() => Self::Surrogate(p),
            _ => Self::ExplicitSum,
        }
    }

    pub fn is_surrogate(&self) -> bool {
        matches!(self, Self::Surrogate(_))
    }
}
