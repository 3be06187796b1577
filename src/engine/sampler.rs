//! Monte Carlo candidate generation: independent uniform draws inside the
//! active region's bounding box, rounded per the coordinate precision policy.
//! Output order is draw order; identical rounded points are not deduplicated.

use serde::{Deserialize, Serialize};

use crate::data::company::Company;
use crate::engine::geo::{BoundingBox, GeoPoint, Region};
use crate::engine::rng::Rng;

/// Coordinate rounding policy. Coarser rounding maps more draws onto the same
/// cache key, trading positional accuracy for cache-hit probability across
/// repeated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordPrecision {
    /// 1 decimal place, ~11 km cells.
    #[default]
    Coarse,
    /// 2 decimal places, ~1 km cells.
    Medium,
    /// 6 decimal places, sub-meter cells.
    Fine,
}

impl CoordPrecision {
    pub fn decimals(&self) -> i32 {
        match self {
            Self::Coarse => 1,
            Self::Medium => 2,
            Self::Fine => 6,
        }
    }

    pub fn round(&self, x: f64) -> f64 {
        let scale = 10_f64.powi(self.decimals());
        (x * scale).round() / scale
    }

    pub fn round_point(&self, point: GeoPoint) -> GeoPoint {
        GeoPoint::new(self.round(point.lat), self.round(point.lon))
    }
}

#[derive(Debug, Clone)]
pub struct MonteCarloSampler {
    bounds: BoundingBox,
    precision: CoordPrecision,
    rng: Rng,
}

impl MonteCarloSampler {
    pub fn new(region: Region, precision: CoordPrecision) -> Self {
        Self {
            bounds: region.bounding_box(),
            precision,
            rng: Rng::from_entropy(),
        }
    }

    /// Deterministic sampler for tests and benchmarks.
    pub fn with_seed(region: Region, precision: CoordPrecision, seed: u64) -> Self {
        Self {
            bounds: region.bounding_box(),
            precision,
            rng: Rng::new(seed),
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// One uniform draw, rounded.
    pub fn sample_point(&mut self) -> GeoPoint {
        let lat = self.rng.in_range(self.bounds.lat_min, self.bounds.lat_max);
        let lon = self.rng.in_range(self.bounds.lon_min, self.bounds.lon_max);
        self.precision.round_point(GeoPoint::new(lat, lon))
    }

    /// `n` candidate locations in draw order.
    pub fn sample_candidates(&mut self, n: usize) -> Vec<Company> {
        (0..n).map(|_| Company::candidate(self.sample_point())).collect()
    }
}
