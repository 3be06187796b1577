//! Composite cache key types. Coordinates are fixed to microdegree integers
//! so keys hash exactly, and unordered pairs are canonicalized at
//! construction so the distance cache's symmetry is structural rather than a
//! double-lookup convention.

use serde::{Deserialize, Serialize};

use crate::engine::geo::GeoPoint;

const MICRODEG_PER_DEG: f64 = 1_000_000.0;

/// A rounded coordinate as microdegree fixed-point. One microdegree is about
/// 0.11 m of latitude, well below the finest rounding policy, so the
/// conversion never merges distinct rounded points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoordKey {
    pub lat_udeg: i64,
    pub lon_udeg: i64,
}

impl CoordKey {
    pub fn from_point(point: GeoPoint) -> Self {
        Self {
            lat_udeg: (point.lat * MICRODEG_PER_DEG).round() as i64,
            lon_udeg: (point.lon * MICRODEG_PER_DEG).round() as i64,
        }
    }

    pub fn to_point(self) -> GeoPoint {
        GeoPoint::new(
            self.lat_udeg as f64 / MICRODEG_PER_DEG,
            self.lon_udeg as f64 / MICRODEG_PER_DEG,
        )
    }
}

impl From<GeoPoint> for CoordKey {
    fn from(point: GeoPoint) -> Self {
        Self::from_point(point)
    }
}

/// Unordered pair of coordinates. `new` sorts the endpoints, so
/// `PairKey::new(a, b) == PairKey::new(b, a)` holds for all inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    lo: CoordKey,
    hi: CoordKey,
}

impl PairKey {
    pub fn new(a: CoordKey, b: CoordKey) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }
}

/// Value-cache key: rounded candidate coordinate plus the primary target
/// sector tag. Deliberately independent of the sampling region: a cached
/// value depends only on the coordinate and the target companies, so entries
/// stay valid when switching between whole-country and sub-region sampling.
/// Clear the values cache when the underlying company dataset changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueKey {
    pub coord: CoordKey,
    pub tag: String,
}

impl ValueKey {
    pub fn new(coord: CoordKey, tag: impl Into<String>) -> Self {
        Self {
            coord,
            tag: tag.into(),
        }
    }
}
