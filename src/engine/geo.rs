//! Geographic primitives: points, great-circle distance, sampling regions.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6_371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Both coordinates inside the valid geographic ranges.
    pub fn is_in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Great-circle distance between two points in kilometers (haversine).
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let s1 = (dlat / 2.0).sin();
    let s2 = (dlon / 2.0).sin();
    let h = s1 * s1 + lat1.cos() * lat2.cos() * s2 * s2;
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Axis-aligned latitude/longitude rectangle candidates are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.lat_min..=self.lat_max).contains(&point.lat)
            && (self.lon_min..=self.lon_max).contains(&point.lon)
    }

    /// Corner-to-corner distance in km. Upper bound on the separation of any
    /// two points inside the box.
    pub fn diagonal_km(&self) -> f64 {
        haversine_km(
            GeoPoint::new(self.lat_min, self.lon_min),
            GeoPoint::new(self.lat_max, self.lon_max),
        )
    }
}

/// Whole-country bounding box for Germany.
pub const GERMANY: BoundingBox = BoundingBox {
    lat_min: 47.2701,
    lat_max: 55.0991,
    lon_min: 5.8663,
    lon_max: 15.0419,
};

/// Bounding box for the Saarland sub-region.
pub const SAARLAND: BoundingBox = BoundingBox {
    lat_min: 49.1118,
    lat_max: 49.6399,
    lon_min: 6.3567,
    lon_max: 7.4048,
};

/// Which region candidates are sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    #[default]
    Germany,
    Saarland,
}

impl Region {
    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Self::Germany => GERMANY,
            Self::Saarland => SAARLAND,
        }
    }
}
