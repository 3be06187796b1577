//! Company records: dataset entities and sampled recommendation candidates.
//! Coordinates and kind are fixed at construction; the computed fields
//! (value, attributed targets, color) start unset and are filled in by the
//! recommendation engine only.

use serde::{Deserialize, Serialize};

use crate::engine::geo::GeoPoint;

/// Placeholder name for dataset rows without one.
pub const UNKNOWN_COMPANY_NAME: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyKind {
    /// A sampled location recommended for founding a new branch.
    Recommendation,
    /// Founding a branch near this company is beneficial.
    Target,
    /// Founding a branch far from this company is beneficial.
    Competitor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub kind: CompanyKind,
    /// Sector tags. Never null: rows without tags get an empty list.
    #[serde(default)]
    pub tags: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,

    /// Objective score, set by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Target companies within the display radius, set by the engine on
    /// attributed recommendations. Presentation metadata only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributed_targets: Option<Vec<Company>>,
    /// Display color as a hex string, set by the presentation layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Company {
    pub fn new(kind: CompanyKind, latitude: f64, longitude: f64) -> Self {
        Self {
            name: UNKNOWN_COMPANY_NAME.to_string(),
            kind,
            tags: Vec::new(),
            latitude,
            longitude,
            value: None,
            attributed_targets: None,
            color: None,
        }
    }

    /// A sampled candidate location.
    pub fn candidate(point: GeoPoint) -> Self {
        Self::new(CompanyKind::Recommendation, point.lat, point.lon)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    /// True when this company carries at least one of `tags`.
    pub fn shares_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|tag| tags.contains(tag))
    }
}
