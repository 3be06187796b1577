//! JSON payload builders for the HTTP shell. Request validation and
//! serialization live here, out of the routing layer. The engine itself is
//! the authority; these are thin adapters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::company::Company;
use crate::data::import::{collect_sectors, load_companies, DEFAULT_COMPANIES_PATH};
use crate::data::registry::{load_registry, DEFAULT_REGISTRY_PATH};
use crate::engine::geo::Region;
use crate::engine::LocationRecommender;

const MAX_SAMPLE_SIZE: usize = 1_000_000;
const DEFAULT_MAX_RECOMMENDATIONS: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    /// Target sector tags. Must not be empty.
    pub sectors: Vec<String>,
    pub max_recommendations: Option<usize>,
    pub min_distance_km: Option<f64>,
    pub details_radius_km: Option<f64>,
    pub sample_size: Option<usize>,
    /// Restrict sampling to the Saarland sub-region.
    pub saarland_only: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributedTarget {
    pub name: String,
    pub geolocation: Geolocation,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationEntry {
    pub geolocation: Geolocation,
    pub value: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<AttributedTarget>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    pub status: &'static str,
    pub engine: &'static str,
    pub region: Region,
    pub sample_size: usize,
    pub target_count: usize,
    pub recommendations: Vec<RecommendationEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub errors: Vec<ValidationIssue>,
}

#[derive(Debug)]
pub enum RecommendPayloadError {
    Parse(serde_json::Error),
    Validation(ValidationErrorResponse),
    Engine(String),
}

impl fmt::Display for RecommendPayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Validation(_) => write!(f, "invalid recommendation request"),
            Self::Engine(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for RecommendPayloadError {}

pub fn health_payload() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "standort-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn sectors_payload() -> Result<String, Box<dyn std::error::Error>> {
    let companies = load_companies(DEFAULT_COMPANIES_PATH)?;
    let sectors = collect_sectors(&companies);
    Ok(serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "sectors": sectors
    }))?)
}

pub fn data_version_payload() -> Result<String, serde_json::Error> {
    match load_registry(DEFAULT_REGISTRY_PATH) {
        Some(entry) => serde_json::to_string_pretty(&entry),
        None => serde_json::to_string_pretty(&serde_json::json!({
            "status": "unknown",
            "message": "no dataset registry; run import first"
        })),
    }
}

fn validate_request(request: &RecommendationRequest) -> Vec<ValidationIssue> {
    let mut errors = Vec::new();
    if request.sectors.is_empty() || request.sectors.iter().all(|s| s.trim().is_empty()) {
        errors.push(ValidationIssue {
            field: "sectors",
            messages: vec!["at least one target sector is required".to_string()],
        });
    }
    if let Some(sample_size) = request.sample_size {
        if sample_size == 0 || sample_size > MAX_SAMPLE_SIZE {
            errors.push(ValidationIssue {
                field: "sample_size",
                messages: vec![format!("must be between 1 and {MAX_SAMPLE_SIZE}")],
            });
        }
    }
    for (field, value) in [
        ("min_distance_km", request.min_distance_km),
        ("details_radius_km", request.details_radius_km),
    ] {
        if let Some(km) = value {
            if !km.is_finite() || km < 0.0 {
                errors.push(ValidationIssue {
                    field,
                    messages: vec!["must be a non-negative number".to_string()],
                });
            }
        }
    }
    errors
}

fn entry_from_company(company: &Company) -> RecommendationEntry {
    RecommendationEntry {
        geolocation: Geolocation {
            latitude: company.latitude,
            longitude: company.longitude,
        },
        value: company.value.unwrap_or(0.0),
        targets: company
            .attributed_targets
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|target| AttributedTarget {
                name: target.name.clone(),
                geolocation: Geolocation {
                    latitude: target.latitude,
                    longitude: target.longitude,
                },
            })
            .collect(),
    }
}

/// Parse, validate and serve one recommendation request.
pub fn recommendations_payload(body: &str) -> Result<String, RecommendPayloadError> {
    let request: RecommendationRequest =
        serde_json::from_str(body).map_err(RecommendPayloadError::Parse)?;

    let errors = validate_request(&request);
    if !errors.is_empty() {
        return Err(RecommendPayloadError::Validation(ValidationErrorResponse {
            status: "error",
            message: "invalid recommendation request",
            errors,
        }));
    }

    let companies = load_companies(DEFAULT_COMPANIES_PATH).map_err(|err| {
        RecommendPayloadError::Engine(format!(
            "company dataset not available ({err}); run import first"
        ))
    })?;

    let mut engine = LocationRecommender::open_default(companies)
        .map_err(|err| RecommendPayloadError::Engine(err.to_string()))?;
    engine.set_target_tags(request.sectors.clone());
    if let Some(km) = request.min_distance_km {
        engine.set_min_recommendation_distance(km);
    }
    if let Some(km) = request.details_radius_km {
        engine.set_detailed_view_radius(km);
    }
    if let Some(sample_size) = request.sample_size {
        engine.set_sample_size(sample_size);
    }
    if request.saarland_only.unwrap_or(false) {
        engine.set_region(Region::Saarland);
    }

    let max_count = request
        .max_recommendations
        .unwrap_or(DEFAULT_MAX_RECOMMENDATIONS);
    let recommendations = engine
        .get_attributed_location_recommendations(max_count)
        .map_err(|err| RecommendPayloadError::Engine(err.to_string()))?;

    let response = RecommendationResponse {
        status: "ok",
        engine: if engine.uses_surrogate() {
            "surrogate"
        } else {
            "explicit_sum"
        },
        region: engine.region(),
        sample_size: engine.sample_size(),
        target_count: engine.targets().len(),
        recommendations: recommendations.iter().map(entry_from_company).collect(),
    };
    serde_json::to_string_pretty(&response).map_err(RecommendPayloadError::Parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sectors_fail_validation() {
        let request = RecommendationRequest {
            sectors: Vec::new(),
            max_recommendations: None,
            min_distance_km: None,
            details_radius_km: None,
            sample_size: None,
            saarland_only: None,
        };
        let errors = validate_request(&request);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "sectors");
    }

    #[test]
    fn out_of_range_parameters_fail_validation() {
        let request = RecommendationRequest {
            sectors: vec!["Steel".to_string()],
            max_recommendations: Some(5),
            min_distance_km: Some(-1.0),
            details_radius_km: Some(f64::NAN),
            sample_size: Some(0),
            saarland_only: None,
        };
        let errors = validate_request(&request);
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"sample_size"));
        assert!(fields.contains(&"min_distance_km"));
        assert!(fields.contains(&"details_radius_km"));
    }
}
