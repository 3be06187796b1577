//! Recommendation engine: samples candidate locations, scores them against
//! the configured target companies (explicitly or through the learned
//! surrogate), and extracts a diverse top-valued subset.

pub mod geo;
pub mod rng;
pub mod sampler;
pub mod selection;
pub mod value;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::cache::{CacheError, CacheStore, CoordKey, PairKey, ValueKey, DEFAULT_CACHE_DIR};
use crate::data::company::Company;
use crate::engine::geo::{haversine_km, GeoPoint, Region};
use crate::engine::rng::Rng;
use crate::engine::sampler::{CoordPrecision, MonteCarloSampler};
use crate::engine::selection::{select_diverse, sort_by_value_desc};
use crate::engine::value::{
    potential, vicinity, ValueStrategy, DEFAULT_MAX_CONTRIBUTING_DISTANCE_KM,
};
use crate::predictor::{PredictorError, ValuePredictor, DEFAULT_MODEL_PATH};

pub const DEFAULT_MIN_RECOMMENDATION_DISTANCE_KM: f64 = 50.0;
pub const DEFAULT_DISPLAY_RADIUS_KM: f64 = 1.0;
pub const DEFAULT_SAMPLE_SIZE: usize = 100_000;

pub type DistanceCache = CacheStore<PairKey, f64>;
pub type ValueCache = CacheStore<ValueKey, f64>;

#[derive(Debug)]
pub enum EngineError {
    Cache(CacheError),
    Predictor(PredictorError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache(err) => write!(f, "{err}"),
            Self::Predictor(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<CacheError> for EngineError {
    fn from(err: CacheError) -> Self {
        Self::Cache(err)
    }
}

impl From<PredictorError> for EngineError {
    fn from(err: PredictorError) -> Self {
        Self::Predictor(err)
    }
}

/// The composition root. Each instance owns its injected cache stores, so
/// multiple independent engines (e.g. concurrent tests) coexist in one
/// process.
#[derive(Debug)]
pub struct LocationRecommender {
    companies: Vec<Company>,
    target_tags: Vec<String>,
    targets: Vec<Company>,
    min_recommendation_distance_km: f64,
    display_radius_km: f64,
    max_contributing_distance_km: f64,
    sample_size: usize,
    region: Region,
    precision: CoordPrecision,
    strategy: ValueStrategy,
    distance_cache: DistanceCache,
    value_cache: ValueCache,
    rng: Rng,
}

impl LocationRecommender {
    pub fn new(
        companies: Vec<Company>,
        distance_cache: DistanceCache,
        value_cache: ValueCache,
        strategy: ValueStrategy,
    ) -> Self {
        Self {
            companies,
            target_tags: Vec::new(),
            targets: Vec::new(),
            min_recommendation_distance_km: DEFAULT_MIN_RECOMMENDATION_DISTANCE_KM,
            display_radius_km: DEFAULT_DISPLAY_RADIUS_KM,
            max_contributing_distance_km: DEFAULT_MAX_CONTRIBUTING_DISTANCE_KM,
            sample_size: DEFAULT_SAMPLE_SIZE,
            region: Region::default(),
            precision: CoordPrecision::default(),
            strategy,
            distance_cache,
            value_cache,
            rng: Rng::from_entropy(),
        }
    }

    /// Open an engine on the default cache directory and model artifact.
    pub fn open_default(companies: Vec<Company>) -> Result<Self, EngineError> {
        let dir = Path::new(DEFAULT_CACHE_DIR);
        let distance_cache = CacheStore::open("distances", dir, Some(HashMap::new()))?;
        let value_cache = CacheStore::open("values", dir, Some(HashMap::new()))?;
        let predictor = ValuePredictor::load(Path::new(DEFAULT_MODEL_PATH));
        let strategy = ValueStrategy::from_predictor(Some(predictor));
        Ok(Self::new(companies, distance_cache, value_cache, strategy))
    }

    /// Set the target sectors and derive the target list: every company
    /// sharing at least one tag with the set.
    pub fn set_target_tags(&mut self, target_tags: Vec<String>) {
        self.targets = self
            .companies
            .iter()
            .filter(|company| company.shares_any_tag(&target_tags))
            .cloned()
            .collect();
        self.target_tags = target_tags;
        println!("found {} target companies", self.targets.len());
    }

    pub fn set_min_recommendation_distance(&mut self, km: f64) {
        self.min_recommendation_distance_km = km;
    }

    pub fn set_detailed_view_radius(&mut self, km: f64) {
        self.display_radius_km = km;
    }

    pub fn set_max_contributing_distance(&mut self, km: f64) {
        self.max_contributing_distance_km = km;
    }

    pub fn set_sample_size(&mut self, sample_size: usize) {
        self.sample_size = sample_size;
    }

    pub fn set_region(&mut self, region: Region) {
        self.region = region;
    }

    pub fn set_precision(&mut self, precision: CoordPrecision) {
        self.precision = precision;
    }

    /// Make sampling deterministic. Test hook; production engines draw their
    /// seed from process entropy.
    pub fn set_sampler_seed(&mut self, seed: u64) {
        self.rng = Rng::new(seed);
    }

    pub fn targets(&self) -> &[Company] {
        &self.targets
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn uses_surrogate(&self) -> bool {
        self.strategy.is_surrogate()
    }

    pub fn value_cache(&self) -> &ValueCache {
        &self.value_cache
    }

    pub fn distance_cache(&self) -> &DistanceCache {
        &self.distance_cache
    }

    /// Persist both map caches. Failures propagate; nothing is retried.
    pub fn persist_caches(&self) -> Result<(), EngineError> {
        self.distance_cache.persist()?;
        self.value_cache.persist()?;
        Ok(())
    }

    fn cached_distance(cache: &mut DistanceCache, a: GeoPoint, b: GeoPoint) -> f64 {
        let key = PairKey::new(CoordKey::from_point(a), CoordKey::from_point(b));
        if let Some(distance) = cache.lookup(&key) {
            return distance;
        }
        let distance = haversine_km(a, b);
        cache.insert(key, distance);
        distance
    }

    /// Memoized great-circle distance in km.
    pub fn distance(&mut self, a: GeoPoint, b: GeoPoint) -> f64 {
        Self::cached_distance(&mut self.distance_cache, a, b)
    }

    /// First tag of the first target company; the value-cache key component.
    fn primary_target_tag(&self) -> Option<String> {
        self.targets
            .first()
            .and_then(|target| target.primary_tag())
            .map(str::to_string)
    }

    /// Objective value of one candidate under the configured strategy.
    pub fn candidate_value(&mut self, candidate: &Company) -> Result<f64, EngineError> {
        if self.targets.is_empty() {
            return Ok(0.0);
        }
        let position = candidate.position();
        let tag = self.primary_target_tag().unwrap_or_default();

        if let ValueStrategy::Surrogate(predictor) = &self.strategy {
            return Ok(predictor.predict_single(position.lat, position.lon, &tag)?);
        }

        let key = ValueKey::new(CoordKey::from_point(position), tag);
        if let Some(value) = self.value_cache.lookup(&key) {
            return Ok(value);
        }

        let cutoff = self.max_contributing_distance_km;
        let mut value = 0.0;
        for target in &self.targets {
            let distance =
                Self::cached_distance(&mut self.distance_cache, position, target.position());
            value += vicinity(distance, cutoff) * potential(target);
        }
        self.value_cache.insert(key, value);
        Ok(value)
    }

    /// Draw, score, sort and greedily extract up to `max_count` mutually
    /// distant recommendations. Returns fewer when the sample runs dry.
    pub fn get_location_recommendations(
        &mut self,
        max_count: usize,
    ) -> Result<Vec<Company>, EngineError> {
        println!(
            "recommending locations (max {max_count}) from {} monte carlo samples",
            self.sample_size
        );
        let mut sampler =
            MonteCarloSampler::with_seed(self.region, self.precision, self.rng.next_u64());
        let mut candidates = sampler.sample_candidates(self.sample_size);

        for candidate in &mut candidates {
            let value = self.candidate_value(candidate)?;
            candidate.value = Some(value);
        }
        sort_by_value_desc(&mut candidates);

        let min_distance = self.min_recommendation_distance_km;
        let distance_cache = &mut self.distance_cache;
        let recommendations = select_diverse(candidates, max_count, min_distance, |a, b| {
            Self::cached_distance(distance_cache, a.position(), b.position())
        });

        if !self.strategy.is_surrogate() {
            self.value_cache.persist()?;
            println!("{}", self.value_cache.report());
            println!("{}", self.distance_cache.report());
        }
        Ok(recommendations)
    }

    /// Like [Self::get_location_recommendations], additionally annotating each
    /// recommendation with the target companies inside the display radius.
    /// Presentation metadata only, not part of the objective or the
    /// diversity filter.
    pub fn get_attributed_location_recommendations(
        &mut self,
        max_count: usize,
    ) -> Result<Vec<Company>, EngineError> {
        let mut recommendations = self.get_location_recommendations(max_count)?;
        for recommendation in &mut recommendations {
            let position = recommendation.position();
            let mut nearby = Vec::new();
            for target in &self.targets {
                let distance =
                    Self::cached_distance(&mut self.distance_cache, position, target.position());
                if distance <= self.display_radius_km {
                    nearby.push(target.clone());
                }
            }
            recommendation.attributed_targets = Some(nearby);
        }
        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::company::CompanyKind;

    fn open_test_caches(tag: &str) -> (DistanceCache, ValueCache) {
        let dir = std::env::temp_dir().join(format!("standort-engine-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let distances = CacheStore::open("distances", &dir, Some(HashMap::new())).unwrap();
        let values = CacheStore::open("values", &dir, Some(HashMap::new())).unwrap();
        (distances, values)
    }

    fn company(name: &str, tag: &str, lat: f64, lon: f64) -> Company {
        Company::new(CompanyKind::Target, lat, lon)
            .with_name(name)
            .with_tags(vec![tag.to_string()])
    }

    #[test]
    fn target_derivation_matches_on_any_shared_tag() {
        let companies = vec![
            company("A", "Steel", 49.3, 6.8),
            company("B", "Retail", 50.0, 10.0),
            company("C", "Steel", 51.0, 11.0),
        ];
        let (distances, values) = open_test_caches("targets");
        let mut engine =
            LocationRecommender::new(companies, distances, values, ValueStrategy::ExplicitSum);

        engine.set_target_tags(vec!["Steel".to_string()]);
        assert_eq!(engine.targets().len(), 2);

        engine.set_target_tags(vec!["Retail".to_string(), "Steel".to_string()]);
        assert_eq!(engine.targets().len(), 3);

        engine.set_target_tags(vec!["Banking".to_string()]);
        assert!(engine.targets().is_empty());
    }

    #[test]
    fn empty_target_set_scores_every_candidate_zero() {
        let (distances, values) = open_test_caches("empty-targets");
        let mut engine =
            LocationRecommender::new(Vec::new(), distances, values, ValueStrategy::ExplicitSum);
        let candidate = Company::candidate(GeoPoint::new(50.0, 10.0));
        assert_eq!(engine.candidate_value(&candidate).unwrap(), 0.0);
    }

    #[test]
    fn distance_is_symmetric_through_the_cache() {
        let (distances, values) = open_test_caches("symmetric");
        let mut engine =
            LocationRecommender::new(Vec::new(), distances, values, ValueStrategy::ExplicitSum);
        let a = GeoPoint::new(52.52, 13.405);
        let b = GeoPoint::new(48.1351, 11.582);

        let forward = engine.distance(a, b);
        assert_eq!(engine.distance_cache().misses(), 1);
        let backward = engine.distance(b, a);
        assert_eq!(forward, backward);
        // Reversed order must register as a hit on the canonical key.
        assert_eq!(engine.distance_cache().hits(), 1);
    }

    #[test]
    fn explicit_value_is_memoized_per_coordinate_and_tag() {
        let companies = vec![company("A", "Steel", 50.0, 10.0)];
        let (distances, values) = open_test_caches("value-memo");
        let mut engine =
            LocationRecommender::new(companies, distances, values, ValueStrategy::ExplicitSum);
        engine.set_target_tags(vec!["Steel".to_string()]);

        let candidate = Company::candidate(GeoPoint::new(50.1, 10.1));
        let first = engine.candidate_value(&candidate).unwrap();
        let second = engine.candidate_value(&candidate).unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.value_cache().hits(), 1);
        assert_eq!(engine.value_cache().misses(), 1);
    }
}
