use std::collections::HashMap;
use std::path::PathBuf;

use standort::cache::CacheStore;
use standort::data::company::{Company, CompanyKind};
use standort::engine::geo::{haversine_km, GERMANY};
use standort::engine::rng::Rng;
use standort::engine::sampler::{CoordPrecision, MonteCarloSampler};
use standort::engine::value::{vicinity, ValueStrategy};
use standort::engine::{DistanceCache, LocationRecommender, ValueCache};
use standort::predictor::{DenseLayer, FeatureScaler, MlpRegressor, PredictorArtifact, ValuePredictor};

fn open_caches(tag: &str) -> (DistanceCache, ValueCache) {
    let dir: PathBuf =
        std::env::temp_dir().join(format!("standort-it-{tag}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let distances = CacheStore::open("distances", &dir, Some(HashMap::new())).unwrap();
    let values = CacheStore::open("values", &dir, Some(HashMap::new())).unwrap();
    (distances, values)
}

fn target(name: &str, tag: &str, lat: f64, lon: f64) -> Company {
    Company::new(CompanyKind::Target, lat, lon)
        .with_name(name)
        .with_tags(vec![tag.to_string()])
}

fn explicit_engine(companies: Vec<Company>, cache_tag: &str) -> LocationRecommender {
    let (distances, values) = open_caches(cache_tag);
    LocationRecommender::new(companies, distances, values, ValueStrategy::ExplicitSum)
}

#[test]
fn single_company_scenario_yields_one_valued_recommendation() {
    let company = target("Only", "A", 50.0, 10.0);
    let mut engine = explicit_engine(vec![company.clone()], "single");
    engine.set_target_tags(vec!["A".to_string()]);
    engine.set_sample_size(1);
    engine.set_sampler_seed(7);

    let recommendations = engine.get_location_recommendations(1).unwrap();
    assert_eq!(recommendations.len(), 1);

    let recommendation = &recommendations[0];
    // Rounding can nudge a draw past the box edge by at most half a cell.
    assert!(recommendation.latitude >= GERMANY.lat_min - 0.05);
    assert!(recommendation.latitude <= GERMANY.lat_max + 0.05);
    assert!(recommendation.longitude >= GERMANY.lon_min - 0.05);
    assert!(recommendation.longitude <= GERMANY.lon_max + 0.05);

    let distance = haversine_km(recommendation.position(), company.position());
    let expected = vicinity(distance, 1_000.0) * 1.0;
    assert!((recommendation.value.unwrap() - expected).abs() < 1e-9);
}

#[test]
fn oversized_min_distance_returns_at_most_one_recommendation() {
    let companies = vec![target("A", "Steel", 50.0, 10.0), target("B", "Steel", 52.0, 12.0)];
    let mut engine = explicit_engine(companies, "oversized-d");
    engine.set_target_tags(vec!["Steel".to_string()]);
    engine.set_sample_size(200);
    engine.set_sampler_seed(11);
    // Margin covers the half-cell rounding slop at the box edges.
    engine.set_min_recommendation_distance(GERMANY.diagonal_km() + 25.0);

    let recommendations = engine.get_location_recommendations(10).unwrap();
    assert!(recommendations.len() <= 1);
}

#[test]
fn recommendation_count_is_capped_by_max_count_and_sample_size() {
    let mut engine = explicit_engine(vec![target("A", "Steel", 50.0, 10.0)], "caps");
    engine.set_target_tags(vec!["Steel".to_string()]);
    engine.set_sampler_seed(13);
    engine.set_min_recommendation_distance(0.0);

    engine.set_sample_size(5);
    let recommendations = engine.get_location_recommendations(100).unwrap();
    assert!(recommendations.len() <= 5);

    engine.set_sample_size(50);
    let recommendations = engine.get_location_recommendations(3).unwrap();
    assert!(recommendations.len() <= 3);
}

#[test]
fn returned_recommendations_are_mutually_distant() {
    let companies = vec![target("A", "Steel", 49.5, 7.0), target("B", "Steel", 52.5, 13.4)];
    let mut engine = explicit_engine(companies, "diversity");
    engine.set_target_tags(vec!["Steel".to_string()]);
    engine.set_sample_size(300);
    engine.set_sampler_seed(17);
    engine.set_min_recommendation_distance(100.0);

    let recommendations = engine.get_location_recommendations(8).unwrap();
    assert!(recommendations.len() >= 2, "need at least two picks to check");
    for (i, a) in recommendations.iter().enumerate() {
        for b in &recommendations[i + 1..] {
            assert!(haversine_km(a.position(), b.position()) >= 100.0);
        }
    }
}

#[test]
fn empty_target_set_degenerates_to_draw_order() {
    let mut engine = explicit_engine(Vec::new(), "empty-targets");
    engine.set_target_tags(vec!["Nonexistent".to_string()]);
    engine.set_sample_size(20);
    engine.set_sampler_seed(42);
    engine.set_min_recommendation_distance(0.0);

    let recommendations = engine.get_location_recommendations(20).unwrap();
    assert_eq!(recommendations.len(), 20);
    assert!(recommendations.iter().all(|r| r.value == Some(0.0)));

    // With all values zero and no diversity constraint, the output must be
    // the sampler's draw order.
    let mut reference = MonteCarloSampler::with_seed(
        engine.region(),
        CoordPrecision::default(),
        Rng::new(42).next_u64(),
    );
    let expected = reference.sample_candidates(20);
    for (got, want) in recommendations.iter().zip(&expected) {
        assert_eq!(got.latitude, want.latitude);
        assert_eq!(got.longitude, want.longitude);
    }
}

#[test]
fn attribution_annotates_targets_inside_the_display_radius() {
    let company = target("Close", "A", 50.0, 10.0);
    let mut engine = explicit_engine(vec![company], "attribution");
    engine.set_target_tags(vec!["A".to_string()]);
    engine.set_sample_size(5);
    engine.set_sampler_seed(23);
    engine.set_min_recommendation_distance(0.0);

    // Radius larger than the country: every pick sees the target.
    engine.set_detailed_view_radius(100_000.0);
    let attributed = engine.get_attributed_location_recommendations(2).unwrap();
    for recommendation in &attributed {
        let nearby = recommendation.attributed_targets.as_ref().unwrap();
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].name, "Close");
    }

    // Plain recommendations leave the annotation unset.
    let plain = engine.get_location_recommendations(2).unwrap();
    assert!(plain.iter().all(|r| r.attributed_targets.is_none()));
}

#[test]
fn surrogate_strategy_bypasses_the_value_cache() {
    // Constant model: zero weights, bias 3.5.
    let artifact = PredictorArtifact {
        model: MlpRegressor {
            layers: vec![DenseLayer {
                weights: vec![vec![0.0, 0.0, 0.0]],
                biases: vec![3.5],
            }],
        },
        label_embedding: HashMap::from([("A".to_string(), vec![1.0])]),
        scaler: FeatureScaler::default(),
    };
    let predictor =
        ValuePredictor::from_artifact(artifact, std::path::Path::new("/tmp/unused-model.json"));

    let (distances, values) = open_caches("surrogate");
    let mut engine = LocationRecommender::new(
        vec![target("T", "A", 50.0, 10.0)],
        distances,
        values,
        ValueStrategy::from_predictor(Some(predictor)),
    );
    assert!(engine.uses_surrogate());
    engine.set_target_tags(vec!["A".to_string()]);
    engine.set_sample_size(10);
    engine.set_sampler_seed(31);
    engine.set_min_recommendation_distance(0.0);

    let recommendations = engine.get_location_recommendations(3).unwrap();
    assert_eq!(recommendations.len(), 3);
    assert!(recommendations.iter().all(|r| r.value == Some(3.5)));
    // The explicit-sum memoization level was never consulted.
    assert_eq!(engine.value_cache().hits(), 0);
    assert_eq!(engine.value_cache().misses(), 0);
}

#[test]
fn absent_model_artifact_falls_back_to_explicit_summation() {
    let predictor = ValuePredictor::load(std::path::Path::new("/nonexistent/model.json"));
    assert!(!predictor.is_initialized());

    let (distances, values) = open_caches("fallback");
    let mut engine = LocationRecommender::new(
        vec![target("T", "A", 50.0, 10.0)],
        distances,
        values,
        ValueStrategy::from_predictor(Some(predictor)),
    );
    assert!(!engine.uses_surrogate());
    engine.set_target_tags(vec!["A".to_string()]);
    engine.set_sample_size(10);
    engine.set_sampler_seed(37);

    let recommendations = engine.get_location_recommendations(2).unwrap();
    assert!(!recommendations.is_empty());
    assert!(engine.value_cache().misses() > 0);
}

#[test]
fn value_cache_survives_engine_restarts() {
    let dir: PathBuf =
        std::env::temp_dir().join(format!("standort-it-restart-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let companies = vec![target("T", "A", 50.0, 10.0)];
    let first_run = {
        let distances = CacheStore::open("distances", &dir, Some(HashMap::new())).unwrap();
        let values = CacheStore::open("values", &dir, Some(HashMap::new())).unwrap();
        let mut engine = LocationRecommender::new(
            companies.clone(),
            distances,
            values,
            ValueStrategy::ExplicitSum,
        );
        engine.set_target_tags(vec!["A".to_string()]);
        engine.set_sample_size(25);
        engine.set_sampler_seed(41);
        engine.get_location_recommendations(5).unwrap();
        engine.persist_caches().unwrap();
        engine.value_cache().len()
    };
    assert!(first_run > 0);

    // A fresh engine over the same cache directory sees every entry.
    let distances = CacheStore::open("distances", &dir, None).unwrap();
    let values = CacheStore::open("values", &dir, None).unwrap();
    let engine =
        LocationRecommender::new(companies, distances, values, ValueStrategy::ExplicitSum);
    assert_eq!(engine.value_cache().len(), first_run);
    let _ = std::fs::remove_dir_all(&dir);
}
