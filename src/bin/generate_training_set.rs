//! Generate a balanced training corpus for the value surrogate.
//!
//! Queries the recommender once per sector label per round, so the values
//! cache accumulates one entry per (sampled coordinate, label) pair across
//! all sectors evenly. Runs until a wall-clock budget expires; caches are
//! persisted after every round as a checkpoint.
//!
//! Usage: cargo run --bin generate_training_set -- [hours] [sample_size]

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use standort::cache::{CacheStore, DEFAULT_CACHE_DIR};
use standort::data::import::{collect_sectors, load_companies, DEFAULT_COMPANIES_PATH};
use standort::engine::value::ValueStrategy;
use standort::engine::LocationRecommender;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let hours: f64 = std::env::args()
        .nth(1)
        .map(|raw| raw.parse())
        .transpose()?
        .unwrap_or(3.0);
    let sample_size: usize = std::env::args()
        .nth(2)
        .map(|raw| raw.parse())
        .transpose()?
        .unwrap_or(100);

    let companies = load_companies(DEFAULT_COMPANIES_PATH)?;
    let labels = collect_sectors(&companies);
    if labels.is_empty() {
        return Err("dataset has no sector tags".into());
    }
    println!("generating corpus for {} sector labels", labels.len());

    // Corpus generation must run the explicit objective: surrogate
    // predictions would not add new entries to the values cache.
    let cache_dir = Path::new(DEFAULT_CACHE_DIR);
    let distances = CacheStore::open("distances", cache_dir, Some(HashMap::new()))?;
    let values = CacheStore::open("values", cache_dir, Some(HashMap::new()))?;
    let mut engine =
        LocationRecommender::new(companies, distances, values, ValueStrategy::ExplicitSum);
    engine.set_sample_size(sample_size);

    let budget = Duration::from_secs_f64(hours * 3_600.0);
    let start = Instant::now();
    let mut rounds = 0_u64;
    while start.elapsed() < budget {
        for label in &labels {
            engine.set_target_tags(vec![label.clone()]);
            engine.get_attributed_location_recommendations(1)?;
        }
        rounds += 1;
        engine.persist_caches()?;
        println!(
            "round {rounds}: {} value samples after {:.1} minutes",
            engine.value_cache().len(),
            start.elapsed().as_secs_f64() / 60.0
        );
    }

    Ok(())
}
