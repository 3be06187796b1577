//! Export the values cache as CSV feature rows for the offline trainer.
//!
//! Row layout matches the surrogate's feature vector: latitude, longitude,
//! one one-hot column per sector label, then the target value.
//!
//! Usage: cargo run --bin export_training_set -- [out.csv]

use std::path::Path;

use standort::cache::{CacheStore, ValueKey, DEFAULT_CACHE_DIR};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "training_set.csv".to_string());

    // No default: exporting an absent corpus is an error, not an empty file.
    let values: CacheStore<ValueKey, f64> =
        CacheStore::open("values", Path::new(DEFAULT_CACHE_DIR), None)?;

    let mut labels: Vec<String> = Vec::new();
    for (key, _) in values.entries() {
        if !labels.contains(&key.tag) {
            labels.push(key.tag.clone());
        }
    }
    labels.sort();

    let mut writer = csv::Writer::from_path(&out_path)?;
    let mut header = vec!["lat".to_string(), "lon".to_string()];
    header.extend(labels.iter().map(|label| format!("sector_{label}")));
    header.push("value".to_string());
    writer.write_record(&header)?;

    for (key, value) in values.entries() {
        let point = key.coord.to_point();
        let mut row = vec![point.lat.to_string(), point.lon.to_string()];
        for label in &labels {
            row.push(if *label == key.tag { "1" } else { "0" }.to_string());
        }
        row.push(value.to_string());
        writer.write_record(&row)?;
    }
    writer.flush()?;

    println!(
        "exported {} rows with {} sector columns -> {out_path}",
        values.len(),
        labels.len()
    );
    Ok(())
}
