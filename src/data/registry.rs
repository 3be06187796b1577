//! Dataset registry: source and import-time tracking for the company dataset.
//! Written by the importer; read by the app to show "data as of".

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_REGISTRY_PATH: &str = "data/registry.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSetEntry {
    /// Spreadsheet the companies were imported from.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    pub path: String,
}

pub fn load_registry(path: &str) -> Option<DataSetEntry> {
    let raw = fs::read_to_string(Path::new(path)).ok()?;
    serde_json::from_str(&raw).ok()
}

pub fn write_registry(path: &str, entry: &DataSetEntry) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(entry).map_err(std::io::Error::other)?;
    fs::write(path, raw)
}
