//! Persisted key→value store with hit/miss accounting. The whole map lives in
//! memory after `open` and is rewritten wholesale by `persist`: there is no
//! incremental durability, and concurrent writers to one file are
//! last-writer-wins (single-writer usage assumed).

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub const DEFAULT_CACHE_DIR: &str = "cache";

#[derive(Debug)]
pub enum CacheError {
    /// Cache identifier empty, or first-run cache opened without a default.
    Validation(String),
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "cache validation error: {msg}"),
            Self::Io(err) => write!(f, "cache io error: {err}"),
            Self::Serde(err) => write!(f, "cache serialization error: {err}"),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err)
    }
}

/// On disk: a JSON array of `[key, value]` pairs, so struct keys round-trip
/// (JSON object keys would have to be strings).
#[derive(Debug)]
pub struct CacheStore<K, V> {
    id: String,
    path: PathBuf,
    entries: HashMap<K, V>,
    hits: u64,
    misses: u64,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    /// Open the cache named `id` under `dir`, creating `dir` if absent
    /// (idempotent). Loads the backing file when it exists; otherwise starts
    /// from `default`, which must be supplied for a cache that does not yet
    /// exist on disk.
    pub fn open(id: &str, dir: &Path, default: Option<HashMap<K, V>>) -> Result<Self, CacheError> {
        if id.trim().is_empty() {
            return Err(CacheError::Validation("cache id must not be empty".into()));
        }
        fs::create_dir_all(dir)?;

        let path = dir.join(format!("{id}.json"));
        let entries = if path.exists() {
            let start = Instant::now();
            let raw = fs::read_to_string(&path)?;
            let pairs: Vec<(K, V)> = serde_json::from_str(&raw)?;
            let entries: HashMap<K, V> = pairs.into_iter().collect();
            println!(
                "cache {id}: loaded {} entries in {:.2}s",
                entries.len(),
                start.elapsed().as_secs_f64()
            );
            entries
        } else {
            println!("cache {id}: creating");
            default.ok_or_else(|| {
                CacheError::Validation(format!("cache {id} does not exist and no default was supplied"))
            })?
        };

        Ok(Self {
            id: id.to_string(),
            path,
            entries,
            hits: 0,
            misses: 0,
        })
    }

    /// Look up `key`, counting a hit or a miss.
    pub fn lookup(&mut self, key: &K) -> Option<V> {
        match self.entries.get(key) {
            Some(value) => {
                self.hits += 1;
                Some(value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    /// Serialize the full map to the backing file. Failures are fatal to the
    /// calling operation and propagate.
    pub fn persist(&self) -> Result<(), CacheError> {
        let pairs: Vec<(&K, &V)> = self.entries.iter().collect();
        let raw = serde_json::to_string(&pairs)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    /// Hit-rate summary. Pure bookkeeping, no effect on correctness.
    pub fn report(&self) -> String {
        let total = self.hits + self.misses;
        if total == 0 {
            return format!("cache {}: no lookups", self.id);
        }
        format!(
            "cache {}: {} entries, hit rate {:.1}% ({} hits / {} misses)",
            self.id,
            self.entries.len(),
            self.hits as f64 / total as f64 * 100.0,
            self.hits,
            self.misses
        )
    }
}
