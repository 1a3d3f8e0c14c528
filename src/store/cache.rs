//! Explicit cache of the loaded snapshot.
//!
//! The cache holds at most one dataset, keyed by where it came from, the
//! configuration that produced it and the snapshot's modification time.
//! Readers receive an `Arc` to the dataset; replacing the entry never
//! affects a dataset a reader already holds.

use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use crate::error::{Error, Result};
use crate::models::CanonicalDataset;

/// Identity of a cached snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    /// Snapshot path or remote URL
    pub source: String,
    /// `PipelineConfig::fingerprint` of the producing configuration
    pub fingerprint: u64,
    /// Modification time of the snapshot file, `None` for remote sources
    pub modified: Option<SystemTime>,
}

impl SnapshotKey {
    #[must_use]
    pub fn local(path: &Path, fingerprint: u64, modified: Option<SystemTime>) -> Self {
        Self {
            source: path.display().to_string(),
            fingerprint,
            modified,
        }
    }

    #[must_use]
    pub fn remote(url: &str, fingerprint: u64) -> Self {
        Self {
            source: url.to_string(),
            fingerprint,
            modified: None,
        }
    }
}

type Entry = (SnapshotKey, Arc<CanonicalDataset>);

/// Single-entry snapshot cache
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entry: RwLock<Option<Entry>>,
}

fn poisoned<T>(_: T) -> Error {
    Error::Cache("snapshot cache lock poisoned".to_string())
}

impl SnapshotCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached dataset if its key equals `key`
    pub fn get(&self, key: &SnapshotKey) -> Result<Option<Arc<CanonicalDataset>>> {
        let entry = self.entry.read().map_err(poisoned)?;
        Ok(entry
            .as_ref()
            .filter(|(cached, _)| cached == key)
            .map(|(_, dataset)| Arc::clone(dataset)))
    }

    /// The cached dataset for `key`, loading and caching it on a miss
    ///
    /// A loader returning `Ok(None)` leaves the cache unchanged.
    pub fn get_or_load<F>(&self, key: SnapshotKey, load: F) -> Result<Option<Arc<CanonicalDataset>>>
    where
        F: FnOnce() -> Result<Option<CanonicalDataset>>,
    {
        if let Some(dataset) = self.get(&key)? {
            log::debug!("Snapshot cache hit for {}", key.source);
            return Ok(Some(dataset));
        }

        log::debug!("Snapshot cache miss for {}", key.source);
        match load()? {
            Some(dataset) => self.publish(key, dataset).map(Some),
            None => Ok(None),
        }
    }

    /// Replace the cached entry
    pub fn publish(&self, key: SnapshotKey, dataset: CanonicalDataset) -> Result<Arc<CanonicalDataset>> {
        let dataset = Arc::new(dataset);
        let mut entry = self.entry.write().map_err(poisoned)?;
        *entry = Some((key, Arc::clone(&dataset)));
        Ok(dataset)
    }

    /// Drop the cached entry
    pub fn invalidate(&self) -> Result<()> {
        let mut entry = self.entry.write().map_err(poisoned)?;
        *entry = None;
        Ok(())
    }

    /// The cached dataset regardless of key
    pub fn current(&self) -> Result<Option<Arc<CanonicalDataset>>> {
        let entry = self.entry.read().map_err(poisoned)?;
        Ok(entry.as_ref().map(|(_, dataset)| Arc::clone(dataset)))
    }
}
