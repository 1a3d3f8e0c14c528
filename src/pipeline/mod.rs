//! Orchestration of the full pipeline.
//!
//! A canonical dataset is obtained, in order of preference, from the remote
//! snapshot, from the local snapshot (or its textual fallback), or by
//! merging and cleaning the raw files and publishing the result.

use std::sync::Arc;
use std::time::Instant;

use log::info;

use crate::clean::{CleaningReport, clean};
use crate::config::PipelineConfig;
use crate::error::util::try_operations;
use crate::error::{Error, Result};
use crate::models::CanonicalDataset;
use crate::reader::merge_inputs;
use crate::remote::fetch_snapshot;
use crate::store::{SnapshotCache, SnapshotKey, SnapshotStore};

type Attempt<'a> = Box<dyn FnOnce() -> Result<Arc<CanonicalDataset>> + 'a>;

/// The pipeline bound to one validated configuration
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    fingerprint: u64,
    store: SnapshotStore,
    cache: SnapshotCache,
}

impl Pipeline {
    /// Create a pipeline after validating `config`
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fingerprint: config.fingerprint(),
            store: SnapshotStore::new(config.snapshot.clone(), config.cleaning.clone()),
            cache: SnapshotCache::new(),
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &SnapshotStore {
        &self.store
    }

    #[must_use]
    pub const fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    fn local_key(&self) -> SnapshotKey {
        SnapshotKey::local(self.store.path(), self.fingerprint, self.store.modified())
    }

    fn from_remote(&self) -> Result<Arc<CanonicalDataset>> {
        let Some(url) = self.config.remote.url.as_deref() else {
            return Err(Error::Remote("no remote URL configured".to_string()));
        };
        self.cache
            .get_or_load(SnapshotKey::remote(url, self.fingerprint), || {
                Ok(fetch_snapshot(&self.config.remote, &self.config.cleaning))
            })?
            .ok_or_else(|| Error::Remote(format!("remote snapshot {url} unavailable")))
    }

    fn from_local_snapshot(&self) -> Result<Arc<CanonicalDataset>> {
        if let Some(dataset) = self.cache.get(&self.local_key())? {
            return Ok(dataset);
        }
        let dataset = self.store.load()?.ok_or_else(|| {
            Error::SnapshotUnavailable(format!(
                "no snapshot at {}",
                self.store.path().display()
            ))
        })?;
        // Loading a textual fallback publishes a new Parquet file
        self.cache.publish(self.local_key(), dataset)
    }

    /// Obtain the canonical dataset by the first path that succeeds
    ///
    /// # Errors
    /// `Error::SnapshotUnavailable` listing every failed attempt when no
    /// path yields a dataset.
    pub fn run(&self) -> Result<Arc<CanonicalDataset>> {
        let attempts: Vec<Attempt<'_>> = vec![
            Box::new(|| self.from_remote()),
            Box::new(|| self.from_local_snapshot()),
            Box::new(|| self.rebuild().map(|(dataset, _)| dataset)),
        ];
        try_operations("load canonical snapshot", attempts)
    }

    /// Merge and clean the raw files, then publish the new snapshot
    ///
    /// The previous snapshot stays in place if any step fails.
    pub fn rebuild(&self) -> Result<(Arc<CanonicalDataset>, CleaningReport)> {
        let start = Instant::now();
        let raw = merge_inputs(&self.config.input)?;
        let (dataset, report) = clean(&raw, &self.config.cleaning)?;
        self.store.publish(&dataset)?;
        let dataset = self.cache.publish(self.local_key(), dataset)?;
        info!(
            "Published {} canonical records in {:?}",
            dataset.len(),
            start.elapsed()
        );
        Ok((dataset, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SnapshotConfig;

    fn config(dir: &std::path::Path) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.input.data_dir = dir.to_path_buf();
        config.snapshot = SnapshotConfig {
            parquet_path: dir.join("Deces_cleaned.parquet"),
            csv_fallback: None,
        };
        config
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = PipelineConfig::default();
        config.analysis.histogram_bins = 0;
        assert!(matches!(Pipeline::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_nothing_available() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(config(dir.path())).unwrap();
        let err = pipeline.run().unwrap_err();
        assert!(matches!(err, Error::SnapshotUnavailable(_)));
        assert!(err.to_string().contains("No raw input files"));
        assert!(!pipeline.store().exists());
    }

    #[test]
    fn test_rebuild_without_raw_files() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(config(dir.path())).unwrap();
        assert!(matches!(pipeline.rebuild(), Err(Error::NoInputFiles { .. })));
    }
}
