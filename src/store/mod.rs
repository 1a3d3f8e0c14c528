//! The canonical store: the single materialized snapshot of a cleaning run.
//!
//! The snapshot is a Parquet file with the canonical schema. Publishing
//! writes the complete file next to its destination and renames it over
//! the previous snapshot, so a failed run never leaves a partial file and
//! readers always see a complete one. A delimited-text copy is accepted as
//! a fallback and converted to Parquet the first time it is loaded.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use arrow::csv::{ReaderBuilder, WriterBuilder};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::properties::WriterProperties;

use crate::config::{CleaningConfig, SnapshotConfig};
use crate::error::util::safe_open_file;
use crate::error::Result;
use crate::models::{CanonicalDataset, CanonicalRecord};
use crate::schema::canonical_schema;
use crate::utils::{FileOp, log_operation_complete, log_operation_start, snapshot_batch_size};

pub mod arrow_codec;
pub mod cache;

pub use arrow_codec::{batch_to_records, records_to_batch};
pub use cache::{SnapshotCache, SnapshotKey};

/// Field delimiter of the textual snapshot
pub const CSV_DELIMITER: u8 = b';';

/// Sibling path used while a file is being written
fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(fs::create_dir_all(parent)?),
        _ => Ok(()),
    }
}

/// Write `dataset` to `path` as Parquet, replacing any previous file atomically
pub fn write_parquet_snapshot(path: &Path, dataset: &CanonicalDataset) -> Result<()> {
    let start = Instant::now();
    log_operation_start(FileOp::PublishSnapshot, path);
    ensure_parent(path)?;

    let tmp = temporary_path(path);
    let written = (|| -> Result<()> {
        let file = File::create(&tmp)?;
        let props = WriterProperties::builder()
            .set_max_row_group_size(snapshot_batch_size())
            .build();
        let mut writer = ArrowWriter::try_new(file, canonical_schema(), Some(props))?;
        for chunk in dataset.records().chunks(snapshot_batch_size()) {
            writer.write(&records_to_batch(chunk)?)?;
        }
        writer.close()?;
        Ok(())
    })();

    if let Err(e) = written {
        // Never leave a half-written file behind
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)?;

    log_operation_complete(FileOp::PublishSnapshot, path, dataset.len(), Some(start.elapsed()));
    Ok(())
}

fn read_parquet_records(path: &Path) -> Result<Vec<CanonicalRecord>> {
    let start = Instant::now();
    log_operation_start(FileOp::LoadSnapshot, path);

    let file = safe_open_file(path, "snapshot loading")?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(snapshot_batch_size())
        .build()?;

    let mut records = Vec::new();
    for batch in reader {
        records.extend(batch_to_records(&batch?)?);
    }

    log_operation_complete(FileOp::LoadSnapshot, path, records.len(), Some(start.elapsed()));
    Ok(records)
}

/// Read a Parquet snapshot
pub fn read_parquet_snapshot(path: &Path) -> Result<CanonicalDataset> {
    read_parquet_records(path).map(CanonicalDataset::new)
}

/// Write `dataset` as `;`-delimited text with ISO dates
pub fn write_csv_snapshot(path: &Path, dataset: &CanonicalDataset) -> Result<()> {
    ensure_parent(path)?;
    let tmp = temporary_path(path);
    let written = (|| -> Result<()> {
        let file = File::create(&tmp)?;
        let mut writer = WriterBuilder::new()
            .with_header(true)
            .with_delimiter(CSV_DELIMITER)
            .build(file);
        for chunk in dataset.records().chunks(snapshot_batch_size()) {
            writer.write(&records_to_batch(chunk)?)?;
        }
        Ok(())
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)?;
    log_operation_complete(FileOp::WriteFallback, path, dataset.len(), None);
    Ok(())
}

fn read_csv_records(path: &Path) -> Result<Vec<CanonicalRecord>> {
    log_operation_start(FileOp::LoadFallback, path);
    let file = safe_open_file(path, "textual snapshot loading")?;
    let reader = ReaderBuilder::new(canonical_schema())
        .with_header(true)
        .with_delimiter(CSV_DELIMITER)
        .with_batch_size(snapshot_batch_size())
        .build(file)?;

    let mut records = Vec::new();
    for batch in reader {
        records.extend(batch_to_records(&batch?)?);
    }
    log_operation_complete(FileOp::LoadFallback, path, records.len(), None);
    Ok(records)
}

/// Read a textual snapshot written by `write_csv_snapshot`
///
/// Empty text fields read back as absent; an empty name reads back as "".
pub fn read_csv_snapshot(path: &Path) -> Result<CanonicalDataset> {
    read_csv_records(path).map(CanonicalDataset::new)
}

/// Location and publication of the canonical snapshot
///
/// Loaded records are checked against the canonical invariants of the
/// cleaning configuration; records breaking one are discarded.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    config: SnapshotConfig,
    cleaning: CleaningConfig,
}

impl SnapshotStore {
    #[must_use]
    pub const fn new(config: SnapshotConfig, cleaning: CleaningConfig) -> Self {
        Self { config, cleaning }
    }

    fn validated(&self, records: Vec<CanonicalRecord>, source: &Path) -> CanonicalDataset {
        let (dataset, discarded) = CanonicalDataset::validated(
            records,
            &self.cleaning.retention,
            self.cleaning.max_age,
        );
        if discarded > 0 {
            log::warn!(
                "Discarded {discarded} records of {} violating canonical invariants",
                source.display()
            );
        }
        dataset
    }

    /// Path of the Parquet snapshot
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.parquet_path
    }

    /// Whether a snapshot can be loaded without running the pipeline
    #[must_use]
    pub fn exists(&self) -> bool {
        self.config.parquet_path.is_file()
            || self.config.csv_fallback.as_deref().is_some_and(Path::is_file)
    }

    /// Modification time of the Parquet snapshot
    #[must_use]
    pub fn modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.config.parquet_path)
            .and_then(|m| m.modified())
            .ok()
    }

    /// Publish a new snapshot, replacing the current one
    pub fn publish(&self, dataset: &CanonicalDataset) -> Result<()> {
        write_parquet_snapshot(&self.config.parquet_path, dataset)
    }

    /// Load the current snapshot
    ///
    /// Prefers the Parquet file. Without one, a textual fallback is read,
    /// validated, published as Parquet for subsequent loads, and returned.
    /// `Ok(None)` when neither exists.
    pub fn load(&self) -> Result<Option<CanonicalDataset>> {
        let parquet = &self.config.parquet_path;
        if parquet.is_file() {
            let records = read_parquet_records(parquet)?;
            return Ok(Some(self.validated(records, parquet)));
        }

        let Some(fallback) = self.config.csv_fallback.as_deref().filter(|p| p.is_file()) else {
            log::debug!(
                "No snapshot at {} and no textual fallback",
                self.config.parquet_path.display()
            );
            return Ok(None);
        };

        let dataset = self.validated(read_csv_records(fallback)?, fallback);
        log::info!(
            "Converting textual snapshot {} to {}",
            fallback.display(),
            self.config.parquet_path.display()
        );
        self.publish(&dataset)?;
        Ok(Some(dataset))
    }
}
