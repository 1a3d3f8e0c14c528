//! Asynchronous snapshot reading for read-side consumers.
//!
//! The pipeline itself is synchronous; these helpers let an async host load
//! the published snapshot without blocking its runtime.

use std::path::Path;
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use parquet::arrow::ProjectionMask;
use parquet::arrow::async_reader::ParquetRecordBatchStreamBuilder;
use tokio::fs::File;

use crate::error::{Error, Result};
use crate::models::CanonicalDataset;
use crate::store::batch_to_records;
use crate::utils::{
    FileOp, log_operation_complete, log_operation_start, log_warning, snapshot_batch_size,
};

/// Open a snapshot file asynchronously
pub async fn open_snapshot_async(path: &Path) -> Result<File> {
    File::open(path).await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open snapshot {}: {e}", path.display()),
        ))
    })
}

/// Stream the batches of a Parquet snapshot
///
/// # Arguments
/// * `path` - Path to the snapshot
/// * `columns` - Optional root columns to read; names missing from the file
///   are skipped with a warning
pub async fn read_snapshot_batches_async(
    path: &Path,
    columns: Option<&[String]>,
) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    log_operation_start(FileOp::LoadSnapshot, path);

    let file = open_snapshot_async(path).await?;
    let mut builder = ParquetRecordBatchStreamBuilder::new(file).await?;

    if let Some(columns) = columns {
        let schema = builder.schema();
        let indices: Vec<usize> = columns
            .iter()
            .filter_map(|name| {
                let idx = schema.index_of(name).ok();
                if idx.is_none() {
                    log_warning(&format!("Column {name} not in snapshot, skipping"), Some(path));
                }
                idx
            })
            .collect();
        let mask = ProjectionMask::roots(builder.parquet_schema(), indices);
        builder = builder.with_projection(mask);
    }

    let batches = builder
        .with_batch_size(snapshot_batch_size())
        .build()?
        .try_collect::<Vec<_>>()
        .await?;

    let rows = batches.iter().map(RecordBatch::num_rows).sum();
    log_operation_complete(FileOp::LoadSnapshot, path, rows, Some(start.elapsed()));
    Ok(batches)
}

/// Load a complete Parquet snapshot asynchronously
pub async fn read_snapshot_async(path: &Path) -> Result<CanonicalDataset> {
    let mut records = Vec::new();
    for batch in read_snapshot_batches_async(path, None).await? {
        records.extend(batch_to_records(&batch)?);
    }
    Ok(CanonicalDataset::new(records))
}
