//! The merger: discovers raw yearly files and streams them into one raw table.
//!
//! Files are read sequentially in ascending year order, in fixed-size batches,
//! and every batch is adapted to the union of all file headers. No row is
//! dropped or reordered here.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arrow::csv::ReaderBuilder;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use log::{debug, error};

use crate::config::InputConfig;
use crate::error::util::{safe_open_file, validate_directory};
use crate::error::{Error, Result};
use crate::schema::{adapt_batch_to_schema, raw_schema_from_header, union_schema};
use crate::utils::logging::{create_spinner, finish_progress_bar};
use crate::utils::{FileOp, log_operation_complete, log_operation_start, log_warning};

/// Delimiters a misconfigured file is likely to use instead
const OTHER_DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Concatenation of every raw file, all columns as nullable text
#[derive(Debug, Clone)]
pub struct RawTable {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
    row_count: usize,
}

impl RawTable {
    /// Assemble a table from batches sharing `schema`
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        if let Some(batch) = batches.iter().find(|b| b.schema() != schema) {
            return Err(Error::schema(format!(
                "batch schema {:?} differs from table schema",
                batch.schema()
            )));
        }
        let row_count = batches.iter().map(RecordBatch::num_rows).sum();
        Ok(Self {
            schema,
            batches,
            row_count,
        })
    }

    /// Union schema of the table
    #[must_use]
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Batches in file order
    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total number of raw rows
    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    /// Whether the table holds no rows
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

/// Find the raw files of the configured year range that exist on disk
///
/// # Errors
/// `Error::NoInputFiles` when none of the expected files exists.
pub fn discover_input_files(config: &InputConfig) -> Result<Vec<PathBuf>> {
    log_operation_start(FileOp::Discover, &config.data_dir);
    validate_directory(&config.data_dir, "raw input discovery")?;

    let files: Vec<PathBuf> = config
        .years
        .years()
        .map(|year| config.file_for_year(year))
        .filter(|path| {
            let found = path.is_file();
            if !found {
                debug!("No raw file at {}", path.display());
            }
            found
        })
        .collect();

    if files.is_empty() {
        return Err(Error::NoInputFiles {
            dir: config.data_dir.clone(),
            years: config.years.to_string(),
        });
    }

    log_operation_complete(FileOp::Discover, &config.data_dir, files.len(), None);
    Ok(files)
}

/// Read and split the header line of a delimited file
///
/// # Errors
/// `Error::Delimiter` when the header is not split by `delimiter` but
/// by another common delimiter.
pub fn read_header(path: &Path, delimiter: char) -> Result<Vec<String>> {
    let mut reader = BufReader::new(safe_open_file(path, "header inspection")?);
    let mut line = String::new();
    reader.read_line(&mut line)?;

    let line = line
        .trim_start_matches('\u{feff}')
        .trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Err(Error::schema(format!("{} has no header row", path.display())));
    }

    let mistaken = OTHER_DELIMITERS
        .iter()
        .any(|other| *other != delimiter && line.contains(*other));
    if !line.contains(delimiter) && mistaken {
        return Err(Error::Delimiter {
            path: path.to_path_buf(),
            delimiter,
        });
    }

    Ok(line
        .split(delimiter)
        .map(|column| column.trim().trim_matches('"').to_string())
        .collect())
}

/// Stream one file into batches adapted to `target`
fn read_file_batches(
    path: &Path,
    file_schema: Schema,
    target: &SchemaRef,
    delimiter: u8,
    batch_size: usize,
    on_batch: &mut dyn FnMut(RecordBatch),
) -> Result<usize> {
    let start = Instant::now();
    log_operation_start(FileOp::ReadRaw, path);

    let file: File = safe_open_file(path, "raw input")?;
    let reader = ReaderBuilder::new(Arc::new(file_schema))
        .with_header(true)
        .with_delimiter(delimiter)
        .with_batch_size(batch_size)
        .build(file)?;

    let mut rows = 0;
    for batch in reader {
        let batch = batch.map_err(|e| {
            error!("Failed to decode {}: {e}", path.display());
            Error::from(e)
        })?;
        rows += batch.num_rows();
        on_batch(adapt_batch_to_schema(&batch, target)?);
    }

    log_operation_complete(FileOp::ReadRaw, path, rows, Some(start.elapsed()));
    Ok(rows)
}

/// Merge raw files, in the given order, into one table
///
/// Headers are read first so that the union schema is known before any row
/// is streamed. A file that cannot be decoded aborts the whole merge.
pub fn merge_files(paths: &[PathBuf], delimiter: char, batch_size: usize) -> Result<RawTable> {
    let delimiter_byte = u8::try_from(delimiter).map_err(|_| {
        Error::config(format!("delimiter {delimiter:?} is not a single byte"))
    })?;

    let file_schemas = paths
        .iter()
        .map(|path| raw_schema_from_header(&read_header(path, delimiter)?))
        .collect::<Result<Vec<_>>>()?;
    let target = union_schema(&file_schemas);

    let spinner = create_spinner(Some("merging raw files"));
    let mut batches = Vec::new();
    for (path, file_schema) in paths.iter().zip(file_schemas) {
        let rows = read_file_batches(
            path,
            file_schema,
            &target,
            delimiter_byte,
            batch_size,
            &mut |batch| {
                spinner.inc(batch.num_rows() as u64);
                batches.push(batch);
            },
        )?;
        if rows == 0 {
            log_warning("Raw file has a header but no rows", Some(path));
        }
    }

    let table = RawTable::new(target, batches)?;
    finish_progress_bar(&spinner, Some("merged"));
    log::info!(
        "Merged {} rows from {} files ({} columns)",
        table.row_count(),
        paths.len(),
        table.schema().fields().len()
    );
    Ok(table)
}

/// Discover and merge the configured raw inputs
pub fn merge_inputs(config: &InputConfig) -> Result<RawTable> {
    let files = discover_input_files(config)?;
    merge_files(&files, config.delimiter, config.effective_batch_size())
}
