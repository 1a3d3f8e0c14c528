//! Error handling for the mortality pipeline.
//!
//! Only configuration-level and I/O failures surface as errors. Row-level
//! validity problems are counted by the cleaner and never reach this type.

use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

pub mod util;

/// Specialized error type for the pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error opening, reading or writing a file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error processing Arrow data (CSV decoding, batch construction)
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error reading or writing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error (de)serializing configuration or reports
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No raw input file matched the naming convention
    #[error("No raw input files found in {} for years {years}", dir.display())]
    NoInputFiles {
        /// Directory that was searched
        dir: PathBuf,
        /// Year range that was searched, formatted for display
        years: String,
    },

    /// The merged raw table contains no rows
    #[error("Raw input contains no rows")]
    EmptyInput,

    /// A raw file could not be read with the expected delimiter
    #[error("File {} is not delimited by {delimiter:?}", path.display())]
    Delimiter {
        /// Offending file
        path: PathBuf,
        /// Expected delimiter
        delimiter: char,
    },

    /// Required columns are missing or a column has an unexpected type
    #[error("Schema error: {0}")]
    Schema(String),

    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote snapshot fetch failed
    #[error("Remote fetch error: {0}")]
    Remote(String),

    /// The snapshot cache lock was poisoned by a panicking reader or writer
    #[error("Snapshot cache error: {0}")]
    Cache(String),

    /// No canonical snapshot could be derived by any path
    #[error("No canonical snapshot available: {0}")]
    SnapshotUnavailable(String),
}

impl Error {
    /// Convenience constructor for schema errors
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Convenience constructor for configuration errors
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Remote(error.to_string())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
