//! A Rust library for cleaning civil-registry mortality records into a
//! canonical Parquet snapshot and computing aggregate statistics over it.

pub mod aggregate;
pub mod async_io;
pub mod clean;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod remote;
pub mod schema;
pub mod store;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{PipelineConfig, YearRange};
pub use error::{Error, Result};
pub use models::{CanonicalDataset, CanonicalRecord, DatasetView, Sex, YearMonth};
pub use pipeline::Pipeline;

// Pipeline stages
pub use clean::{CleaningReport, clean};
pub use reader::{RawTable, merge_files, merge_inputs};
pub use store::{SnapshotCache, SnapshotKey, SnapshotStore};

// Filtering and aggregation
pub use aggregate::{Outcome, Report, full_report};
pub use filter::{AgeGroup, NameQuery, PredicateSet, RecordFilter, matching_given_names};

// Async functionality
pub use async_io::read_snapshot_async;
