//! Shared helpers: batch sizing and logging/progress utilities

pub mod logging;

pub use logging::{FileOp, log_operation_complete, log_operation_start, log_warning};

/// Default number of rows per streamed batch
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Environment variable overriding every batch size
pub const BATCH_SIZE_VAR: &str = "MORTALITY_BATCH_SIZE";

fn parse_batch_size(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok().filter(|size| *size > 0)
}

/// Helper function to get batch size from environment
///
/// Zero and unparsable values are ignored.
#[must_use]
pub fn get_batch_size() -> Option<usize> {
    std::env::var(BATCH_SIZE_VAR)
        .ok()
        .and_then(|s| parse_batch_size(&s))
}

/// Rows per batch for snapshot reads and writes
#[must_use]
pub fn snapshot_batch_size() -> usize {
    get_batch_size().unwrap_or(DEFAULT_BATCH_SIZE)
}
