//! Utility functions for error handling
//!
//! File-system helpers that turn bare `io::Error`s into messages naming the
//! path and the purpose of the access.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};

/// Open a file, reporting the path and the purpose on failure
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.is_file() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a readable file (needed for {purpose})", path.display()),
        )));
    }

    fs::File::open(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => "permission denied".to_string(),
            _ => format!("failed to open for {purpose}"),
        };
        Error::Io(io::Error::new(
            e.kind(),
            format!("{}: {context}: {e}", path.display()),
        ))
    })
}

/// Check that a directory exists and is readable
pub fn validate_directory(path: &Path, purpose: &str) -> Result<()> {
    if !path.is_dir() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Directory {} not found (needed for {purpose})", path.display()),
        )));
    }

    fs::read_dir(path).map(|_| ()).map_err(|e| {
        Error::Io(io::Error::new(
            e.kind(),
            format!("Failed to access directory {}: {e}", path.display()),
        ))
    })
}

/// Try multiple operations in sequence, returning the first success
///
/// If every operation fails, the returned error lists each attempt.
pub fn try_operations<T, F>(operation_name: &str, operations: Vec<F>) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let mut errors = Vec::new();

    for (i, operation) in operations.into_iter().enumerate() {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) => errors.push(format!("Attempt {}: {e}", i + 1)),
        }
    }

    Err(Error::SnapshotUnavailable(format!(
        "All attempts failed for operation: {operation_name}\n{}",
        errors.join("\n")
    )))
}
