//! Logging utilities
//!
//! Every file the pipeline touches is reported through these helpers so that
//! raw-input and snapshot traffic read the same way in the logs.

use std::path::Path;
use std::time::Duration;

/// File-level steps of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    /// Looking up the yearly raw files in the data directory
    Discover,
    /// Streaming one raw yearly file
    ReadRaw,
    /// Reading a Parquet snapshot
    LoadSnapshot,
    /// Reading the `;`-delimited fallback snapshot
    LoadFallback,
    /// Writing a Parquet snapshot
    PublishSnapshot,
    /// Writing the `;`-delimited fallback snapshot
    WriteFallback,
}

impl FileOp {
    const fn starting(self) -> &'static str {
        match self {
            Self::Discover => "Looking for raw death files in",
            Self::ReadRaw => "Reading raw death file",
            Self::LoadSnapshot => "Loading canonical snapshot",
            Self::LoadFallback => "Loading fallback snapshot",
            Self::PublishSnapshot => "Publishing canonical snapshot",
            Self::WriteFallback => "Writing fallback snapshot",
        }
    }

    const fn finished(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::Discover => ("Found", "raw files", "in"),
            Self::ReadRaw => ("Read", "raw rows", "from"),
            Self::LoadSnapshot | Self::LoadFallback => ("Loaded", "death records", "from"),
            Self::PublishSnapshot | Self::WriteFallback => ("Wrote", "death records", "to"),
        }
    }
}

fn completion_message(op: FileOp, path: &Path, count: usize, elapsed: Option<Duration>) -> String {
    let (verb, unit, preposition) = op.finished();
    let message = format!("{verb} {count} {unit} {preposition} {}", path.display());
    match elapsed {
        Some(duration) => format!("{message} in {duration:.2?}"),
        None => message,
    }
}

/// Log the start of a file-level step
pub fn log_operation_start(op: FileOp, path: &Path) {
    log::info!("{} {}", op.starting(), path.display());
}

/// Log the end of a file-level step
///
/// # Arguments
/// * `op` - The step that finished
/// * `path` - File or directory it worked on
/// * `count` - Files found, raw rows read or records loaded/written
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(op: FileOp, path: &Path, count: usize, elapsed: Option<Duration>) {
    log::info!("{}", completion_message(op, path, count, elapsed));
}

/// Log a warning, prefixed by the file it concerns
pub fn log_warning(message: &str, path: Option<&Path>) {
    match path {
        Some(path) => log::warn!("{}: {message}", path.display()),
        None => log::warn!("{message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_message_names_the_unit() {
        let path = Path::new("Deces_2021.csv");
        assert_eq!(
            completion_message(FileOp::ReadRaw, path, 12, None),
            "Read 12 raw rows from Deces_2021.csv"
        );
        assert_eq!(
            completion_message(FileOp::PublishSnapshot, Path::new("out.parquet"), 3, None),
            "Wrote 3 death records to out.parquet"
        );
        assert!(
            completion_message(FileOp::LoadFallback, path, 0, Some(Duration::from_millis(5)))
                .starts_with("Loaded 0 death records from Deces_2021.csv in ")
        );
    }
}
