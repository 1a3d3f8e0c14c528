//! Aggregate diagnostics of one cleaning run

use serde::Serialize;

/// Row counts after each cleaning stage
///
/// Counts are reproducible for a given input and configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    /// Rows in the merged raw table
    pub rows_read: usize,
    /// Rows left after exact deduplication
    pub after_dedup: usize,
    /// Rows with every required field present
    pub after_required: usize,
    /// Rows whose birth and death dates both parsed
    pub after_dates: usize,
    /// Rows with a plausible age at death
    pub after_age: usize,
    /// Rows whose death year lies in the retention window
    pub after_retention: usize,
    /// Rows (among those reaching sex mapping) with a code outside {1, 2}
    pub unmapped_sex: usize,
    /// Columns removed by pruning
    pub columns_dropped: Vec<String>,
}

impl CleaningReport {
    /// Total rows excluded by cleaning
    #[must_use]
    pub const fn rows_dropped(&self) -> usize {
        self.rows_read - self.after_retention
    }

    /// Emit the report through the logger
    pub fn log(&self) {
        log::info!(
            "Cleaning: {} read, {} after dedup, {} with required fields, {} with valid dates, \
             {} with plausible age, {} retained",
            self.rows_read,
            self.after_dedup,
            self.after_required,
            self.after_dates,
            self.after_age,
            self.after_retention
        );
        if self.unmapped_sex > 0 {
            log::debug!("{} rows have an unmapped sex code", self.unmapped_sex);
        }
        if !self.columns_dropped.is_empty() {
            log::debug!("Dropped columns: {}", self.columns_dropped.join(", "));
        }
    }
}
