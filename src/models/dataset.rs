//! The canonical dataset and non-destructive views over it.
//!
//! A `CanonicalDataset` is immutable once built and cheap to clone. Filtering
//! produces a `DatasetView`, an index selection over the shared records; a
//! view never copies or mutates records.

use std::sync::Arc;

use crate::config::YearRange;
use crate::models::record::CanonicalRecord;

/// Immutable set of canonical records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalDataset {
    records: Arc<[CanonicalRecord]>,
}

impl CanonicalDataset {
    /// Wrap a vector of records
    #[must_use]
    pub fn new(records: Vec<CanonicalRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Wrap the records satisfying every canonical invariant
    ///
    /// Returns the dataset and the number of records discarded.
    #[must_use]
    pub fn validated(
        records: Vec<CanonicalRecord>,
        retention: &YearRange,
        max_age: i32,
    ) -> (Self, usize) {
        let total = records.len();
        let kept: Vec<CanonicalRecord> = records
            .into_iter()
            .filter(|record| record.satisfies_invariants(retention, max_age))
            .collect();
        let discarded = total - kept.len();
        (Self::new(kept), discarded)
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in snapshot order
    #[must_use]
    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    /// A view selecting every record
    #[must_use]
    pub fn view(&self) -> DatasetView<'_> {
        DatasetView {
            records: &self.records,
            selection: Selection::All,
        }
    }
}

impl From<Vec<CanonicalRecord>> for CanonicalDataset {
    fn from(records: Vec<CanonicalRecord>) -> Self {
        Self::new(records)
    }
}

#[derive(Debug, Clone)]
enum Selection {
    All,
    Rows(Arc<[u32]>),
}

/// A row subset of a `CanonicalDataset`
#[derive(Debug, Clone)]
pub struct DatasetView<'a> {
    records: &'a [CanonicalRecord],
    selection: Selection,
}

impl<'a> DatasetView<'a> {
    /// Number of selected records
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.selection {
            Selection::All => self.records.len(),
            Selection::Rows(rows) => rows.len(),
        }
    }

    /// Whether the view selects nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the selected records in dataset order
    pub fn iter(&self) -> impl Iterator<Item = &'a CanonicalRecord> + '_ {
        let records = self.records;
        self.indices().map(move |idx| &records[idx as usize])
    }

    /// Indices of the selected records in the underlying dataset
    pub fn indices(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match &self.selection {
            Selection::All => Box::new((0..self.records.len()).map(|idx| idx as u32)),
            Selection::Rows(rows) => Box::new(rows.iter().copied()),
        }
    }

    /// New view keeping the selected records for which `keep` holds
    #[must_use]
    pub fn select<F>(&self, keep: F) -> DatasetView<'a>
    where
        F: Fn(&CanonicalRecord) -> bool,
    {
        let records = self.records;
        let rows: Arc<[u32]> = self
            .indices()
            .filter(|&idx| keep(&records[idx as usize]))
            .collect();

        DatasetView {
            records,
            selection: Selection::Rows(rows),
        }
    }

    /// Copy the selected records into a new dataset
    #[must_use]
    pub fn materialize(&self) -> CanonicalDataset {
        CanonicalDataset::new(self.iter().cloned().collect())
    }
}
