//! Exact full-row deduplication across batches.
//!
//! Rows are bucketed by a hash of every column value and compared value by
//! value inside a bucket, so hash collisions never drop a distinct row. The
//! first occurrence of each row is kept and row order is preserved.

use std::hash::{Hash, Hasher};

use arrow::array::{Array, AsArray, BooleanArray, StringArray};
use arrow::compute::filter_record_batch;
use arrow::record_batch::RecordBatch;
use rustc_hash::{FxHashMap, FxHasher};
use smallvec::SmallVec;

use crate::error::Result;

/// Location of a row: (batch index, row index)
type RowRef = (u32, u32);

struct BatchColumns<'a> {
    columns: Vec<&'a StringArray>,
}

impl<'a> BatchColumns<'a> {
    fn new(batch: &'a RecordBatch) -> Self {
        Self {
            columns: batch
                .columns()
                .iter()
                .map(|column| column.as_string::<i32>())
                .collect(),
        }
    }

    fn value(&self, column: usize, row: usize) -> Option<&'a str> {
        let array = self.columns[column];
        (!array.is_null(row)).then(|| array.value(row))
    }

    fn hash_row(&self, row: usize) -> u64 {
        let mut hasher = FxHasher::default();
        for column in 0..self.columns.len() {
            self.value(column, row).hash(&mut hasher);
        }
        hasher.finish()
    }
}

fn rows_equal(all: &[BatchColumns<'_>], a: RowRef, b: RowRef) -> bool {
    let (left, right) = (&all[a.0 as usize], &all[b.0 as usize]);
    (0..left.columns.len())
        .all(|column| left.value(column, a.1 as usize) == right.value(column, b.1 as usize))
}

/// Remove fully identical rows
///
/// All batches must share one schema with `Utf8` columns, as produced by
/// the merger.
pub fn deduplicate(batches: &[RecordBatch]) -> Result<Vec<RecordBatch>> {
    let columns: Vec<BatchColumns<'_>> = batches.iter().map(BatchColumns::new).collect();
    let mut seen: FxHashMap<u64, SmallVec<[RowRef; 1]>> = FxHashMap::default();

    let mut deduplicated = Vec::with_capacity(batches.len());
    for (batch_idx, batch) in batches.iter().enumerate() {
        let current = &columns[batch_idx];
        let keep: BooleanArray = (0..batch.num_rows())
            .map(|row| {
                let here = (batch_idx as u32, row as u32);
                let bucket = seen.entry(current.hash_row(row)).or_default();
                if bucket.iter().any(|&other| rows_equal(&columns, other, here)) {
                    Some(false)
                } else {
                    bucket.push(here);
                    Some(true)
                }
            })
            .collect();

        let kept = filter_record_batch(batch, &keep)?;
        if kept.num_rows() > 0 {
            deduplicated.push(kept);
        }
    }

    Ok(deduplicated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::ArrayRef;
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn batch(rows: &[(Option<&str>, Option<&str>)]) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("a", DataType::Utf8, true),
            Field::new("b", DataType::Utf8, true),
        ]));
        let a: StringArray = rows.iter().map(|r| r.0).collect();
        let b: StringArray = rows.iter().map(|r| r.1).collect();
        RecordBatch::try_new(schema, vec![Arc::new(a) as ArrayRef, Arc::new(b)]).unwrap()
    }

    fn total(batches: &[RecordBatch]) -> usize {
        batches.iter().map(RecordBatch::num_rows).sum()
    }

    #[test]
    fn test_duplicates_within_and_across_batches() {
        let batches = vec![
            batch(&[(Some("x"), Some("1")), (Some("x"), Some("1")), (Some("y"), None)]),
            batch(&[(Some("y"), None), (Some("x"), Some("2"))]),
        ];
        let deduplicated = deduplicate(&batches).unwrap();
        assert_eq!(total(&deduplicated), 3);

        let first = deduplicated[0].column(0).as_string::<i32>();
        assert_eq!(first.value(0), "x");
        assert_eq!(first.value(1), "y");
    }

    #[test]
    fn test_null_differs_from_empty_string() {
        let batches = vec![batch(&[(Some("x"), None), (Some("x"), Some(""))])];
        assert_eq!(total(&deduplicate(&batches).unwrap()), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(deduplicate(&[]).unwrap().is_empty());
    }
}
