//! The cleaner: turns the merged raw table into the canonical dataset.
//!
//! Stages run in a fixed order:
//! 1. exact deduplication
//! 2. column pruning
//! 3. required-field filtering
//! 4. name splitting
//! 5. strict date parsing
//! 6. date-validity filtering
//! 7. age derivation and plausibility filtering
//! 8. calendar field derivation
//! 9. sex categorization
//! 10. retention filtering
//!
//! Every filtering stage is a predicate over a single row; a row dropped by
//! one stage is never seen by a later one. Row-level failures are counted in
//! the `CleaningReport`, never returned as errors.

use arrow::array::{Array, AsArray, StringArray};
use arrow::record_batch::RecordBatch;
use chrono::Datelike;
use log::debug;

use crate::config::CleaningConfig;
use crate::error::{Error, Result};
use crate::models::{CanonicalDataset, CanonicalRecord, Sex, age_in_years};
use crate::reader::RawTable;
use crate::schema::RawSchema;

pub mod dedup;
pub mod derive;
pub mod encode;
pub mod report;

pub use dedup::deduplicate;
pub use derive::{parse_compact_date, split_name};
pub use encode::raw_table_from_records;
pub use report::CleaningReport;

/// Remove pruned columns from every batch
///
/// Returns the pruned batches and the names of the removed columns. Names in
/// the deny list that the table does not have are ignored.
fn prune_columns(
    table_schema: &arrow::datatypes::Schema,
    batches: &[RecordBatch],
    config: &CleaningConfig,
) -> Result<(Vec<RecordBatch>, Vec<String>)> {
    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    for (idx, field) in table_schema.fields().iter().enumerate() {
        let name = field.name();
        let denied = config.drop_columns.iter().any(|c| c == name);
        let allowed = config
            .keep_columns
            .as_ref()
            .is_none_or(|keep| keep.iter().any(|c| c == name));
        if allowed && !denied {
            kept.push(idx);
        } else {
            dropped.push(name.clone());
        }
    }

    let pruned = batches
        .iter()
        .map(|batch| batch.project(&kept))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((pruned, dropped))
}

/// Text columns of one batch, addressed through a resolved layout
struct RowReader<'a> {
    columns: Vec<&'a StringArray>,
}

impl<'a> RowReader<'a> {
    fn new(batch: &'a RecordBatch) -> Self {
        Self {
            columns: batch
                .columns()
                .iter()
                .map(|column| column.as_string::<i32>())
                .collect(),
        }
    }

    /// Trimmed value, `None` for null or blank
    fn value(&self, column: usize, row: usize) -> Option<&'a str> {
        let array = self.columns[column];
        if array.is_null(row) {
            return None;
        }
        let value = array.value(row).trim();
        (!value.is_empty()).then_some(value)
    }

    fn optional(&self, column: Option<usize>, row: usize) -> Option<&'a str> {
        column.and_then(|column| self.value(column, row))
    }
}

/// Cleaner bound to one cleaning configuration
#[derive(Debug, Clone)]
pub struct Cleaner<'a> {
    config: &'a CleaningConfig,
}

impl<'a> Cleaner<'a> {
    #[must_use]
    pub const fn new(config: &'a CleaningConfig) -> Self {
        Self { config }
    }

    /// Run every stage over `raw`
    ///
    /// # Errors
    /// `Error::EmptyInput` when the raw table has no rows, checked before any
    /// transformation; `Error::Schema` when a mandatory column is missing.
    pub fn clean(&self, raw: &RawTable) -> Result<(CanonicalDataset, CleaningReport)> {
        if raw.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut report = CleaningReport {
            rows_read: raw.row_count(),
            ..CleaningReport::default()
        };

        let deduplicated = deduplicate(raw.batches())?;
        report.after_dedup = deduplicated.iter().map(RecordBatch::num_rows).sum();
        debug!("{} rows after deduplication", report.after_dedup);

        let (pruned, dropped) = prune_columns(raw.schema(), &deduplicated, self.config)?;
        report.columns_dropped = dropped;

        let pruned_schema = match pruned.first() {
            Some(batch) => batch.schema(),
            None => std::sync::Arc::new(raw.schema().project(&[])?),
        };
        let layout = RawSchema::resolve(&pruned_schema, &self.config.required_columns)?;

        let mut records = Vec::with_capacity(report.after_dedup);
        for batch in &pruned {
            let reader = RowReader::new(batch);
            for row in 0..batch.num_rows() {
                if let Some(record) = self.clean_row(&reader, &layout, row, &mut report) {
                    records.push(record);
                }
            }
        }

        report.log();
        Ok((CanonicalDataset::new(records), report))
    }

    fn clean_row(
        &self,
        reader: &RowReader<'_>,
        layout: &RawSchema,
        row: usize,
        report: &mut CleaningReport,
    ) -> Option<CanonicalRecord> {
        if layout
            .required
            .iter()
            .any(|&column| reader.value(column, row).is_none())
        {
            return None;
        }
        report.after_required += 1;

        let (surname, given_name) = split_name(reader.value(layout.name, row).unwrap_or_default());

        let birth_date = reader
            .value(layout.birth_date, row)
            .and_then(parse_compact_date);
        let death_date = reader
            .value(layout.death_date, row)
            .and_then(parse_compact_date);
        let (Some(birth_date), Some(death_date)) = (birth_date, death_date) else {
            return None;
        };
        report.after_dates += 1;

        let age = age_in_years(birth_date, death_date);
        if !(0..=self.config.max_age).contains(&age) {
            return None;
        }
        report.after_age += 1;

        let sex = reader.optional(layout.sex, row).and_then(Sex::from_code);
        if sex.is_none() {
            report.unmapped_sex += 1;
        }

        if !self.config.retention.contains(death_date.year()) {
            return None;
        }
        report.after_retention += 1;

        Some(CanonicalRecord::derive(
            surname,
            given_name,
            birth_date,
            death_date,
            sex,
            reader.value(layout.birth_place, row)?.to_string(),
            reader.optional(layout.death_place, row).map(str::to_string),
            reader.optional(layout.birth_commune, row).map(str::to_string),
        ))
    }
}

/// Clean a raw table with `config`
pub fn clean(raw: &RawTable, config: &CleaningConfig) -> Result<(CanonicalDataset, CleaningReport)> {
    Cleaner::new(config).clean(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::YearRange;
    use crate::schema::raw_schema_from_header;
    use arrow::array::ArrayRef;
    use std::sync::Arc;

    const HEADER: [&str; 9] = [
        "nomprenom", "sexe", "datenaiss", "lieunaiss", "commnaiss", "paysnaiss", "datedeces",
        "lieudeces", "actedeces",
    ];

    fn table(rows: &[[Option<&str>; 9]]) -> RawTable {
        let schema = Arc::new(
            raw_schema_from_header(&HEADER.iter().map(|s| (*s).to_string()).collect::<Vec<_>>())
                .unwrap(),
        );
        let columns = (0..HEADER.len())
            .map(|c| Arc::new(rows.iter().map(|r| r[c]).collect::<StringArray>()) as ArrayRef)
            .collect();
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
        RawTable::new(schema, vec![batch]).unwrap()
    }

    fn row<'a>(name: &'a str, sex: &'a str, birth: &'a str, death: &'a str) -> [Option<&'a str>; 9] {
        [
            Some(name),
            Some(sex),
            Some(birth),
            Some("75056"),
            Some("PARIS"),
            None,
            Some(death),
            Some("13055"),
            Some("42"),
        ]
    }

    #[test]
    fn test_clean_single_valid_row() {
        let raw = table(&[row("DUPONT*JEAN/", "1", "19400312", "20210105")]);
        let (dataset, report) = clean(&raw, &CleaningConfig::default()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(report.after_retention, 1);
        assert_eq!(report.columns_dropped, vec!["paysnaiss", "actedeces"]);

        let record = &dataset.records()[0];
        assert_eq!(record.surname, "DUPONT");
        assert_eq!(record.given_name, "JEAN");
        assert_eq!(record.age_at_death, 80);
        assert_eq!(record.sex, Some(Sex::Male));
        assert_eq!(record.birth_commune.as_deref(), Some("PARIS"));
        assert_eq!(record.death_place_code.as_deref(), Some("13055"));
    }

    #[test]
    fn test_stage_counts() {
        let mut missing_birth_place = row("A*B/", "2", "19300101", "20200101");
        missing_birth_place[3] = None;

        let raw = table(&[
            row("A*B/", "1", "19300101", "20200101"),
            row("A*B/", "1", "19300101", "20200101"), // duplicate
            missing_birth_place,
            row("C*D/", "2", "19300100", "20200101"), // bad birth date
            row("E*F/", "2", "18800101", "20210101"), // 141 years old
            row("G*H/", "9", "19500101", "20220101"), // unmapped sex, kept
            row("I*J/", "1", "19500101", "20190101"), // outside retention
        ]);
        let (dataset, report) = clean(&raw, &CleaningConfig::default()).unwrap();

        assert_eq!(report.rows_read, 7);
        assert_eq!(report.after_dedup, 6);
        assert_eq!(report.after_required, 5);
        assert_eq!(report.after_dates, 4);
        assert_eq!(report.after_age, 3);
        assert_eq!(report.unmapped_sex, 1);
        assert_eq!(report.after_retention, 2);
        assert_eq!(report.rows_dropped(), 5);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[1].sex, None);
    }

    #[test]
    fn test_blank_death_place_dropped() {
        let mut blank_death_place = row("A*B/", "1", "19300101", "20200101");
        blank_death_place[7] = Some("  ");

        let raw = table(&[blank_death_place]);
        let (dataset, report) = clean(&raw, &CleaningConfig::default()).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(report.after_dedup, 1);
        assert_eq!(report.after_required, 0);
    }

    #[test]
    fn test_death_before_birth_dropped() {
        let raw = table(&[row("A*B/", "1", "20200110", "20200101")]);
        let (dataset, report) = clean(&raw, &CleaningConfig::default()).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(report.after_dates, 1);
        assert_eq!(report.after_age, 0);
    }

    #[test]
    fn test_empty_input_is_fatal() {
        let raw = table(&[]);
        assert!(matches!(
            clean(&raw, &CleaningConfig::default()),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_allow_list_prunes_unlisted_columns() {
        let config = CleaningConfig {
            keep_columns: Some(
                ["nomprenom", "datenaiss", "lieunaiss", "datedeces", "lieudeces"]
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect(),
            ),
            ..CleaningConfig::default()
        };
        let raw = table(&[row("A*B/", "2", "19300101", "20200101")]);
        let (dataset, report) = clean(&raw, &config).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].sex, None);
        assert_eq!(dataset.records()[0].birth_commune, None);
        assert!(report.columns_dropped.contains(&"sexe".to_string()));
    }

    #[test]
    fn test_pruning_a_required_column_is_an_error() {
        let config = CleaningConfig {
            drop_columns: vec!["lieudeces".into()],
            ..CleaningConfig::default()
        };
        let raw = table(&[row("A*B/", "2", "19300101", "20200101")]);
        assert!(matches!(clean(&raw, &config), Err(Error::Schema(_))));
    }

    #[test]
    fn test_retention_window_is_inclusive() {
        let config = CleaningConfig {
            retention: YearRange::new(2021, 2021),
            ..CleaningConfig::default()
        };
        let raw = table(&[
            row("A*B/", "1", "19300101", "20201231"),
            row("A*B/", "1", "19300101", "20210101"),
            row("A*B/", "1", "19300101", "20211231"),
            row("A*B/", "1", "19300101", "20220101"),
        ]);
        let (dataset, _) = clean(&raw, &config).unwrap();
        assert_eq!(dataset.len(), 2);
    }
}
