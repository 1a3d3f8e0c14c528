//! Conversion between canonical records and Arrow batches

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Date32Array, Int32Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Int32Type};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use log::debug;

use crate::error::Result;
use crate::models::{CanonicalRecord, Sex, age_in_years};
use crate::schema::{SnapshotColumns, canonical_schema};

/// Days between 0001-01-01 and the Unix epoch
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Date to days since the Unix epoch
#[must_use]
pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Days since the Unix epoch to a date
#[must_use]
pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

fn string_column<F>(records: &[CanonicalRecord], value: F) -> ArrayRef
where
    F: for<'r> Fn(&'r CanonicalRecord) -> Option<&'r str>,
{
    Arc::new(records.iter().map(value).collect::<StringArray>())
}

fn date_column<F>(records: &[CanonicalRecord], value: F) -> ArrayRef
where
    F: Fn(&CanonicalRecord) -> NaiveDate,
{
    Arc::new(Date32Array::from_iter_values(
        records.iter().map(|r| date_to_days(value(r))),
    ))
}

fn int_column<F>(records: &[CanonicalRecord], value: F) -> ArrayRef
where
    F: Fn(&CanonicalRecord) -> i32,
{
    Arc::new(Int32Array::from_iter_values(records.iter().map(value)))
}

/// Encode records as one batch with the canonical schema
pub fn records_to_batch(records: &[CanonicalRecord]) -> Result<RecordBatch> {
    // Field order of `canonical_schema`
    let columns = vec![
        string_column(records, |r| Some(r.surname.as_str())),
        string_column(records, |r| Some(r.given_name.as_str())),
        date_column(records, |r| r.birth_date),
        date_column(records, |r| r.death_date),
        int_column(records, |r| r.age_at_death),
        string_column(records, |r| r.sex.map(Sex::label)),
        string_column(records, |r| Some(r.birth_place_code.as_str())),
        string_column(records, |r| r.death_place_code.as_deref()),
        string_column(records, |r| r.birth_commune.as_deref()),
        int_column(records, |r| r.death_year),
        int_column(records, |r| r.death_month as i32),
        int_column(records, |r| r.birth_year),
        int_column(records, |r| r.birth_month as i32),
    ];

    Ok(RecordBatch::try_new(canonical_schema(), columns)?)
}

/// A snapshot batch with every resolved column cast to its canonical type
struct TypedColumns {
    birth_date: ArrayRef,
    death_date: ArrayRef,
    birth_place_code: ArrayRef,
    surname: Option<ArrayRef>,
    given_name: Option<ArrayRef>,
    age_at_death: Option<ArrayRef>,
    sex: Option<ArrayRef>,
    death_place_code: Option<ArrayRef>,
    birth_commune: Option<ArrayRef>,
    death_year: Option<ArrayRef>,
    death_month: Option<ArrayRef>,
    birth_year: Option<ArrayRef>,
    birth_month: Option<ArrayRef>,
}

impl TypedColumns {
    fn new(batch: &RecordBatch, layout: &SnapshotColumns) -> Result<Self> {
        let typed = |idx: usize, data_type: &DataType| -> Result<ArrayRef> {
            let column = batch.column(idx);
            if column.data_type() == data_type {
                Ok(Arc::clone(column))
            } else {
                Ok(cast(column, data_type)?)
            }
        };
        let optional = |idx: Option<usize>, data_type: &DataType| -> Result<Option<ArrayRef>> {
            idx.map(|idx| typed(idx, data_type)).transpose()
        };

        Ok(Self {
            birth_date: typed(layout.birth_date, &DataType::Date32)?,
            death_date: typed(layout.death_date, &DataType::Date32)?,
            birth_place_code: typed(layout.birth_place_code, &DataType::Utf8)?,
            surname: optional(layout.surname, &DataType::Utf8)?,
            given_name: optional(layout.given_name, &DataType::Utf8)?,
            age_at_death: optional(layout.age_at_death, &DataType::Int32)?,
            sex: optional(layout.sex, &DataType::Utf8)?,
            death_place_code: optional(layout.death_place_code, &DataType::Utf8)?,
            birth_commune: optional(layout.birth_commune, &DataType::Utf8)?,
            death_year: optional(layout.death_year, &DataType::Int32)?,
            death_month: optional(layout.death_month, &DataType::Int32)?,
            birth_year: optional(layout.birth_year, &DataType::Int32)?,
            birth_month: optional(layout.birth_month, &DataType::Int32)?,
        })
    }
}

fn text(column: Option<&ArrayRef>, row: usize) -> Option<&str> {
    let array = column?.as_string::<i32>();
    (!array.is_null(row)).then(|| array.value(row))
}

fn int(column: Option<&ArrayRef>, row: usize) -> Option<i32> {
    let array = column?.as_primitive::<Int32Type>();
    (!array.is_null(row)).then(|| array.value(row))
}

fn date(column: &ArrayRef, row: usize) -> Option<NaiveDate> {
    let array = column.as_primitive::<Date32Type>();
    if array.is_null(row) {
        return None;
    }
    days_to_date(array.value(row))
}

/// Decode a snapshot batch into records
///
/// Only the dates and the birth place are required; every other column may
/// be absent. Stored age and calendar fields are used as written, missing
/// ones are derived from the dates. Rows lacking a date or a birth place are
/// skipped.
pub fn batch_to_records(batch: &RecordBatch) -> Result<Vec<CanonicalRecord>> {
    let layout = SnapshotColumns::resolve(&batch.schema())?;
    let columns = TypedColumns::new(batch, &layout)?;

    let mut records = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let (Some(birth_date), Some(death_date)) =
            (date(&columns.birth_date, row), date(&columns.death_date, row))
        else {
            continue;
        };
        let Some(birth_place_code) = text(Some(&columns.birth_place_code), row) else {
            continue;
        };

        let sex = text(columns.sex.as_ref(), row)
            .and_then(|value| Sex::from_label(value).or_else(|| Sex::from_code(value)));
        let month = |value: Option<i32>, fallback: u32| {
            value.and_then(|m| u32::try_from(m).ok()).unwrap_or(fallback)
        };

        records.push(CanonicalRecord {
            surname: text(columns.surname.as_ref(), row).unwrap_or_default().to_string(),
            given_name: text(columns.given_name.as_ref(), row).unwrap_or_default().to_string(),
            birth_date,
            death_date,
            age_at_death: int(columns.age_at_death.as_ref(), row)
                .unwrap_or_else(|| age_in_years(birth_date, death_date)),
            sex,
            birth_place_code: birth_place_code.to_string(),
            death_place_code: text(columns.death_place_code.as_ref(), row).map(str::to_string),
            birth_commune: text(columns.birth_commune.as_ref(), row).map(str::to_string),
            death_year: int(columns.death_year.as_ref(), row).unwrap_or_else(|| death_date.year()),
            death_month: month(int(columns.death_month.as_ref(), row), death_date.month()),
            birth_year: int(columns.birth_year.as_ref(), row).unwrap_or_else(|| birth_date.year()),
            birth_month: month(int(columns.birth_month.as_ref(), row), birth_date.month()),
        });
    }

    let skipped = batch.num_rows() - records.len();
    if skipped > 0 {
        debug!("Skipped {skipped} snapshot rows without dates or birth place");
    }
    Ok(records)
}
