//! Re-encoding canonical records in the raw file layout

use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::record_batch::RecordBatch;

use crate::clean::derive::{GIVEN_NAME_TERMINATOR, NAME_SEPARATOR, format_compact_date};
use crate::error::Result;
use crate::models::CanonicalRecord;
use crate::reader::RawTable;
use crate::schema::{raw, raw_schema_from_header};

fn text_column<F>(records: &[CanonicalRecord], value: F) -> ArrayRef
where
    F: Fn(&CanonicalRecord) -> Option<String>,
{
    Arc::new(records.iter().map(value).collect::<StringArray>())
}

/// Encode canonical records back into a raw table
///
/// Uses the columns of `raw::ENCODED`: the name as `SURNAME*GIVEN/`, dates as
/// `YYYYMMDD`, sex as its code. Cleaning the result with the default
/// configuration yields the same records, which makes cleaning idempotent
/// over its own output.
pub fn raw_table_from_records(records: &[CanonicalRecord]) -> Result<RawTable> {
    let header: Vec<String> = raw::ENCODED.iter().map(|c| (*c).to_string()).collect();
    let schema = Arc::new(raw_schema_from_header(&header)?);

    let columns: Vec<ArrayRef> = raw::ENCODED
        .iter()
        .map(|column| match *column {
            raw::NOMPRENOM => text_column(records, |r| {
                Some(format!(
                    "{}{NAME_SEPARATOR}{}{GIVEN_NAME_TERMINATOR}",
                    r.surname, r.given_name
                ))
            }),
            raw::SEXE => text_column(records, |r| r.sex.map(|s| s.code().to_string())),
            raw::DATENAISS => text_column(records, |r| Some(format_compact_date(r.birth_date))),
            raw::LIEUNAISS => text_column(records, |r| Some(r.birth_place_code.clone())),
            raw::COMMNAISS => text_column(records, |r| r.birth_commune.clone()),
            raw::DATEDECES => text_column(records, |r| Some(format_compact_date(r.death_date))),
            raw::LIEUDECES => text_column(records, |r| r.death_place_code.clone()),
            _ => Arc::new(StringArray::new_null(records.len())),
        })
        .collect();

    let batches = if records.is_empty() {
        Vec::new()
    } else {
        vec![RecordBatch::try_new(schema.clone(), columns)?]
    };
    RawTable::new(schema, batches)
}
