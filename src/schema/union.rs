//! Schema union and batch adaptation for raw files with drifting layouts.
//!
//! Each yearly file may add or omit columns. The merger reads every file
//! with its own header schema and adapts each batch to the union schema,
//! filling absent columns with nulls.

use std::sync::Arc;

use arrow::array::{ArrayRef, new_null_array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;

use crate::error::{Error, Result};

/// Build an all-`Utf8` schema from header column names
///
/// Duplicate header names are rejected since columns are addressed by name.
pub fn raw_schema_from_header(columns: &[String]) -> Result<Schema> {
    if let Some(duplicate) = columns.iter().duplicates().next() {
        return Err(Error::schema(format!("duplicate column '{duplicate}' in header")));
    }

    Ok(Schema::new(
        columns
            .iter()
            .map(|name| Field::new(name, DataType::Utf8, true))
            .collect_vec(),
    ))
}

/// Union of several schemas, keeping columns in first-seen order
#[must_use]
pub fn union_schema(schemas: &[Schema]) -> SchemaRef {
    let fields = schemas
        .iter()
        .flat_map(|schema| schema.fields().iter().cloned())
        .unique_by(|field| field.name().clone())
        .collect_vec();

    Arc::new(Schema::new(fields))
}

/// Adapt a batch to a target schema by name
///
/// Columns present in both are reused as-is (types must match), columns only
/// in the target become null arrays, columns only in the source are dropped.
pub fn adapt_batch_to_schema(batch: &RecordBatch, target: &SchemaRef) -> Result<RecordBatch> {
    let source = batch.schema();
    if source.as_ref() == target.as_ref() {
        return Ok(batch.clone());
    }

    let columns = target
        .fields()
        .iter()
        .map(|field| match source.index_of(field.name()) {
            Ok(idx) => {
                let column = batch.column(idx);
                if column.data_type() != field.data_type() {
                    return Err(Error::schema(format!(
                        "column '{}' has type {:?}, expected {:?}",
                        field.name(),
                        column.data_type(),
                        field.data_type()
                    )));
                }
                Ok(column.clone())
            }
            Err(_) => Ok(new_null_array(field.data_type(), batch.num_rows())),
        })
        .collect::<Result<Vec<ArrayRef>>>()?;

    Ok(RecordBatch::try_new(target.clone(), columns)?)
}
