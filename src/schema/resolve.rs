//! Column presence resolved once per schema.
//!
//! Transforms never probe for optional columns themselves: they receive a
//! resolved layout in which mandatory columns are plain indices and optional
//! columns are `Option<usize>`.

use arrow::datatypes::{DataType, Schema};

use crate::error::{Error, Result};
use crate::schema::{canonical, raw};

fn require(schema: &Schema, name: &str) -> Result<usize> {
    schema
        .index_of(name)
        .map_err(|_| Error::schema(format!("required column '{name}' is missing")))
}

fn optional(schema: &Schema, name: &str) -> Option<usize> {
    schema.index_of(name).ok()
}

/// Resolved layout of a (pruned) raw table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSchema {
    /// Combined name field
    pub name: usize,
    /// Birth date string
    pub birth_date: usize,
    /// Death date string
    pub death_date: usize,
    /// Birth place code
    pub birth_place: usize,
    /// Sex code
    pub sex: Option<usize>,
    /// Death place code
    pub death_place: Option<usize>,
    /// Birth commune name
    pub birth_commune: Option<usize>,
    /// Every column whose null value drops the row
    pub required: Vec<usize>,
}

impl RawSchema {
    /// Resolve the layout and validate that every mandatory column exists
    ///
    /// # Arguments
    /// * `schema` - Schema of the pruned raw table (all columns `Utf8`)
    /// * `required_columns` - Configured mandatory columns in addition to the
    ///   inherent ones
    pub fn resolve(schema: &Schema, required_columns: &[String]) -> Result<Self> {
        for field in schema.fields() {
            if field.data_type() != &DataType::Utf8 {
                return Err(Error::schema(format!(
                    "raw column '{}' must be Utf8, found {:?}",
                    field.name(),
                    field.data_type()
                )));
            }
        }

        let birth_place = require(schema, raw::LIEUNAISS)?;
        let mut required = vec![birth_place];
        for name in required_columns {
            let idx = require(schema, name)?;
            if !required.contains(&idx) {
                required.push(idx);
            }
        }

        Ok(Self {
            name: require(schema, raw::NOMPRENOM)?,
            birth_date: require(schema, raw::DATENAISS)?,
            death_date: require(schema, raw::DATEDECES)?,
            birth_place,
            sex: optional(schema, raw::SEXE),
            death_place: optional(schema, raw::LIEUDECES),
            birth_commune: optional(schema, raw::COMMNAISS),
            required,
        })
    }
}

/// Resolved layout of a canonical snapshot batch
///
/// Snapshots fetched remotely may carry only a declared subset of columns,
/// so everything except the dates and the birth place is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotColumns {
    pub birth_date: usize,
    pub death_date: usize,
    pub birth_place_code: usize,
    pub surname: Option<usize>,
    pub given_name: Option<usize>,
    pub age_at_death: Option<usize>,
    pub sex: Option<usize>,
    pub death_place_code: Option<usize>,
    pub birth_commune: Option<usize>,
    pub death_year: Option<usize>,
    pub death_month: Option<usize>,
    pub birth_year: Option<usize>,
    pub birth_month: Option<usize>,
}

impl SnapshotColumns {
    /// Resolve a canonical batch layout
    pub fn resolve(schema: &Schema) -> Result<Self> {
        use canonical as c;
        Ok(Self {
            birth_date: require(schema, c::BIRTH_DATE)?,
            death_date: require(schema, c::DEATH_DATE)?,
            birth_place_code: require(schema, c::BIRTH_PLACE_CODE)?,
            surname: optional(schema, c::SURNAME),
            given_name: optional(schema, c::GIVEN_NAME),
            age_at_death: optional(schema, c::AGE_AT_DEATH),
            sex: optional(schema, c::SEX),
            death_place_code: optional(schema, c::DEATH_PLACE_CODE),
            birth_commune: optional(schema, c::BIRTH_COMMUNE),
            death_year: optional(schema, c::DEATH_YEAR),
            death_month: optional(schema, c::DEATH_MONTH),
            birth_year: optional(schema, c::BIRTH_YEAR),
            birth_month: optional(schema, c::BIRTH_MONTH),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::raw_schema_from_header;

    fn schema(columns: &[&str]) -> Schema {
        raw_schema_from_header(&columns.iter().map(|s| (*s).to_string()).collect::<Vec<_>>())
            .unwrap()
    }

    #[test]
    fn test_resolve_full_layout() {
        let s = schema(&[
            "nomprenom", "sexe", "datenaiss", "lieunaiss", "commnaiss", "datedeces", "lieudeces",
        ]);
        let layout = RawSchema::resolve(&s, &["lieunaiss".into(), "lieudeces".into()]).unwrap();
        assert_eq!(layout.name, 0);
        assert_eq!(layout.sex, Some(1));
        assert_eq!(layout.death_place, Some(6));
        assert_eq!(layout.required, vec![3, 6]);
    }

    #[test]
    fn test_optional_columns_absent() {
        let s = schema(&["nomprenom", "datenaiss", "lieunaiss", "datedeces"]);
        let layout = RawSchema::resolve(&s, &[]).unwrap();
        assert_eq!(layout.sex, None);
        assert_eq!(layout.birth_commune, None);
        assert_eq!(layout.required, vec![2]);
    }

    #[test]
    fn test_missing_mandatory_column() {
        let s = schema(&["nomprenom", "datenaiss", "datedeces"]);
        let err = RawSchema::resolve(&s, &[]).unwrap_err();
        assert!(err.to_string().contains("lieunaiss"));
    }

    #[test]
    fn test_missing_configured_required_column() {
        let s = schema(&["nomprenom", "datenaiss", "lieunaiss", "datedeces"]);
        assert!(RawSchema::resolve(&s, &["lieudeces".into()]).is_err());
    }
}
