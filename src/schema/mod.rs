//! Column names and Arrow schemas for raw and canonical data.
//!
//! Raw files are read with every column typed as nullable `Utf8`; coercion to
//! dates and categories happens in the cleaner. The canonical schema is the
//! typed layout of the published snapshot.

use std::sync::{Arc, OnceLock};

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};

pub mod resolve;
pub mod union;

pub use resolve::{RawSchema, SnapshotColumns};
pub use union::{adapt_batch_to_schema, raw_schema_from_header, union_schema};

/// Column names of the raw INSEE death files
pub mod raw {
    /// Combined `SURNAME*GIVEN NAMES/` field
    pub const NOMPRENOM: &str = "nomprenom";
    /// Sex code, `1` or `2`
    pub const SEXE: &str = "sexe";
    /// Birth date, `YYYYMMDD`
    pub const DATENAISS: &str = "datenaiss";
    /// Commune code of birth
    pub const LIEUNAISS: &str = "lieunaiss";
    /// Commune name of birth
    pub const COMMNAISS: &str = "commnaiss";
    /// Country of birth
    pub const PAYSNAISS: &str = "paysnaiss";
    /// Death date, `YYYYMMDD`
    pub const DATEDECES: &str = "datedeces";
    /// Commune code of death
    pub const LIEUDECES: &str = "lieudeces";
    /// Death certificate number
    pub const ACTEDECES: &str = "actedeces";

    /// Columns every raw table must provide
    pub const MANDATORY: [&str; 4] = [NOMPRENOM, DATENAISS, DATEDECES, LIEUNAISS];

    /// Column order used when re-encoding canonical records
    pub const ENCODED: [&str; 7] = [
        NOMPRENOM, SEXE, DATENAISS, LIEUNAISS, COMMNAISS, DATEDECES, LIEUDECES,
    ];
}

/// Column names of the canonical snapshot
pub mod canonical {
    pub const SURNAME: &str = "surname";
    pub const GIVEN_NAME: &str = "given_name";
    pub const BIRTH_DATE: &str = "birth_date";
    pub const DEATH_DATE: &str = "death_date";
    pub const AGE_AT_DEATH: &str = "age_at_death";
    pub const SEX: &str = "sex";
    pub const BIRTH_PLACE_CODE: &str = "birth_place_code";
    pub const DEATH_PLACE_CODE: &str = "death_place_code";
    pub const BIRTH_COMMUNE: &str = "birth_commune";
    pub const DEATH_YEAR: &str = "death_year";
    pub const DEATH_MONTH: &str = "death_month";
    pub const BIRTH_YEAR: &str = "birth_year";
    pub const BIRTH_MONTH: &str = "birth_month";
}

/// Typed schema of the canonical snapshot
#[must_use]
pub fn canonical_schema() -> SchemaRef {
    static SCHEMA: OnceLock<SchemaRef> = OnceLock::new();
    SCHEMA
        .get_or_init(|| {
            use canonical as c;
            Arc::new(Schema::new(vec![
                Field::new(c::SURNAME, DataType::Utf8, true),
                Field::new(c::GIVEN_NAME, DataType::Utf8, true),
                Field::new(c::BIRTH_DATE, DataType::Date32, false),
                Field::new(c::DEATH_DATE, DataType::Date32, false),
                Field::new(c::AGE_AT_DEATH, DataType::Int32, false),
                Field::new(c::SEX, DataType::Utf8, true),
                Field::new(c::BIRTH_PLACE_CODE, DataType::Utf8, false),
                Field::new(c::DEATH_PLACE_CODE, DataType::Utf8, true),
                Field::new(c::BIRTH_COMMUNE, DataType::Utf8, true),
                Field::new(c::DEATH_YEAR, DataType::Int32, false),
                Field::new(c::DEATH_MONTH, DataType::Int32, false),
                Field::new(c::BIRTH_YEAR, DataType::Int32, false),
                Field::new(c::BIRTH_MONTH, DataType::Int32, false),
            ]))
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_schema_layout() {
        let schema = canonical_schema();
        assert_eq!(schema.fields().len(), 13);
        assert_eq!(
            schema.field_with_name(canonical::BIRTH_DATE).unwrap().data_type(),
            &DataType::Date32
        );
        assert!(schema.field_with_name(canonical::SEX).unwrap().is_nullable());
        assert!(!schema.field_with_name(canonical::BIRTH_PLACE_CODE).unwrap().is_nullable());
    }
}
