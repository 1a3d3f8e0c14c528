//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use mortality_pipeline::config::SnapshotConfig;
use mortality_pipeline::{CanonicalRecord, PipelineConfig, Sex};

/// Header of the yearly INSEE death files
pub const INSEE_HEADER: &str = "\"nomprenom\";\"sexe\";\"datenaiss\";\"lieunaiss\";\"commnaiss\";\
                                \"paysnaiss\";\"datedeces\";\"lieudeces\";\"actedeces\"";

/// Write a raw yearly file in the INSEE layout
pub fn write_raw_year(dir: &Path, year: i32, rows: &[&str]) -> PathBuf {
    let path = dir.join(format!("Deces_{year}.csv"));
    let mut content = String::from(INSEE_HEADER);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(&path, content).expect("Failed to write raw fixture");
    path
}

/// Three raw years exercising every cleaning stage
///
/// Nine rows are read; one exact duplicate, one missing birth place, one
/// unparseable birth date and one death before birth are removed, leaving
/// five records (one of them with an unmapped sex code).
pub fn write_sample_inputs(dir: &Path) {
    write_raw_year(
        dir,
        2020,
        &[
            "\"MARTIN*MARIE JEANNE/\";\"2\";\"19300215\";\"75056\";\"PARIS\";\"\";\"20200401\";\"75056\";\"123\"",
            "\"MARTIN*MARIE JEANNE/\";\"2\";\"19300215\";\"75056\";\"PARIS\";\"\";\"20200401\";\"75056\";\"123\"",
            "\"DURAND*PIERRE/\";\"1\";\"19450610\";\"69123\";\"LYON\";\"\";\"20201115\";\"69123\";\"124\"",
            "\"PETIT*LUC/\";\"1\";\"19500000\";\"13055\";\"MARSEILLE\";\"\";\"20200301\";\"13055\";\"125\"",
        ],
    );
    write_raw_year(
        dir,
        2021,
        &[
            "\"BERNARD*ANNE/\";\"2\";\"19280101\";\"31555\";\"TOULOUSE\";\"\";\"20210105\";\"31555\";\"1\"",
            "\"ROUX*JEAN/\";\"1\";\"19600707\";\"\";\"\";\"\";\"20210808\";\"06088\";\"2\"",
            "\"MOREL*CLAUDE/\";\"9\";\"19700101\";\"2A004\";\"AJACCIO\";\"\";\"20210303\";\"2A004\";\"3\"",
        ],
    );
    write_raw_year(
        dir,
        2022,
        &[
            "\"FAURE*PAUL/\";\"1\";\"19990909\";\"99350\";\"\";\"MAROC\";\"20220202\";\"33063\";\"4\"",
            "\"GIRARD*LOUISE/\";\"2\";\"20220101\";\"75056\";\"PARIS\";\"\";\"20211231\";\"75056\";\"5\"",
        ],
    );
}

/// Configuration reading raw files from `dir` and publishing there too
#[must_use]
pub fn test_config(dir: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.input.data_dir = dir.to_path_buf();
    config.snapshot = SnapshotConfig {
        parquet_path: dir.join("Deces_cleaned.parquet"),
        csv_fallback: Some(dir.join("Deces_cleaned.csv")),
    };
    config
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

/// Build a canonical record with the given demographic fields
#[must_use]
pub fn record(
    given_name: &str,
    sex: Option<Sex>,
    birth: (i32, u32, u32),
    death: (i32, u32, u32),
    place: &str,
    commune: Option<&str>,
) -> CanonicalRecord {
    CanonicalRecord::derive(
        "TEST".to_string(),
        given_name.to_string(),
        date(birth.0, birth.1, birth.2),
        date(death.0, death.1, death.2),
        sex,
        place.to_string(),
        Some(place.to_string()),
        commune.map(str::to_string),
    )
}

/// The records the sample inputs clean down to, in input order
#[must_use]
pub fn expected_sample_records() -> Vec<CanonicalRecord> {
    let mut records = vec![
        record(
            "MARIE JEANNE",
            Some(Sex::Female),
            (1930, 2, 15),
            (2020, 4, 1),
            "75056",
            Some("PARIS"),
        ),
        record("PIERRE", Some(Sex::Male), (1945, 6, 10), (2020, 11, 15), "69123", Some("LYON")),
        record("ANNE", Some(Sex::Female), (1928, 1, 1), (2021, 1, 5), "31555", Some("TOULOUSE")),
        record("CLAUDE", None, (1970, 1, 1), (2021, 3, 3), "2A004", Some("AJACCIO")),
        record("PAUL", Some(Sex::Male), (1999, 9, 9), (2022, 2, 2), "99350", None),
    ];
    let surnames = ["MARTIN", "DURAND", "BERNARD", "MOREL", "FAURE"];
    for (record, surname) in records.iter_mut().zip(surnames) {
        record.surname = surname.to_string();
    }
    // born abroad, died in Gironde
    records[4].death_place_code = Some("33063".to_string());
    records
}
