mod utils;

use std::fs;
use std::sync::Arc;

use mortality_pipeline::clean::raw_table_from_records;
use mortality_pipeline::store::{read_parquet_snapshot, write_csv_snapshot};
use mortality_pipeline::{CanonicalDataset, Error, Pipeline, clean, full_report};

use utils::{expected_sample_records, test_config, write_sample_inputs};

#[test]
fn test_rebuild_cleans_and_publishes() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_inputs(dir.path());
    let pipeline = Pipeline::new(test_config(dir.path())).unwrap();

    let (dataset, report) = pipeline.rebuild().unwrap();

    assert_eq!(report.rows_read, 9);
    assert_eq!(report.after_dedup, 8);
    assert_eq!(report.after_required, 7);
    assert_eq!(report.after_dates, 6);
    assert_eq!(report.after_age, 5);
    assert_eq!(report.after_retention, 5);
    assert_eq!(report.unmapped_sex, 1);
    assert_eq!(report.columns_dropped, vec!["paysnaiss", "actedeces"]);

    assert_eq!(dataset.records(), expected_sample_records().as_slice());
    assert!(pipeline.store().exists());
    assert_eq!(
        read_parquet_snapshot(pipeline.store().path()).unwrap(),
        *dataset
    );
}

#[test]
fn test_every_record_satisfies_invariants() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_inputs(dir.path());
    let config = test_config(dir.path());
    let pipeline = Pipeline::new(config.clone()).unwrap();

    let (dataset, report) = pipeline.rebuild().unwrap();

    assert!(dataset.len() <= report.after_dedup);
    for record in dataset.records() {
        assert!(
            record.satisfies_invariants(&config.cleaning.retention, config.cleaning.max_age),
            "{record:?}"
        );
    }
}

#[test]
fn test_run_reuses_cache_then_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_inputs(dir.path());
    let config = test_config(dir.path());

    let pipeline = Pipeline::new(config.clone()).unwrap();
    let (built, _) = pipeline.rebuild().unwrap();
    let loaded = pipeline.run().unwrap();
    assert!(Arc::ptr_eq(&built, &loaded));

    // a fresh pipeline finds the published snapshot without any raw file
    for year in 2020..=2022 {
        fs::remove_file(dir.path().join(format!("Deces_{year}.csv"))).unwrap();
    }
    let fresh = Pipeline::new(config).unwrap();
    assert_eq!(*fresh.run().unwrap(), *built);
}

#[test]
fn test_rebuild_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_inputs(dir.path());
    let pipeline = Pipeline::new(test_config(dir.path())).unwrap();

    let (first, first_report) = pipeline.rebuild().unwrap();
    let (second, second_report) = pipeline.rebuild().unwrap();
    assert_eq!(*first, *second);
    assert_eq!(first_report, second_report);
}

#[test]
fn test_cleaning_canonical_output_is_identity() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_inputs(dir.path());
    let config = test_config(dir.path());
    let (dataset, _) = Pipeline::new(config.clone()).unwrap().rebuild().unwrap();

    let raw = raw_table_from_records(dataset.records()).unwrap();
    let (recleaned, report) = clean(&raw, &config.cleaning).unwrap();
    assert_eq!(recleaned, *dataset);
    assert_eq!(report.rows_dropped(), 0);
}

#[test]
fn test_textual_snapshot_is_converted() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let dataset = CanonicalDataset::new(expected_sample_records());
    write_csv_snapshot(config.snapshot.csv_fallback.as_ref().unwrap(), &dataset).unwrap();

    let pipeline = Pipeline::new(config).unwrap();
    assert!(!pipeline.store().path().exists());
    let converted = pipeline.run().unwrap();
    assert_eq!(*converted, dataset);
    assert!(pipeline.store().path().exists());

    // the converted snapshot is served from the cache afterwards
    assert!(Arc::ptr_eq(&converted, &pipeline.run().unwrap()));
}

#[test]
fn test_inconsistent_textual_snapshot_is_repaired_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let mut records = expected_sample_records();
    records[0].age_at_death = 500;
    records[1].death_month = 0;
    write_csv_snapshot(
        config.snapshot.csv_fallback.as_ref().unwrap(),
        &CanonicalDataset::new(records),
    )
    .unwrap();

    let pipeline = Pipeline::new(config).unwrap();
    let dataset = pipeline.run().unwrap();
    assert_eq!(dataset.records(), &expected_sample_records()[2..]);

    let report = full_report(&dataset.view(), &pipeline.config().analysis);
    assert!(report.excess_mortality.is_ready());
}

#[test]
fn test_failed_rebuild_keeps_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_inputs(dir.path());
    let pipeline = Pipeline::new(test_config(dir.path())).unwrap();
    let (built, _) = pipeline.rebuild().unwrap();

    // comma-delimited header where semicolons are expected
    fs::write(
        dir.path().join("Deces_2021.csv"),
        "nomprenom,sexe,datenaiss,lieunaiss,datedeces,lieudeces\n",
    )
    .unwrap();
    assert!(matches!(pipeline.rebuild(), Err(Error::Delimiter { .. })));
    assert_eq!(
        read_parquet_snapshot(pipeline.store().path()).unwrap(),
        *built
    );
}

#[test]
fn test_no_source_available() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(test_config(dir.path())).unwrap();
    assert!(matches!(pipeline.run(), Err(Error::SnapshotUnavailable(_))));
}
