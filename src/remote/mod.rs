//! Optional remote fast path: fetch a pre-built snapshot over HTTP.
//!
//! Only the declared columns and row range are decoded. Every failure is
//! recoverable: `fetch_snapshot` logs a warning and returns `None` so the
//! caller can fall back to the local pipeline.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;
use reqwest::blocking::Client;

use crate::config::{CleaningConfig, RemoteConfig};
use crate::error::{Error, Result};
use crate::models::CanonicalDataset;
use crate::store::batch_to_records;

/// Decode a Parquet snapshot restricted to `config`'s columns and rows
///
/// Records violating a canonical invariant under `cleaning` are discarded.
pub fn decode_snapshot<R>(
    reader: R,
    config: &RemoteConfig,
    cleaning: &CleaningConfig,
) -> Result<CanonicalDataset>
where
    R: ChunkReader + 'static,
{
    let builder = ParquetRecordBatchReaderBuilder::try_new(reader)?;

    let indices: Vec<usize> = config
        .columns
        .iter()
        .filter_map(|name| {
            let idx = builder.schema().index_of(name).ok();
            if idx.is_none() {
                debug!("Remote snapshot has no column {name}");
            }
            idx
        })
        .collect();
    if indices.is_empty() {
        return Err(Error::Remote(
            "none of the declared columns exist in the remote snapshot".to_string(),
        ));
    }
    let mask = ProjectionMask::roots(builder.parquet_schema(), indices);

    let reader = builder
        .with_projection(mask)
        .with_offset(config.offset)
        .with_limit(config.limit)
        .build()?;

    let mut records = Vec::new();
    for batch in reader {
        records.extend(batch_to_records(&batch?)?);
    }
    let (dataset, discarded) =
        CanonicalDataset::validated(records, &cleaning.retention, cleaning.max_age);
    if discarded > 0 {
        warn!("Discarded {discarded} remote records violating canonical invariants");
    }
    Ok(dataset)
}

/// Fetch and decode the remote snapshot
///
/// # Errors
/// `Error::Remote` for a missing URL, a network failure or an HTTP error
/// status; Parquet and schema errors for a malformed payload.
pub fn try_fetch(config: &RemoteConfig, cleaning: &CleaningConfig) -> Result<CanonicalDataset> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| Error::Remote("no remote URL configured".to_string()))?;

    let start = Instant::now();
    info!("Fetching remote snapshot from {url}");
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    let response = client.get(url).send()?;
    if !response.status().is_success() {
        return Err(Error::Remote(format!("HTTP {} from {url}", response.status())));
    }
    let body = response.bytes()?;
    debug!("Downloaded {} bytes in {:?}", body.len(), start.elapsed());

    let dataset = decode_snapshot(body, config, cleaning)?;
    info!(
        "Loaded {} records from remote snapshot in {:?}",
        dataset.len(),
        start.elapsed()
    );
    Ok(dataset)
}

/// Fetch the remote snapshot, `None` on any failure
#[must_use]
pub fn fetch_snapshot(config: &RemoteConfig, cleaning: &CleaningConfig) -> Option<CanonicalDataset> {
    config.url.as_ref()?;
    match try_fetch(config, cleaning) {
        Ok(dataset) => Some(dataset),
        Err(e) => {
            warn!("Remote snapshot unavailable, falling back to local data: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::YearRange;
    use crate::models::{CanonicalRecord, Sex};
    use crate::schema::canonical;
    use crate::store::write_parquet_snapshot;
    use chrono::NaiveDate;
    use std::fs::File;

    fn record(given: &str, death_year: i32) -> CanonicalRecord {
        CanonicalRecord::derive(
            "BERNARD".into(),
            given.into(),
            NaiveDate::from_ymd_opt(1945, 4, 4).unwrap(),
            NaiveDate::from_ymd_opt(death_year, 4, 4).unwrap(),
            Some(Sex::Female),
            "31555".into(),
            Some("31555".into()),
            Some("TOULOUSE".into()),
        )
    }

    fn snapshot(dir: &std::path::Path) -> File {
        let path = dir.join("remote.parquet");
        let dataset = CanonicalDataset::new(vec![
            record("ALICE", 2020),
            record("BRIGITTE", 2021),
            record("CLAIRE", 2019),
            record("DENISE", 2022),
        ]);
        write_parquet_snapshot(&path, &dataset).unwrap();
        File::open(path).unwrap()
    }

    #[test]
    fn test_projection_and_invariants() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = decode_snapshot(
            snapshot(dir.path()),
            &RemoteConfig::default(),
            &CleaningConfig::default(),
        )
        .unwrap();
        // 2019 is outside the retention window
        assert_eq!(dataset.len(), 3);
        // surname is not among the declared columns
        assert!(dataset.records().iter().all(|r| r.surname.is_empty()));
        assert_eq!(dataset.records()[0].birth_commune.as_deref(), Some("TOULOUSE"));
    }

    #[test]
    fn test_row_range() {
        let dir = tempfile::tempdir().unwrap();
        let config = RemoteConfig {
            offset: 1,
            limit: 2,
            ..RemoteConfig::default()
        };
        let cleaning = CleaningConfig {
            retention: YearRange::new(2000, 2030),
            ..CleaningConfig::default()
        };
        let dataset = decode_snapshot(snapshot(dir.path()), &config, &cleaning).unwrap();
        let names: Vec<_> = dataset.records().iter().map(|r| r.given_name.as_str()).collect();
        assert_eq!(names, vec!["BRIGITTE", "CLAIRE"]);
    }

    #[test]
    fn test_missing_date_column_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = RemoteConfig {
            columns: vec![canonical::GIVEN_NAME.to_string(), canonical::SEX.to_string()],
            ..RemoteConfig::default()
        };
        assert!(decode_snapshot(snapshot(dir.path()), &config, &CleaningConfig::default()).is_err());
    }

    #[test]
    fn test_unconfigured_or_unreachable_remote_is_soft() {
        let cleaning = CleaningConfig::default();
        assert!(fetch_snapshot(&RemoteConfig::default(), &cleaning).is_none());

        let unreachable = RemoteConfig {
            url: Some("http://127.0.0.1:9/snapshot.parquet".to_string()),
            timeout_secs: 1,
            ..RemoteConfig::default()
        };
        assert!(fetch_snapshot(&unreachable, &cleaning).is_none());
        assert!(matches!(try_fetch(&unreachable, &cleaning), Err(Error::Remote(_))));
    }
}
