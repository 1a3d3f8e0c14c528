//! Configuration for the mortality pipeline.
//!
//! Every section implements `Default` with the values of the reference
//! deployment (INSEE death files 2020-2022), and deserializes with
//! `#[serde(default)]` so a partial JSON file is a valid configuration.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use crate::aggregate::excess::{Baseline, ExcessConfig};
use crate::aggregate::geography::LocationField;
use crate::aggregate::names::NameCohortConfig;
use crate::aggregate::periods::PeriodComparison;
use crate::aggregate::timeseries::Granularity;
use crate::aggregate::waves::{Wave, WaveSet};
use crate::error::{Error, Result};
use crate::schema::raw;
use crate::utils::{DEFAULT_BATCH_SIZE, get_batch_size};

/// An inclusive range of calendar years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    /// First year (inclusive)
    pub start: i32,
    /// Last year (inclusive)
    pub end: i32,
}

impl YearRange {
    /// Create a new year range
    #[must_use]
    pub const fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Whether `year` falls inside the range
    #[must_use]
    pub const fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }

    /// Number of years covered, zero for an inverted range
    #[must_use]
    pub const fn span(&self) -> u32 {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start + 1) as u32
        }
    }

    /// Whether two ranges share at least one year
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Iterate the years in ascending order
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }

    fn check(&self, what: &str) -> Result<()> {
        if self.end < self.start {
            return Err(Error::config(format!("{what}: range {self} is inverted")));
        }
        Ok(())
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl std::str::FromStr for YearRange {
    type Err = Error;

    /// Parse `2020-2022` or a single year `2021`
    fn from_str(s: &str) -> Result<Self> {
        let parse = |part: &str| {
            part.trim()
                .parse::<i32>()
                .map_err(|e| Error::config(format!("invalid year '{part}': {e}")))
        };
        let range = match s.split_once('-') {
            Some((start, end)) => Self::new(parse(start)?, parse(end)?),
            None => {
                let year = parse(s)?;
                Self::new(year, year)
            }
        };
        range.check("year range")?;
        Ok(range)
    }
}

/// Raw input discovery and streaming settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory holding the raw files
    pub data_dir: PathBuf,
    /// File name prefix, followed by the year
    pub file_prefix: String,
    /// File extension without the dot
    pub extension: String,
    /// Years for which a raw file is expected
    pub years: YearRange,
    /// Field delimiter
    pub delimiter: char,
    /// Rows per streamed batch
    pub batch_size: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            file_prefix: "Deces_".to_string(),
            extension: "csv".to_string(),
            years: YearRange::new(2020, 2022),
            delimiter: ';',
            batch_size: 200_000,
        }
    }
}

impl InputConfig {
    /// Path of the raw file for `year`
    #[must_use]
    pub fn file_for_year(&self, year: i32) -> PathBuf {
        self.data_dir
            .join(format!("{}{year}.{}", self.file_prefix, self.extension))
    }

    /// Batch size, honouring the `MORTALITY_BATCH_SIZE` environment override
    #[must_use]
    pub fn effective_batch_size(&self) -> usize {
        get_batch_size().unwrap_or(if self.batch_size == 0 {
            DEFAULT_BATCH_SIZE
        } else {
            self.batch_size
        })
    }
}

/// Cleaning and retention settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Administrative columns removed after deduplication
    pub drop_columns: Vec<String>,
    /// When set, only these columns survive pruning
    pub keep_columns: Option<Vec<String>>,
    /// Columns whose absence drops the row
    pub required_columns: Vec<String>,
    /// Death years kept in the canonical set
    pub retention: YearRange,
    /// Largest plausible age at death
    pub max_age: i32,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            drop_columns: vec![raw::ACTEDECES.to_string(), raw::PAYSNAISS.to_string()],
            keep_columns: None,
            required_columns: vec![raw::LIEUNAISS.to_string(), raw::LIEUDECES.to_string()],
            retention: YearRange::new(2020, 2022),
            max_age: 122,
        }
    }
}

/// Location of the canonical snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Columnar snapshot
    pub parquet_path: PathBuf,
    /// Optional textual snapshot, converted lazily on first load
    pub csv_fallback: Option<PathBuf>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            parquet_path: PathBuf::from("data/Deces_cleaned.parquet"),
            csv_fallback: Some(PathBuf::from("data/Deces_cleaned.csv")),
        }
    }
}

/// Optional remote snapshot source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// URL of a pre-built Parquet snapshot
    pub url: Option<String>,
    /// Columns to fetch
    pub columns: Vec<String>,
    /// First row to read
    pub offset: usize,
    /// Maximum number of rows to read
    pub limit: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        use crate::schema::canonical as c;
        Self {
            url: None,
            columns: [
                c::GIVEN_NAME,
                c::SEX,
                c::BIRTH_DATE,
                c::DEATH_DATE,
                c::AGE_AT_DEATH,
                c::BIRTH_PLACE_CODE,
                c::DEATH_PLACE_CODE,
                c::BIRTH_COMMUNE,
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
            offset: 0,
            limit: 2_000_000,
            timeout_secs: 60,
        }
    }
}

/// Parameters of the aggregation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of bins of the age/sex histogram
    pub histogram_bins: usize,
    /// Granularity of the mortality time series
    pub granularity: Granularity,
    /// Excess-mortality parameters
    pub excess: ExcessConfig,
    /// Name cohort parameters
    pub names: NameCohortConfig,
    /// Named waves and the residual bucket
    pub waves: WaveSet,
    /// Optional period-normalized comparison
    pub period_comparison: Option<PeriodComparison>,
    /// Location field used for geographic aggregation
    pub location: LocationField,
    /// Number of departments listed in the ranking
    pub top_departments: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            histogram_bins: 100,
            granularity: Granularity::Day,
            excess: ExcessConfig::default(),
            names: NameCohortConfig::default(),
            waves: WaveSet::default(),
            period_comparison: None,
            location: LocationField::DeathPlace,
            top_departments: 10,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raw input discovery
    pub input: InputConfig,
    /// Cleaning rules
    pub cleaning: CleaningConfig,
    /// Snapshot location
    pub snapshot: SnapshotConfig,
    /// Remote fast path
    pub remote: RemoteConfig,
    /// Aggregation parameters
    pub analysis: AnalysisConfig,
}

impl PipelineConfig {
    /// Load and validate a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject configurations no pipeline run could honour
    pub fn validate(&self) -> Result<()> {
        self.input.years.check("input.years")?;
        self.cleaning.retention.check("cleaning.retention")?;

        if self.input.batch_size == 0 {
            return Err(Error::config("input.batch_size must be positive"));
        }
        if !self.input.delimiter.is_ascii() {
            return Err(Error::config("input.delimiter must be a single ASCII character"));
        }
        if !(0..=150).contains(&self.cleaning.max_age) {
            return Err(Error::config("cleaning.max_age must lie in 0..=150"));
        }
        if self.analysis.histogram_bins == 0 {
            return Err(Error::config("analysis.histogram_bins must be positive"));
        }
        if let Baseline::ReferenceWindow { years } = &self.analysis.excess.baseline {
            years.check("analysis.excess.baseline.years")?;
            if years.end >= self.analysis.excess.threshold_year {
                return Err(Error::config(format!(
                    "excess reference window {years} must end before threshold year {}",
                    self.analysis.excess.threshold_year
                )));
            }
        }
        for wave in &self.analysis.waves.waves {
            if wave.end < wave.start {
                return Err(Error::config(format!("wave '{}' ends before it starts", wave.name)));
            }
        }
        if let Some(comparison) = &self.analysis.period_comparison {
            PeriodComparison::new(comparison.first, comparison.second)?;
        }
        Ok(())
    }

    /// Stable hash of the whole configuration, used as a cache key component
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        // Serialization of these plain structs cannot fail
        serde_json::to_string(self)
            .unwrap_or_default()
            .hash(&mut hasher);
        hasher.finish()
    }
}

/// Parse an ISO date used in configuration defaults
pub(crate) fn iso_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// Waves of the reference deployment
pub(crate) fn default_waves() -> Vec<Wave> {
    vec![
        Wave::new("1st Wave (Spring 2020)", iso_date(2020, 3, 15), iso_date(2020, 5, 15)),
        Wave::new("2nd Wave (Winter 2020-21)", iso_date(2020, 10, 15), iso_date(2021, 1, 15)),
        Wave::new(
            "3rd Wave (Delta, Summer 2021)",
            iso_date(2021, 8, 1),
            iso_date(2021, 10, 1),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.input.file_for_year(2021), PathBuf::from("data/Deces_2021.csv"));
        assert_eq!(config.cleaning.retention, YearRange::new(2020, 2022));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "cleaning": { "retention": { "start": 2019, "end": 2019 } } }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.cleaning.retention, YearRange::new(2019, 2019));
        assert_eq!(config.cleaning.max_age, 122);
        assert_eq!(config.input.delimiter, ';');
        assert_eq!(config.analysis.histogram_bins, 100);
    }

    #[test]
    fn test_inverted_retention_rejected() {
        let mut config = PipelineConfig::default();
        config.cleaning.retention = YearRange::new(2022, 2020);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_reference_window_must_precede_threshold() {
        let mut config = PipelineConfig::default();
        config.analysis.excess.baseline = Baseline::ReferenceWindow {
            years: YearRange::new(2015, 2020),
        };
        assert!(config.validate().is_err());

        config.analysis.excess.baseline = Baseline::ReferenceWindow {
            years: YearRange::new(2015, 2019),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_year_range_parsing() {
        assert_eq!("2020-2022".parse::<YearRange>().unwrap(), YearRange::new(2020, 2022));
        assert_eq!("2021".parse::<YearRange>().unwrap(), YearRange::new(2021, 2021));
        assert!("2022-2020".parse::<YearRange>().is_err());
        assert!("abc".parse::<YearRange>().is_err());
    }

    #[test]
    fn test_year_range_helpers() {
        let range = YearRange::new(2015, 2019);
        assert_eq!(range.span(), 5);
        assert!(range.contains(2015) && range.contains(2019));
        assert!(!range.contains(2020));
        assert!(range.overlaps(&YearRange::new(2019, 2022)));
        assert!(!range.overlaps(&YearRange::new(2020, 2022)));
    }

    #[test]
    fn test_fingerprint_tracks_changes() {
        let a = PipelineConfig::default();
        let mut b = PipelineConfig::default();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.cleaning.max_age = 110;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
