//! The aggregation engine.
//!
//! Every statistic is a pure function of a `DatasetView` (and, where needed,
//! its parameters). Functions never fail: an input too small to compute a
//! statistic yields `Outcome::InsufficientData` instead of an error or a
//! silent zero.

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::models::DatasetView;

pub mod distribution;
pub mod excess;
pub mod generation;
pub mod geography;
pub mod kpi;
pub mod names;
pub mod periods;
pub mod timeseries;
pub mod waves;

pub use distribution::{AgeCount, AgeSexHistogram, age_counts, age_sex_histogram};
pub use excess::{Baseline, ExcessConfig, ExcessPoint, excess_mortality};
pub use generation::{DecadeCount, generations};
pub use geography::{DepartmentCount, GeographySummary, LocationField, deaths_by_department};
pub use kpi::{Kpis, kpis};
pub use names::{NameCohortConfig, NameCohorts, NameStat, name_cohorts};
pub use periods::{PeriodComparison, PeriodComparisonResult, compare_periods};
pub use timeseries::{Granularity, SeriesPoint, mortality_series};
pub use waves::{Wave, WaveAges, WaveSet, wave_age_impact};

/// Result of one aggregation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// The statistic was computed
    Ready(T),
    /// The input did not contain enough rows; carries the reason
    InsufficientData(String),
}

impl<T> Outcome<T> {
    pub(crate) fn insufficient(reason: impl Into<String>) -> Self {
        Self::InsufficientData(reason.into())
    }

    /// Whether the statistic was computed
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The computed value, if any
    #[must_use]
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::InsufficientData(_) => None,
        }
    }

    /// Borrow the computed value, if any
    #[must_use]
    pub const fn as_ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::InsufficientData(_) => None,
        }
    }

    /// Transform the computed value
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Self::Ready(value) => Outcome::Ready(f(value)),
            Self::InsufficientData(reason) => Outcome::InsufficientData(reason),
        }
    }
}

/// Reason reported for an empty input view
pub(crate) const EMPTY_VIEW: &str = "no records match the current filters";

/// Every statistic computed over one view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub kpis: Outcome<Kpis>,
    pub age_sex_histogram: Outcome<AgeSexHistogram>,
    pub mortality_series: Outcome<Vec<SeriesPoint>>,
    pub excess_mortality: Outcome<Vec<ExcessPoint>>,
    pub generations: Outcome<Vec<DecadeCount>>,
    pub name_cohorts: Outcome<NameCohorts>,
    pub waves: Outcome<Vec<WaveAges>>,
    pub period_comparison: Option<Outcome<PeriodComparisonResult>>,
    pub departments: Outcome<GeographySummary>,
}

/// Compute every statistic configured in `config` over `view`
#[must_use]
pub fn full_report(view: &DatasetView<'_>, config: &AnalysisConfig) -> Report {
    Report {
        kpis: kpis(view),
        age_sex_histogram: age_sex_histogram(view, config.histogram_bins),
        mortality_series: mortality_series(view, config.granularity),
        excess_mortality: excess_mortality(view, &config.excess),
        generations: generations(view),
        name_cohorts: name_cohorts(view, &config.names),
        waves: wave_age_impact(view, &config.waves),
        period_comparison: config
            .period_comparison
            .as_ref()
            .map(|comparison| compare_periods(view, comparison)),
        departments: deaths_by_department(view, config.location),
    }
}
