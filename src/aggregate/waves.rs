//! Age impact of named epidemic waves against the rest of the period

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::distribution::{AgeCount, age_counts};
use crate::aggregate::{EMPTY_VIEW, Outcome};
use crate::config::default_waves;
use crate::models::{CanonicalRecord, DatasetView};

/// A named, inclusive range of death dates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Wave {
    #[must_use]
    pub fn new(name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Named waves plus the label of the residual bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSet {
    pub waves: Vec<Wave>,
    /// Bucket of every death outside all named waves
    pub other_label: String,
}

impl Default for WaveSet {
    fn default() -> Self {
        Self {
            waves: default_waves(),
            other_label: "Other (Rest of 2020-2022)".to_string(),
        }
    }
}

impl WaveSet {
    /// Whether `date` falls outside the union of every named wave
    #[must_use]
    pub fn is_residual(&self, date: NaiveDate) -> bool {
        !self.waves.iter().any(|wave| wave.contains(date))
    }
}

/// Age distribution of one window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaveAges {
    pub name: String,
    pub deaths: usize,
    pub ages: Vec<AgeCount>,
}

fn window_ages<'a>(name: &str, records: impl Iterator<Item = &'a CanonicalRecord>) -> WaveAges {
    let ages = age_counts(records);
    WaveAges {
        name: name.to_string(),
        deaths: ages.iter().map(|a| a.deaths).sum(),
        ages,
    }
}

/// Per-age deaths inside each named wave and in the residual bucket
///
/// Every wave is evaluated independently; the residual bucket holds the
/// deaths outside the union of all waves. A window without deaths is
/// reported with an empty distribution.
#[must_use]
pub fn wave_age_impact(view: &DatasetView<'_>, waves: &WaveSet) -> Outcome<Vec<WaveAges>> {
    if view.is_empty() {
        return Outcome::insufficient(EMPTY_VIEW);
    }

    let mut windows: Vec<WaveAges> = waves
        .waves
        .iter()
        .map(|wave| window_ages(&wave.name, view.iter().filter(|r| wave.contains(r.death_date))))
        .collect();
    windows.push(window_ages(
        &waves.other_label,
        view.iter().filter(|r| waves.is_residual(r.death_date)),
    ));
    Outcome::Ready(windows)
}
