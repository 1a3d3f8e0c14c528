//! Excess mortality: observed deaths per month minus an expected baseline

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{EMPTY_VIEW, Outcome};
use crate::config::YearRange;
use crate::models::{DatasetView, YearMonth};

/// Average monthly deaths in France 2015-2019 (Ined)
pub const REFERENCE_DEATHS_PER_MONTH: f64 = 50_048.0;

/// Expected deaths per month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Baseline {
    /// One external value for every month
    Constant { deaths_per_month: f64 },
    /// Deaths of the same month-of-year in a reference window of the input,
    /// divided by the number of reference years
    ReferenceWindow { years: YearRange },
}

/// Excess-mortality parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcessConfig {
    /// First death year compared against the baseline
    pub threshold_year: i32,
    pub baseline: Baseline,
}

impl Default for ExcessConfig {
    fn default() -> Self {
        Self {
            threshold_year: 2020,
            baseline: Baseline::Constant {
                deaths_per_month: REFERENCE_DEATHS_PER_MONTH,
            },
        }
    }
}

/// Excess deaths in one absolute month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcessPoint {
    pub month: YearMonth,
    pub observed: usize,
    pub baseline: f64,
    /// `observed - baseline`
    pub excess: f64,
}

/// Expected deaths per month-of-year (index 0 is January)
fn reference_baseline(view: &DatasetView<'_>, years: &YearRange) -> Option<[f64; 12]> {
    let mut totals = [0usize; 12];
    let mut any = false;
    for record in view.iter().filter(|r| years.contains(r.death_year)) {
        totals[(record.death_month - 1) as usize] += 1;
        any = true;
    }
    let span = f64::from(years.span());
    (any && span > 0.0).then(|| totals.map(|total| total as f64 / span))
}

/// Compute excess deaths for every month at or after the threshold year
///
/// Months are matched to the baseline by month of year only, so every
/// January is compared against the same January baseline.
#[must_use]
pub fn excess_mortality(view: &DatasetView<'_>, config: &ExcessConfig) -> Outcome<Vec<ExcessPoint>> {
    if view.is_empty() {
        return Outcome::insufficient(EMPTY_VIEW);
    }

    let mut observed: BTreeMap<YearMonth, usize> = BTreeMap::new();
    for record in view.iter().filter(|r| r.death_year >= config.threshold_year) {
        *observed.entry(record.death_period()).or_default() += 1;
    }
    if observed.is_empty() {
        return Outcome::insufficient(format!(
            "no deaths in or after {}",
            config.threshold_year
        ));
    }

    let expected = match &config.baseline {
        Baseline::Constant { deaths_per_month } => [*deaths_per_month; 12],
        Baseline::ReferenceWindow { years } => match reference_baseline(view, years) {
            Some(expected) => expected,
            None => {
                return Outcome::insufficient(format!("no deaths in reference window {years}"));
            }
        },
    };

    Outcome::Ready(
        observed
            .into_iter()
            .map(|(month, observed)| {
                let baseline = expected[(month.month - 1) as usize];
                ExcessPoint {
                    month,
                    observed,
                    baseline,
                    excess: observed as f64 - baseline,
                }
            })
            .collect(),
    )
}
