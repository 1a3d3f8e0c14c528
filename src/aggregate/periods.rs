//! Period-normalized age comparison

use serde::{Deserialize, Serialize};

use crate::aggregate::distribution::age_counts;
use crate::aggregate::{EMPTY_VIEW, Outcome};
use crate::config::YearRange;
use crate::error::{Error, Result};
use crate::models::DatasetView;

/// Two disjoint death-year periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub first: YearRange,
    pub second: YearRange,
}

impl PeriodComparison {
    /// # Errors
    /// `Error::Config` when a period is inverted or the periods overlap.
    pub fn new(first: YearRange, second: YearRange) -> Result<Self> {
        if first.span() == 0 || second.span() == 0 {
            return Err(Error::config(format!(
                "comparison periods {first} and {second} must not be inverted"
            )));
        }
        if first.overlaps(&second) {
            return Err(Error::config(format!(
                "comparison periods {first} and {second} overlap"
            )));
        }
        Ok(Self { first, second })
    }
}

/// Average annual deaths at one age
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnnualAgeRate {
    pub age: i32,
    pub deaths_per_year: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodAges {
    pub years: YearRange,
    pub deaths: usize,
    pub ages: Vec<AnnualAgeRate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparisonResult {
    pub first: PeriodAges,
    pub second: PeriodAges,
}

fn period_ages(view: &DatasetView<'_>, years: YearRange) -> Option<PeriodAges> {
    let counts = age_counts(view.iter().filter(|r| years.contains(r.death_year)));
    if counts.is_empty() {
        return None;
    }
    let span = f64::from(years.span());
    Some(PeriodAges {
        years,
        deaths: counts.iter().map(|c| c.deaths).sum(),
        ages: counts
            .into_iter()
            .map(|c| AnnualAgeRate {
                age: c.age,
                deaths_per_year: c.deaths as f64 / span,
            })
            .collect(),
    })
}

/// Per-age deaths of each period divided by the period length in years
#[must_use]
pub fn compare_periods(
    view: &DatasetView<'_>,
    comparison: &PeriodComparison,
) -> Outcome<PeriodComparisonResult> {
    if view.is_empty() {
        return Outcome::insufficient(EMPTY_VIEW);
    }
    let Some(first) = period_ages(view, comparison.first) else {
        return Outcome::insufficient(format!("no deaths in {}", comparison.first));
    };
    let Some(second) = period_ages(view, comparison.second) else {
        return Outcome::insufficient(format!("no deaths in {}", comparison.second));
    };
    Outcome::Ready(PeriodComparisonResult { first, second })
}
