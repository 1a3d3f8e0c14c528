//! Deaths per calendar day or month

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::{EMPTY_VIEW, Outcome};
use crate::models::{DatasetView, YearMonth};

/// Grouping period of the time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Month,
}

/// A calendar day or an absolute month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Period {
    Day(NaiveDate),
    Month(YearMonth),
}

/// Deaths in one period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub period: Period,
    pub deaths: usize,
}

/// Count deaths per period in chronological order
///
/// Periods without deaths are not materialized.
#[must_use]
pub fn mortality_series(view: &DatasetView<'_>, granularity: Granularity) -> Outcome<Vec<SeriesPoint>> {
    if view.is_empty() {
        return Outcome::insufficient(EMPTY_VIEW);
    }

    let mut counts: BTreeMap<Period, usize> = BTreeMap::new();
    for record in view.iter() {
        let period = match granularity {
            Granularity::Day => Period::Day(record.death_date),
            Granularity::Month => Period::Month(record.death_period()),
        };
        *counts.entry(period).or_default() += 1;
    }

    Outcome::Ready(
        counts
            .into_iter()
            .map(|(period, deaths)| SeriesPoint { period, deaths })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalDataset, CanonicalRecord};

    fn died_on(y: i32, m: u32, d: u32) -> CanonicalRecord {
        CanonicalRecord::derive(
            "X".into(),
            "Y".into(),
            NaiveDate::from_ymd_opt(1940, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            None,
            "75056".into(),
            None,
            None,
        )
    }

    #[test]
    fn test_daily_series_is_chronological_without_gaps_filled() {
        let dataset = CanonicalDataset::new(vec![
            died_on(2020, 3, 5),
            died_on(2020, 3, 1),
            died_on(2020, 3, 5),
        ]);
        let series = mortality_series(&dataset.view(), Granularity::Day).ready().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(
            series[0].period,
            Period::Day(NaiveDate::from_ymd_opt(2020, 3, 1).unwrap())
        );
        assert_eq!(series[1].deaths, 2);
    }

    #[test]
    fn test_monthly_series() {
        let dataset = CanonicalDataset::new(vec![
            died_on(2021, 1, 31),
            died_on(2020, 12, 1),
            died_on(2021, 1, 2),
        ]);
        let series = mortality_series(&dataset.view(), Granularity::Month).ready().unwrap();
        assert_eq!(series[0].period, Period::Month(YearMonth::new(2020, 12)));
        assert_eq!(series[1].deaths, 2);
        assert_eq!(
            serde_json::to_string(&series[1]).unwrap(),
            r#"{"period":"2021-01","deaths":2}"#
        );
    }
}
