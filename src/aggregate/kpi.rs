//! Headline indicators: death count, mean and median age

use serde::Serialize;

use crate::aggregate::{EMPTY_VIEW, Outcome};
use crate::models::{DatasetView, Sex};

/// Mean age of one sex category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SexMeanAge {
    pub sex: Sex,
    pub deaths: usize,
    /// Rounded to one decimal
    pub mean_age: f64,
}

/// Key performance indicators of a view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub deaths: usize,
    /// Rounded to the nearest integer
    pub mean_age: i64,
    /// Rounded to the nearest integer
    pub median_age: i64,
    /// Mapped sex categories only, in `Sex` order; absent categories omitted
    pub mean_age_by_sex: Vec<SexMeanAge>,
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Median of sorted values, averaging the middle pair for even lengths
fn median(sorted: &[i32]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        f64::from(sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        f64::from(sorted[mid])
    }
}

/// Compute the KPI summary
#[must_use]
pub fn kpis(view: &DatasetView<'_>) -> Outcome<Kpis> {
    if view.is_empty() {
        return Outcome::insufficient(EMPTY_VIEW);
    }

    let mut ages: Vec<i32> = view.iter().map(|r| r.age_at_death).collect();
    ages.sort_unstable();
    let total: i64 = ages.iter().map(|&a| i64::from(a)).sum();
    let mean = total as f64 / ages.len() as f64;

    let mean_age_by_sex = [Sex::Male, Sex::Female]
        .into_iter()
        .filter_map(|sex| {
            let (count, sum) = view
                .iter()
                .filter(|r| r.sex == Some(sex))
                .fold((0usize, 0i64), |(n, s), r| (n + 1, s + i64::from(r.age_at_death)));
            (count > 0).then(|| SexMeanAge {
                sex,
                deaths: count,
                mean_age: round_to_tenth(sum as f64 / count as f64),
            })
        })
        .collect();

    Outcome::Ready(Kpis {
        deaths: ages.len(),
        mean_age: mean.round() as i64,
        median_age: median(&ages).round() as i64,
        mean_age_by_sex,
    })
}
