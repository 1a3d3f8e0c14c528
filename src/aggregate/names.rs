//! Given-name cohorts: most frequent names and names with the youngest deaths

use std::cmp::Ordering;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::aggregate::{EMPTY_VIEW, Outcome};
use crate::models::DatasetView;

/// Name cohort parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameCohortConfig {
    /// Minimum occurrences for a name to be ranked
    pub min_count: usize,
    /// Length of each ranking
    pub top_n: usize,
}

impl Default for NameCohortConfig {
    fn default() -> Self {
        Self {
            min_count: 500,
            top_n: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameStat {
    pub given_name: String,
    pub deaths: usize,
    pub mean_age: f64,
}

/// The two rankings over names reaching the popularity threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameCohorts {
    /// Names reaching the threshold
    pub eligible_names: usize,
    /// Most frequent names first
    pub most_common: Vec<NameStat>,
    /// Lowest mean age at death first
    pub youngest: Vec<NameStat>,
}

/// Rank given names occurring at least `min_count` times in `view`
///
/// The threshold is evaluated on the view itself. Empty given names are
/// not a cohort. Ties are broken by name.
#[must_use]
pub fn name_cohorts(view: &DatasetView<'_>, config: &NameCohortConfig) -> Outcome<NameCohorts> {
    if view.is_empty() {
        return Outcome::insufficient(EMPTY_VIEW);
    }

    let mut groups: FxHashMap<&str, (usize, i64)> = FxHashMap::default();
    for record in view.iter().filter(|r| !r.given_name.is_empty()) {
        let entry = groups.entry(record.given_name.as_str()).or_default();
        entry.0 += 1;
        entry.1 += i64::from(record.age_at_death);
    }

    let eligible: Vec<NameStat> = groups
        .into_iter()
        .filter(|(_, (count, _))| *count >= config.min_count)
        .map(|(name, (count, total_age))| NameStat {
            given_name: name.to_string(),
            deaths: count,
            mean_age: total_age as f64 / count as f64,
        })
        .collect();

    if eligible.is_empty() {
        return Outcome::insufficient(format!(
            "no given name occurs at least {} times",
            config.min_count
        ));
    }

    let mut most_common = eligible.clone();
    most_common.sort_by(|a, b| {
        b.deaths
            .cmp(&a.deaths)
            .then_with(|| a.given_name.cmp(&b.given_name))
    });
    most_common.truncate(config.top_n);

    let mut youngest = eligible;
    let eligible_names = youngest.len();
    youngest.sort_by(|a, b| match a.mean_age.total_cmp(&b.mean_age) {
        Ordering::Equal => a.given_name.cmp(&b.given_name),
        order => order,
    });
    youngest.truncate(config.top_n);

    Outcome::Ready(NameCohorts {
        eligible_names,
        most_common,
        youngest,
    })
}
