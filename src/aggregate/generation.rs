//! Deaths per decade of birth

use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::{EMPTY_VIEW, Outcome};
use crate::models::DatasetView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecadeCount {
    /// First year of the decade, `floor(birth_year / 10) * 10`
    pub decade: i32,
    pub deaths: usize,
}

/// Count deaths per birth decade, decades ascending
#[must_use]
pub fn generations(view: &DatasetView<'_>) -> Outcome<Vec<DecadeCount>> {
    if view.is_empty() {
        return Outcome::insufficient(EMPTY_VIEW);
    }

    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for record in view.iter() {
        *counts.entry(record.birth_decade()).or_default() += 1;
    }
    Outcome::Ready(
        counts
            .into_iter()
            .map(|(decade, deaths)| DecadeCount { decade, deaths })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalDataset, CanonicalRecord};
    use chrono::NaiveDate;

    fn born_in(year: i32) -> CanonicalRecord {
        CanonicalRecord::derive(
            "X".into(),
            "Y".into(),
            NaiveDate::from_ymd_opt(year, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
            None,
            "75056".into(),
            None,
            None,
        )
    }

    #[test]
    fn test_decades() {
        let dataset = CanonicalDataset::new(vec![
            born_in(1949),
            born_in(1930),
            born_in(1940),
            born_in(1939),
        ]);
        let decades = generations(&dataset.view()).ready().unwrap();
        assert_eq!(
            decades,
            vec![
                DecadeCount { decade: 1930, deaths: 2 },
                DecadeCount { decade: 1940, deaths: 2 },
            ]
        );
    }
}
