//! Age distributions: per-age counts and the overlaid age/sex histogram

use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::{EMPTY_VIEW, Outcome};
use crate::models::{CanonicalRecord, DatasetView, Sex};

/// Deaths at one integer age
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgeCount {
    pub age: i32,
    pub deaths: usize,
}

/// Per-age death counts in ascending age order, ages without deaths omitted
pub fn age_counts<'a, I>(records: I) -> Vec<AgeCount>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
{
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.age_at_death).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(age, deaths)| AgeCount { age, deaths })
        .collect()
}

/// One histogram bin covering ages `start..=end`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgeBin {
    pub start: i32,
    pub end: i32,
    pub male: usize,
    pub female: usize,
    /// Rows whose sex code was unmapped
    pub unknown: usize,
}

impl AgeBin {
    /// Total deaths in the bin
    #[must_use]
    pub const fn total(&self) -> usize {
        self.male + self.female + self.unknown
    }
}

/// Age histogram split by sex, with equal-width bins
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgeSexHistogram {
    pub bin_width: i32,
    pub bins: Vec<AgeBin>,
}

/// Bucket ages into at most `bins` equal-width bins spanning the observed ages
///
/// The bin width is `ceil((max - min + 1) / bins)`, so requesting more bins
/// than distinct ages yields one bin per age.
#[must_use]
pub fn age_sex_histogram(view: &DatasetView<'_>, bins: usize) -> Outcome<AgeSexHistogram> {
    if view.is_empty() {
        return Outcome::insufficient(EMPTY_VIEW);
    }
    if bins == 0 {
        return Outcome::insufficient("histogram needs at least one bin");
    }

    let (min, max) = view
        .iter()
        .fold((i32::MAX, i32::MIN), |(lo, hi), r| {
            (lo.min(r.age_at_death), hi.max(r.age_at_death))
        });
    let span = max - min + 1;
    let bins = i32::try_from(bins).unwrap_or(i32::MAX);
    let width = ((span + bins - 1) / bins).max(1);
    let count = (span + width - 1) / width;

    let mut histogram: Vec<AgeBin> = (0..count)
        .map(|idx| AgeBin {
            start: min + idx * width,
            end: min + (idx + 1) * width - 1,
            male: 0,
            female: 0,
            unknown: 0,
        })
        .collect();

    for record in view.iter() {
        let bin = &mut histogram[((record.age_at_death - min) / width) as usize];
        match record.sex {
            Some(Sex::Male) => bin.male += 1,
            Some(Sex::Female) => bin.female += 1,
            None => bin.unknown += 1,
        }
    }

    Outcome::Ready(AgeSexHistogram {
        bin_width: width,
        bins: histogram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CanonicalDataset;
    use chrono::NaiveDate;

    fn record(age: i32, sex: Option<Sex>) -> CanonicalRecord {
        CanonicalRecord::derive(
            "X".into(),
            "Y".into(),
            NaiveDate::from_ymd_opt(2021 - age, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
            sex,
            "75056".into(),
            None,
            None,
        )
    }

    #[test]
    fn test_age_counts() {
        let records = [
            record(70, None),
            record(90, Some(Sex::Male)),
            record(70, Some(Sex::Female)),
        ];
        assert_eq!(
            age_counts(&records),
            vec![AgeCount { age: 70, deaths: 2 }, AgeCount { age: 90, deaths: 1 }]
        );
    }

    #[test]
    fn test_histogram_bins() {
        let dataset = CanonicalDataset::new(vec![
            record(0, Some(Sex::Male)),
            record(5, Some(Sex::Female)),
            record(9, None),
            record(10, Some(Sex::Male)),
        ]);
        let histogram = age_sex_histogram(&dataset.view(), 2).ready().unwrap();
        // 11 distinct ages over 2 bins: width 6
        assert_eq!(histogram.bin_width, 6);
        assert_eq!(histogram.bins.len(), 2);
        assert_eq!((histogram.bins[0].start, histogram.bins[0].end), (0, 5));
        assert_eq!(histogram.bins[0].male, 1);
        assert_eq!(histogram.bins[0].female, 1);
        assert_eq!(histogram.bins[1].unknown, 1);
        assert_eq!(histogram.bins[1].male, 1);
        assert_eq!(
            histogram.bins.iter().map(AgeBin::total).sum::<usize>(),
            dataset.len()
        );
    }

    #[test]
    fn test_more_bins_than_ages() {
        let dataset = CanonicalDataset::new(vec![record(80, None), record(81, None)]);
        let histogram = age_sex_histogram(&dataset.view(), 100).ready().unwrap();
        assert_eq!(histogram.bin_width, 1);
        assert_eq!(histogram.bins.len(), 2);
    }

    #[test]
    fn test_empty_view() {
        let dataset = CanonicalDataset::default();
        assert!(!age_sex_histogram(&dataset.view(), 100).is_ready());
    }
}
