//! Predicate interface over the canonical dataset.
//!
//! Filters never touch the dataset: applying a predicate set to a view
//! yields a new `DatasetView` selecting the matching records. Predicates
//! combine with logical AND and an absent predicate matches everything.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::str::FromStr;

use crate::config::YearRange;
use crate::error::{Error, Result};
use crate::models::{CanonicalRecord, DatasetView, Sex};

/// A predicate over canonical records
pub trait RecordFilter: Debug {
    /// Whether `record` passes the filter
    fn matches(&self, record: &CanonicalRecord) -> bool;
}

impl<'a> DatasetView<'a> {
    /// New view keeping the records of this view that pass `filter`
    #[must_use]
    pub fn refine<F: RecordFilter + ?Sized>(&self, filter: &F) -> DatasetView<'a> {
        self.select(|record| filter.matches(record))
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Given-name query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameQuery {
    /// Case-insensitive substring
    Contains(String),
    /// Exact match against the upper-cased query, as names are stored upper-case
    Exact(String),
}

impl NameQuery {
    fn is_empty(&self) -> bool {
        match self {
            Self::Contains(query) | Self::Exact(query) => query.trim().is_empty(),
        }
    }
}

impl RecordFilter for NameQuery {
    fn matches(&self, record: &CanonicalRecord) -> bool {
        match self {
            Self::Contains(query) => contains_ignore_case(&record.given_name, query.trim()),
            Self::Exact(query) => record.given_name == query.trim().to_uppercase(),
        }
    }
}

/// Age bands offered for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgeGroup {
    #[default]
    All,
    NinetyPlus,
    From75To89,
    From60To74,
    From40To59,
    From20To39,
    Under20,
}

impl AgeGroup {
    /// Every group in display order
    pub const ALL: [Self; 7] = [
        Self::All,
        Self::NinetyPlus,
        Self::From75To89,
        Self::From60To74,
        Self::From40To59,
        Self::From20To39,
        Self::Under20,
    ];

    /// Inclusive age bounds, `max_age` closing the open-ended bands
    #[must_use]
    pub const fn bounds(self, max_age: i32) -> (i32, i32) {
        match self {
            Self::All => (0, max_age),
            Self::NinetyPlus => (90, max_age),
            Self::From75To89 => (75, 89),
            Self::From60To74 => (60, 74),
            Self::From40To59 => (40, 59),
            Self::From20To39 => (20, 39),
            Self::Under20 => (0, 19),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::NinetyPlus => "90+",
            Self::From75To89 => "75-89",
            Self::From60To74 => "60-74",
            Self::From40To59 => "40-59",
            Self::From20To39 => "20-39",
            Self::Under20 => "0-19",
        }
    }
}

impl FromStr for AgeGroup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|group| group.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let labels: Vec<_> = Self::ALL.iter().map(|g| g.label()).collect();
                Error::config(format!(
                    "unknown age group '{s}', expected one of {}",
                    labels.join(", ")
                ))
            })
    }
}

/// Conjunction of the optional predicates of the filtering interface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateSet {
    /// Inclusive death year range
    pub death_years: Option<YearRange>,
    /// Exact sex category; records with unmapped sex never match
    pub sex: Option<Sex>,
    /// Case-insensitive substring of the birth commune, or of the birth
    /// place code when the commune is unknown
    pub birth_place: Option<String>,
    pub given_name: Option<NameQuery>,
    /// Inclusive age range
    pub age: Option<(i32, i32)>,
}

impl PredicateSet {
    /// Predicate set matching everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_death_years(mut self, years: YearRange) -> Self {
        self.death_years = Some(years);
        self
    }

    #[must_use]
    pub const fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = Some(sex);
        self
    }

    #[must_use]
    pub fn with_birth_place(mut self, place: impl Into<String>) -> Self {
        self.birth_place = Some(place.into());
        self
    }

    #[must_use]
    pub fn with_given_name(mut self, query: NameQuery) -> Self {
        self.given_name = Some(query);
        self
    }

    #[must_use]
    pub const fn with_age(mut self, min: i32, max: i32) -> Self {
        self.age = Some((min, max));
        self
    }

    /// Restrict the age to one of the preset groups
    #[must_use]
    pub const fn with_age_group(self, group: AgeGroup, max_age: i32) -> Self {
        let (min, max) = group.bounds(max_age);
        self.with_age(min, max)
    }

    /// Whether no predicate is set
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self == &Self::default()
    }
}

impl RecordFilter for PredicateSet {
    fn matches(&self, record: &CanonicalRecord) -> bool {
        if let Some(years) = &self.death_years {
            if !years.contains(record.death_year) {
                return false;
            }
        }
        if let Some(sex) = self.sex {
            if record.sex != Some(sex) {
                return false;
            }
        }
        if let Some(place) = self.birth_place.as_deref().map(str::trim) {
            let target = record
                .birth_commune
                .as_deref()
                .unwrap_or(&record.birth_place_code);
            if !place.is_empty() && !contains_ignore_case(target, place) {
                return false;
            }
        }
        if let Some(query) = &self.given_name {
            if !query.is_empty() && !query.matches(record) {
                return false;
            }
        }
        if let Some((min, max)) = self.age {
            if !(min..=max).contains(&record.age_at_death) {
                return false;
            }
        }
        true
    }
}

/// Distinct non-empty given names containing `query`, case-insensitively, sorted
///
/// Used to offer completions; callers pass the unfiltered dataset view.
#[must_use]
pub fn matching_given_names(view: &DatasetView<'_>, query: &str) -> Vec<String> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    view.iter()
        .filter(|r| !r.given_name.is_empty() && contains_ignore_case(&r.given_name, query))
        .map(|r| r.given_name.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
