//! The canonical decedent record

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::config::YearRange;
use crate::models::types::{Sex, YearMonth};

/// Days per year used for age derivation
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Whole years between two dates, `floor(days / 365.25)`
///
/// Negative when `death` precedes `birth`. The 365.25 approximation may be
/// off by one on exact birthdays; this is accepted behaviour.
#[must_use]
pub fn age_in_years(birth: NaiveDate, death: NaiveDate) -> i32 {
    let days = death.signed_duration_since(birth).num_days();
    (days as f64 / DAYS_PER_YEAR).floor() as i32
}

/// One decedent surviving cleaning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalRecord {
    pub surname: String,
    pub given_name: String,
    pub birth_date: NaiveDate,
    pub death_date: NaiveDate,
    pub age_at_death: i32,
    pub sex: Option<Sex>,
    pub birth_place_code: String,
    pub death_place_code: Option<String>,
    pub birth_commune: Option<String>,
    pub death_year: i32,
    pub death_month: u32,
    pub birth_year: i32,
    pub birth_month: u32,
}

impl CanonicalRecord {
    /// Build a record, deriving age and calendar fields from the dates
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn derive(
        surname: String,
        given_name: String,
        birth_date: NaiveDate,
        death_date: NaiveDate,
        sex: Option<Sex>,
        birth_place_code: String,
        death_place_code: Option<String>,
        birth_commune: Option<String>,
    ) -> Self {
        Self {
            surname,
            given_name,
            birth_date,
            death_date,
            age_at_death: age_in_years(birth_date, death_date),
            sex,
            birth_place_code,
            death_place_code,
            birth_commune,
            death_year: death_date.year(),
            death_month: death_date.month(),
            birth_year: birth_date.year(),
            birth_month: birth_date.month(),
        }
    }

    /// Absolute month of death
    #[must_use]
    pub const fn death_period(&self) -> YearMonth {
        YearMonth::new(self.death_year, self.death_month)
    }

    /// Absolute month of birth
    #[must_use]
    pub const fn birth_period(&self) -> YearMonth {
        YearMonth::new(self.birth_year, self.birth_month)
    }

    /// First year of the birth decade
    #[must_use]
    pub const fn birth_decade(&self) -> i32 {
        self.birth_year.div_euclid(10) * 10
    }

    /// Whether every canonical invariant holds
    ///
    /// Age within `0..=max_age` and consistent with the dates, non-empty birth
    /// place, derived calendar fields consistent, death year retained.
    #[must_use]
    pub fn satisfies_invariants(&self, retention: &YearRange, max_age: i32) -> bool {
        (0..=max_age).contains(&self.age_at_death)
            && self.age_at_death == age_in_years(self.birth_date, self.death_date)
            && !self.birth_place_code.trim().is_empty()
            && self.death_year == self.death_date.year()
            && self.death_month == self.death_date.month()
            && self.birth_year == self.birth_date.year()
            && self.birth_month == self.birth_date.month()
            && retention.contains(self.death_year)
    }
}
