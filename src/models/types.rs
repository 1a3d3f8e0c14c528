//! Common domain type definitions

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Sex category derived from the registry's numeric code
///
/// Codes other than `1` and `2` have no category; records carry
/// `Option<Sex>` and `None` means unmapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sex {
    /// Code 1
    Male,
    /// Code 2
    Female,
}

impl Sex {
    /// Map a raw sex code, `None` for anything but `1` or `2`
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().parse::<u8>() {
            Ok(1) => Some(Self::Male),
            Ok(2) => Some(Self::Female),
            _ => None,
        }
    }

    /// The registry code of this category
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Male => "1",
            Self::Female => "2",
        }
    }

    /// Categorical label as stored in the snapshot
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    /// Parse a stored label, case-insensitively
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An absolute calendar month, displayed as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Month containing `date`
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
