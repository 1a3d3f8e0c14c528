//! Field-level coercions applied to each surviving raw row

use chrono::NaiveDate;

/// Separator between surname and given names in the combined name field
pub const NAME_SEPARATOR: char = '*';

/// Delimiter artifact trailing the given names
pub const GIVEN_NAME_TERMINATOR: char = '/';

/// Split `SURNAME*GIVEN NAMES/` into surname and given names
///
/// Only the first separator splits. A field without separator is kept whole
/// as the surname with an empty given name.
#[must_use]
pub fn split_name(field: &str) -> (String, String) {
    match field.split_once(NAME_SEPARATOR) {
        Some((surname, given)) => (
            surname.trim().to_string(),
            given
                .trim_end_matches(GIVEN_NAME_TERMINATOR)
                .trim()
                .to_string(),
        ),
        None => (
            field.trim_end_matches(GIVEN_NAME_TERMINATOR).trim().to_string(),
            String::new(),
        ),
    }
}

/// Parse a fixed-width `YYYYMMDD` date
///
/// Anything but exactly eight ASCII digits forming a real calendar date is
/// rejected, including the `00` day or month used for unknown components.
#[must_use]
pub fn parse_compact_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y%m%d").ok()
}

/// Format a date back to `YYYYMMDD`
#[must_use]
pub fn format_compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
