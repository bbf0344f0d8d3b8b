//! Calendar-day key utilities.
//!
//! All time-series structures in the engine are joined on a day key:
//! a `%Y-%m-%d` string derived from an instant. Splitting is
//! time-zone-naive -- the engine works entirely in UTC calendar days.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// Format used for all day keys.
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Convert an instant to its calendar-day key string.
pub fn day_key(at: DateTime<Utc>) -> String {
    at.date_naive().format(DAY_KEY_FORMAT).to_string()
}

/// Convert an instant to its calendar day.
pub fn day_of(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

/// Parse a day key string back into a date. Returns `None` for
/// malformed keys rather than erroring -- corrupt persisted keys are
/// skipped, not fatal.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DAY_KEY_FORMAT).ok()
}

/// Render a date as a day key string.
pub fn key_of(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

/// Monday-first start of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let days_from_monday = date.weekday().num_days_from_monday() as i64;
    date - Duration::days(days_from_monday)
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// The midnight (00:00:00 UTC) that starts the day after `at`.
pub fn next_midnight(at: DateTime<Utc>) -> DateTime<Utc> {
    let next_day = at.date_naive() + Duration::days(1);
    Utc.from_utc_datetime(&next_day.and_hms_opt(0, 0, 0).unwrap_or_default())
}
