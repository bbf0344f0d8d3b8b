//! Daily focus history store.
//!
//! One entry per calendar day, created lazily the first time a day
//! accrues seconds. Entries are never deleted individually -- only
//! bulk-trimmed by the retention policy. Persisted as a JSON list of
//! [`DailyFocusEntry`]; held in memory as a `BTreeMap` so lookups and
//! date-range scans are both cheap.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::calendar;

/// Persisted per-day record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyFocusEntry {
    pub date_key: String,
    pub total_seconds: f64,
    pub session_count: u32,
}

/// In-memory per-day totals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DayTotals {
    pub seconds: f64,
    pub sessions: u32,
}

/// Ordered-by-date collection of per-day focus totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<DailyFocusEntry>", into = "Vec<DailyFocusEntry>")]
pub struct DailyHistory {
    days: BTreeMap<NaiveDate, DayTotals>,
}

impl DailyHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<DayTotals> {
        self.days.get(&date).copied()
    }

    /// Seconds recorded for `date`, zero if the day has no entry.
    pub fn seconds_on(&self, date: NaiveDate) -> f64 {
        self.days.get(&date).map(|d| d.seconds).unwrap_or(0.0)
    }

    /// Add focus seconds to a day, creating the entry lazily.
    /// Negative additions are ignored; totals never go below zero.
    pub fn add_seconds(&mut self, date: NaiveDate, seconds: f64) {
        if seconds <= 0.0 || !seconds.is_finite() {
            return;
        }
        self.days.entry(date).or_default().seconds += seconds;
    }

    /// Increment the session count for a day, creating the entry lazily.
    pub fn add_session(&mut self, date: NaiveDate) {
        self.days.entry(date).or_default().sessions += 1;
    }

    /// Sum of seconds across an inclusive date range.
    pub fn seconds_in_range(&self, range: RangeInclusive<NaiveDate>) -> f64 {
        self.days.range(range).map(|(_, d)| d.seconds).sum()
    }

    /// Sum of session counts across an inclusive date range.
    pub fn sessions_in_range(&self, range: RangeInclusive<NaiveDate>) -> u32 {
        self.days.range(range).map(|(_, d)| d.sessions).sum()
    }

    /// Lifetime-of-store totals (only meaningful before trimming).
    pub fn total_seconds(&self) -> f64 {
        self.days.values().map(|d| d.seconds).sum()
    }

    pub fn total_sessions(&self) -> u32 {
        self.days.values().map(|d| d.sessions).sum()
    }

    /// Number of days with any recorded focus. Days trimmed to zero by
    /// clock anomalies are excluded.
    pub fn days_focused(&self) -> u32 {
        self.days.values().filter(|d| d.seconds > 0.0).count() as u32
    }

    /// Whether `date` meets a qualifying threshold in seconds.
    pub fn day_qualifies(&self, date: NaiveDate, threshold_secs: u32) -> bool {
        self.seconds_on(date) >= threshold_secs as f64
    }

    /// All dates meeting `threshold_secs`, ascending.
    pub fn qualifying_dates(&self, threshold_secs: u32) -> Vec<NaiveDate> {
        self.days
            .iter()
            .filter(|(_, d)| d.seconds >= threshold_secs as f64)
            .map(|(date, _)| *date)
            .collect()
    }

    /// Drop all entries strictly before `cutoff`. Returns the number
    /// removed. Never touches cumulative counters.
    pub fn trim_before(&mut self, cutoff: NaiveDate) -> usize {
        let keep = self.days.split_off(&cutoff);
        let removed = self.days.len();
        self.days = keep;
        removed
    }

    /// Iterate entries ascending by date.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, DayTotals)> + '_ {
        self.days.iter().map(|(date, totals)| (*date, *totals))
    }
}

impl From<Vec<DailyFocusEntry>> for DailyHistory {
    fn from(entries: Vec<DailyFocusEntry>) -> Self {
        let mut days = BTreeMap::new();
        for entry in entries {
            // Malformed keys and negative totals are dropped, not fatal.
            let Some(date) = calendar::parse_day_key(&entry.date_key) else {
                continue;
            };
            let totals: &mut DayTotals = days.entry(date).or_default();
            totals.seconds += entry.total_seconds.max(0.0);
            totals.sessions += entry.session_count;
        }
        Self { days }
    }
}

impl From<DailyHistory> for Vec<DailyFocusEntry> {
    fn from(history: DailyHistory) -> Self {
        history
            .days
            .into_iter()
            .map(|(date, totals)| DailyFocusEntry {
                date_key: calendar::key_of(date),
                total_seconds: totals.seconds,
                session_count: totals.sessions,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        calendar::parse_day_key(s).unwrap()
    }

    #[test]
    fn entries_created_lazily() {
        let mut history = DailyHistory::new();
        assert!(history.get(date("2024-03-07")).is_none());
        history.add_seconds(date("2024-03-07"), 120.0);
        assert_eq!(history.seconds_on(date("2024-03-07")), 120.0);
        assert_eq!(history.get(date("2024-03-07")).unwrap().sessions, 0);
    }

    #[test]
    fn negative_and_nan_additions_ignored() {
        let mut history = DailyHistory::new();
        history.add_seconds(date("2024-03-07"), -30.0);
        history.add_seconds(date("2024-03-07"), f64::NAN);
        assert!(history.is_empty());
    }

    #[test]
    fn trim_drops_only_older_entries() {
        let mut history = DailyHistory::new();
        history.add_seconds(date("2024-01-01"), 100.0);
        history.add_seconds(date("2024-02-01"), 200.0);
        history.add_seconds(date("2024-03-01"), 300.0);
        let removed = history.trim_before(date("2024-02-01"));
        assert_eq!(removed, 1);
        assert_eq!(history.len(), 2);
        assert_eq!(history.seconds_on(date("2024-02-01")), 200.0);
    }

    #[test]
    fn range_sums() {
        let mut history = DailyHistory::new();
        history.add_seconds(date("2024-03-04"), 100.0);
        history.add_seconds(date("2024-03-05"), 200.0);
        history.add_seconds(date("2024-03-11"), 400.0);
        let week = date("2024-03-04")..=date("2024-03-10");
        assert_eq!(history.seconds_in_range(week), 300.0);
    }

    #[test]
    fn serde_roundtrip_skips_malformed_keys() {
        let entries = vec![
            DailyFocusEntry {
                date_key: "2024-03-07".into(),
                total_seconds: 90.0,
                session_count: 1,
            },
            DailyFocusEntry {
                date_key: "garbage".into(),
                total_seconds: 50.0,
                session_count: 1,
            },
        ];
        let history: DailyHistory = entries.into();
        assert_eq!(history.len(), 1);
        let back: Vec<DailyFocusEntry> = history.into();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].date_key, "2024-03-07");
    }

    #[test]
    fn zero_second_days_excluded_from_days_focused() {
        let mut history = DailyHistory::new();
        history.add_session(date("2024-03-07"));
        assert_eq!(history.days_focused(), 0);
        history.add_seconds(date("2024-03-07"), 1.0);
        assert_eq!(history.days_focused(), 1);
    }
}
