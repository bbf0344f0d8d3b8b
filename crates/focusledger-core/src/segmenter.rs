//! Day-crossing session segmenter.
//!
//! A session that spans midnight must credit each calendar day it
//! touched. Break time is excluded by scaling every day slice with one
//! uniform ratio (`focus / wall_clock`) rather than tracking which day
//! each break fell on -- a documented approximation: a 10-minute break
//! taken entirely before midnight still shaves a proportional sliver
//! off the post-midnight slice.

use chrono::{DateTime, NaiveDate, Utc};

use crate::calendar;
use crate::history::DailyHistory;

/// One calendar day's share of a finished session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaySlice {
    pub date: NaiveDate,
    pub seconds: f64,
}

/// Split `focus_seconds` across the calendar days between `start` and
/// `end`, proportionally to wall-clock time spent in each day.
///
/// Conservation: the slice seconds sum to `focus_seconds` up to float
/// rounding. A zero-length (or clock-moved-backward) session yields a
/// single slice on the start day.
pub fn segment(start: DateTime<Utc>, end: DateTime<Utc>, focus_seconds: f64) -> Vec<DaySlice> {
    let focus_seconds = focus_seconds.max(0.0);
    let wall_clock_secs = (end - start).num_milliseconds() as f64 / 1000.0;
    if wall_clock_secs <= 0.0 {
        return vec![DaySlice {
            date: calendar::day_of(start),
            seconds: focus_seconds,
        }];
    }
    let ratio = focus_seconds / wall_clock_secs;

    let mut slices = Vec::new();
    let mut current = start;
    while current < end {
        let segment_end = calendar::next_midnight(current).min(end);
        let segment_secs = (segment_end - current).num_milliseconds() as f64 / 1000.0;
        slices.push(DaySlice {
            date: calendar::day_of(current),
            seconds: segment_secs * ratio,
        });
        current = segment_end;
    }
    slices
}

/// Count the slices whose day had no recorded seconds yet. Must be
/// called *before* [`apply`] mutates the history -- this feeds the
/// lifetime-days cumulative counter.
pub fn untouched_days(history: &DailyHistory, slices: &[DaySlice]) -> u32 {
    slices
        .iter()
        .filter(|s| s.seconds > 0.0 && history.seconds_on(s.date) <= 0.0)
        .count() as u32
}

/// Fold the slices into the history. The session count increments on
/// the first slice only, and only when the session was long enough to
/// count.
pub fn apply(history: &mut DailyHistory, slices: &[DaySlice], counts_as_session: bool) {
    for (i, slice) in slices.iter().enumerate() {
        history.add_seconds(slice.date, slice.seconds);
        if i == 0 && counts_as_session {
            history.add_session(slice.date);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn overnight_session_splits_at_midnight() {
        // 23:00 -> 03:00, no breaks: 1h on day one, 3h on day two.
        let start = at(2024, 3, 7, 23, 0, 0);
        let end = at(2024, 3, 8, 3, 0, 0);
        let slices = segment(start, end, 4.0 * 3600.0);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].date, calendar::parse_day_key("2024-03-07").unwrap());
        assert!((slices[0].seconds - 3600.0).abs() < 1e-6);
        assert!((slices[1].seconds - 3.0 * 3600.0).abs() < 1e-6);
    }

    #[test]
    fn break_ratio_scales_every_slice() {
        // Same session with a 10-minute break: ratio 230/240.
        let start = at(2024, 3, 7, 23, 0, 0);
        let end = at(2024, 3, 8, 3, 0, 0);
        let slices = segment(start, end, 230.0 * 60.0);
        assert_eq!(slices.len(), 2);
        assert!((slices[0].seconds - 57.5 * 60.0).abs() < 1e-6);
        assert!((slices[1].seconds - 172.5 * 60.0).abs() < 1e-6);
    }

    #[test]
    fn zero_length_session_lands_on_start_day() {
        let start = at(2024, 3, 7, 12, 0, 0);
        let slices = segment(start, start, 30.0);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].seconds, 30.0);
    }

    #[test]
    fn clock_moved_backward_clamps() {
        let start = at(2024, 3, 7, 12, 0, 0);
        let end = at(2024, 3, 7, 11, 0, 0);
        let slices = segment(start, end, -10.0);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].seconds, 0.0);
    }

    #[test]
    fn session_count_only_on_first_day() {
        let mut history = DailyHistory::new();
        let start = at(2024, 3, 7, 23, 0, 0);
        let end = at(2024, 3, 8, 3, 0, 0);
        let slices = segment(start, end, 4.0 * 3600.0);
        apply(&mut history, &slices, true);
        let d1 = calendar::parse_day_key("2024-03-07").unwrap();
        let d2 = calendar::parse_day_key("2024-03-08").unwrap();
        assert_eq!(history.get(d1).unwrap().sessions, 1);
        assert_eq!(history.get(d2).unwrap().sessions, 0);
    }

    #[test]
    fn short_session_logs_seconds_without_count() {
        let mut history = DailyHistory::new();
        let start = at(2024, 3, 7, 12, 0, 0);
        let end = at(2024, 3, 7, 12, 0, 30);
        let slices = segment(start, end, 30.0);
        apply(&mut history, &slices, false);
        let d = calendar::parse_day_key("2024-03-07").unwrap();
        assert_eq!(history.seconds_on(d), 30.0);
        assert_eq!(history.get(d).unwrap().sessions, 0);
    }

    #[test]
    fn untouched_days_counted_before_apply() {
        let mut history = DailyHistory::new();
        let d1 = calendar::parse_day_key("2024-03-07").unwrap();
        history.add_seconds(d1, 100.0);
        let start = at(2024, 3, 7, 23, 0, 0);
        let end = at(2024, 3, 8, 3, 0, 0);
        let slices = segment(start, end, 4.0 * 3600.0);
        // Day one already has seconds; only day two is new.
        assert_eq!(untouched_days(&history, &slices), 1);
    }

    proptest! {
        #[test]
        fn conservation(
            start_offset_secs in 0i64..(7 * 24 * 3600),
            duration_secs in 0i64..(72 * 3600),
            break_fraction in 0.0f64..1.0,
        ) {
            let base = at(2024, 3, 1, 0, 0, 0);
            let start = base + chrono::Duration::seconds(start_offset_secs);
            let end = start + chrono::Duration::seconds(duration_secs);
            let focus = duration_secs as f64 * (1.0 - break_fraction);
            let slices = segment(start, end, focus);
            let total: f64 = slices.iter().map(|s| s.seconds).sum();
            prop_assert!((total - focus).abs() < 1e-6);
            prop_assert!(slices.iter().all(|s| s.seconds >= 0.0));
        }
    }
}
