//! Streak derivation.
//!
//! Streaks are never incremented in place -- they are recomputed in
//! full from the daily history, both after every session end and on
//! every engine construction. Any drift in the persisted scalars heals
//! itself on the next recompute. The one exception is the longest
//! streak, which is monotonic: a recompute can only raise it, so a
//! record set before history was trimmed survives the trim.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::history::DailyHistory;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current: u32,
    pub longest: u32,
    pub last_qualifying_date: Option<NaiveDate>,
}

/// Derive the streak state from history.
///
/// A day qualifies at `threshold_secs` accrued seconds. The current
/// streak anchors on today when today qualifies, or provisionally when
/// a session is running; otherwise it anchors on yesterday, giving the
/// user the remainder of the day to act before the streak breaks.
/// `prior_longest` keeps the longest streak monotonic.
pub fn recompute(
    history: &DailyHistory,
    today: NaiveDate,
    session_active: bool,
    threshold_secs: u32,
    prior_longest: u32,
) -> StreakState {
    let today_counts = history.day_qualifies(today, threshold_secs) || session_active;

    let mut current = 0;
    let mut cursor = today - Duration::days(1);
    if today_counts {
        current = 1;
    }
    while history.day_qualifies(cursor, threshold_secs) {
        current += 1;
        cursor -= Duration::days(1);
    }

    // Longest: scan all qualifying dates ascending, tracking runs of
    // exactly-consecutive days.
    let mut longest_run: u32 = 0;
    let mut run: u32 = 0;
    let mut prev: Option<NaiveDate> = None;
    let qualifying = history.qualifying_dates(threshold_secs);
    for date in &qualifying {
        run = match prev {
            Some(p) if *date == p + Duration::days(1) => run + 1,
            _ => 1,
        };
        longest_run = longest_run.max(run);
        prev = Some(*date);
    }

    StreakState {
        current,
        longest: prior_longest.max(longest_run).max(current),
        last_qualifying_date: qualifying.last().copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar;

    fn date(s: &str) -> NaiveDate {
        calendar::parse_day_key(s).unwrap()
    }

    fn history_with(days: &[(&str, f64)]) -> DailyHistory {
        let mut history = DailyHistory::new();
        for (key, secs) in days {
            history.add_seconds(date(key), *secs);
        }
        history
    }

    #[test]
    fn empty_history_has_no_streak() {
        let state = recompute(&DailyHistory::new(), date("2024-03-07"), false, 600, 0);
        assert_eq!(state.current, 0);
        assert_eq!(state.longest, 0);
        assert_eq!(state.last_qualifying_date, None);
    }

    #[test]
    fn run_ending_today_counts_from_today() {
        let history = history_with(&[
            ("2024-03-05", 700.0),
            ("2024-03-06", 700.0),
            ("2024-03-07", 700.0),
        ]);
        let state = recompute(&history, date("2024-03-07"), false, 600, 0);
        assert_eq!(state.current, 3);
        assert_eq!(state.longest, 3);
        assert_eq!(state.last_qualifying_date, Some(date("2024-03-07")));
    }

    #[test]
    fn today_not_yet_qualifying_falls_back_to_yesterday() {
        let history = history_with(&[("2024-03-05", 700.0), ("2024-03-06", 700.0)]);
        let state = recompute(&history, date("2024-03-07"), false, 600, 0);
        assert_eq!(state.current, 2);
    }

    #[test]
    fn active_session_makes_today_provisional() {
        let history = history_with(&[("2024-03-06", 700.0)]);
        let state = recompute(&history, date("2024-03-07"), true, 600, 0);
        assert_eq!(state.current, 2);
        // Without the active session, the provisional day disappears.
        let state = recompute(&history, date("2024-03-07"), false, 600, 0);
        assert_eq!(state.current, 1);
    }

    #[test]
    fn sub_threshold_day_breaks_the_run() {
        let history = history_with(&[
            ("2024-03-04", 700.0),
            ("2024-03-05", 100.0),
            ("2024-03-06", 700.0),
            ("2024-03-07", 700.0),
        ]);
        let state = recompute(&history, date("2024-03-07"), false, 600, 0);
        assert_eq!(state.current, 2);
        assert_eq!(state.longest, 2);
    }

    #[test]
    fn longest_finds_historical_run() {
        let history = history_with(&[
            ("2024-02-01", 700.0),
            ("2024-02-02", 700.0),
            ("2024-02-03", 700.0),
            ("2024-02-04", 700.0),
            ("2024-03-07", 700.0),
        ]);
        let state = recompute(&history, date("2024-03-07"), false, 600, 0);
        assert_eq!(state.current, 1);
        assert_eq!(state.longest, 4);
    }

    #[test]
    fn longest_is_monotonic_across_trims() {
        // History was trimmed; only a short recent run remains, but the
        // previously persisted longest is preserved.
        let history = history_with(&[("2024-03-06", 700.0), ("2024-03-07", 700.0)]);
        let state = recompute(&history, date("2024-03-07"), false, 600, 9);
        assert_eq!(state.current, 2);
        assert_eq!(state.longest, 9);
    }

    #[test]
    fn gap_of_more_than_one_day_resets_current() {
        let history = history_with(&[("2024-03-03", 700.0)]);
        let state = recompute(&history, date("2024-03-07"), false, 600, 0);
        assert_eq!(state.current, 0);
        assert_eq!(state.last_qualifying_date, Some(date("2024-03-03")));
    }
}
