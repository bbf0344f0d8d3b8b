//! Personal records: longest session, best day, best week.
//!
//! Every field is monotonic -- updates only ever raise the stored
//! value. Records therefore survive history trimming and any later
//! recomputation over a smaller window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalRecords {
    pub longest_session_secs: f64,
    pub longest_session_date: Option<NaiveDate>,
    pub best_day_secs: f64,
    pub best_day_date: Option<NaiveDate>,
    pub best_week_secs: f64,
    pub best_week_start: Option<NaiveDate>,
}

impl PersonalRecords {
    /// Returns true if the session set a new longest-session record.
    pub fn observe_session(&mut self, focus_secs: f64, date: NaiveDate) -> bool {
        if focus_secs > self.longest_session_secs {
            self.longest_session_secs = focus_secs;
            self.longest_session_date = Some(date);
            return true;
        }
        false
    }

    /// Returns true if `total_secs` set a new best-day record.
    pub fn observe_day(&mut self, date: NaiveDate, total_secs: f64) -> bool {
        if total_secs > self.best_day_secs {
            self.best_day_secs = total_secs;
            self.best_day_date = Some(date);
            return true;
        }
        false
    }

    /// Returns true if `total_secs` set a new best-week record.
    pub fn observe_week(&mut self, week_start: NaiveDate, total_secs: f64) -> bool {
        if total_secs > self.best_week_secs {
            self.best_week_secs = total_secs;
            self.best_week_start = Some(week_start);
            return true;
        }
        false
    }
}
