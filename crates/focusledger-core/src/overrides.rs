//! Override allowance and earn-back.
//!
//! An override is a consumable emergency allowance. Using one anchors
//! an earn-back cycle: after `earn_back_streak_days` consecutive
//! qualifying days since the anchor, one override regenerates (capped),
//! the progress counter resets and the anchor advances to today so the
//! next cycle starts fresh.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::history::DailyHistory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideState {
    pub remaining: u32,
    pub last_used_date: Option<NaiveDate>,
    pub earn_back_progress_days: u32,
}

impl OverrideState {
    pub fn new_full(max_overrides: u32) -> Self {
        Self {
            remaining: max_overrides,
            last_used_date: None,
            earn_back_progress_days: 0,
        }
    }

    /// Spend one override. Fails (state unchanged) at zero remaining.
    pub fn use_override(&mut self, today: NaiveDate) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.last_used_date = Some(today);
        self.earn_back_progress_days = 0;
        true
    }

    /// Recompute earn-back progress from history. Walks forward from
    /// the day after the anchor through today; a past day that misses
    /// the threshold resets the run, today's partial data never does.
    /// Returns true when a full run restored one override.
    pub fn recompute_earn_back(
        &mut self,
        history: &DailyHistory,
        today: NaiveDate,
        threshold_secs: u32,
        streak_days_needed: u32,
        max_overrides: u32,
    ) -> bool {
        if self.remaining >= max_overrides {
            return false;
        }
        let Some(anchor) = self.last_used_date else {
            return false;
        };

        let mut run: u32 = 0;
        let mut day = anchor + Duration::days(1);
        while day <= today {
            if history.day_qualifies(day, threshold_secs) {
                run += 1;
            } else if day < today {
                run = 0;
            }
            day += Duration::days(1);
        }
        self.earn_back_progress_days = run;

        if run >= streak_days_needed {
            self.remaining = (self.remaining + 1).min(max_overrides);
            self.earn_back_progress_days = 0;
            self.last_used_date = Some(today);
            return true;
        }
        false
    }
}
