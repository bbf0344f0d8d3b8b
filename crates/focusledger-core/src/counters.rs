//! Lifetime cumulative counters.
//!
//! The daily history is bounded by retention; these counters are the
//! always-growing ledger behind "all time" stats. Retention trims must
//! never touch them. A one-time migration seeds them from whatever
//! history exists the first time this engine version runs, guarded by a
//! persisted flag so a legitimately-zero ledger is not re-seeded.

use serde::{Deserialize, Serialize};

use crate::history::DailyHistory;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CumulativeCounters {
    pub lifetime_seconds: f64,
    pub lifetime_sessions: u64,
    pub lifetime_days: u64,
}

impl CumulativeCounters {
    /// Fold one finished session into the ledger. `new_days` is the
    /// number of calendar days this session touched that had no prior
    /// recorded seconds (inspected before the segmenter ran).
    pub fn record_session(&mut self, focus_secs: f64, counted: bool, new_days: u32) {
        self.lifetime_seconds += focus_secs.max(0.0);
        if counted {
            self.lifetime_sessions += 1;
        }
        self.lifetime_days += new_days as u64;
    }

    /// Backfill from an existing history store (pre-counter data).
    pub fn seed_from_history(history: &DailyHistory) -> Self {
        Self {
            lifetime_seconds: history.total_seconds(),
            lifetime_sessions: history.total_sessions() as u64,
            lifetime_days: history.days_focused() as u64,
        }
    }
}
