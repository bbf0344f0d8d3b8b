//! The full set of persisted engine scalars, as one snapshot value.
//!
//! The engine hands a `PersistedState` to the persistence sink and the
//! cloud-sync sink after every mutating operation; the store fans it
//! out into one key-value namespace per field.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::counters::CumulativeCounters;
use crate::history::DailyHistory;
use crate::overrides::OverrideState;
use crate::records::PersonalRecords;
use crate::session::SessionTrigger;
use crate::streak::StreakState;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub is_in_session: bool,
    pub session_start_instant: Option<DateTime<Utc>>,
    pub session_trigger: Option<SessionTrigger>,
    pub daily_history: DailyHistory,
    /// Day key of the currently-accruing bucket; used to detect a day
    /// rollover on the idle path.
    pub current_focus_date: Option<NaiveDate>,
    pub total_blocked_seconds_today: f64,
    pub streak: StreakState,
    pub records: PersonalRecords,
    /// `None` means the override namespace has never been written --
    /// a fresh install starts with a full allowance.
    pub overrides: Option<OverrideState>,
    pub cumulative: CumulativeCounters,
    /// One-time migration guard: set after `cumulative` has been
    /// seeded from pre-existing history, and never cleared, so a
    /// legitimately-zero ledger is not re-seeded.
    pub cumulative_seeded: bool,
}
