use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionTrigger;

/// Every state change in the engine produces an Event.
/// Hosts poll for events; notification layers subscribe to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        trigger: SessionTrigger,
        at: DateTime<Utc>,
    },
    /// Session was shorter than the logging floor and left no trace.
    SessionDiscarded {
        focus_secs: f64,
        at: DateTime<Utc>,
    },
    SessionEnded {
        focus_secs: f64,
        wall_clock_secs: f64,
        /// Whether the session was long enough to increment session counts.
        counted: bool,
        days_touched: usize,
        at: DateTime<Utc>,
    },
    /// A focus milestone unlocked a break option.
    BreakEarned {
        milestone_index: usize,
        break_minutes: u32,
        at: DateTime<Utc>,
    },
    BreakStarted {
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    BreakEnded {
        taken_secs: u32,
        at: DateTime<Utc>,
    },
    OverrideUsed {
        remaining: u32,
        at: DateTime<Utc>,
    },
    /// Earn-back completed a full qualifying run and restored one override.
    OverrideEarned {
        remaining: u32,
        at: DateTime<Utc>,
    },
    /// Retention dropped history entries older than the cutoff.
    HistoryTrimmed {
        removed: usize,
        at: DateTime<Utc>,
    },
    /// Full engine state snapshot for display layers.
    StateSnapshot {
        in_session: bool,
        elapsed_secs: f64,
        on_break: bool,
        break_secs_remaining: u32,
        earned_breaks: usize,
        today_secs: f64,
        current_streak: u32,
        overrides_remaining: u32,
        at: DateTime<Utc>,
    },
}
