//! Session state machine and its nested break sub-state.
//!
//! The session machine is wall-clock based in the same way as a
//! caller-ticked timer: no internal threads, the host drives a 1 Hz
//! `tick()` on the engine while a session is active. Elapsed time is
//! always recomputed from the start instant, so a process restart
//! mid-session loses nothing but the in-memory break state -- earned
//! breaks are re-derived from elapsed focus time when the engine is
//! restored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::events::Event;
use crate::policy::BreakMilestone;

/// What started the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionTrigger {
    TokenTap,
    Manual,
}

impl SessionTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionTrigger::TokenTap => "token_tap",
            SessionTrigger::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "token_tap" => Some(SessionTrigger::TokenTap),
            "manual" => Some(SessionTrigger::Manual),
            _ => None,
        }
    }
}

/// A break option unlocked by a milestone, waiting to be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnedBreak {
    pub milestone_index: usize,
    pub duration_secs: u32,
}

/// Break sub-state. In-memory only: never persisted across restarts.
#[derive(Debug, Clone, Default)]
pub struct BreakState {
    earned: Vec<EarnedBreak>,
    /// Milestone indices that already fired this session.
    reached: HashSet<usize>,
    active: Option<ActiveBreak>,
    total_break_secs_taken: u32,
}

#[derive(Debug, Clone, Copy)]
struct ActiveBreak {
    started_at: DateTime<Utc>,
    duration_secs: u32,
}

/// The single active session. Exactly one logical instance exists at a
/// time; the engine holds `Option<ActiveSession>`.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    started_at: DateTime<Utc>,
    trigger: SessionTrigger,
    breaks: BreakState,
}

impl ActiveSession {
    pub fn new(started_at: DateTime<Utc>, trigger: SessionTrigger) -> Self {
        Self {
            started_at,
            trigger,
            breaks: BreakState::default(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn trigger(&self) -> SessionTrigger {
        self.trigger
    }

    /// Wall-clock seconds since the session started, clamped at zero
    /// against backward clock jumps.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> f64 {
        ((now - self.started_at).num_milliseconds() as f64 / 1000.0).max(0.0)
    }

    /// Focus-only seconds: elapsed minus break time taken so far.
    pub fn focus_secs(&self, now: DateTime<Utc>) -> f64 {
        (self.elapsed_secs(now) - self.breaks.total_break_secs_taken as f64).max(0.0)
    }

    pub fn total_break_secs_taken(&self) -> u32 {
        self.breaks.total_break_secs_taken
    }

    pub fn earned_breaks(&self) -> &[EarnedBreak] {
        &self.breaks.earned
    }

    pub fn is_on_break(&self) -> bool {
        self.breaks.active.is_some()
    }

    /// Countdown seconds left in the active break, zero when idle.
    pub fn break_secs_remaining(&self, now: DateTime<Utc>) -> u32 {
        match self.breaks.active {
            Some(b) => {
                let elapsed = ((now - b.started_at).num_seconds()).max(0) as u64;
                (b.duration_secs as u64).saturating_sub(elapsed) as u32
            }
            None => 0,
        }
    }

    /// Compare focus minutes so far against the milestone table and
    /// unlock any not-yet-reached milestones. Each milestone fires at
    /// most once per session; repeated calls with unchanged elapsed
    /// time earn nothing new. After a restart this re-derives every
    /// milestone already passed in one call.
    pub fn check_milestones(
        &mut self,
        now: DateTime<Utc>,
        milestones: &[BreakMilestone],
    ) -> Vec<Event> {
        if self.is_on_break() {
            return Vec::new();
        }
        let focus_minutes = self.focus_secs(now) / 60.0;
        let mut events = Vec::new();
        for (index, milestone) in milestones.iter().enumerate() {
            if self.breaks.reached.contains(&index) {
                continue;
            }
            if focus_minutes >= milestone.minutes_required as f64 {
                self.breaks.reached.insert(index);
                self.breaks.earned.push(EarnedBreak {
                    milestone_index: index,
                    duration_secs: milestone.break_seconds(),
                });
                events.push(Event::BreakEarned {
                    milestone_index: index,
                    break_minutes: milestone.break_minutes,
                    at: now,
                });
            }
        }
        events
    }

    /// Consume an earned break and start its countdown. Fails (returns
    /// `None`, state unchanged) if the index is out of range or a break
    /// is already running.
    pub fn start_break(&mut self, index: usize, now: DateTime<Utc>) -> Option<Event> {
        if self.is_on_break() || index >= self.breaks.earned.len() {
            return None;
        }
        let option = self.breaks.earned.remove(index);
        self.breaks.active = Some(ActiveBreak {
            started_at: now,
            duration_secs: option.duration_secs,
        });
        Some(Event::BreakStarted {
            duration_secs: option.duration_secs,
            at: now,
        })
    }

    /// End the active break, folding its elapsed time into the session
    /// total. No-op when not on break.
    pub fn end_break(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let active = self.breaks.active.take()?;
        let taken = (now - active.started_at).num_seconds().max(0) as u32;
        self.breaks.total_break_secs_taken += taken;
        Some(Event::BreakEnded {
            taken_secs: taken,
            at: now,
        })
    }

    /// Per-tick break bookkeeping: auto-end the break once its
    /// countdown is exhausted.
    pub fn tick_break(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.is_on_break() && self.break_secs_remaining(now) == 0 {
            return self.end_break(now);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::EnginePolicy;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 7, 9, 0, 0).unwrap()
    }

    fn milestones() -> Vec<BreakMilestone> {
        EnginePolicy::default().break_milestones
    }

    #[test]
    fn milestones_fire_once() {
        let mut session = ActiveSession::new(start(), SessionTrigger::TokenTap);
        let now = start() + Duration::minutes(26);
        let events = session.check_milestones(now, &milestones());
        assert_eq!(events.len(), 1);
        assert_eq!(session.earned_breaks().len(), 1);
        // Unchanged elapsed time: nothing new.
        let events = session.check_milestones(now, &milestones());
        assert!(events.is_empty());
        assert_eq!(session.earned_breaks().len(), 1);
    }

    #[test]
    fn restart_rederives_all_passed_milestones() {
        // Fresh session object 95 minutes in, as after a process kill.
        let mut session = ActiveSession::new(start(), SessionTrigger::Manual);
        let now = start() + Duration::minutes(95);
        let events = session.check_milestones(now, &milestones());
        assert_eq!(events.len(), 3);
        assert_eq!(session.earned_breaks().len(), 3);
    }

    #[test]
    fn break_lifecycle_folds_into_total() {
        let mut session = ActiveSession::new(start(), SessionTrigger::TokenTap);
        let now = start() + Duration::minutes(25);
        session.check_milestones(now, &milestones());

        assert!(session.start_break(0, now).is_some());
        assert!(session.is_on_break());
        assert_eq!(session.break_secs_remaining(now), 300);
        // Starting another break while on one fails.
        assert!(session.start_break(0, now).is_none());

        let later = now + Duration::minutes(3);
        let ended = session.end_break(later).unwrap();
        match ended {
            Event::BreakEnded { taken_secs, .. } => assert_eq!(taken_secs, 180),
            _ => panic!("expected BreakEnded"),
        }
        assert_eq!(session.total_break_secs_taken(), 180);
        assert!(!session.is_on_break());
    }

    #[test]
    fn break_auto_ends_when_countdown_exhausted() {
        let mut session = ActiveSession::new(start(), SessionTrigger::TokenTap);
        let now = start() + Duration::minutes(25);
        session.check_milestones(now, &milestones());
        session.start_break(0, now);

        assert!(session.tick_break(now + Duration::seconds(299)).is_none());
        let ended = session.tick_break(now + Duration::seconds(300));
        assert!(ended.is_some());
        assert_eq!(session.total_break_secs_taken(), 300);
    }

    #[test]
    fn milestones_do_not_fire_while_on_break() {
        let mut session = ActiveSession::new(start(), SessionTrigger::TokenTap);
        let now = start() + Duration::minutes(25);
        session.check_milestones(now, &milestones());
        session.start_break(0, now);
        let events = session.check_milestones(now + Duration::minutes(30), &milestones());
        assert!(events.is_empty());
    }

    #[test]
    fn focus_excludes_break_time() {
        let mut session = ActiveSession::new(start(), SessionTrigger::TokenTap);
        let now = start() + Duration::minutes(25);
        session.check_milestones(now, &milestones());
        session.start_break(0, now);
        session.end_break(now + Duration::minutes(5));

        let end = start() + Duration::minutes(40);
        assert_eq!(session.elapsed_secs(end), 2400.0);
        assert_eq!(session.focus_secs(end), 2100.0);
    }

    #[test]
    fn backward_clock_clamps_elapsed() {
        let session = ActiveSession::new(start(), SessionTrigger::Manual);
        let before = start() - Duration::minutes(10);
        assert_eq!(session.elapsed_secs(before), 0.0);
        assert_eq!(session.focus_secs(before), 0.0);
    }
}
