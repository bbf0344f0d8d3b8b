//! The focus accounting engine.
//!
//! One owned instance orchestrates the whole pipeline: the session
//! state machine feeds the day-crossing segmenter, which feeds the
//! daily history, from which streaks, records, cumulative counters and
//! override earn-back are derived, in that order, after every session
//! end. Every mutating operation ends by handing a state snapshot to
//! the persistence sink and the cloud-sync sink.
//!
//! The engine is single-threaded and caller-ticked: the host drives a
//! 1 Hz `tick()` while a session is active and calls the public
//! operations synchronously. Invalid transitions (ending an idle
//! session, starting a break without one earned) return `None` and
//! leave state untouched.
//!
//! Every time-dependent operation has an `_at` variant taking an
//! explicit instant; the plain methods delegate with `Utc::now()`.
//!
//! The engine does not depend on the device-level restriction sink.
//! Callers that enforce blocking are expected to activate restrictions
//! before (or together with) `start_session` and to end the session
//! before deactivating them, so accrued time never exceeds blocked
//! time.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::calendar;
use crate::counters::CumulativeCounters;
use crate::events::Event;
use crate::history::DailyHistory;
use crate::overrides::OverrideState;
use crate::policy::EnginePolicy;
use crate::records::PersonalRecords;
use crate::segmenter;
use crate::session::{ActiveSession, SessionTrigger};
use crate::storage::{PersistedState, SnapshotSink};
use crate::streak::{self, StreakState};
use crate::sync::CloudSync;

pub struct FocusEngine {
    policy: EnginePolicy,
    history: DailyHistory,
    session: Option<ActiveSession>,
    streak: StreakState,
    records: PersonalRecords,
    overrides: OverrideState,
    counters: CumulativeCounters,
    /// Day key of the currently-accruing bucket; a mismatch with "now"
    /// signals a day rollover on the idle path.
    current_focus_date: NaiveDate,
    total_blocked_secs_today: f64,
    /// Set when restoration or a day rollover changed state the store
    /// has not seen yet; cleared by the next snapshot hand-off.
    dirty: bool,
    persistence: Option<Box<dyn SnapshotSink>>,
    cloud_sync: Option<Box<dyn CloudSync>>,
}

impl FocusEngine {
    /// Fresh engine with no prior state.
    pub fn new(policy: EnginePolicy) -> Self {
        Self::restore(policy, PersistedState::default())
    }

    /// Rebuild the engine from persisted state.
    pub fn restore(policy: EnginePolicy, state: PersistedState) -> Self {
        Self::restore_at(policy, state, Utc::now())
    }

    /// Rebuild from persisted state at an explicit instant.
    ///
    /// Restoration self-heals: an active-session flag without a start
    /// instant is cleared, the override allowance is clamped into
    /// policy bounds, the streak is recomputed in full, and the
    /// cumulative ledger is seeded from history exactly once.
    pub fn restore_at(policy: EnginePolicy, state: PersistedState, now: DateTime<Utc>) -> Self {
        let today = calendar::day_of(now);
        let mut healed = false;

        let mut session = if state.is_in_session {
            match state.session_start_instant {
                Some(started_at) => Some(ActiveSession::new(
                    started_at,
                    state.session_trigger.unwrap_or(SessionTrigger::Manual),
                )),
                None => {
                    log::warn!("restored active-session flag with no start instant; clearing");
                    healed = true;
                    None
                }
            }
        } else {
            None
        };

        // Break state is never persisted; a restored session re-earns
        // every milestone it has already passed, without waiting for a
        // tick, so break commands work right after a reload.
        if let Some(session) = session.as_mut() {
            session.check_milestones(now, &policy.break_milestones);
        }

        let history = state.daily_history;
        let counters = if state.cumulative_seeded {
            state.cumulative
        } else {
            CumulativeCounters::seed_from_history(&history)
        };

        let mut overrides = state
            .overrides
            .unwrap_or_else(|| OverrideState::new_full(policy.max_overrides));
        overrides.remaining = overrides.remaining.min(policy.max_overrides);

        let mut engine = Self {
            streak: streak::recompute(
                &history,
                today,
                session.is_some(),
                policy.minimum_session_for_streak_secs,
                state.streak.longest,
            ),
            history,
            session,
            records: state.records,
            overrides,
            counters,
            current_focus_date: state.current_focus_date.unwrap_or(today),
            total_blocked_secs_today: state.total_blocked_seconds_today,
            policy,
            dirty: healed,
            persistence: None,
            cloud_sync: None,
        };
        engine.roll_day_if_needed(now);
        engine
    }

    pub fn with_persistence(mut self, sink: Box<dyn SnapshotSink>) -> Self {
        self.persistence = Some(sink);
        // Flush anything restoration changed relative to the store.
        if self.dirty {
            self.persist();
        }
        self
    }

    pub fn with_cloud_sync(mut self, sync: Box<dyn CloudSync>) -> Self {
        self.cloud_sync = Some(sync);
        if self.dirty {
            self.persist();
        }
        self
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start_session(&mut self, trigger: SessionTrigger) -> Option<Event> {
        self.start_session_at(trigger, Utc::now())
    }

    /// Begin a session. No-op if one is already active.
    pub fn start_session_at(
        &mut self,
        trigger: SessionTrigger,
        now: DateTime<Utc>,
    ) -> Option<Event> {
        self.roll_day_if_needed(now);
        if self.session.is_some() {
            return None;
        }
        self.session = Some(ActiveSession::new(now, trigger));
        // Today now counts provisionally toward the streak.
        self.recompute_streak(calendar::day_of(now));
        self.persist();
        Some(Event::SessionStarted { trigger, at: now })
    }

    pub fn end_session(&mut self) -> Vec<Event> {
        self.end_session_at(Utc::now())
    }

    /// End the active session and run the accounting pipeline.
    /// Returns every event produced; empty when idle.
    pub fn end_session_at(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = self.roll_day_if_needed(now);
        let Some(mut session) = self.session.take() else {
            if !events.is_empty() {
                self.persist();
            }
            return events;
        };

        // A break still running is folded into the total first.
        if let Some(ended) = session.end_break(now) {
            events.push(ended);
        }

        let wall_clock_secs = session.elapsed_secs(now);
        let focus_secs = session.focus_secs(now);
        let today = calendar::day_of(now);

        if focus_secs < self.policy.minimum_session_to_log_secs as f64 {
            // Accidental tap: no history, no streak, no records.
            self.recompute_streak(today);
            self.persist();
            events.push(Event::SessionDiscarded {
                focus_secs,
                at: now,
            });
            return events;
        }

        let counted = focus_secs >= self.policy.minimum_session_for_history_secs as f64;
        let end = now.max(session.started_at());
        let slices = segmenter::segment(session.started_at(), end, focus_secs);

        // Lifetime-days needs the pre-mutation view of the history.
        let new_days = segmenter::untouched_days(&self.history, &slices);
        segmenter::apply(&mut self.history, &slices, counted);
        self.total_blocked_secs_today = self.history.seconds_on(today);

        self.recompute_streak(today);

        self.records.observe_session(focus_secs, calendar::day_of(end));
        let mut weeks = BTreeSet::new();
        for slice in &slices {
            let day_total = self.history.seconds_on(slice.date);
            self.records.observe_day(slice.date, day_total);
            weeks.insert(calendar::week_start(slice.date));
        }
        for week_start in weeks {
            let week_end = week_start + Duration::days(6);
            let week_total = self.history.seconds_in_range(week_start..=week_end);
            self.records.observe_week(week_start, week_total);
        }

        self.counters.record_session(focus_secs, counted, new_days);

        let earned = self.overrides.recompute_earn_back(
            &self.history,
            today,
            self.policy.minimum_session_for_earn_back_secs,
            self.policy.earn_back_streak_days,
            self.policy.max_overrides,
        );

        self.current_focus_date = today;
        self.persist();

        events.push(Event::SessionEnded {
            focus_secs,
            wall_clock_secs,
            counted,
            days_touched: slices.len(),
            at: now,
        });
        if earned {
            events.push(Event::OverrideEarned {
                remaining: self.overrides.remaining,
                at: now,
            });
        }
        events
    }

    pub fn tick(&mut self) -> Vec<Event> {
        self.tick_at(Utc::now())
    }

    /// 1 Hz heartbeat while a session is active. Drives the break
    /// countdown, milestone earning and idle-path day rollover.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = self.roll_day_if_needed(now);
        if let Some(session) = self.session.as_mut() {
            if let Some(ended) = session.tick_break(now) {
                events.push(ended);
            }
            events.extend(session.check_milestones(now, &self.policy.break_milestones));
        }
        if !events.is_empty() || self.dirty {
            self.persist();
        }
        events
    }

    pub fn start_break(&mut self, index: usize) -> Option<Event> {
        self.start_break_at(index, Utc::now())
    }

    /// Consume earned break `index`. Fails when idle, already on
    /// break, or the index is out of range.
    pub fn start_break_at(&mut self, index: usize, now: DateTime<Utc>) -> Option<Event> {
        let event = self.session.as_mut()?.start_break(index, now)?;
        self.persist();
        Some(event)
    }

    pub fn end_break(&mut self) -> Option<Event> {
        self.end_break_at(Utc::now())
    }

    /// End the running break early. No-op when not on break.
    pub fn end_break_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let event = self.session.as_mut()?.end_break(now)?;
        self.persist();
        Some(event)
    }

    pub fn use_override(&mut self) -> Option<Event> {
        self.use_override_at(Utc::now())
    }

    /// Spend one override. Fails (state unchanged) at zero remaining.
    pub fn use_override_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.roll_day_if_needed(now);
        if !self.overrides.use_override(calendar::day_of(now)) {
            return None;
        }
        self.persist();
        Some(Event::OverrideUsed {
            remaining: self.overrides.remaining,
            at: now,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_in_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        self.session.as_ref()
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    pub fn history(&self) -> &DailyHistory {
        &self.history
    }

    pub fn streak(&self) -> &StreakState {
        &self.streak
    }

    pub fn records(&self) -> &PersonalRecords {
        &self.records
    }

    pub fn overrides(&self) -> &OverrideState {
        &self.overrides
    }

    pub fn counters(&self) -> &CumulativeCounters {
        &self.counters
    }

    /// Seconds accrued today, including the live session's share that
    /// falls on today. A live session spanning midnight contributes
    /// only its post-midnight portion here.
    pub fn today_secs_at(&self, now: DateTime<Utc>) -> f64 {
        let today = calendar::day_of(now);
        self.history.seconds_on(today) + self.live_focus_secs_in(today..=today, now)
    }

    /// Seconds accrued this Monday-first week, including live time.
    pub fn week_secs_at(&self, now: DateTime<Utc>) -> f64 {
        let today = calendar::day_of(now);
        let start = calendar::week_start(today);
        self.history.seconds_in_range(start..=today) + self.live_focus_secs_in(start..=today, now)
    }

    /// Seconds accrued this calendar month, including live time.
    pub fn month_secs_at(&self, now: DateTime<Utc>) -> f64 {
        let today = calendar::day_of(now);
        let start = calendar::month_start(today);
        self.history.seconds_in_range(start..=today) + self.live_focus_secs_in(start..=today, now)
    }

    pub fn today_session_count_at(&self, now: DateTime<Utc>) -> u32 {
        self.history
            .get(calendar::day_of(now))
            .map(|d| d.sessions)
            .unwrap_or(0)
    }

    /// Full display snapshot.
    pub fn state_snapshot_at(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            in_session: self.session.is_some(),
            elapsed_secs: self
                .session
                .as_ref()
                .map(|s| s.elapsed_secs(now))
                .unwrap_or(0.0),
            on_break: self.session.as_ref().is_some_and(|s| s.is_on_break()),
            break_secs_remaining: self
                .session
                .as_ref()
                .map(|s| s.break_secs_remaining(now))
                .unwrap_or(0),
            earned_breaks: self
                .session
                .as_ref()
                .map(|s| s.earned_breaks().len())
                .unwrap_or(0),
            today_secs: self.today_secs_at(now),
            current_streak: self.streak.current,
            overrides_remaining: self.overrides.remaining,
            at: now,
        }
    }

    /// The full persisted-scalar snapshot handed to the sinks.
    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            is_in_session: self.session.is_some(),
            session_start_instant: self.session.as_ref().map(|s| s.started_at()),
            session_trigger: self.session.as_ref().map(|s| s.trigger()),
            daily_history: self.history.clone(),
            current_focus_date: Some(self.current_focus_date),
            total_blocked_seconds_today: self.total_blocked_secs_today,
            streak: self.streak.clone(),
            records: self.records.clone(),
            overrides: Some(self.overrides.clone()),
            cumulative: self.counters,
            cumulative_seeded: true,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// The live session's unlogged focus seconds falling inside the
    /// given day range, split across midnight the same way the
    /// end-of-session pipeline will split them.
    fn live_focus_secs_in(&self, range: RangeInclusive<NaiveDate>, now: DateTime<Utc>) -> f64 {
        let Some(session) = &self.session else {
            return 0.0;
        };
        let end = now.max(session.started_at());
        segmenter::segment(session.started_at(), end, session.focus_secs(now))
            .iter()
            .filter(|slice| range.contains(&slice.date))
            .map(|slice| slice.seconds)
            .sum()
    }

    fn recompute_streak(&mut self, today: NaiveDate) {
        self.streak = streak::recompute(
            &self.history,
            today,
            self.session.is_some(),
            self.policy.minimum_session_for_streak_secs,
            self.streak.longest,
        );
    }

    /// Day-boundary housekeeping: retention trim, today-bucket reset
    /// and a streak recompute. Runs at most once per boundary crossing.
    fn roll_day_if_needed(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let today = calendar::day_of(now);
        if today == self.current_focus_date {
            return Vec::new();
        }
        let mut events = Vec::new();
        let cutoff = today - Duration::days(self.policy.retention_days as i64);
        let removed = self.history.trim_before(cutoff);
        if removed > 0 {
            events.push(Event::HistoryTrimmed { removed, at: now });
        }
        self.current_focus_date = today;
        self.total_blocked_secs_today = self.history.seconds_on(today);
        self.recompute_streak(today);
        self.dirty = true;
        events
    }

    /// Hand a snapshot to the persistence and cloud-sync sinks.
    /// Both are fire-and-forget; the pipeline never blocks on them.
    fn persist(&mut self) {
        if self.persistence.is_none() && self.cloud_sync.is_none() {
            return;
        }
        let snapshot = self.snapshot();
        if let Some(sink) = &self.persistence {
            sink.submit(snapshot.clone());
        }
        if let Some(sync) = &self.cloud_sync {
            sync.push(snapshot);
        }
        self.dirty = false;
    }
}
