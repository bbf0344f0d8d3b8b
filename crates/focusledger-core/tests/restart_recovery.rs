//! End-to-end recovery tests: engine state written through the store
//! must rebuild an equivalent engine after a process restart, including
//! mid-session kills and stale multi-day gaps.

use chrono::{DateTime, Duration, TimeZone, Utc};
use focusledger_core::{
    EnginePolicy, FocusEngine, ImmediateSink, SessionTrigger, StateStore,
};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

fn engine_on(path: &std::path::Path, now: DateTime<Utc>) -> FocusEngine {
    let store = StateStore::open(path).unwrap();
    let state = store.load();
    FocusEngine::restore_at(EnginePolicy::default(), state, now)
        .with_persistence(Box::new(ImmediateSink::new(store)))
}

#[test]
fn finished_sessions_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");

    let start = at(2024, 3, 7, 9, 0, 0);
    let mut engine = engine_on(&path, start);
    engine.start_session_at(SessionTrigger::TokenTap, start);
    engine.end_session_at(start + Duration::minutes(20));

    let revived = engine_on(&path, start + Duration::hours(1));
    assert!(!revived.is_in_session());
    assert_eq!(revived.counters().lifetime_seconds, 1200.0);
    assert_eq!(revived.counters().lifetime_sessions, 1);
    assert_eq!(revived.streak().current, 1);
    assert_eq!(revived.today_secs_at(start + Duration::hours(1)), 1200.0);
}

#[test]
fn mid_session_kill_resumes_without_rerunning_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");

    let start = at(2024, 3, 7, 9, 0, 0);
    let mut engine = engine_on(&path, start);
    engine.start_session_at(SessionTrigger::Manual, start);

    // Kill + restart 40 minutes in: the session resumes from its
    // original start instant and nothing was logged to history yet.
    let now = start + Duration::minutes(40);
    let mut revived = engine_on(&path, now);
    assert!(revived.is_in_session());
    assert_eq!(revived.session().unwrap().elapsed_secs(now), 2400.0);
    assert!(revived.history().is_empty());

    // Ending after the restart logs the full wall-clock focus time.
    let events = revived.end_session_at(start + Duration::minutes(45));
    assert!(!events.is_empty());
    assert_eq!(revived.counters().lifetime_seconds, 2700.0);
}

#[test]
fn earned_breaks_are_usable_in_the_next_invocation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");

    let start = at(2024, 3, 7, 9, 0, 0);
    let mut engine = engine_on(&path, start);
    engine.start_session_at(SessionTrigger::TokenTap, start);
    drop(engine);

    // A separate invocation 30 minutes later: the 25-minute milestone
    // has passed, so the break is listed and startable without a tick.
    let now = start + Duration::minutes(30);
    let mut revived = engine_on(&path, now);
    assert_eq!(revived.session().unwrap().earned_breaks().len(), 1);
    assert!(revived.start_break_at(0, now).is_some());
    assert!(revived.session().unwrap().is_on_break());
}

#[test]
fn override_state_and_records_round_trip_through_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");

    let start = at(2024, 3, 7, 9, 0, 0);
    let mut engine = engine_on(&path, start);
    engine.use_override_at(start);
    engine.start_session_at(SessionTrigger::TokenTap, start);
    engine.end_session_at(start + Duration::minutes(30));

    let revived = engine_on(&path, start + Duration::hours(2));
    assert_eq!(revived.overrides().remaining, 2);
    assert_eq!(
        revived.overrides().last_used_date,
        Some(start.date_naive())
    );
    assert_eq!(revived.records().longest_session_secs, 1800.0);
}

#[test]
fn stale_state_rolls_forward_on_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");

    // Build up three qualifying days, then go dark for two days.
    let mut engine = engine_on(&path, at(2024, 3, 4, 9, 0, 0));
    for day in 4..=6 {
        let start = at(2024, 3, day, 9, 0, 0);
        engine.start_session_at(SessionTrigger::TokenTap, start);
        engine.end_session_at(start + Duration::minutes(15));
    }
    assert_eq!(engine.streak().current, 3);
    drop(engine);

    let revived = engine_on(&path, at(2024, 3, 9, 9, 0, 0));
    // The gap broke the current streak but the longest is preserved.
    assert_eq!(revived.streak().current, 0);
    assert_eq!(revived.streak().longest, 3);
    assert_eq!(revived.counters().lifetime_sessions, 3);
}

#[test]
fn idle_day_rollover_reaches_the_store_without_a_command() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");

    let start = at(2024, 3, 7, 9, 0, 0);
    let mut engine = engine_on(&path, start);
    engine.start_session_at(SessionTrigger::TokenTap, start);
    engine.end_session_at(start + Duration::minutes(15));
    drop(engine);

    // Reviving two days later rolls the focus date forward; the roll
    // is written back even though no command runs.
    drop(engine_on(&path, at(2024, 3, 9, 8, 0, 0)));

    let store = StateStore::open(&path).unwrap();
    let state = store.load();
    assert_eq!(
        state.current_focus_date,
        Some(at(2024, 3, 9, 8, 0, 0).date_naive())
    );
}
