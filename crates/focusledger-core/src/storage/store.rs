//! SQLite-backed flat key-value state store.
//!
//! Every persisted engine field lives under its own key in a single
//! `kv` table, serialized as JSON text. Loading is infallible by
//! design: a missing or corrupt value falls back to its default (with
//! a warning) instead of failing the whole load.

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use super::state::PersistedState;
use crate::error::StorageError;
use crate::history::DailyHistory;
use crate::overrides::OverrideState;
use crate::session::SessionTrigger;

mod keys {
    pub const IS_IN_SESSION: &str = "is_in_session";
    pub const SESSION_START_INSTANT: &str = "session_start_instant";
    pub const SESSION_TRIGGER: &str = "session_trigger";
    pub const DAILY_HISTORY: &str = "daily_history";
    pub const CURRENT_FOCUS_DATE: &str = "current_focus_date";
    pub const TOTAL_BLOCKED_SECONDS_TODAY: &str = "total_blocked_seconds_today";
    pub const STREAK_CURRENT: &str = "streak.current";
    pub const STREAK_LONGEST: &str = "streak.longest";
    pub const STREAK_LAST_QUALIFYING_DATE: &str = "streak.last_qualifying_date";
    pub const RECORDS_LONGEST_SESSION_SECS: &str = "records.longest_session_secs";
    pub const RECORDS_LONGEST_SESSION_DATE: &str = "records.longest_session_date";
    pub const RECORDS_BEST_DAY_SECS: &str = "records.best_day_secs";
    pub const RECORDS_BEST_DAY_DATE: &str = "records.best_day_date";
    pub const RECORDS_BEST_WEEK_SECS: &str = "records.best_week_secs";
    pub const RECORDS_BEST_WEEK_START: &str = "records.best_week_start";
    pub const OVERRIDE_REMAINING: &str = "override.remaining";
    pub const OVERRIDE_LAST_USED_DATE: &str = "override.last_used_date";
    pub const OVERRIDE_EARN_BACK_PROGRESS_DAYS: &str = "override.earn_back_progress_days";
    pub const CUMULATIVE_SECONDS: &str = "cumulative.seconds";
    pub const CUMULATIVE_SESSIONS: &str = "cumulative.sessions";
    pub const CUMULATIVE_DAYS: &str = "cumulative.days";
    pub const CUMULATIVE_SEEDED: &str = "cumulative_seeded";
}

/// Flat key-value store for the engine's persisted scalars.
pub struct StateStore {
    conn: Connection,
}

impl StateStore {
    /// Open the store at `~/.config/focusledger/state.db`.
    ///
    /// # Errors
    /// Returns an error if the store cannot be opened or migrated.
    pub fn open_default() -> Result<Self, Box<dyn std::error::Error>> {
        let path = super::data_dir()?.join("state.db");
        Ok(Self::open(&path)?)
    }

    /// Open the store at an explicit path.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Raw get. Hosts may keep their own keys next to the engine's.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Raw upsert.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Typed get: `None` on missing *or* corrupt value. Corruption is
    /// logged and swallowed -- the caller substitutes a default.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.kv_get(key) {
            Ok(v) => v?,
            Err(e) => {
                log::warn!("state store read failed for '{key}': {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("discarding corrupt value for '{key}': {e}");
                None
            }
        }
    }

    fn put_json<T: Serialize>(
        tx: &rusqlite::Transaction<'_>,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let text = serde_json::to_string(value)
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        tx.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, text],
        )?;
        Ok(())
    }

    /// Load the full engine state. Never fails: each missing or corrupt
    /// field degrades to its default.
    pub fn load(&self) -> PersistedState {
        let mut state = PersistedState {
            is_in_session: self.get_json(keys::IS_IN_SESSION).unwrap_or(false),
            session_start_instant: self.get_json(keys::SESSION_START_INSTANT).unwrap_or(None),
            session_trigger: self
                .get_json::<Option<String>>(keys::SESSION_TRIGGER)
                .flatten()
                .and_then(|s| SessionTrigger::parse(&s)),
            daily_history: self
                .get_json(keys::DAILY_HISTORY)
                .unwrap_or_else(DailyHistory::new),
            current_focus_date: self.get_json(keys::CURRENT_FOCUS_DATE).unwrap_or(None),
            total_blocked_seconds_today: self
                .get_json(keys::TOTAL_BLOCKED_SECONDS_TODAY)
                .unwrap_or(0.0),
            ..PersistedState::default()
        };

        state.streak.current = self.get_json(keys::STREAK_CURRENT).unwrap_or(0);
        state.streak.longest = self.get_json(keys::STREAK_LONGEST).unwrap_or(0);
        state.streak.last_qualifying_date = self
            .get_json(keys::STREAK_LAST_QUALIFYING_DATE)
            .unwrap_or(None);

        state.records.longest_session_secs = self
            .get_json(keys::RECORDS_LONGEST_SESSION_SECS)
            .unwrap_or(0.0);
        state.records.longest_session_date = self
            .get_json(keys::RECORDS_LONGEST_SESSION_DATE)
            .unwrap_or(None);
        state.records.best_day_secs = self.get_json(keys::RECORDS_BEST_DAY_SECS).unwrap_or(0.0);
        state.records.best_day_date = self.get_json(keys::RECORDS_BEST_DAY_DATE).unwrap_or(None);
        state.records.best_week_secs = self.get_json(keys::RECORDS_BEST_WEEK_SECS).unwrap_or(0.0);
        state.records.best_week_start = self.get_json(keys::RECORDS_BEST_WEEK_START).unwrap_or(None);

        // A missing remaining-count means the namespace was never
        // written: a fresh install, not a zeroed allowance.
        state.overrides = self
            .get_json::<u32>(keys::OVERRIDE_REMAINING)
            .map(|remaining| OverrideState {
                remaining,
                last_used_date: self.get_json(keys::OVERRIDE_LAST_USED_DATE).unwrap_or(None),
                earn_back_progress_days: self
                    .get_json(keys::OVERRIDE_EARN_BACK_PROGRESS_DAYS)
                    .unwrap_or(0),
            });

        state.cumulative.lifetime_seconds = self.get_json(keys::CUMULATIVE_SECONDS).unwrap_or(0.0);
        state.cumulative.lifetime_sessions = self.get_json(keys::CUMULATIVE_SESSIONS).unwrap_or(0);
        state.cumulative.lifetime_days = self.get_json(keys::CUMULATIVE_DAYS).unwrap_or(0);
        state.cumulative_seeded = self.get_json(keys::CUMULATIVE_SEEDED).unwrap_or(false);

        state
    }

    /// Write the full engine state in one transaction.
    pub fn save(&mut self, state: &PersistedState) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        Self::put_json(&tx, keys::IS_IN_SESSION, &state.is_in_session)?;
        Self::put_json(&tx, keys::SESSION_START_INSTANT, &state.session_start_instant)?;
        Self::put_json(
            &tx,
            keys::SESSION_TRIGGER,
            &state.session_trigger.map(|t| t.as_str()),
        )?;
        Self::put_json(&tx, keys::DAILY_HISTORY, &state.daily_history)?;
        Self::put_json(&tx, keys::CURRENT_FOCUS_DATE, &state.current_focus_date)?;
        Self::put_json(
            &tx,
            keys::TOTAL_BLOCKED_SECONDS_TODAY,
            &state.total_blocked_seconds_today,
        )?;
        Self::put_json(&tx, keys::STREAK_CURRENT, &state.streak.current)?;
        Self::put_json(&tx, keys::STREAK_LONGEST, &state.streak.longest)?;
        Self::put_json(
            &tx,
            keys::STREAK_LAST_QUALIFYING_DATE,
            &state.streak.last_qualifying_date,
        )?;
        Self::put_json(
            &tx,
            keys::RECORDS_LONGEST_SESSION_SECS,
            &state.records.longest_session_secs,
        )?;
        Self::put_json(
            &tx,
            keys::RECORDS_LONGEST_SESSION_DATE,
            &state.records.longest_session_date,
        )?;
        Self::put_json(&tx, keys::RECORDS_BEST_DAY_SECS, &state.records.best_day_secs)?;
        Self::put_json(&tx, keys::RECORDS_BEST_DAY_DATE, &state.records.best_day_date)?;
        Self::put_json(&tx, keys::RECORDS_BEST_WEEK_SECS, &state.records.best_week_secs)?;
        Self::put_json(&tx, keys::RECORDS_BEST_WEEK_START, &state.records.best_week_start)?;
        if let Some(overrides) = &state.overrides {
            Self::put_json(&tx, keys::OVERRIDE_REMAINING, &overrides.remaining)?;
            Self::put_json(&tx, keys::OVERRIDE_LAST_USED_DATE, &overrides.last_used_date)?;
            Self::put_json(
                &tx,
                keys::OVERRIDE_EARN_BACK_PROGRESS_DAYS,
                &overrides.earn_back_progress_days,
            )?;
        }
        Self::put_json(&tx, keys::CUMULATIVE_SECONDS, &state.cumulative.lifetime_seconds)?;
        Self::put_json(
            &tx,
            keys::CUMULATIVE_SESSIONS,
            &state.cumulative.lifetime_sessions,
        )?;
        Self::put_json(&tx, keys::CUMULATIVE_DAYS, &state.cumulative.lifetime_days)?;
        Self::put_json(&tx, keys::CUMULATIVE_SEEDED, &state.cumulative_seeded)?;
        tx.commit()?;
        Ok(())
    }
}
