//! # Focusledger Core Library
//!
//! This library provides the focus accounting engine behind
//! Focusledger: it turns raw session start/stop events into durable
//! daily statistics and derives streaks, personal records and the
//! override earn-back allowance from that history. It implements a
//! CLI-first philosophy where all operations are available via a
//! standalone CLI binary, with any GUI being a thin layer over the
//! same core library.
//!
//! ## Architecture
//!
//! - **Focus Engine**: a wall-clock-based state machine that requires
//!   the caller to periodically invoke `tick()` while a session runs
//! - **Storage**: a flat SQLite key-value store for the persisted
//!   scalars, with a debounced autosave sink for long-running hosts
//! - **Derived stats**: streaks, personal records and cumulative
//!   counters are recomputed from the bounded daily history, so the
//!   engine recovers correct results after arbitrary interruption
//!
//! ## Key Components
//!
//! - [`FocusEngine`]: the session lifecycle and accounting pipeline
//! - [`DailyHistory`]: bounded per-day focus totals
//! - [`StateStore`]: persisted scalar storage
//! - [`EnginePolicy`]: thresholds and milestone configuration

pub mod calendar;
pub mod counters;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod overrides;
pub mod policy;
pub mod records;
pub mod segmenter;
pub mod session;
pub mod storage;
pub mod streak;
pub mod sync;

pub use counters::CumulativeCounters;
pub use engine::FocusEngine;
pub use error::{ConfigError, CoreError, StorageError};
pub use events::Event;
pub use history::{DailyFocusEntry, DailyHistory};
pub use overrides::OverrideState;
pub use policy::{BreakMilestone, EnginePolicy};
pub use records::PersonalRecords;
pub use session::{ActiveSession, EarnedBreak, SessionTrigger};
pub use storage::{DebouncedSink, ImmediateSink, PersistedState, SnapshotSink, StateStore};
pub use streak::StreakState;
pub use sync::{CloudSync, NoopCloudSync, QueuedCloudSync};
