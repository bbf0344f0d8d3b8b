//! Engine policy constants.
//!
//! All thresholds that gate logging, streaks and earn-back live here,
//! loaded from `~/.config/focusledger/config.toml` with per-field
//! defaults so a partial or missing file always yields a usable policy.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// A focus-duration milestone that unlocks one break option, once per
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakMilestone {
    /// Focus minutes required to unlock this milestone.
    pub minutes_required: u32,
    /// Break minutes awarded when it fires.
    pub break_minutes: u32,
}

impl BreakMilestone {
    pub fn break_seconds(&self) -> u32 {
        self.break_minutes.saturating_mul(60)
    }
}

/// Engine policy.
///
/// Serialized to/from TOML at `~/.config/focusledger/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnginePolicy {
    /// Sessions shorter than this are discarded entirely (accidental taps).
    #[serde(default = "default_minimum_session_to_log_secs")]
    pub minimum_session_to_log_secs: u32,
    /// Sessions shorter than this still log seconds but do not count
    /// toward `session_count`.
    #[serde(default = "default_minimum_session_for_history_secs")]
    pub minimum_session_for_history_secs: u32,
    /// A day qualifies for the streak once it accrues this many seconds.
    #[serde(default = "default_minimum_session_for_streak_secs")]
    pub minimum_session_for_streak_secs: u32,
    /// A day qualifies for override earn-back at this many seconds.
    #[serde(default = "default_minimum_session_for_earn_back_secs")]
    pub minimum_session_for_earn_back_secs: u32,
    /// Consecutive qualifying days required to earn one override back.
    #[serde(default = "default_earn_back_streak_days")]
    pub earn_back_streak_days: u32,
    /// Upper bound on the override allowance.
    #[serde(default = "default_max_overrides")]
    pub max_overrides: u32,
    /// Daily history entries older than this many days are trimmed.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Ordered break milestones checked against focus minutes so far.
    #[serde(default = "default_break_milestones")]
    pub break_milestones: Vec<BreakMilestone>,
}

// Default functions
fn default_minimum_session_to_log_secs() -> u32 {
    5
}
fn default_minimum_session_for_history_secs() -> u32 {
    60
}
fn default_minimum_session_for_streak_secs() -> u32 {
    600
}
fn default_minimum_session_for_earn_back_secs() -> u32 {
    600
}
fn default_earn_back_streak_days() -> u32 {
    7
}
fn default_max_overrides() -> u32 {
    3
}
fn default_retention_days() -> u32 {
    90
}
fn default_break_milestones() -> Vec<BreakMilestone> {
    vec![
        BreakMilestone {
            minutes_required: 25,
            break_minutes: 5,
        },
        BreakMilestone {
            minutes_required: 45,
            break_minutes: 5,
        },
        BreakMilestone {
            minutes_required: 90,
            break_minutes: 10,
        },
    ]
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            minimum_session_to_log_secs: default_minimum_session_to_log_secs(),
            minimum_session_for_history_secs: default_minimum_session_for_history_secs(),
            minimum_session_for_streak_secs: default_minimum_session_for_streak_secs(),
            minimum_session_for_earn_back_secs: default_minimum_session_for_earn_back_secs(),
            earn_back_streak_days: default_earn_back_streak_days(),
            max_overrides: default_max_overrides(),
            retention_days: default_retention_days(),
            break_milestones: default_break_milestones(),
        }
    }
}

impl EnginePolicy {
    /// Path of the policy file inside the data directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = crate::storage::data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/focusledger"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load the policy, falling back to defaults if the file is missing.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Save the policy to its TOML file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path().map_err(|e| ConfigError::SaveFailed {
            path: PathBuf::from("~/.config/focusledger"),
            message: e.to_string(),
        })?;
        let text = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, text).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }
}
