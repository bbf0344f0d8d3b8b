pub mod autosave;
pub mod state;
pub mod store;

pub use autosave::{DebouncedSink, ImmediateSink, SnapshotSink};
pub use state::PersistedState;
pub use store::StateStore;

use std::path::PathBuf;

/// Returns `~/.config/focusledger[-dev]/` based on FOCUSLEDGER_ENV.
///
/// Set FOCUSLEDGER_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSLEDGER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focusledger-dev")
    } else {
        base_dir.join("focusledger")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
