pub mod breaks;
pub mod config;
pub mod overrides;
pub mod session;
pub mod stats;

use focusledger_core::{EnginePolicy, FocusEngine, ImmediateSink, StateStore};

/// Load the persisted state and build an engine that writes back
/// through the store on every mutating operation.
pub fn load_engine() -> Result<FocusEngine, Box<dyn std::error::Error>> {
    let store = StateStore::open_default()?;
    let state = store.load();
    let policy = EnginePolicy::load()?;
    Ok(FocusEngine::restore(policy, state)
        .with_persistence(Box::new(ImmediateSink::new(store))))
}
