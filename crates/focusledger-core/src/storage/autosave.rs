//! Snapshot sinks: where the engine hands its state after each
//! mutating operation.
//!
//! The debounced sink coalesces rapid successive snapshots into a
//! single write once the stream goes quiet -- a pending write is
//! replaced by a newer snapshot, never queued twice. The engine itself
//! never blocks on I/O.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::state::PersistedState;
use super::store::StateStore;

/// Writes are fire-and-forget from the engine's point of view.
pub trait SnapshotSink: Send {
    fn submit(&self, snapshot: PersistedState);
}

/// Synchronous sink for one-shot hosts (the CLI): every submit writes
/// immediately.
pub struct ImmediateSink {
    store: Mutex<StateStore>,
}

impl ImmediateSink {
    pub fn new(store: StateStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }
}

impl SnapshotSink for ImmediateSink {
    fn submit(&self, snapshot: PersistedState) {
        let mut store = match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = store.save(&snapshot) {
            log::error!("state save failed: {e}");
        }
    }
}

/// Debounced sink for long-running hosts. Owns the store on a tokio
/// task; a write lands roughly `delay` after the last submit.
pub struct DebouncedSink {
    tx: mpsc::UnboundedSender<PersistedState>,
    worker: JoinHandle<()>,
}

impl DebouncedSink {
    /// Default quiet period before a coalesced write.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

    /// Spawn the writer task on the current tokio runtime.
    pub fn spawn(store: StateStore, delay: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<PersistedState>();
        let worker = tokio::spawn(async move {
            let mut store = store;
            while let Some(mut latest) = rx.recv().await {
                // Keep replacing the pending snapshot until the stream
                // stays quiet for `delay`.
                loop {
                    match tokio::time::timeout(delay, rx.recv()).await {
                        Ok(Some(next)) => latest = next,
                        Ok(None) => break,
                        Err(_) => break,
                    }
                }
                if let Err(e) = store.save(&latest) {
                    log::error!("debounced state save failed: {e}");
                }
            }
        });
        Self { tx, worker }
    }

    /// Drop the channel and wait for the final write to land.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }
}

impl SnapshotSink for DebouncedSink {
    fn submit(&self, snapshot: PersistedState) {
        // Send fails only after shutdown; nothing left to save then.
        let _ = self.tx.send(snapshot);
    }
}
