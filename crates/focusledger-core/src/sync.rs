//! Cloud sync sink.
//!
//! The engine pushes a snapshot of its persisted scalars after every
//! state-mutating operation. Pushes are fire-and-forget: the
//! accounting pipeline never waits on network completion, and a failed
//! push is the transport's problem to retry.

use tokio::sync::mpsc;

use crate::storage::PersistedState;

/// Receives state snapshots for remote replication.
pub trait CloudSync: Send {
    /// Must return quickly; implementations hand the snapshot off to
    /// their own worker.
    fn push(&self, snapshot: PersistedState);
}

/// Sync disabled.
pub struct NoopCloudSync;

impl CloudSync for NoopCloudSync {
    fn push(&self, _snapshot: PersistedState) {}
}

/// Channel-backed sink: snapshots are queued to a tokio worker that
/// invokes the transport closure one at a time.
pub struct QueuedCloudSync {
    tx: mpsc::UnboundedSender<PersistedState>,
}

impl QueuedCloudSync {
    /// Spawn the upload worker on the current tokio runtime.
    pub fn spawn<F>(mut upload: F) -> Self
    where
        F: FnMut(PersistedState) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<PersistedState>();
        tokio::spawn(async move {
            while let Some(snapshot) = rx.recv().await {
                upload(snapshot);
            }
        });
        Self { tx }
    }
}

impl CloudSync for QueuedCloudSync {
    fn push(&self, snapshot: PersistedState) {
        let _ = self.tx.send(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn queued_sync_delivers_snapshots_in_order() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen2 = seen.clone();
        let sync = QueuedCloudSync::spawn(move |_snapshot| {
            seen2.fetch_add(1, Ordering::SeqCst);
        });

        for _ in 0..3 {
            sync.push(PersistedState::default());
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
