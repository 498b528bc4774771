use std::sync::{mpsc, Arc};

use gridwatch_core::Snapshot;
use tokio::sync::watch;

use crate::EngineEvent;

/// Receives each completed snapshot from the scheduler.
///
/// Called while the scheduler holds its lifecycle lock, so implementations
/// must return promptly and must not cancel the scheduler themselves.
pub trait SnapshotSink: Send + Sync {
    fn publish(&self, snapshot: Arc<Snapshot>);
}

impl<F> SnapshotSink for F
where
    F: Fn(Arc<Snapshot>) + Send + Sync,
{
    fn publish(&self, snapshot: Arc<Snapshot>) {
        self(snapshot)
    }
}

/// Forwards snapshots as [`EngineEvent::SnapshotPublished`].
pub struct ChannelSnapshotSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelSnapshotSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl SnapshotSink for ChannelSnapshotSink {
    fn publish(&self, snapshot: Arc<Snapshot>) {
        let _ = self.tx.send(EngineEvent::SnapshotPublished(snapshot));
    }
}

/// The single "latest snapshot" cell shared with readers.
///
/// Publishing swaps the whole snapshot; readers never see a mix of cycles.
#[derive(Clone)]
pub struct LatestSnapshot {
    tx: Arc<watch::Sender<Option<Arc<Snapshot>>>>,
}

impl LatestSnapshot {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// `None` until the first cycle has been published.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.tx.subscribe()
    }
}

impl Default for LatestSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSink for LatestSnapshot {
    fn publish(&self, snapshot: Arc<Snapshot>) {
        self.tx.send_replace(Some(snapshot));
    }
}
