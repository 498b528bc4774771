use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Startup configuration resolved to a grid shape.
    ConfigLoaded(crate::GridShape),
    /// Startup configuration could not be read.
    ConfigUnavailable,
    /// Engine completed and published a poll cycle.
    SnapshotPublished(Arc<crate::Snapshot>),
    /// Engine reports its scheduler is not running, e.g. it failed to start.
    PollingStopped,
    /// User asked to quit.
    QuitRequested,
}
