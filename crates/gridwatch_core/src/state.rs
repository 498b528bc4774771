use std::sync::Arc;

use crate::view_model::{build_cells, BoardStatus, BoardView};
use crate::{GridShape, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Waiting for the startup configuration.
    #[default]
    AwaitingConfig,
    /// Scheduler is running for the configured grid.
    Polling,
    /// Configuration missing or empty, or the scheduler could not run.
    Disabled,
    /// User quit; terminal.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    session: SessionState,
    shape: GridShape,
    latest: Option<Arc<Snapshot>>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Most recently accepted snapshot, if any cycle has completed yet.
    pub fn latest(&self) -> Option<&Arc<Snapshot>> {
        self.latest.as_ref()
    }

    pub fn view(&self) -> BoardView {
        let status = match &self.latest {
            Some(snapshot) => BoardStatus::Ready {
                cycle: snapshot.cycle(),
                counts: snapshot.counts(),
            },
            None => BoardStatus::NotYetAvailable,
        };
        BoardView {
            session: self.session,
            shape: self.shape,
            status,
            cells: build_cells(self.shape, self.latest.as_deref()),
            dirty: self.dirty,
        }
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn start_polling(&mut self, shape: GridShape) {
        self.shape = shape;
        self.session = SessionState::Polling;
        self.dirty = true;
    }

    pub(crate) fn disable(&mut self) {
        self.session = SessionState::Disabled;
        self.dirty = true;
    }

    pub(crate) fn stop(&mut self) {
        self.session = SessionState::Stopped;
        self.dirty = true;
    }

    /// Replaces the displayed snapshot when it belongs to this grid and is newer.
    pub(crate) fn accept_snapshot(&mut self, snapshot: Arc<Snapshot>) -> bool {
        if snapshot.shape() != self.shape {
            return false;
        }
        if let Some(current) = &self.latest {
            if snapshot.cycle() <= current.cycle() {
                return false;
            }
        }
        self.latest = Some(snapshot);
        self.dirty = true;
        true
    }
}
