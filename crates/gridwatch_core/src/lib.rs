//! Gridwatch core: grid data model, pure board state machine and view-model helpers.
mod effect;
mod grid;
mod msg;
mod result;
mod snapshot;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use grid::{Coordinate, GridShape};
pub use msg::Msg;
pub use result::{CellResult, IMAGE_ENCODING, NO_CONTENT};
pub use snapshot::{CycleId, Snapshot, SnapshotCounts};
pub use state::{AppState, SessionState};
pub use update::update;
pub use view_model::{BoardStatus, BoardView, CellDisplay, CellView};
