use crate::{CellResult, Coordinate, CycleId, GridShape, SessionState, Snapshot, SnapshotCounts};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardStatus {
    /// No cycle has completed yet.
    NotYetAvailable,
    Ready { cycle: CycleId, counts: SnapshotCounts },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub session: SessionState,
    pub shape: GridShape,
    pub status: BoardStatus,
    /// One entry per coordinate, row-major.
    pub cells: Vec<CellView>,
    pub dirty: bool,
}

impl BoardView {
    /// Cells grouped by row.
    pub fn rows(&self) -> impl Iterator<Item = &[CellView]> {
        self.cells.chunks(self.shape.cols.max(1) as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellView {
    pub coordinate: Coordinate,
    pub display: CellDisplay,
    /// Status code shown in the corner of the cell, when one was received.
    pub badge: Option<u16>,
    pub healthy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellDisplay {
    /// Waiting for the first snapshot.
    Pending,
    /// Encoded on demand through [`CellResult::data_uri`].
    Image { byte_len: usize },
    NoImage,
    /// Producer explicitly reported no content.
    StatusCode(u16),
}

pub(crate) fn build_cells(shape: GridShape, snapshot: Option<&Snapshot>) -> Vec<CellView> {
    shape
        .coordinates()
        .map(|coordinate| match snapshot.and_then(|s| s.get(coordinate)) {
            Some(result) => cell_view(coordinate, result),
            None => CellView {
                coordinate,
                display: CellDisplay::Pending,
                badge: None,
                healthy: false,
            },
        })
        .collect()
}

fn cell_view(coordinate: Coordinate, result: &CellResult) -> CellView {
    let display = match result {
        CellResult::Image { bytes, .. } => CellDisplay::Image {
            byte_len: bytes.len(),
        },
        CellResult::Empty { http_status } => CellDisplay::StatusCode(*http_status),
        CellResult::Failure { .. } => CellDisplay::NoImage,
    };
    CellView {
        coordinate,
        display,
        badge: result.http_status(),
        healthy: result.is_healthy(),
    }
}
