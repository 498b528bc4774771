use std::collections::BTreeMap;

use crate::{CellResult, Coordinate, GridShape};

/// Sequence number of a poll cycle. The first cycle of a session is 1.
pub type CycleId = u64;

/// Complete, immutable result set of one poll cycle.
///
/// Holds exactly one [`CellResult`] for every coordinate of its shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    cycle: CycleId,
    shape: GridShape,
    cells: BTreeMap<Coordinate, CellResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotCounts {
    pub healthy: usize,
    pub empty: usize,
    pub failed: usize,
}

impl Snapshot {
    /// Assemble a snapshot from the results gathered during one cycle.
    ///
    /// Results for coordinates outside `shape` are dropped and the first result
    /// wins on duplicates. Coordinates without a result are recorded as a
    /// failure with no status.
    pub fn from_results<I>(cycle: CycleId, shape: GridShape, results: I) -> Self
    where
        I: IntoIterator<Item = (Coordinate, CellResult)>,
    {
        let mut cells = BTreeMap::new();
        for (coordinate, result) in results {
            if shape.contains(coordinate) {
                cells.entry(coordinate).or_insert(result);
            }
        }
        for coordinate in shape.coordinates() {
            cells
                .entry(coordinate)
                .or_insert_with(|| CellResult::failure(None));
        }
        Self {
            cycle,
            shape,
            cells,
        }
    }

    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, coordinate: Coordinate) -> Option<&CellResult> {
        self.cells.get(&coordinate)
    }

    /// Cells in row-major coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, &CellResult)> {
        self.cells.iter().map(|(coordinate, result)| (*coordinate, result))
    }

    pub fn counts(&self) -> SnapshotCounts {
        self.cells
            .values()
            .fold(SnapshotCounts::default(), |mut counts, result| {
                match result {
                    CellResult::Image { .. } => counts.healthy += 1,
                    CellResult::Empty { .. } => counts.empty += 1,
                    CellResult::Failure { .. } => counts.failed += 1,
                }
                counts
            })
    }
}
