use crate::GridShape;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start the poll scheduler for the loaded grid.
    StartPolling { shape: GridShape },
    /// Cancel the poll scheduler. No snapshot is delivered afterwards.
    StopPolling,
}
