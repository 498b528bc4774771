use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use futures_util::{stream, StreamExt};
use gridwatch_core::{CellResult, Coordinate, CycleId, GridShape, Snapshot};
use tokio::time::Instant;

use crate::{CellProbe, ProbeFailure};

#[derive(Debug, Clone)]
pub struct CycleSettings {
    /// Upper bound on probes in flight within one cycle.
    pub max_concurrency: usize,
    /// Hard deadline per probe; expiry is recorded as a failure with no status.
    pub probe_deadline: Duration,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
            probe_deadline: Duration::from_secs(4),
        }
    }
}

/// One pass over the grid: probe every cell once, then build a snapshot.
pub struct PollCycle {
    probe: Arc<dyn CellProbe>,
    settings: CycleSettings,
}

impl PollCycle {
    pub fn new(probe: Arc<dyn CellProbe>, settings: CycleSettings) -> Self {
        Self { probe, settings }
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    /// Probe every coordinate of `shape` and wait for all of them to settle.
    pub async fn run(&self, shape: GridShape, cycle: CycleId) -> Snapshot {
        let started = Instant::now();
        let limit = self.settings.max_concurrency.max(1);
        let deadline = self.settings.probe_deadline;
        let probe = self.probe.as_ref();

        let results: Vec<(Coordinate, CellResult)> = stream::iter(shape.coordinates())
            .map(|coordinate| async move {
                let result = probe_with_deadline(probe, coordinate, deadline).await;
                (coordinate, result)
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        let snapshot = Snapshot::from_results(cycle, shape, results);
        let counts = snapshot.counts();
        engine_info!(
            "cycle={} grid={} healthy={} empty={} failed={} elapsed_ms={}",
            cycle,
            shape,
            counts.healthy,
            counts.empty,
            counts.failed,
            started.elapsed().as_millis()
        );
        snapshot
    }
}

async fn probe_with_deadline(
    probe: &dyn CellProbe,
    coordinate: Coordinate,
    deadline: Duration,
) -> CellResult {
    match tokio::time::timeout(deadline, probe.probe(coordinate)).await {
        Ok(result) => result,
        Err(_) => {
            engine_debug!(
                "probe {} failed: {}",
                coordinate,
                ProbeFailure::DeadlineExpired
            );
            CellResult::failure(None)
        }
    }
}
