use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use gridwatch_core::{CycleId, GridShape, Snapshot};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{PollCycle, SchedulerError, SnapshotSink};

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Time between cycle triggers, measured from trigger to trigger.
    pub interval: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    /// Terminal. Nothing is published once this state is reached.
    Cancelled,
}

/// Shared between the loop task and every handle. Publication happens under
/// the same lock that cancellation takes.
struct Lifecycle {
    state: Mutex<SchedulerState>,
    stop_tx: watch::Sender<bool>,
}

impl Lifecycle {
    fn new() -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            state: Mutex::new(SchedulerState::Idle),
            stop_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> SchedulerState {
        *self.lock()
    }

    fn cancel(&self) {
        let mut state = self.lock();
        *state = SchedulerState::Cancelled;
        drop(state);
        self.stop_tx.send_replace(true);
    }

    /// Hands the snapshot to the sink unless the scheduler was cancelled.
    fn publish(&self, snapshot: Arc<Snapshot>, sink: &dyn SnapshotSink) -> bool {
        let state = self.lock();
        if *state != SchedulerState::Running {
            return false;
        }
        sink.publish(snapshot);
        true
    }
}

/// Runs poll cycles back to back on a fixed cadence for one grid.
pub struct Scheduler {
    cycle: Arc<PollCycle>,
    settings: SchedulerSettings,
    lifecycle: Arc<Lifecycle>,
}

impl Scheduler {
    pub fn new(cycle: PollCycle, settings: SchedulerSettings) -> Self {
        Self {
            cycle: Arc::new(cycle),
            settings,
            lifecycle: Arc::new(Lifecycle::new()),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.lifecycle.state()
    }

    /// Cancelling an idle scheduler prevents it from ever starting.
    pub fn cancel(&self) {
        self.lifecycle.cancel();
    }

    /// Spawn the polling loop on the current Tokio runtime.
    ///
    /// The first cycle starts immediately; each completed snapshot is handed
    /// to `sink`. An empty grid is rejected and nothing is polled.
    pub fn start<S>(&self, shape: GridShape, sink: S) -> Result<SchedulerHandle, SchedulerError>
    where
        S: SnapshotSink + 'static,
    {
        if shape.is_empty() {
            return Err(SchedulerError::EmptyGrid(shape));
        }
        if self.settings.interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        {
            let mut state = self.lifecycle.lock();
            if *state != SchedulerState::Idle {
                return Err(SchedulerError::NotIdle(*state));
            }
            *state = SchedulerState::Running;
        }

        engine_info!(
            "scheduler starting grid={} interval_ms={} max_concurrency={}",
            shape,
            self.settings.interval.as_millis(),
            self.cycle.settings().max_concurrency
        );
        let task = runtime.spawn(run_loop(
            self.cycle.clone(),
            self.settings.interval,
            shape,
            Box::new(sink),
            self.lifecycle.clone(),
        ));

        Ok(SchedulerHandle {
            lifecycle: self.lifecycle.clone(),
            task,
        })
    }
}

/// Controls a running scheduler. Dropping the handle does not stop polling.
pub struct SchedulerHandle {
    lifecycle: Arc<Lifecycle>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop scheduling cycles. A cycle in flight drains but is never
    /// published; once this returns, the sink receives nothing more.
    pub fn cancel(&self) {
        self.lifecycle.cancel();
    }

    pub fn state(&self) -> SchedulerState {
        self.lifecycle.state()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == SchedulerState::Cancelled
    }

    /// Wait for the loop task to exit. Only returns after [`cancel`](Self::cancel).
    pub async fn join(self) -> Result<(), SchedulerError> {
        self.task.await?;
        Ok(())
    }
}

async fn run_loop(
    cycle: Arc<PollCycle>,
    interval: Duration,
    shape: GridShape,
    sink: Box<dyn SnapshotSink>,
    lifecycle: Arc<Lifecycle>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut stop_rx = lifecycle.stop_tx.subscribe();
    let mut cycle_id: CycleId = 0;

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.wait_for(|stopped| *stopped) => break,
            _ = ticker.tick() => {}
        }

        cycle_id += 1;
        let snapshot = Arc::new(cycle.run(shape, cycle_id).await);
        if !lifecycle.publish(snapshot, sink.as_ref()) {
            engine_debug!("cycle={} completed after cancellation; dropped", cycle_id);
            break;
        }
    }

    engine_info!("scheduler stopped after {} cycles", cycle_id);
}
