use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_error, engine_info, engine_warn};
use gridwatch_core::GridShape;
use tokio::runtime::Runtime;

use crate::config::{resolve_grid_shape, ConfigSource};
use crate::{
    ChannelSnapshotSink, CycleSettings, EngineError, EngineEvent, PollCycle, ProbeSettings,
    ReqwestProbe, Scheduler, SchedulerHandle, SchedulerSettings,
};

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub probe: ProbeSettings,
    pub cycle: CycleSettings,
    pub scheduler: SchedulerSettings,
}

impl EngineConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.probe.base_url = base_url.into();
        config
    }
}

enum EngineCommand {
    LoadConfig { source: ConfigSource },
    StartPolling { shape: GridShape },
    StopPolling,
}

/// Owns a background thread with a Tokio runtime. Commands go in, events
/// come out; dropping the handle shuts the engine down.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::Builder::new()
            .name("gridwatch-engine".to_string())
            .spawn(move || {
                let runtime = match Runtime::new() {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        engine_error!("Failed to start tokio runtime: {}", err);
                        return;
                    }
                };
                let _guard = runtime.enter();
                let mut worker = EngineWorker::new(config, event_tx);
                while let Ok(command) = cmd_rx.recv() {
                    worker.handle(&runtime, command);
                }
                worker.shutdown();
            })?;

        Ok(Self { cmd_tx, event_rx })
    }

    /// Read the grid shape once; answered with `ConfigResolved` or `ConfigFailed`.
    pub fn load_config(&self, source: ConfigSource) {
        let _ = self.cmd_tx.send(EngineCommand::LoadConfig { source });
    }

    pub fn start_polling(&self, shape: GridShape) {
        let _ = self.cmd_tx.send(EngineCommand::StartPolling { shape });
    }

    /// Always answered with `PollingStopped`, even when nothing was running.
    pub fn stop_polling(&self) {
        let _ = self.cmd_tx.send(EngineCommand::StopPolling);
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

struct EngineWorker {
    config: EngineConfig,
    event_tx: mpsc::Sender<EngineEvent>,
    active: Option<SchedulerHandle>,
}

impl EngineWorker {
    fn new(config: EngineConfig, event_tx: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            config,
            event_tx,
            active: None,
        }
    }

    fn handle(&mut self, runtime: &Runtime, command: EngineCommand) {
        match command {
            EngineCommand::LoadConfig { source } => {
                let settings = self.config.probe.clone();
                let event_tx = self.event_tx.clone();
                runtime.spawn(async move {
                    let event = match resolve_grid_shape(&source, &settings).await {
                        Ok(shape) => EngineEvent::ConfigResolved { shape },
                        Err(err) => EngineEvent::ConfigFailed {
                            reason: err.to_string(),
                        },
                    };
                    let _ = event_tx.send(event);
                });
            }
            EngineCommand::StartPolling { shape } => self.start_polling(shape),
            EngineCommand::StopPolling => self.stop_polling(runtime),
        }
    }

    fn start_polling(&mut self, shape: GridShape) {
        if self.active.is_some() {
            engine_warn!("StartPolling ignored: scheduler already running");
            return;
        }

        let probe = match ReqwestProbe::new(self.config.probe.clone()) {
            Ok(probe) => probe,
            Err(err) => {
                engine_error!("Cannot build cell probe: {}", err);
                let _ = self.event_tx.send(EngineEvent::PollingStopped);
                return;
            }
        };
        let cycle = PollCycle::new(Arc::new(probe), self.config.cycle.clone());
        let scheduler = Scheduler::new(cycle, self.config.scheduler.clone());
        let sink = ChannelSnapshotSink::new(self.event_tx.clone());

        match scheduler.start(shape, sink) {
            Ok(handle) => self.active = Some(handle),
            Err(err) => {
                engine_warn!("Polling not started: {}", err);
                let _ = self.event_tx.send(EngineEvent::PollingStopped);
            }
        }
    }

    fn stop_polling(&mut self, runtime: &Runtime) {
        let Some(handle) = self.active.take() else {
            let _ = self.event_tx.send(EngineEvent::PollingStopped);
            return;
        };
        handle.cancel();
        engine_info!("Polling cancelled; draining in-flight cycle");
        let event_tx = self.event_tx.clone();
        runtime.spawn(async move {
            if let Err(err) = handle.join().await {
                engine_error!("Scheduler task ended abnormally: {}", err);
            }
            let _ = event_tx.send(EngineEvent::PollingStopped);
        });
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.cancel();
        }
    }
}
