//! Gridwatch engine: cell probing, poll cycles and the poll scheduler.
mod config;
mod cycle;
mod engine;
mod probe;
mod scheduler;
mod sink;
mod types;

pub use config::{
    fetch_grid_config, load_grid_config, parse_grid_config, resolve_grid_shape, ConfigSource,
    GridConfig, CONFIG_DOCUMENT,
};
pub use cycle::{CycleSettings, PollCycle};
pub use engine::{EngineConfig, EngineHandle};
pub use probe::{classify_response, CellProbe, ProbeSettings, ReqwestProbe, DEFAULT_BASE_URL};
pub use scheduler::{Scheduler, SchedulerHandle, SchedulerSettings, SchedulerState};
pub use sink::{ChannelSnapshotSink, LatestSnapshot, SnapshotSink};
pub use types::{
    ConfigError, EngineError, EngineEvent, ProbeFailure, ProbeSetupError, SchedulerError,
};
