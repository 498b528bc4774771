use std::fmt;
use std::sync::Arc;

use gridwatch_core::{GridShape, Snapshot};

use crate::scheduler::SchedulerState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Startup configuration was read.
    ConfigResolved { shape: GridShape },
    /// Startup configuration could not be read; the grid stays empty.
    ConfigFailed { reason: String },
    /// A poll cycle completed and its snapshot is now the latest.
    SnapshotPublished(Arc<Snapshot>),
    /// The scheduler has exited (cancelled or failed to start).
    PollingStopped,
}

/// Why a probe produced no usable image. Diagnostic only; the snapshot
/// carries the collapsed [`gridwatch_core::CellResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// No response received (DNS, connect, reset, malformed response).
    Transport { message: String },
    /// The HTTP client's own request timeout fired.
    Timeout,
    /// The per-probe deadline expired before the probe settled.
    DeadlineExpired,
    /// The body exceeded the configured size cap.
    TooLarge {
        status: u16,
        max_bytes: u64,
        actual: Option<u64>,
    },
    /// A response arrived but carried no decodable image.
    UnusableResponse { status: u16, reason: String },
}

impl ProbeFailure {
    /// Status code to record in the snapshot, if a response was received.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ProbeFailure::TooLarge { status, .. }
            | ProbeFailure::UnusableResponse { status, .. } => Some(*status),
            ProbeFailure::Transport { .. }
            | ProbeFailure::Timeout
            | ProbeFailure::DeadlineExpired => None,
        }
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Transport { message } => write!(f, "transport error: {message}"),
            ProbeFailure::Timeout => write!(f, "request timeout"),
            ProbeFailure::DeadlineExpired => write!(f, "probe deadline expired"),
            ProbeFailure::TooLarge {
                status,
                max_bytes,
                actual,
            } => write!(
                f,
                "http {status}: response too large (max {max_bytes}, actual {actual:?})"
            ),
            ProbeFailure::UnusableResponse { status, reason } => {
                write!(f, "http {status}: unusable response: {reason}")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeSetupError {
    #[error("invalid base url {url}: {message}")]
    InvalidBaseUrl { url: String, message: String },
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("failed to fetch config: {0}")]
    Fetch(String),
    #[error("config request returned http status {0}")]
    Status(u16),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("grid {0} has no cells; polling not started")]
    EmptyGrid(GridShape),
    #[error("poll interval must be non-zero")]
    ZeroInterval,
    #[error("scheduler is {0:?}, expected Idle")]
    NotIdle(SchedulerState),
    #[error("no tokio runtime available to run the scheduler")]
    NoRuntime,
    #[error("scheduler task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),
}
