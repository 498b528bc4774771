use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use gridwatch_engine::{ConfigSource, EngineConfig, DEFAULT_BASE_URL};

#[derive(Debug, Parser)]
#[command(name = "gridwatch", version, about = "Live status board for a grid of image producers")]
pub struct Cli {
    /// Producer service root; cells are fetched from `<base-url>/image?x=..&y=..`.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Read `{rows, cols}` from this file instead of `<base-url>/config.json`.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Time between poll cycles.
    #[arg(long, default_value_t = 5_000, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: u64,

    /// Maximum probes in flight per cycle.
    #[arg(long, default_value_t = 16)]
    pub max_concurrency: usize,

    /// Per-cell request timeout and probe deadline.
    #[arg(long, default_value_t = 4_000)]
    pub probe_timeout_ms: u64,

    /// Mirror logs to the terminal in addition to ./gridwatch.log.
    #[arg(long)]
    pub log_to_terminal: bool,
}

impl Cli {
    pub fn engine_config(&self) -> EngineConfig {
        let probe_timeout = Duration::from_millis(self.probe_timeout_ms);
        let mut config = EngineConfig::with_base_url(self.base_url.clone());
        config.probe.request_timeout = probe_timeout;
        config.cycle.probe_deadline = probe_timeout;
        config.cycle.max_concurrency = self.max_concurrency;
        config.scheduler.interval = Duration::from_millis(self.interval_ms);
        config
    }

    pub fn config_source(&self) -> ConfigSource {
        match &self.config {
            Some(path) => ConfigSource::File { path: path.clone() },
            None => ConfigSource::Remote {
                base_url: self.base_url.clone(),
            },
        }
    }
}
