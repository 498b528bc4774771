use std::fs;
use std::path::{Path, PathBuf};

use engine_logging::{engine_info, engine_warn};
use gridwatch_core::GridShape;
use serde::Deserialize;

use crate::probe::join_path;
use crate::{ConfigError, ProbeSettings};

pub const CONFIG_DOCUMENT: &str = "config.json";

/// Startup document describing the grid: `{ "rows": 4, "cols": 6 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GridConfig {
    pub rows: u32,
    pub cols: u32,
}

impl From<GridConfig> for GridShape {
    fn from(config: GridConfig) -> Self {
        GridShape::new(config.rows, config.cols)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `GET {base_url}/config.json` from the producer service.
    Remote { base_url: String },
    File { path: PathBuf },
}

pub fn parse_grid_config(bytes: &[u8]) -> Result<GridShape, ConfigError> {
    let config: GridConfig = serde_json::from_slice(bytes)?;
    Ok(config.into())
}

pub fn load_grid_config(path: &Path) -> Result<GridShape, ConfigError> {
    let bytes = fs::read(path)?;
    parse_grid_config(&bytes)
}

pub async fn fetch_grid_config(
    base_url: &str,
    settings: &ProbeSettings,
) -> Result<GridShape, ConfigError> {
    let url = join_path(base_url, CONFIG_DOCUMENT).map_err(|message| ConfigError::InvalidUrl {
        url: base_url.to_string(),
        message,
    })?;
    let client = reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .build()
        .map_err(|err| ConfigError::Fetch(err.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| ConfigError::Fetch(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ConfigError::Status(status.as_u16()));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|err| ConfigError::Fetch(err.to_string()))?;
    parse_grid_config(&bytes)
}

/// Read the grid shape once at startup.
///
/// Failures are logged and returned; callers treat them as an empty grid.
pub async fn resolve_grid_shape(
    source: &ConfigSource,
    settings: &ProbeSettings,
) -> Result<GridShape, ConfigError> {
    let result = match source {
        ConfigSource::Remote { base_url } => fetch_grid_config(base_url, settings).await,
        ConfigSource::File { path } => load_grid_config(path),
    };
    match &result {
        Ok(shape) => engine_info!("grid config loaded from {:?}: {}", source, shape),
        Err(err) => engine_warn!("grid config unavailable from {:?}: {}", source, err),
    }
    result
}
