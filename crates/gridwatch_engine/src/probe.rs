use std::time::Duration;

use base64::Engine as _;
use engine_logging::{engine_debug, engine_trace};
use futures_util::StreamExt;
use gridwatch_core::{CellResult, Coordinate, NO_CONTENT};
use serde::Deserialize;
use url::Url;

use crate::{ProbeFailure, ProbeSetupError};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Root of the producer service; cells are fetched from `{base_url}/image`.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_secs(4),
            max_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Fetches and classifies one cell. Never fails: every problem becomes a
/// [`CellResult::Failure`].
#[async_trait::async_trait]
pub trait CellProbe: Send + Sync {
    async fn probe(&self, coordinate: Coordinate) -> CellResult;
}

#[derive(Debug, Deserialize)]
struct ImagePayload {
    img: Option<String>,
}

/// Map a received status and body onto a cell result.
///
/// 204 is `Empty` whatever the body says. Any other status is an image only
/// when the body is JSON with a non-empty, valid base64 `img` field.
pub fn classify_response(status: u16, body: &[u8]) -> Result<CellResult, ProbeFailure> {
    if status == NO_CONTENT {
        return Ok(CellResult::empty());
    }

    let payload: ImagePayload =
        serde_json::from_slice(body).map_err(|err| ProbeFailure::UnusableResponse {
            status,
            reason: format!("invalid json: {err}"),
        })?;

    let encoded = payload
        .img
        .filter(|img| !img.is_empty())
        .ok_or_else(|| ProbeFailure::UnusableResponse {
            status,
            reason: "missing img field".to_string(),
        })?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.as_bytes())
        .map_err(|err| ProbeFailure::UnusableResponse {
            status,
            reason: format!("invalid base64: {err}"),
        })?;

    Ok(CellResult::image(bytes, status))
}

#[derive(Debug, Clone)]
pub struct ReqwestProbe {
    settings: ProbeSettings,
    endpoint: Url,
    client: reqwest::Client,
}

impl ReqwestProbe {
    pub fn new(settings: ProbeSettings) -> Result<Self, ProbeSetupError> {
        let endpoint = image_endpoint(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self {
            settings,
            endpoint,
            client,
        })
    }

    /// `GET {base_url}/image?x=..&y=..` for one cell.
    pub fn cell_url(&self, coordinate: Coordinate) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("x", &coordinate.x.to_string())
            .append_pair("y", &coordinate.y.to_string());
        url
    }

    async fn fetch(&self, coordinate: Coordinate) -> Result<CellResult, ProbeFailure> {
        let url = self.cell_url(coordinate);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        if status == NO_CONTENT {
            return Ok(CellResult::empty());
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(ProbeFailure::TooLarge {
                    status,
                    max_bytes: self.settings.max_bytes,
                    actual: Some(content_len),
                });
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(ProbeFailure::TooLarge {
                    status,
                    max_bytes: self.settings.max_bytes,
                    actual: Some(next_len),
                });
            }
            body.extend_from_slice(&chunk);
        }
        engine_trace!("probe {} http {} body_len={}", coordinate, status, body.len());

        classify_response(status, &body)
    }
}

#[async_trait::async_trait]
impl CellProbe for ReqwestProbe {
    async fn probe(&self, coordinate: Coordinate) -> CellResult {
        match self.fetch(coordinate).await {
            Ok(result) => result,
            Err(failure) => {
                engine_debug!("probe {} failed: {}", coordinate, failure);
                CellResult::failure(failure.http_status())
            }
        }
    }
}

fn image_endpoint(base_url: &str) -> Result<Url, ProbeSetupError> {
    join_path(base_url, "image").map_err(|message| ProbeSetupError::InvalidBaseUrl {
        url: base_url.to_string(),
        message,
    })
}

/// Append one path segment to `base_url`, keeping any existing path prefix.
pub(crate) fn join_path(base_url: &str, segment: &str) -> Result<Url, String> {
    let mut url = Url::parse(base_url).map_err(|err| err.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {}", url.scheme()));
    }
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| "url cannot be a base".to_string())?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

fn map_reqwest_error(err: reqwest::Error) -> ProbeFailure {
    if err.is_timeout() {
        return ProbeFailure::Timeout;
    }
    ProbeFailure::Transport {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_url_encodes_coordinates_as_query() {
        let probe = ReqwestProbe::new(ProbeSettings {
            base_url: "http://grid.local:9000/board/".to_string(),
            ..ProbeSettings::default()
        })
        .unwrap();
        assert_eq!(
            probe.cell_url(Coordinate::new(3, 7)).as_str(),
            "http://grid.local:9000/board/image?x=3&y=7"
        );
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = ReqwestProbe::new(ProbeSettings {
            base_url: "ftp://grid.local".to_string(),
            ..ProbeSettings::default()
        })
        .unwrap_err();
        assert!(matches!(err, ProbeSetupError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn classify_reports_reason_for_unusable_payloads() {
        let err = classify_response(200, b"{\"img\":\"\"}").unwrap_err();
        assert_eq!(
            err,
            ProbeFailure::UnusableResponse {
                status: 200,
                reason: "missing img field".to_string()
            }
        );
        assert!(matches!(
            classify_response(200, b"{\"img\":\"@@@\"}"),
            Err(ProbeFailure::UnusableResponse { status: 200, .. })
        ));
        assert!(matches!(
            classify_response(502, b"<html>bad gateway</html>"),
            Err(ProbeFailure::UnusableResponse { status: 502, .. })
        ));
    }
}
