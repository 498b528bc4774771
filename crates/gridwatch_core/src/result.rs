use base64::Engine as _;

/// Encoding tag attached to every decoded image payload.
pub const IMAGE_ENCODING: &str = "image";

/// HTTP status used by producers to say "nothing to show right now".
pub const NO_CONTENT: u16 = 204;

/// Outcome of probing one cell in one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellResult {
    /// The producer answered with a usable image payload.
    Image {
        bytes: Vec<u8>,
        encoding: String,
        http_status: u16,
    },
    /// The producer answered 204 No Content.
    Empty { http_status: u16 },
    /// No usable payload. `http_status` is `None` when no response arrived.
    Failure { http_status: Option<u16> },
}

impl CellResult {
    pub fn image(bytes: Vec<u8>, http_status: u16) -> Self {
        CellResult::Image {
            bytes,
            encoding: IMAGE_ENCODING.to_string(),
            http_status,
        }
    }

    pub fn empty() -> Self {
        CellResult::Empty {
            http_status: NO_CONTENT,
        }
    }

    pub fn failure(http_status: Option<u16>) -> Self {
        CellResult::Failure { http_status }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            CellResult::Image { http_status, .. } | CellResult::Empty { http_status } => {
                Some(*http_status)
            }
            CellResult::Failure { http_status } => *http_status,
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, CellResult::Image { .. })
    }

    /// `data:image/png;base64,...` form of an image payload, for display.
    pub fn data_uri(&self) -> Option<String> {
        match self {
            CellResult::Image { bytes, .. } => Some(format!(
                "data:image/png;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(bytes)
            )),
            _ => None,
        }
    }
}
