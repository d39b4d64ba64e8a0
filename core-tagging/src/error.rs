use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaggingError {
    #[error("Asset {asset_id} has no readable source")]
    MissingSource { asset_id: String },

    #[error("Preview download returned status {status}")]
    PreviewDownload { status: u16 },

    #[error("Tag cache error: {0}")]
    Cache(String),

    #[error("Invalid tagging configuration: {0}")]
    InvalidConfig(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),
}

/// Status markers the HTTP transport and the tagging providers put in
/// their error text.
const RATE_LIMIT_MARKERS: [&str; 2] = ["status 429", "HTTP 429 "];

impl TaggingError {
    /// Rate limiting is recognised by the HTTP status of a failed service
    /// call, never by digits elsewhere in the message.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            TaggingError::Bridge(BridgeError::OperationFailed(message)) => RATE_LIMIT_MARKERS
                .iter()
                .any(|marker| message.contains(marker)),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TaggingError>;
