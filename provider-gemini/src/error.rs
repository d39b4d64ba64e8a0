//! Error types for the Gemini provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeminiError {
    /// API request returned an error
    #[error("Gemini API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, GeminiError>;

impl GeminiError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GeminiError::ApiError { status_code: 429, .. })
    }
}

impl From<GeminiError> for BridgeError {
    fn from(error: GeminiError) -> Self {
        match error {
            GeminiError::ApiError {
                status_code,
                message,
            } => BridgeError::OperationFailed(format!(
                "Tagging API error (status {}): {}",
                status_code, message
            )),
            GeminiError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            GeminiError::BridgeError(e) => e,
        }
    }
}
