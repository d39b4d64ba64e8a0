//! Error types for the Supabase Storage provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Supabase Storage provider errors
#[derive(Error, Debug)]
pub enum SupabaseError {
    /// No signed-in session and no API key to fall back on
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request returned an error
    #[error("Supabase Storage API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Object not found: {path}")]
    ObjectNotFound { path: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Failed to encode request: {0}")]
    EncodeError(String),

    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Supabase Storage operations
pub type Result<T> = std::result::Result<T, SupabaseError>;

impl From<SupabaseError> for BridgeError {
    fn from(error: SupabaseError) -> Self {
        match error {
            SupabaseError::ObjectNotFound { path } => BridgeError::NotFound(path),
            SupabaseError::ApiError {
                status_code,
                message,
            } => BridgeError::OperationFailed(format!(
                "Storage API error (status {}): {}",
                status_code, message
            )),
            SupabaseError::AuthenticationFailed(msg) => {
                BridgeError::OperationFailed(format!("Authentication failed: {}", msg))
            }
            SupabaseError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            SupabaseError::EncodeError(msg) => {
                BridgeError::OperationFailed(format!("Encode error: {}", msg))
            }
            SupabaseError::BridgeError(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SupabaseError::ApiError {
            status_code: 413,
            message: "Payload too large".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Supabase Storage API error (status 413): Payload too large"
        );
    }

    #[test]
    fn test_not_found_maps_to_bridge_not_found() {
        let bridge_error: BridgeError = SupabaseError::ObjectNotFound {
            path: "owner/a.jpg".to_string(),
        }
        .into();

        assert!(bridge_error.is_not_found());
    }
}
