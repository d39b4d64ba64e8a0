use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Runtime error: {0}")]
    Runtime(core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    #[error("Sync error: {0}")]
    Sync(#[from] core_sync::SyncError),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Tagging error: {0}")]
    Tagging(#[from] core_tagging::TaggingError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl From<core_runtime::Error> for CoreError {
    fn from(error: core_runtime::Error) -> Self {
        match error {
            core_runtime::Error::CapabilityMissing {
                capability,
                message,
            } => CoreError::CapabilityMissing {
                capability,
                message,
            },
            other => CoreError::Runtime(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_missing_is_lifted() {
        let error: CoreError = core_runtime::Error::CapabilityMissing {
            capability: "HttpClient".to_string(),
            message: "none injected".to_string(),
        }
        .into();

        assert!(matches!(
            error,
            CoreError::CapabilityMissing { ref capability, .. } if capability == "HttpClient"
        ));

        let error: CoreError = core_runtime::Error::Config("bad".to_string()).into();
        assert!(matches!(error, CoreError::Runtime(_)));
    }
}
