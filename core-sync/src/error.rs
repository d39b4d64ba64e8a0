use bridge_traits::error::BridgeError;
use core_auth::AuthError;
use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("No signed-in owner")]
    NotAuthenticated,

    #[error("Asset {asset_id} has no readable file URI")]
    MissingUri { asset_id: String },

    #[error("Failed to read asset file: {0}")]
    ReadFailed(String),

    #[error("Upload of {path} failed: {message}")]
    UploadFailed { path: String, message: String },

    #[error("Asset {0} not found in the remote store")]
    AssetNotFound(String),

    #[error("First local media page failed: {0}")]
    LocalPageFailed(String),

    #[error("Remote listing failed: {0}")]
    RemoteListingFailed(String),

    #[error("Download returned status {status}")]
    DownloadFailed { status: u16 },

    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Auth error: {0}")]
    Auth(AuthError),
}

impl From<AuthError> for SyncError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotAuthenticated => SyncError::NotAuthenticated,
            other => SyncError::Auth(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
