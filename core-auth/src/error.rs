use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Session expired at {0}")]
    SessionExpired(chrono::DateTime<chrono::Utc>),

    #[error("Invalid owner id '{0}'")]
    InvalidOwnerId(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
