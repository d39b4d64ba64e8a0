use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{AuthError, Result};

/// Identifier of the authenticated owner.
///
/// Remote objects live under `{owner_id}/` in the bucket, so the textual
/// form (hyphenated lowercase UUID) is part of every object path.
///
/// # Examples
///
/// ```
/// use core_auth::OwnerId;
///
/// let owner = OwnerId::from_string("550e8400-e29b-41d4-a716-446655440000").unwrap();
/// assert_eq!(owner.object_prefix(), "550e8400-e29b-41d4-a716-446655440000");
/// assert_eq!(
///     owner.object_path("IMG_1.jpg"),
///     "550e8400-e29b-41d4-a716-446655440000/IMG_1.jpg"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(Uuid);

impl OwnerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| AuthError::InvalidOwnerId(s.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Listing prefix for the owner's objects.
    pub fn object_prefix(&self) -> String {
        self.0.to_string()
    }

    /// Object path of `file_name` inside the owner's folder.
    pub fn object_path(&self, file_name: &str) -> String {
        format!("{}/{}", self.0, file_name)
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for OwnerId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A signed-in session handed over by the host.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub owner_id: OwnerId,
    /// Bearer token for the object store
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(owner_id: OwnerId, access_token: impl Into<String>) -> Self {
        Self {
            owner_id,
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("owner_id", &self.owner_id)
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
