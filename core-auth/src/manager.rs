//! # Session Manager
//!
//! Holds the current [`Session`] behind an async `RwLock` and emits
//! [`AuthEvent`]s on changes.
//!
//! ## Usage
//!
//! ```ignore
//! use core_auth::{OwnerId, Session, SessionManager};
//! use core_runtime::events::EventBus;
//!
//! let manager = SessionManager::new(EventBus::default());
//! manager.sign_in(Session::new(owner_id, access_token)).await;
//!
//! let owner = manager.require_owner().await?;
//! ```

use chrono::Utc;
use core_async::sync::RwLock;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use tracing::{info, instrument, warn};

use crate::error::{AuthError, Result};
use crate::types::{OwnerId, Session};

/// Owner session shared by every owner-scoped operation.
pub struct SessionManager {
    current: RwLock<Option<Session>>,
    event_bus: EventBus,
}

impl SessionManager {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            current: RwLock::new(None),
            event_bus,
        }
    }

    /// Replace the current session.
    #[instrument(skip(self, session), fields(owner_id = %session.owner_id))]
    pub async fn sign_in(&self, session: Session) {
        let owner_id = session.owner_id;
        *self.current.write().await = Some(session);
        info!("Owner signed in");

        self.event_bus
            .emit(CoreEvent::Auth(AuthEvent::SignedIn {
                owner_id: owner_id.to_string(),
            }))
            .ok();
    }

    /// Clear the session. Returns the owner that was signed in, if any.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Option<OwnerId> {
        let previous = self.current.write().await.take();

        if let Some(session) = &previous {
            info!(owner_id = %session.owner_id, "Owner signed out");
            self.event_bus
                .emit(CoreEvent::Auth(AuthEvent::SignedOut {
                    owner_id: session.owner_id.to_string(),
                }))
                .ok();
        }

        previous.map(|session| session.owner_id)
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn current_owner(&self) -> Option<OwnerId> {
        self.current.read().await.as_ref().map(|s| s.owner_id)
    }

    /// The signed-in owner, or [`AuthError::NotAuthenticated`].
    pub async fn require_owner(&self) -> Result<OwnerId> {
        self.current_owner()
            .await
            .ok_or(AuthError::NotAuthenticated)
    }

    /// Bearer token of a signed-in, unexpired session.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotAuthenticated`] without a session and
    /// [`AuthError::SessionExpired`] once `expires_at` has passed.
    pub async fn access_token(&self) -> Result<String> {
        let guard = self.current.read().await;
        let session = guard.as_ref().ok_or(AuthError::NotAuthenticated)?;

        if session.is_expired_at(Utc::now()) {
            warn!(owner_id = %session.owner_id, "Session token expired");
            if let Some(expires_at) = session.expires_at {
                return Err(AuthError::SessionExpired(expires_at));
            }
        }

        Ok(session.access_token.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }
}
