//! # Event Bus System
//!
//! Typed notifications from the reconciliation engine to the host, carried
//! over a `tokio::sync::broadcast` channel.
//!
//! ## Overview
//!
//! - **Event Types**: one enum per domain (auth, library, sync, tagging)
//!   wrapped in [`CoreEvent`]
//! - **EventBus**: cloneable sender side; emitting with no subscribers is not
//!   an error worth handling, so producers call `emit(..).ok()`
//! - **EventStream**: receiver wrapper with an optional predicate
//!
//! Events replace UI alerts and loading flags: a host shows the upload result
//! from [`SyncEvent::Uploaded`] / [`SyncEvent::UploadFailed`], renders local
//! batches as [`LibraryEvent::LocalBatchLoaded`] arrives, and so on.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(64);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Sync(SyncEvent::Uploaded {
//!     asset_id: "IMG_0001".to_string(),
//!     path: "owner/IMG_0001.jpg".to_string(),
//! }))
//! .ok();
//!
//! assert!(matches!(rx.recv().await, Ok(CoreEvent::Sync(_))));
//! # }
//! ```

use core_async::sync::broadcast::{self, error::RecvError, error::SendError};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use core_async::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that fall further behind receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Auth(AuthEvent),
    Library(LibraryEvent),
    Sync(SyncEvent),
    Tagging(TaggingEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Auth(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
            CoreEvent::Sync(e) => e.description(),
            CoreEvent::Tagging(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Sync(SyncEvent::UploadFailed { .. }) => EventSeverity::Error,
            CoreEvent::Sync(SyncEvent::DeleteFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Tagging(TaggingEvent::RateLimited { .. }) => EventSeverity::Warning,
            CoreEvent::Library(LibraryEvent::BackupIndexRebuilt { complete: false, .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Sync(_) | CoreEvent::Auth(_) => EventSeverity::Info,
            CoreEvent::Library(LibraryEvent::LocalLoadFinished { .. })
            | CoreEvent::Tagging(TaggingEvent::Completed { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Authentication Events
// ============================================================================

/// Session changes of the authenticated owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    SignedIn { owner_id: String },
    SignedOut { owner_id: String },
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::SignedIn { .. } => "Owner signed in",
            AuthEvent::SignedOut { .. } => "Owner signed out",
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Progress of the reconciliation loaders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// The backup index was rebuilt from the remote listing.
    BackupIndexRebuilt {
        /// Identifiers in the index
        count: usize,
        /// False when a listing error cut the rebuild short
        complete: bool,
    },
    /// A page of local assets became visible.
    LocalBatchLoaded {
        batch_size: usize,
        total_loaded: usize,
    },
    /// Local pagination stopped.
    LocalLoadFinished { total: usize, fully_loaded: bool },
    /// Remote-only assets were reloaded.
    RemoteAssetsRefreshed { count: usize },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::BackupIndexRebuilt { .. } => "Backup index rebuilt",
            LibraryEvent::LocalBatchLoaded { .. } => "Local assets loaded",
            LibraryEvent::LocalLoadFinished { .. } => "Local library loading finished",
            LibraryEvent::RemoteAssetsRefreshed { .. } => "Remote assets refreshed",
        }
    }
}

// ============================================================================
// Sync Events
// ============================================================================

/// Outcome of user-initiated upload and delete operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    Uploaded { asset_id: String, path: String },
    UploadFailed { asset_id: String, message: String },
    Deleted { asset_id: String, path: String },
    DeleteFailed { asset_id: String, message: String },
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::Uploaded { .. } => "Asset backed up",
            SyncEvent::UploadFailed { .. } => "Asset backup failed",
            SyncEvent::Deleted { .. } => "Asset removed from cloud",
            SyncEvent::DeleteFailed { .. } => "Asset removal failed",
        }
    }
}

// ============================================================================
// Tagging Events
// ============================================================================

/// Progress of a tagging pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum TaggingEvent {
    Started { total: usize },
    AssetAnalyzed {
        asset_id: String,
        /// Result came from the tag cache without a network call
        from_cache: bool,
        enriched: bool,
    },
    /// The tagging service answered 429; the pipeline is backing off.
    RateLimited {
        asset_id: String,
        attempt: u32,
        delay_ms: u64,
    },
    Completed { processed: usize, enriched: usize },
}

impl TaggingEvent {
    fn description(&self) -> &str {
        match self {
            TaggingEvent::Started { .. } => "Tagging started",
            TaggingEvent::AssetAnalyzed { .. } => "Asset analyzed",
            TaggingEvent::RateLimited { .. } => "Tagging service rate limited",
            TaggingEvent::Completed { .. } => "Tagging completed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers, or an error when nobody is listening.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// New independent receiver of all future events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::default();
/// let tagging_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Tagging(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Next event passing the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` once every sender is gone.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv); `None` when nothing is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
