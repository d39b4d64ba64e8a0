//! # Host Bridge Traits
//!
//! Collaborator contracts the photo library core depends on.
//!
//! ## Overview
//!
//! The reconciliation engine never talks to a device API, an object store or
//! a vision model directly. Each of those is a trait here; hosts inject
//! implementations (`bridge-desktop`, the `provider-*` crates, or mocks in
//! tests).
//!
//! ## Traits
//!
//! ### Remote services
//! - [`ObjectStore`](object_store::ObjectStore) - Paginated bucket listing, info, upload, remove
//! - [`TaggingService`](tagging::TaggingService) - Vision model returning JSON-ish text
//! - [`ImageUrlBuilder`](image_url::ImageUrlBuilder) - CDN transformation URLs
//! - [`HttpClient`](http::HttpClient) - Transport used by the providers
//!
//! ### Device
//! - [`MediaLibrary`](media::MediaLibrary) - Cursor-paginated photos and videos
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Base64 reads, downloads, file info
//! - [`KeyValueStore`](storage::KeyValueStore) - Persisted tag cache
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert their own errors and keep the HTTP status in the message so callers
//! can recognise rate limiting.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared as
//! `Arc<dyn Trait>` across tokio tasks.

pub mod error;
pub mod http;
pub mod image_url;
pub mod media;
pub mod object_store;
pub mod storage;
pub mod tagging;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use image_url::{ImageUrlBuilder, Transformation};
pub use media::{AssetInfo, MediaItem, MediaKind, MediaLibrary, MediaPage, MediaPageRequest, SortBy};
pub use object_store::{ListOptions, ObjectEntry, ObjectInfo, ObjectStore, UploadOptions};
pub use storage::{DownloadResult, FileInfo, FileSystemAccess, KeyValueStore};
pub use tagging::{TaggingRequest, TaggingService};
pub use time::{Clock, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
