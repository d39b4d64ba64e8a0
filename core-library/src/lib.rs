//! # Library Model Module
//!
//! The unified asset model and the merge of local and remote-only assets
//! into one timeline.
//!
//! ## Overview
//!
//! - [`Asset`]: either a [`LocalAsset`] from the device media library or a
//!   [`RemoteAsset`] that only exists in the object store
//! - [`TagResult`] / [`TaggedAsset`]: tagging pipeline output
//! - [`merge`]: deduplicating, timestamp-ordered merge with the backed-up
//!   count
//!
//! Everything here is plain data and pure functions; loading and syncing
//! live in `core-sync`.

pub mod error;
pub mod merge;
pub mod models;

pub use error::{LibraryError, Result};
pub use merge::{merge, MergedCollection};
pub use models::{Asset, LocalAsset, Quality, RemoteAsset, RemoteMetadata, TagResult, TaggedAsset};
