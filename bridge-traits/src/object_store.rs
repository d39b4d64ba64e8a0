//! Object Store Abstraction
//!
//! The remote bucket holding backed-up assets. Objects live under
//! `{owner_id}/{file_name}` and carry a flat string metadata block.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Pagination window for [`ObjectStore::list`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: u32,
    pub offset: u32,
}

impl ListOptions {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }
}

/// One entry of a listing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Object name relative to the listed prefix
    pub name: String,
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// User metadata returned inline by the listing, when the store has it
    pub metadata: Option<Map<String, Value>>,
}

impl ObjectEntry {
    /// Asset identifier carried in the inline metadata, if any.
    pub fn inline_asset_id(&self) -> Option<String> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("id"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

/// Full object information from [`ObjectStore::info`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub id: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub bucket_id: Option<String>,
    pub size: Option<u64>,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub etag: Option<String>,
    pub metadata: Option<Map<String, Value>>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectInfo {
    /// True when the metadata block is missing or has no keys.
    pub fn has_empty_metadata(&self) -> bool {
        self.metadata.as_ref().map_or(true, Map::is_empty)
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
    }
}

/// Options for [`ObjectStore::upload`]
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOptions {
    pub content_type: String,
    pub cache_control: String,
    /// Overwrite an existing object at the same path
    pub upsert: bool,
    pub metadata: Map<String, Value>,
}

/// Remote object store trait
///
/// # Example
///
/// ```ignore
/// use bridge_traits::object_store::{ListOptions, ObjectStore};
///
/// async fn first_page(store: &dyn ObjectStore, owner: &str) -> Result<usize> {
///     let entries = store.list(owner, ListOptions::new(1000, 0)).await?;
///     Ok(entries.len())
/// }
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List objects under `prefix`.
    async fn list(&self, prefix: &str, options: ListOptions) -> Result<Vec<ObjectEntry>>;

    /// Fetch object information.
    ///
    /// # Errors
    ///
    /// `BridgeError::NotFound` if no object exists at `path`.
    async fn info(&self, path: &str) -> Result<ObjectInfo>;

    /// Write `data` at `path`.
    async fn upload(&self, path: &str, data: Bytes, options: UploadOptions) -> Result<()>;

    /// Remove every object in `paths`.
    async fn remove(&self, paths: &[String]) -> Result<()>;
}
