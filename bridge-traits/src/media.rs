//! Device Media Library Abstraction
//!
//! Cursor-paginated access to the photos and videos on the device.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Kind of media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    #[default]
    #[serde(other)]
    Unknown,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Unknown => "unknown",
        }
    }
}

/// Page ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    ModificationTimeDesc,
    CreationTimeDesc,
}

/// Request for one page of media items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPageRequest {
    pub page_size: u32,
    /// `end_cursor` of the previous page; `None` for the first page
    pub cursor: Option<String>,
    pub sort_by: SortBy,
    pub media_kinds: Vec<MediaKind>,
}

impl MediaPageRequest {
    pub fn first(page_size: u32) -> Self {
        Self {
            page_size,
            cursor: None,
            sort_by: SortBy::ModificationTimeDesc,
            media_kinds: vec![MediaKind::Photo, MediaKind::Video],
        }
    }

    pub fn after(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }
}

/// A media item as listed by the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub file_name: String,
    pub uri: String,
    pub media_kind: MediaKind,
    pub width: u32,
    pub height: u32,
    /// Milliseconds since the Unix epoch
    pub creation_time: Option<i64>,
    /// Milliseconds since the Unix epoch
    pub modification_time: Option<i64>,
    /// Seconds, videos only
    pub duration: Option<f64>,
}

/// One page of media items
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPage {
    pub items: Vec<MediaItem>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Detailed information about one media item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    pub id: String,
    pub file_name: String,
    pub uri: String,
    /// Readable file URI, when it differs from `uri`
    pub local_uri: Option<String>,
    pub width: u32,
    pub height: u32,
    pub media_kind: MediaKind,
    pub location: Option<Value>,
    pub exif: Option<Value>,
    pub creation_time: Option<i64>,
    pub modification_time: Option<i64>,
}

impl AssetInfo {
    /// URI the file content can be read from.
    pub fn readable_uri(&self) -> Option<&str> {
        self.local_uri
            .as_deref()
            .filter(|u| !u.is_empty())
            .or(Some(self.uri.as_str()).filter(|u| !u.is_empty()))
    }
}

/// Device media library trait
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    async fn get_page(&self, request: MediaPageRequest) -> Result<MediaPage>;

    /// May fail for items the platform cannot resolve; callers degrade.
    async fn get_asset_info(&self, asset_id: &str) -> Result<AssetInfo>;
}
