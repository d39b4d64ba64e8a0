//! Domain models for the photo library
//!
//! An [`Asset`] is what the user sees in the timeline. Local assets come from
//! the device media library and know whether they are backed up; remote
//! assets exist only in the object store and are reconstructed from the
//! metadata block stored with each object.

use bridge_traits::media::{MediaItem, MediaKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

// =============================================================================
// Local assets
// =============================================================================

/// A photo or video from the device media library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalAsset {
    /// Stable per device media item
    pub id: String,
    pub file_name: String,
    /// Device-local URI
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
    pub is_backed_up: bool,
}

impl LocalAsset {
    pub fn from_media_item(item: MediaItem, is_backed_up: bool) -> Self {
        Self {
            id: item.id,
            file_name: item.file_name,
            uri: item.uri,
            media_kind: item.media_kind,
            width: item.width,
            height: item.height,
            creation_time: item.creation_time,
            modification_time: item.modification_time,
            duration: item.duration,
            is_backed_up,
        }
    }

    /// Creation time, or modification time when creation is unknown or zero.
    pub fn timestamp_millis(&self) -> i64 {
        self.creation_time
            .filter(|t| *t != 0)
            .or(self.modification_time)
            .unwrap_or(0)
    }
}

// =============================================================================
// Remote assets
// =============================================================================

/// Metadata block stored with every uploaded object.
///
/// Keys are camelCase on the wire. `location` and `exif` are JSON text, or
/// the empty string when the device had none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMetadata {
    pub id: Option<String>,
    pub file_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub extension: Option<String>,
    pub media_type: Option<String>,
    pub location: Option<String>,
    pub exif: Option<String>,
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn u32_field(map: &Map<String, Value>, key: &str) -> Option<u32> {
    match map.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl RemoteMetadata {
    /// Read a metadata map, accepting numbers or strings for every field.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            id: string_field(map, "id"),
            file_name: string_field(map, "fileName"),
            width: u32_field(map, "width"),
            height: u32_field(map, "height"),
            extension: string_field(map, "extension"),
            media_type: string_field(map, "mediaType"),
            location: string_field(map, "location"),
            exif: string_field(map, "exif"),
        }
    }

    /// Wire form used on upload. Missing text fields become `""`.
    pub fn to_map(&self) -> Map<String, Value> {
        let text = |v: &Option<String>| Value::String(v.clone().unwrap_or_default());
        let mut map = Map::new();
        map.insert("id".into(), text(&self.id));
        map.insert("fileName".into(), text(&self.file_name));
        map.insert("width".into(), Value::from(self.width.unwrap_or(0)));
        map.insert("height".into(), Value::from(self.height.unwrap_or(0)));
        map.insert("extension".into(), text(&self.extension));
        map.insert("mediaType".into(), text(&self.media_type));
        map.insert("location".into(), text(&self.location));
        map.insert("exif".into(), text(&self.exif));
        map
    }

    /// Asset identifier, ignoring empty strings.
    pub fn asset_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// An object in the remote store with no local counterpart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAsset {
    /// Object name within the owner's folder
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub size: Option<u64>,
    pub content_type: Option<String>,
    pub metadata: RemoteMetadata,
}

impl RemoteAsset {
    /// Metadata identifier, falling back to the object name.
    pub fn id(&self) -> &str {
        self.metadata.asset_id().unwrap_or(&self.name)
    }

    /// Created time, then updated time, then the epoch.
    pub fn timestamp_millis(&self) -> i64 {
        self.created_at
            .or(self.updated_at)
            .map(|t| t.timestamp_millis())
            .unwrap_or(0)
    }

    pub fn file_name(&self) -> &str {
        self.metadata
            .file_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.name)
    }

    pub fn media_kind(&self) -> MediaKind {
        match self.metadata.media_type.as_deref() {
            Some("photo") => MediaKind::Photo,
            Some("video") => MediaKind::Video,
            _ => MediaKind::Unknown,
        }
    }
}

// =============================================================================
// Unified asset
// =============================================================================

/// Timeline entry: exactly one of the two shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum Asset {
    Local(LocalAsset),
    Remote(RemoteAsset),
}

impl Asset {
    pub fn id(&self) -> &str {
        match self {
            Asset::Local(local) => &local.id,
            Asset::Remote(remote) => remote.id(),
        }
    }

    pub fn is_local_asset(&self) -> bool {
        matches!(self, Asset::Local(_))
    }

    /// Remote-only assets report `false`: they have nothing local to back up.
    pub fn is_backed_up(&self) -> bool {
        match self {
            Asset::Local(local) => local.is_backed_up,
            Asset::Remote(_) => false,
        }
    }

    pub fn timestamp_millis(&self) -> i64 {
        match self {
            Asset::Local(local) => local.timestamp_millis(),
            Asset::Remote(remote) => remote.timestamp_millis(),
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            Asset::Local(local) => &local.file_name,
            Asset::Remote(remote) => remote.file_name(),
        }
    }

    pub fn media_kind(&self) -> MediaKind {
        match self {
            Asset::Local(local) => local.media_kind,
            Asset::Remote(remote) => remote.media_kind(),
        }
    }

    pub fn as_local(&self) -> Option<&LocalAsset> {
        match self {
            Asset::Local(local) => Some(local),
            Asset::Remote(_) => None,
        }
    }

    pub fn as_remote(&self) -> Option<&RemoteAsset> {
        match self {
            Asset::Remote(remote) => Some(remote),
            Asset::Local(_) => None,
        }
    }
}

impl From<LocalAsset> for Asset {
    fn from(asset: LocalAsset) -> Self {
        Asset::Local(asset)
    }
}

impl From<RemoteAsset> for Asset {
    fn from(asset: RemoteAsset) -> Self {
        Asset::Remote(asset)
    }
}

// =============================================================================
// Tagging output
// =============================================================================

/// Image quality as judged by the vision model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    High,
    Medium,
    Low,
    /// Anything the model answered outside the three known grades
    #[default]
    #[serde(other)]
    Unknown,
}

/// Result of analysing one asset; also the tag cache value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagResult {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub quality: Quality,
}

impl TagResult {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Tagging pipeline output record: the asset plus its analysis, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedAsset {
    pub asset: Asset,
    pub analysis: Option<TagResult>,
}

impl TaggedAsset {
    pub fn plain(asset: Asset) -> Self {
        Self {
            asset,
            analysis: None,
        }
    }

    pub fn enriched(asset: Asset, analysis: TagResult) -> Self {
        Self {
            asset,
            analysis: Some(analysis),
        }
    }

    pub fn tags(&self) -> &[String] {
        self.analysis
            .as_ref()
            .map(|a| a.tags.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_enriched(&self) -> bool {
        self.analysis.is_some()
    }
}
