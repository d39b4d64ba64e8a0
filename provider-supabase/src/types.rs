//! Supabase Storage API request and response types
//!
//! Shapes of the `/storage/v1/object/*` endpoints. Timestamps are kept as
//! strings and parsed by the connector.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sort clause of a list request
#[derive(Debug, Clone, Serialize)]
pub struct SortBy {
    pub column: &'static str,
    pub order: &'static str,
}

impl Default for SortBy {
    fn default() -> Self {
        Self {
            column: "name",
            order: "asc",
        }
    }
}

/// Body of `POST /object/list/{bucket}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    pub prefix: String,
    pub limit: u32,
    pub offset: u32,
    pub sort_by: SortBy,
}

/// One element of the list response
///
/// Folder placeholders come back with a null `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListedObject {
    pub name: String,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Response of `GET /object/info/{bucket}/{path}`
///
/// Older servers answer in camelCase, newer ones in snake_case.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectInfoResponse {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default, alias = "bucketId")]
    pub bucket_id: Option<String>,

    #[serde(default)]
    pub size: Option<u64>,

    #[serde(default, alias = "contentType")]
    pub content_type: Option<String>,

    #[serde(default, alias = "cacheControl")]
    pub cache_control: Option<String>,

    #[serde(default)]
    pub etag: Option<String>,

    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,

    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,

    #[serde(default, alias = "lastModified")]
    pub last_modified: Option<String>,
}

/// Body of `DELETE /object/{bucket}`
#[derive(Debug, Clone, Serialize)]
pub struct RemoveRequest<'a> {
    pub prefixes: &'a [String],
}

/// Error body returned with non-2xx answers
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageErrorBody {
    #[serde(default)]
    pub status_code: Option<String>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}
