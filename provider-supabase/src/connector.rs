//! Supabase Storage API connector implementation
//!
//! Implements the `ObjectStore` trait for the Supabase Storage REST API.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::object_store::{ListOptions, ObjectEntry, ObjectInfo, ObjectStore, UploadOptions};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use core_async::time::{sleep, Duration};
use core_auth::SessionManager;
use core_runtime::config::StorageApiConfig;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::SupabaseError;
use crate::types::{ListRequest, ListedObject, ObjectInfoResponse, RemoveRequest, SortBy, StorageErrorBody};

/// Storage API path below the project URL
const STORAGE_API_PATH: &str = "/storage/v1";

/// Attempts per request when the server answers 429 or 5xx
const MAX_ATTEMPTS: u32 = 3;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Uploads carry whole photos and videos
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Supabase Storage connector
///
/// Implements `ObjectStore` for one bucket of a Supabase project.
///
/// # Features
///
/// - Offset-paged listing sorted by name
/// - Info lookups with user metadata
/// - Upserting uploads with `x-metadata` (base64 JSON)
/// - Exponential backoff for rate limiting and server errors
/// - Requests authorised with the signed-in session token, falling back to
///   the project API key
///
/// # Example
///
/// ```ignore
/// use provider_supabase::SupabaseStorageConnector;
/// use bridge_traits::object_store::{ListOptions, ObjectStore};
///
/// let connector = SupabaseStorageConnector::new(http_client, storage_config, sessions);
/// let entries = connector.list(&owner.object_prefix(), ListOptions::new(1000, 0)).await?;
/// ```
pub struct SupabaseStorageConnector {
    http_client: Arc<dyn HttpClient>,
    config: StorageApiConfig,
    sessions: Arc<SessionManager>,
}

impl SupabaseStorageConnector {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        config: StorageApiConfig,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            http_client,
            config,
            sessions,
        }
    }

    fn endpoint(&self, route: &str) -> String {
        format!(
            "{}{}/{}",
            self.config.base_url.trim_end_matches('/'),
            STORAGE_API_PATH,
            route
        )
    }

    /// Object route with every path segment percent-encoded.
    fn object_route(&self, action: &str, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        self.endpoint(&format!("{}/{}/{}", action, self.config.bucket, encoded.join("/")))
    }

    /// `apikey` plus a bearer token: the session token when signed in,
    /// otherwise the API key itself.
    async fn authorize(&self, request: HttpRequest) -> HttpRequest {
        let token = match self.sessions.access_token().await {
            Ok(token) => token,
            Err(e) => {
                debug!("No session token ({}), using API key", e);
                self.config.api_key.clone()
            }
        };

        request
            .header("apikey", self.config.api_key.clone())
            .bearer_token(token)
    }

    fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
        value
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn convert_entry(object: ListedObject) -> ObjectEntry {
        ObjectEntry {
            created_at: Self::parse_timestamp(object.created_at.as_deref()),
            updated_at: Self::parse_timestamp(object.updated_at.as_deref()),
            name: object.name,
            id: object.id,
            metadata: object.metadata,
        }
    }

    fn convert_info(info: ObjectInfoResponse) -> ObjectInfo {
        ObjectInfo {
            created_at: Self::parse_timestamp(info.created_at.as_deref()),
            last_modified: Self::parse_timestamp(info.last_modified.as_deref()),
            id: info.id,
            name: info.name,
            version: info.version,
            bucket_id: info.bucket_id,
            size: info.size,
            content_type: info.content_type,
            cache_control: info.cache_control,
            etag: info.etag,
            metadata: info.metadata,
        }
    }

    /// Map a non-2xx answer to an error.
    ///
    /// The storage server reports missing objects either as a plain 404 or as
    /// a 400 whose body carries `"statusCode": "404"`.
    fn error_for(response: &HttpResponse, path: &str) -> SupabaseError {
        let body: Option<StorageErrorBody> = serde_json::from_slice(&response.body).ok();
        let body_status = body.as_ref().and_then(|b| b.status_code.as_deref());

        if response.status == 404 || body_status == Some("404") {
            return SupabaseError::ObjectNotFound {
                path: path.to_string(),
            };
        }

        let message = body
            .and_then(|b| b.message.or(b.error))
            .unwrap_or_else(|| response.text_lossy());

        SupabaseError::ApiError {
            status_code: response.status,
            message,
        }
    }

    /// Execute API request with retry logic
    ///
    /// Retries with exponential backoff on 429, 5xx and transport errors.
    /// Other answers are returned to the caller as-is.
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn execute_with_retry(&self, request: HttpRequest) -> Result<HttpResponse> {
        let request = self.authorize(request).await;
        let mut attempt = 0;

        loop {
            match self.http_client.execute(request.clone()).await {
                Ok(response) if response.is_rate_limited() || response.is_server_error() => {
                    attempt += 1;
                    if attempt >= MAX_ATTEMPTS {
                        warn!(
                            "Storage request failed after {} attempts: status={}",
                            MAX_ATTEMPTS, response.status
                        );
                        return Ok(response);
                    }

                    let backoff_ms = 100u64 * 2u64.pow(attempt);
                    warn!(
                        "Storage request failed (attempt {}/{}): status={}, retrying in {}ms",
                        attempt, MAX_ATTEMPTS, response.status, backoff_ms
                    );
                    sleep(Duration::from_millis(backoff_ms)).await;
                }
                Ok(response) => {
                    debug!("Storage request finished: status={}", response.status);
                    return Ok(response);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= MAX_ATTEMPTS {
                        warn!("Storage request failed after {} attempts: {}", MAX_ATTEMPTS, e);
                        return Err(e);
                    }

                    let backoff_ms = 100u64 * 2u64.pow(attempt);
                    warn!(
                        "Storage request failed (attempt {}/{}): {}, retrying in {}ms",
                        attempt, MAX_ATTEMPTS, e, backoff_ms
                    );
                    sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorageConnector {
    #[instrument(skip(self), fields(prefix = %prefix, offset = options.offset))]
    async fn list(&self, prefix: &str, options: ListOptions) -> Result<Vec<ObjectEntry>> {
        let body = ListRequest {
            prefix: prefix.to_string(),
            limit: options.limit,
            offset: options.offset,
            sort_by: SortBy::default(),
        };

        let request = HttpRequest::new(
            HttpMethod::Post,
            self.endpoint(&format!("object/list/{}", self.config.bucket)),
        )
        .json(&body)?
        .timeout(REQUEST_TIMEOUT);

        let response = self.execute_with_retry(request).await?;
        if !response.is_success() {
            return Err(Self::error_for(&response, prefix).into());
        }

        let objects: Vec<ListedObject> = serde_json::from_slice(&response.body).map_err(|e| {
            SupabaseError::ParseError(format!("Failed to parse object list: {}", e))
        })?;

        debug!("Listed {} objects", objects.len());
        Ok(objects.into_iter().map(Self::convert_entry).collect())
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn info(&self, path: &str) -> Result<ObjectInfo> {
        let request = HttpRequest::new(HttpMethod::Get, self.object_route("object/info", path))
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        let response = self.execute_with_retry(request).await?;
        if !response.is_success() {
            return Err(Self::error_for(&response, path).into());
        }

        let info: ObjectInfoResponse = serde_json::from_slice(&response.body).map_err(|e| {
            SupabaseError::ParseError(format!("Failed to parse object info: {}", e))
        })?;

        Ok(Self::convert_info(info))
    }

    #[instrument(skip(self, data, options), fields(path = %path, bytes = data.len()))]
    async fn upload(&self, path: &str, data: Bytes, options: UploadOptions) -> Result<()> {
        let metadata = serde_json::to_vec(&options.metadata)
            .map_err(|e| SupabaseError::EncodeError(format!("metadata: {}", e)))?;

        let request = HttpRequest::new(HttpMethod::Post, self.object_route("object", path))
            .header("Content-Type", options.content_type)
            .header("cache-control", format!("max-age={}", options.cache_control))
            .header("x-upsert", options.upsert.to_string())
            .header("x-metadata", STANDARD.encode(metadata))
            .body(data)
            .timeout(UPLOAD_TIMEOUT);

        let response = self.execute_with_retry(request).await?;
        if !response.is_success() {
            return Err(Self::error_for(&response, path).into());
        }

        info!("Uploaded object");
        Ok(())
    }

    #[instrument(skip(self, paths), fields(count = paths.len()))]
    async fn remove(&self, paths: &[String]) -> Result<()> {
        let request = HttpRequest::new(
            HttpMethod::Delete,
            self.endpoint(&format!("object/{}", self.config.bucket)),
        )
        .json(&RemoveRequest { prefixes: paths })?
        .timeout(REQUEST_TIMEOUT);

        let response = self.execute_with_retry(request).await?;
        if !response.is_success() {
            let joined = paths.join(", ");
            return Err(Self::error_for(&response, &joined).into());
        }

        info!("Removed {} objects", paths.len());
        Ok(())
    }
}
