//! # Core Configuration Module
//!
//! Builder-style configuration for the photo vault core.
//!
//! ## Overview
//!
//! [`CoreConfig`] holds the paths, remote service settings and optionally
//! injected bridge implementations. `build()` validates everything up front so
//! a missing API key fails at start-up rather than on the first upload.
//!
//! ## Required settings
//!
//! - `database_path` - SQLite file holding the tag cache
//! - `cache_dir` - downloaded previews and shared images
//! - [`StorageApiConfig`] - object store endpoint, key and bucket
//! - [`ImageCdnConfig`] - URL endpoint used for remote previews
//!
//! ## Optional settings
//!
//! - [`TaggingApiConfig`] - without it the tagging pipeline is unavailable
//! - `media_root` - directory scanned by the desktop media library
//! - Bridges (`HttpClient`, `FileSystemAccess`, `KeyValueStore`,
//!   `MediaLibrary`); `core-service` fills missing ones with desktop defaults
//!   when its `desktop-shims` feature is on
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, ImageCdnConfig, StorageApiConfig, TaggingApiConfig};
//!
//! let config = CoreConfig::builder()
//!     .database_path("/home/ana/.local/share/photo-vault/tags.db")
//!     .cache_dir("/home/ana/.cache/photo-vault")
//!     .media_root("/home/ana/Pictures")
//!     .storage(StorageApiConfig::new("https://xyz.supabase.co", "anon-key"))
//!     .image_cdn(ImageCdnConfig::new("https://ik.imagekit.io/vault"))
//!     .tagging(TaggingApiConfig::new("gemini-key"))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{FileSystemAccess, HttpClient, KeyValueStore, MediaLibrary};
use std::path::PathBuf;
use std::sync::Arc;

/// Default object store bucket.
pub const DEFAULT_BUCKET: &str = "assets";

/// Default vision model.
pub const DEFAULT_TAGGING_MODEL: &str = "gemini-2.0-flash-lite";

/// Default tagging API base URL.
pub const DEFAULT_TAGGING_BASE_URL: &str = "https://generativelanguage.googleapis.com";

fn validate_http_url(name: &str, url: &str) -> Result<()> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{} must be an http(s) URL, got '{}'",
            name, url
        )))
    }
}

fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::Config(format!("{} cannot be empty", name)))
    } else {
        Ok(())
    }
}

// ============================================================================
// Remote service settings
// ============================================================================

/// Object storage (Supabase Storage) settings.
#[derive(Clone, PartialEq, Eq)]
pub struct StorageApiConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub base_url: String,
    /// Anonymous/public API key sent as `apikey`
    pub api_key: String,
    pub bucket: String,
}

impl StorageApiConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            bucket: DEFAULT_BUCKET.to_string(),
        }
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_http_url("Storage base URL", &self.base_url)?;
        require_non_empty("Storage API key", &self.api_key)?;
        require_non_empty("Storage bucket", &self.bucket)?;
        if self.bucket.contains('/') {
            return Err(Error::Config(
                "Storage bucket must not contain '/'".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for StorageApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// Vision model (Gemini) settings.
#[derive(Clone, PartialEq, Eq)]
pub struct TaggingApiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl TaggingApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_TAGGING_MODEL.to_string(),
            base_url: DEFAULT_TAGGING_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("Tagging API key", &self.api_key)?;
        require_non_empty("Tagging model", &self.model)?;
        validate_http_url("Tagging base URL", &self.base_url)
    }
}

impl std::fmt::Debug for TaggingApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaggingApiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Image CDN (ImageKit) settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCdnConfig {
    /// e.g. `https://ik.imagekit.io/your_id`
    pub url_endpoint: String,
}

impl ImageCdnConfig {
    pub fn new(url_endpoint: impl Into<String>) -> Self {
        Self {
            url_endpoint: url_endpoint.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_http_url("Image CDN endpoint", &self.url_endpoint)
    }
}

// ============================================================================
// CoreConfig
// ============================================================================

/// Core configuration. Build with [`CoreConfig::builder`].
#[derive(Clone)]
pub struct CoreConfig {
    /// SQLite file backing the tag cache
    pub database_path: PathBuf,
    pub cache_dir: PathBuf,
    /// Root directory for the desktop media library
    pub media_root: Option<PathBuf>,
    pub storage: StorageApiConfig,
    pub tagging: Option<TaggingApiConfig>,
    pub image_cdn: ImageCdnConfig,
    pub http_client: Option<Arc<dyn HttpClient>>,
    pub file_system: Option<Arc<dyn FileSystemAccess>>,
    pub key_value_store: Option<Arc<dyn KeyValueStore>>,
    pub media_library: Option<Arc<dyn MediaLibrary>>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("cache_dir", &self.cache_dir)
            .field("media_root", &self.media_root)
            .field("storage", &self.storage)
            .field("tagging", &self.tagging)
            .field("image_cdn", &self.image_cdn)
            .field("http_client", &self.http_client.is_some())
            .field("file_system", &self.file_system.is_some())
            .field("key_value_store", &self.key_value_store.is_some())
            .field("media_library", &self.media_library.is_some())
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Checks paths and every remote service section.
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.cache_dir.as_os_str().is_empty() {
            return Err(Error::Config("Cache directory cannot be empty".to_string()));
        }

        if let Some(root) = &self.media_root {
            if root.as_os_str().is_empty() {
                return Err(Error::Config("Media root cannot be empty".to_string()));
            }
        }

        self.storage.validate()?;
        self.image_cdn.validate()?;
        if let Some(tagging) = &self.tagging {
            tagging.validate()?;
        }

        Ok(())
    }

    /// Returns the injected bridge or a `CapabilityMissing` error naming it.
    pub fn require<T: ?Sized>(bridge: &Option<Arc<T>>, capability: &str) -> Result<Arc<T>> {
        bridge.clone().ok_or_else(|| Error::CapabilityMissing {
            capability: capability.to_string(),
            message: format!(
                "No {} implementation provided. Desktop: enable the desktop-shims feature. \
                 Other hosts: inject a platform adapter.",
                capability
            ),
        })
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    media_root: Option<PathBuf>,
    storage: Option<StorageApiConfig>,
    tagging: Option<TaggingApiConfig>,
    image_cdn: Option<ImageCdnConfig>,
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    key_value_store: Option<Arc<dyn KeyValueStore>>,
    media_library: Option<Arc<dyn MediaLibrary>>,
}

impl CoreConfigBuilder {
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn cache_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.into());
        self
    }

    pub fn media_root<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.media_root = Some(path.into());
        self
    }

    pub fn storage(mut self, storage: StorageApiConfig) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn tagging(mut self, tagging: TaggingApiConfig) -> Self {
        self.tagging = Some(tagging);
        self
    }

    pub fn image_cdn(mut self, cdn: ImageCdnConfig) -> Self {
        self.image_cdn = Some(cdn);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    pub fn key_value_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.key_value_store = Some(store);
        self
    }

    pub fn media_library(mut self, library: Arc<dyn MediaLibrary>) -> Self {
        self.media_library = Some(library);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] naming the first missing or invalid setting.
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let cache_dir = self.cache_dir.ok_or_else(|| {
            Error::Config("Cache directory is required. Use .cache_dir() to set it.".to_string())
        })?;

        let storage = self.storage.ok_or_else(|| {
            Error::Config("Storage settings are required. Use .storage() to set them.".to_string())
        })?;

        let image_cdn = self.image_cdn.ok_or_else(|| {
            Error::Config("Image CDN settings are required. Use .image_cdn() to set them.".to_string())
        })?;

        let config = CoreConfig {
            database_path,
            cache_dir,
            media_root: self.media_root,
            storage,
            tagging: self.tagging,
            image_cdn,
            http_client: self.http_client,
            file_system: self.file_system,
            key_value_store: self.key_value_store,
            media_library: self.media_library,
        };

        config.validate()?;
        Ok(config)
    }
}
