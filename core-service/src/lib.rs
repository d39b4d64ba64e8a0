//! Core service facade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, filesystem,
//! key-value store, media library) and the remote providers (object storage,
//! vision model, image CDN) into the shared Rust core. Desktop apps typically
//! enable the `desktop-shims` feature (which depends on `bridge-desktop`) and
//! call [`bootstrap_desktop`]; other hosts inject their adapters through
//! [`CoreConfig`] and call [`CoreDependencies::from_config`].

pub mod error;
pub mod service;

pub use error::{CoreError, Result};
pub use service::MediaService;

use std::sync::Arc;

use bridge_traits::{
    image_url::ImageUrlBuilder,
    media::MediaLibrary,
    object_store::ObjectStore,
    storage::{FileSystemAccess, KeyValueStore},
    tagging::TaggingService,
    time::{Clock, SystemClock},
};
use core_auth::SessionManager;
use core_runtime::config::CoreConfig;
use core_runtime::events::EventBus;
use provider_gemini::GeminiClient;
use provider_imagekit::ImageKitUrlBuilder;
use provider_supabase::SupabaseStorageConnector;

#[cfg(feature = "desktop-shims")]
use bridge_desktop::{DirectoryMediaLibrary, ReqwestHttpClient, SqliteKeyValueStore, TokioFileSystem};
#[cfg(feature = "desktop-shims")]
use core_sync::SyncConfig;
#[cfg(feature = "desktop-shims")]
use core_tagging::TaggingConfig;
#[cfg(feature = "desktop-shims")]
use tracing::info;

/// Aggregated handle to all dependencies the core requires.
pub struct CoreDependencies {
    pub media_library: Arc<dyn MediaLibrary>,
    pub object_store: Arc<dyn ObjectStore>,
    pub file_system: Arc<dyn FileSystemAccess>,
    pub key_value_store: Arc<dyn KeyValueStore>,
    pub url_builder: Arc<dyn ImageUrlBuilder>,
    /// `None` disables the tagging pipeline
    pub tagging_service: Option<Arc<dyn TaggingService>>,
    pub clock: Arc<dyn Clock>,
    pub sessions: Arc<SessionManager>,
    pub event_bus: EventBus,
}

impl CoreDependencies {
    /// Build the providers from `config` on top of its injected bridges.
    ///
    /// # Errors
    ///
    /// [`CoreError::CapabilityMissing`] naming the first bridge the config
    /// does not carry.
    pub fn from_config(config: &CoreConfig, sessions: Arc<SessionManager>, event_bus: EventBus) -> Result<Self> {
        let http_client = CoreConfig::require(&config.http_client, "HttpClient")?;
        let file_system = CoreConfig::require(&config.file_system, "FileSystemAccess")?;
        let key_value_store = CoreConfig::require(&config.key_value_store, "KeyValueStore")?;
        let media_library = CoreConfig::require(&config.media_library, "MediaLibrary")?;

        let object_store = Arc::new(SupabaseStorageConnector::new(
            http_client.clone(),
            config.storage.clone(),
            sessions.clone(),
        ));
        let url_builder = Arc::new(ImageKitUrlBuilder::new(&config.image_cdn));
        let tagging_service = config.tagging.as_ref().map(|tagging| {
            Arc::new(GeminiClient::new(http_client.clone(), tagging.clone())) as Arc<dyn TaggingService>
        });

        Ok(Self {
            media_library,
            object_store,
            file_system,
            key_value_store,
            url_builder,
            tagging_service,
            clock: Arc::new(SystemClock),
            sessions,
            event_bus,
        })
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Bridges missing from `config` are filled with the `bridge-desktop`
/// adapters: reqwest for HTTP, tokio for files under `cache_dir`, SQLite at
/// `database_path` for the tag cache and a directory scan of `media_root`.
///
/// ```ignore
/// use core_service::bootstrap_desktop;
///
/// let service = bootstrap_desktop(config).await?;
/// service.sessions().sign_in(session).await;
/// service.start().await?;
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(mut config: CoreConfig) -> Result<MediaService> {
    let desktop_http = ReqwestHttpClient::new()?;

    if config.http_client.is_none() {
        config.http_client = Some(Arc::new(desktop_http.clone()));
    }
    if config.file_system.is_none() {
        config.file_system = Some(Arc::new(TokioFileSystem::with_cache_directory(
            config.cache_dir.clone(),
            desktop_http,
        )));
    }
    if config.key_value_store.is_none() {
        let store = SqliteKeyValueStore::new(config.database_path.clone())
            .await
            .map_err(|e| CoreError::InitializationFailed(format!("tag cache: {}", e)))?;
        config.key_value_store = Some(Arc::new(store));
    }
    if config.media_library.is_none() {
        let root = config.media_root.clone().ok_or_else(|| CoreError::CapabilityMissing {
            capability: "MediaLibrary".to_string(),
            message: "Set CoreConfig::media_root or inject a media library".to_string(),
        })?;
        config.media_library = Some(Arc::new(DirectoryMediaLibrary::new(root)));
    }

    let event_bus = EventBus::default();
    let sessions = Arc::new(SessionManager::new(event_bus.clone()));
    let deps = CoreDependencies::from_config(&config, sessions, event_bus)?;

    let service = MediaService::new(deps, SyncConfig::default(), TaggingConfig::default())?;
    info!(tagging = service.has_tagging(), "Desktop core bootstrapped");
    Ok(service)
}
