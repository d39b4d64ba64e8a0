//! Integration tests for the media service facade
//!
//! Wiring from `CoreConfig`, the tagging capability switch and a start-up
//! followed by a library analysis.

use async_trait::async_trait;
use bridge_desktop::{ReqwestHttpClient, SqliteKeyValueStore, TokioFileSystem};
use bridge_traits::{
    error::Result as BridgeResult,
    media::{AssetInfo, MediaItem, MediaKind, MediaLibrary, MediaPage, MediaPageRequest},
    object_store::{ListOptions, ObjectEntry, ObjectInfo, ObjectStore, UploadOptions},
    tagging::{TaggingRequest, TaggingService},
    time::FixedClock,
};
use bytes::Bytes;
use core_auth::{OwnerId, Session, SessionManager};
use core_runtime::config::{CoreConfig, ImageCdnConfig, StorageApiConfig};
use core_runtime::events::EventBus;
use core_service::{bootstrap_desktop, CoreDependencies, CoreError, MediaService};
use core_sync::{SyncConfig, SyncError};
use core_tagging::TaggingConfig;
use mockall::mock;
use provider_imagekit::ImageKitUrlBuilder;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

mock! {
    Store {}

    #[async_trait]
    impl ObjectStore for Store {
        async fn list(&self, prefix: &str, options: ListOptions) -> BridgeResult<Vec<ObjectEntry>>;
        async fn info(&self, path: &str) -> BridgeResult<ObjectInfo>;
        async fn upload(&self, path: &str, data: Bytes, options: UploadOptions) -> BridgeResult<()>;
        async fn remove(&self, paths: &[String]) -> BridgeResult<()>;
    }
}

mock! {
    Service {}

    #[async_trait]
    impl TaggingService for Service {
        async fn generate(&self, request: TaggingRequest) -> BridgeResult<String>;
    }
}

mock! {
    Library {}

    #[async_trait]
    impl MediaLibrary for Library {
        async fn get_page(&self, request: MediaPageRequest) -> BridgeResult<MediaPage>;
        async fn get_asset_info(&self, asset_id: &str) -> BridgeResult<AssetInfo>;
    }
}

fn empty_store() -> MockStore {
    let mut store = MockStore::new();
    store.expect_list().returning(|_, _| Ok(vec![]));
    store
}

fn photo(dir: &Path, id: &str) -> MediaItem {
    let path = dir.join(format!("{}.jpg", id));
    std::fs::write(&path, b"jpeg").unwrap();

    MediaItem {
        id: id.to_string(),
        file_name: format!("{}.jpg", id),
        uri: path.display().to_string(),
        media_kind: MediaKind::Photo,
        width: 4,
        height: 3,
        creation_time: Some(10),
        modification_time: Some(10),
        duration: None,
    }
}

async fn dependencies(
    dir: &Path,
    library: MockLibrary,
    tagging_service: Option<Arc<dyn TaggingService>>,
) -> CoreDependencies {
    let event_bus = EventBus::default();

    CoreDependencies {
        media_library: Arc::new(library),
        object_store: Arc::new(empty_store()),
        file_system: Arc::new(TokioFileSystem::with_cache_directory(
            dir.join("cache"),
            ReqwestHttpClient::new().unwrap(),
        )),
        key_value_store: Arc::new(SqliteKeyValueStore::in_memory().await.unwrap()),
        url_builder: Arc::new(ImageKitUrlBuilder::new(&ImageCdnConfig::new(
            "https://ik.imagekit.io/vault",
        ))),
        tagging_service,
        clock: Arc::new(FixedClock::from_millis(7)),
        sessions: Arc::new(SessionManager::new(event_bus.clone())),
        event_bus,
    }
}

fn fast_tagging() -> TaggingConfig {
    TaggingConfig::default()
        .with_base_retry_delay(Duration::ZERO)
        .with_rate_limit_delay(Duration::ZERO)
}

fn base_config(dir: &Path) -> core_runtime::config::CoreConfigBuilder {
    CoreConfig::builder()
        .database_path(dir.join("tags.db"))
        .cache_dir(dir.join("cache"))
        .storage(StorageApiConfig::new("https://xyz.supabase.co", "anon"))
        .image_cdn(ImageCdnConfig::new("https://ik.imagekit.io/vault"))
}

#[tokio::test]
async fn test_from_config_requires_bridges() {
    let dir = tempfile::tempdir().unwrap();
    let config = base_config(dir.path()).build().unwrap();
    let bus = EventBus::default();

    let result = CoreDependencies::from_config(&config, Arc::new(SessionManager::new(bus.clone())), bus);

    assert!(matches!(
        result,
        Err(CoreError::CapabilityMissing { ref capability, .. }) if capability == "HttpClient"
    ));
}

#[tokio::test]
async fn test_analyze_without_tagging_is_capability_missing() {
    let dir = tempfile::tempdir().unwrap();
    let deps = dependencies(dir.path(), MockLibrary::new(), None).await;
    let service = MediaService::new(deps, SyncConfig::default(), fast_tagging()).unwrap();

    assert!(!service.has_tagging());
    assert!(matches!(
        service.analyze(&[]).await,
        Err(CoreError::CapabilityMissing { .. })
    ));
}

#[tokio::test]
async fn test_bootstrap_desktop_needs_sign_in_to_start() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("Pictures")).unwrap();

    let config = base_config(dir.path())
        .media_root(dir.path().join("Pictures"))
        .build()
        .unwrap();

    let service = bootstrap_desktop(config).await.unwrap();

    assert!(!service.has_tagging());
    assert!(matches!(
        service.start().await,
        Err(CoreError::Sync(SyncError::NotAuthenticated))
    ));
}

#[tokio::test]
async fn test_bootstrap_desktop_without_media_root() {
    let dir = tempfile::tempdir().unwrap();
    let config = base_config(dir.path()).build().unwrap();

    assert!(matches!(
        bootstrap_desktop(config).await,
        Err(CoreError::CapabilityMissing { ref capability, .. }) if capability == "MediaLibrary"
    ));
}

#[tokio::test]
async fn test_start_then_analyze_library() {
    let dir = tempfile::tempdir().unwrap();
    let items = vec![photo(dir.path(), "a"), photo(dir.path(), "b")];

    let mut library = MockLibrary::new();
    library.expect_get_page().returning(move |_| {
        Ok(MediaPage {
            items: items.clone(),
            has_next_page: false,
            end_cursor: None,
        })
    });

    let mut tagger = MockService::new();
    tagger.expect_generate().times(2).returning(|_| {
        Ok(r#"{"tags":["garden"],"caption":"Flowers","quality":"medium"}"#.to_string())
    });

    let deps = dependencies(dir.path(), library, Some(Arc::new(tagger))).await;
    let service = MediaService::new(deps, SyncConfig::default(), fast_tagging()).unwrap();
    service
        .sessions()
        .sign_in(Session::new(OwnerId::new(), "token"))
        .await;

    service.start().await.unwrap();
    assert_eq!(service.assets().await.assets.len(), 2);
    assert_eq!(service.uploaded_count().await, 0);

    let outcome = service.analyze_library().await.unwrap().unwrap();
    assert_eq!(outcome.enriched_count(), 2);
    assert_eq!(outcome.highlights.len(), 1);
    assert_eq!(outcome.highlights[0].id, "tag-garden-7");
    assert!(!service.is_tagging());

    service.shutdown();
    assert!(service.analyze_library().await.unwrap().is_none());
}
