//! Integration tests for the reconciliation flow
//!
//! These tests drive the coordinator against an in-memory object store and
//! media library:
//! - Start-up: backup index, incremental local load, remote-only assets
//! - Upload and delete patching the index and local annotations
//! - Reload gating once the local library is fully loaded
//! - Discarding results after shutdown

use async_trait::async_trait;
use bridge_desktop::{ReqwestHttpClient, TokioFileSystem};
use bridge_traits::{
    error::{BridgeError, Result},
    media::{AssetInfo, MediaItem, MediaKind, MediaLibrary, MediaPage, MediaPageRequest},
    object_store::{ListOptions, ObjectEntry, ObjectInfo, ObjectStore, UploadOptions},
};
use bytes::Bytes;
use chrono::DateTime;
use core_auth::{OwnerId, Session, SessionManager};
use core_library::Asset;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, SyncEvent};
use core_sync::{LibraryCoordinator, SyncConfig, SyncError};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// In-memory collaborators
// ============================================================================

/// Object store keyed by full object path
#[derive(Default)]
struct MemoryStore {
    objects: Mutex<BTreeMap<String, ObjectInfo>>,
}

impl MemoryStore {
    fn put(&self, path: &str, id: &str, created_millis: i64) {
        self.objects.lock().unwrap().insert(
            path.to_string(),
            ObjectInfo {
                name: Some(path.to_string()),
                size: Some(10),
                content_type: Some("image/jpeg".into()),
                created_at: DateTime::from_timestamp_millis(created_millis),
                metadata: json!({ "id": id, "fileName": path.rsplit('/').next().unwrap() })
                    .as_object()
                    .cloned(),
                ..Default::default()
            },
        );
    }

    fn contains(&self, path: &str) -> bool {
        self.objects.lock().unwrap().contains_key(path)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, prefix: &str, options: ListOptions) -> Result<Vec<ObjectEntry>> {
        let folder = format!("{}/", prefix);
        let objects = self.objects.lock().unwrap();
        Ok(objects
            .keys()
            .filter_map(|path| path.strip_prefix(&folder))
            .skip(options.offset as usize)
            .take(options.limit as usize)
            .map(|name| ObjectEntry {
                name: name.to_string(),
                ..Default::default()
            })
            .collect())
    }

    async fn info(&self, path: &str) -> Result<ObjectInfo> {
        self.objects
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| BridgeError::NotFound(path.to_string()))
    }

    async fn upload(&self, path: &str, data: Bytes, options: UploadOptions) -> Result<()> {
        self.objects.lock().unwrap().insert(
            path.to_string(),
            ObjectInfo {
                name: Some(path.to_string()),
                size: Some(data.len() as u64),
                content_type: Some(options.content_type),
                created_at: DateTime::from_timestamp_millis(500),
                metadata: Some(options.metadata),
                ..Default::default()
            },
        );
        Ok(())
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            objects.remove(path);
        }
        Ok(())
    }
}

/// Media library paged by offset cursor
struct MemoryLibrary {
    items: Vec<MediaItem>,
}

#[async_trait]
impl MediaLibrary for MemoryLibrary {
    async fn get_page(&self, request: MediaPageRequest) -> Result<MediaPage> {
        let start: usize = request.cursor.as_deref().unwrap_or("0").parse().unwrap();
        let end = (start + request.page_size as usize).min(self.items.len());
        Ok(MediaPage {
            items: self.items[start..end].to_vec(),
            has_next_page: end < self.items.len(),
            end_cursor: Some(end.to_string()),
        })
    }

    async fn get_asset_info(&self, asset_id: &str) -> Result<AssetInfo> {
        let item = self
            .items
            .iter()
            .find(|item| item.id == asset_id)
            .ok_or_else(|| BridgeError::NotFound(asset_id.to_string()))?;

        Ok(AssetInfo {
            id: item.id.clone(),
            file_name: item.file_name.clone(),
            uri: item.uri.clone(),
            local_uri: None,
            width: item.width,
            height: item.height,
            media_kind: item.media_kind,
            location: Some(json!({ "latitude": 1.5, "longitude": 2.5 })),
            exif: None,
            creation_time: item.creation_time,
            modification_time: item.modification_time,
        })
    }
}

fn media_item(dir: &Path, id: &str, time: i64) -> MediaItem {
    let file_name = format!("IMG_{}.jpg", id);
    let path = dir.join(&file_name);
    std::fs::write(&path, format!("jpeg bytes {}", id)).unwrap();

    MediaItem {
        id: id.to_string(),
        file_name,
        uri: format!("file://{}", path.display()),
        media_kind: MediaKind::Photo,
        width: 640,
        height: 480,
        creation_time: Some(time),
        modification_time: Some(time),
        duration: None,
    }
}

struct Harness {
    coordinator: LibraryCoordinator,
    store: Arc<MemoryStore>,
    owner: OwnerId,
    bus: EventBus,
    _dir: tempfile::TempDir,
}

async fn harness(page_size: u32) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let owner = OwnerId::new();

    let store = Arc::new(MemoryStore::default());
    store.put(&owner.object_path("IMG_2.jpg"), "2", 60);
    store.put(&owner.object_path("IMG_3.jpg"), "3", 75);

    let library = MemoryLibrary {
        items: vec![
            media_item(dir.path(), "1", 100),
            media_item(dir.path(), "2", 50),
        ],
    };

    let bus = EventBus::default();
    let sessions = Arc::new(SessionManager::new(bus.clone()));
    sessions.sign_in(Session::new(owner, "access-token")).await;

    let file_system = TokioFileSystem::with_cache_directory(
        dir.path().join("cache"),
        ReqwestHttpClient::new().unwrap(),
    );

    let coordinator = LibraryCoordinator::new(
        SyncConfig::default()
            .with_local_page_size(page_size)
            .with_local_page_delay(Duration::ZERO),
        store.clone(),
        Arc::new(library),
        Arc::new(file_system),
        sessions,
        bus.clone(),
    )
    .unwrap();

    Harness {
        coordinator,
        store,
        owner,
        bus,
        _dir: dir,
    }
}

fn ids(assets: &[Asset]) -> Vec<&str> {
    assets.iter().map(Asset::id).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_start_merges_local_and_remote_only_assets() {
    let h = harness(1).await;
    let mut events = h.bus.subscribe();

    h.coordinator.start().await.unwrap();

    let merged = h.coordinator.assets().await;
    assert_eq!(ids(&merged.assets), vec!["1", "3", "2"]);
    assert_eq!(merged.uploaded_count, 1);
    assert!(merged.assets[2].is_local_asset());
    assert!(merged.assets[2].is_backed_up());
    assert!(!merged.assets[1].is_local_asset());
    assert!(h.coordinator.is_fully_loaded().await);

    let mut batches = 0;
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Library(LibraryEvent::LocalBatchLoaded { batch_size, .. }) = event {
            assert_eq!(batch_size, 1);
            batches += 1;
        }
    }
    assert_eq!(batches, 2);
}

#[tokio::test]
async fn test_upload_marks_asset_backed_up() {
    let h = harness(500).await;
    h.coordinator.start().await.unwrap();
    let mut events = h.bus.subscribe();

    let asset = h.coordinator.get_asset_by_id("1").await.unwrap();
    let local = asset.as_local().unwrap().clone();
    assert!(!local.is_backed_up);

    let path = h.coordinator.operations().sync_to_cloud(&local).await.unwrap();

    assert_eq!(path, h.owner.object_path("IMG_1.jpg"));
    assert!(h.store.contains(&path));

    let uploaded = h.store.info(&path).await.unwrap();
    assert_eq!(uploaded.metadata_str("id"), Some("1"));
    assert_eq!(uploaded.metadata_str("extension"), Some("jpg"));
    assert_eq!(uploaded.metadata_str("exif"), Some(""));
    assert!(uploaded.metadata_str("location").unwrap().contains("latitude"));

    let state = h.coordinator.snapshot().await;
    assert!(state.backup_index.contains("1"));
    let merged = state.merged();
    assert_eq!(merged.uploaded_count, 2);
    assert_eq!(ids(&merged.assets), vec!["1", "3", "2"]);

    let mut saw_upload = false;
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Sync(SyncEvent::Uploaded { asset_id, .. }) = event {
            assert_eq!(asset_id, "1");
            saw_upload = true;
        }
    }
    assert!(saw_upload);
}

#[tokio::test]
async fn test_delete_unmarks_asset() {
    let h = harness(500).await;
    h.coordinator.start().await.unwrap();

    let asset = h.coordinator.get_asset_by_id("2").await.unwrap();
    assert!(h.coordinator.operations().delete_from_cloud(&asset).await);

    assert!(!h.store.contains(&h.owner.object_path("IMG_2.jpg")));
    let state = h.coordinator.snapshot().await;
    assert!(!state.backup_index.contains("2"));
    assert_eq!(state.remote_assets.len(), 1);
    assert_eq!(state.merged().uploaded_count, 0);
}

#[tokio::test]
async fn test_remote_only_asset_info() {
    let h = harness(500).await;
    h.coordinator.start().await.unwrap();

    let remote = h.coordinator.get_asset_by_id("3").await.unwrap();
    let info = h.coordinator.operations().get_info_asset(&remote).await.unwrap();

    assert_eq!(info.metadata.asset_id(), Some("3"));
    assert_eq!(info.created_at.timestamp_millis(), 75);
    assert_eq!(info.etag, "");
}

#[tokio::test]
async fn test_fetch_assets_skips_when_fully_loaded() {
    let h = harness(500).await;

    assert!(h.coordinator.fetch_assets().await);
    assert!(h.coordinator.is_fully_loaded().await);
    assert!(!h.coordinator.fetch_assets().await);
}

#[tokio::test]
async fn test_shutdown_discards_late_results() {
    let h = harness(500).await;
    h.coordinator.start().await.unwrap();
    h.coordinator.shutdown();

    let asset = h.coordinator.get_asset_by_id("1").await.unwrap();
    let result = h
        .coordinator
        .operations()
        .sync_to_cloud(asset.as_local().unwrap())
        .await;

    assert!(matches!(result, Err(SyncError::Cancelled)));
    assert!(!h.coordinator.snapshot().await.backup_index.contains("1"));
    assert!(matches!(
        h.coordinator.reload_backup_index().await,
        Err(SyncError::Cancelled)
    ));
}

#[tokio::test]
async fn test_start_requires_owner() {
    let h = harness(500).await;
    let sessions = Arc::new(SessionManager::new(h.bus.clone()));

    let coordinator = LibraryCoordinator::new(
        SyncConfig::default(),
        h.store.clone(),
        Arc::new(MemoryLibrary { items: vec![] }),
        Arc::new(TokioFileSystem::with_cache_directory(
            std::env::temp_dir(),
            ReqwestHttpClient::new().unwrap(),
        )),
        sessions,
        h.bus.clone(),
    )
    .unwrap();

    assert!(matches!(
        coordinator.start().await,
        Err(SyncError::NotAuthenticated)
    ));
}
