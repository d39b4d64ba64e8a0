//! # Sync Operations
//!
//! User-initiated changes to the remote copy of a single asset, plus the
//! lookups hosts use to show asset details.
//!
//! ## Failure contracts
//!
//! - [`SyncOperations::sync_to_cloud`] returns an error on any failure and
//!   leaves the backup index and local annotation untouched.
//! - [`SyncOperations::delete_from_cloud`] never returns an error. It logs,
//!   emits [`SyncEvent::DeleteFailed`] and reports `false`.
//!
//! After either operation succeeds the backup index and the local asset are
//! patched in place and remote assets are reloaded. Two concurrent uploads
//! of the same asset are not deduplicated here; callers must not issue them.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bridge_traits::media::{AssetInfo, MediaLibrary};
use bridge_traits::object_store::{ObjectStore, UploadOptions};
use bridge_traits::storage::FileSystemAccess;
use chrono::{DateTime, Utc};
use core_async::sync::CancellationToken;
use core_auth::{OwnerId, SessionManager};
use core_library::{Asset, LocalAsset, RemoteMetadata};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::remote_loader::RemoteAssetLoader;
use crate::state::SharedLibraryState;

// ============================================================================
// Info types
// ============================================================================

/// Object info with every field filled in.
///
/// Missing text becomes `""` and a missing size becomes `0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAssetInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    pub bucket_id: String,
    pub size: u64,
    pub content_type: String,
    pub cache_control: String,
    pub etag: String,
    pub metadata: RemoteMetadata,
    pub created_at: DateTime<Utc>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Details shown for one timeline entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum DetailedInfo {
    Local { info: AssetInfo, size: u64 },
    Remote(RemoteAssetInfo),
}

/// Counts an operation as in flight until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Object name of an asset inside the owner's folder.
fn object_name(asset: &Asset) -> &str {
    match asset {
        Asset::Local(local) => &local.file_name,
        Asset::Remote(remote) => &remote.name,
    }
}

fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(OsStr::to_str)
        .filter(|ext| !ext.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| "jpeg".to_string())
}

fn json_text(value: &Option<Value>) -> Option<String> {
    value
        .as_ref()
        .filter(|v| !v.is_null())
        .map(Value::to_string)
}

/// Info built from what the timeline already knows, used when the media
/// library cannot resolve the asset.
fn degraded_info(asset: &LocalAsset) -> AssetInfo {
    AssetInfo {
        id: asset.id.clone(),
        file_name: asset.file_name.clone(),
        uri: asset.uri.clone(),
        local_uri: None,
        width: asset.width,
        height: asset.height,
        media_kind: asset.media_kind,
        location: None,
        exif: None,
        creation_time: asset.creation_time,
        modification_time: asset.modification_time,
    }
}

// ============================================================================
// Operations
// ============================================================================

pub struct SyncOperations {
    store: Arc<dyn ObjectStore>,
    media: Arc<dyn MediaLibrary>,
    file_system: Arc<dyn FileSystemAccess>,
    sessions: Arc<SessionManager>,
    state: SharedLibraryState,
    remote_loader: Arc<RemoteAssetLoader>,
    event_bus: EventBus,
    config: SyncConfig,
    cancel: CancellationToken,
    uploads: AtomicUsize,
    deletes: AtomicUsize,
}

impl SyncOperations {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        media: Arc<dyn MediaLibrary>,
        file_system: Arc<dyn FileSystemAccess>,
        sessions: Arc<SessionManager>,
        state: SharedLibraryState,
        remote_loader: Arc<RemoteAssetLoader>,
        event_bus: EventBus,
        config: SyncConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            media,
            file_system,
            sessions,
            state,
            remote_loader,
            event_bus,
            config,
            cancel,
            uploads: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.uploads.load(Ordering::SeqCst) > 0
    }

    pub fn is_deleting(&self) -> bool {
        self.deletes.load(Ordering::SeqCst) > 0
    }

    /// Upload a local asset and mark it backed up.
    ///
    /// Returns the object path written.
    #[instrument(skip(self, asset), fields(asset_id = %asset.id))]
    pub async fn sync_to_cloud(&self, asset: &LocalAsset) -> Result<String> {
        let _in_flight = InFlight::enter(&self.uploads);

        match self.upload(asset).await {
            Ok(path) => Ok(path),
            Err(e) => {
                warn!(error = %e, "Upload failed");
                self.event_bus
                    .emit(CoreEvent::Sync(SyncEvent::UploadFailed {
                        asset_id: asset.id.clone(),
                        message: e.to_string(),
                    }))
                    .ok();
                Err(e)
            }
        }
    }

    async fn upload(&self, asset: &LocalAsset) -> Result<String> {
        let info = match self.media.get_asset_info(&asset.id).await {
            Ok(info) => info,
            Err(e) => {
                debug!(error = %e, "Asset info unavailable, using timeline fields");
                degraded_info(asset)
            }
        };

        let uri = info
            .readable_uri()
            .ok_or_else(|| SyncError::MissingUri {
                asset_id: asset.id.clone(),
            })?
            .to_string();
        let owner = self.sessions.require_owner().await?;

        let data = self
            .file_system
            .read_file(&uri)
            .await
            .map_err(|e| SyncError::ReadFailed(e.to_string()))?;

        let path = owner.object_path(&info.file_name);
        let content_type = mime_guess::from_path(&info.file_name)
            .first_raw()
            .unwrap_or(self.config.default_content_type.as_str())
            .to_string();
        let metadata = RemoteMetadata {
            id: Some(asset.id.clone()),
            file_name: Some(info.file_name.clone()),
            width: Some(info.width),
            height: Some(info.height),
            extension: Some(file_extension(&info.file_name)),
            media_type: Some(info.media_kind.as_str().to_string()),
            location: json_text(&info.location),
            exif: json_text(&info.exif),
        };

        let size = data.len();
        self.store
            .upload(
                &path,
                data,
                UploadOptions {
                    content_type,
                    cache_control: self.config.bucket_cache_control.clone(),
                    upsert: true,
                    metadata: metadata.to_map(),
                },
            )
            .await
            .map_err(|e| SyncError::UploadFailed {
                path: path.clone(),
                message: e.to_string(),
            })?;

        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        {
            let mut state = self.state.write().await;
            state.backup_index.insert(asset.id.clone());
            state.set_backed_up(&asset.id, true);
        }

        info!(path = %path, size, "Asset backed up");
        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::Uploaded {
                asset_id: asset.id.clone(),
                path: path.clone(),
            }))
            .ok();

        self.refresh_remote(&owner).await;
        Ok(path)
    }

    /// Remove an asset's object from the store. Returns whether it was removed.
    #[instrument(skip(self, asset), fields(asset_id = %asset.id()))]
    pub async fn delete_from_cloud(&self, asset: &Asset) -> bool {
        let _in_flight = InFlight::enter(&self.deletes);

        match self.delete(asset).await {
            Ok(path) => {
                info!(path = %path, "Asset removed from cloud");
                true
            }
            Err(e) => {
                warn!(error = %e, "Delete failed");
                self.event_bus
                    .emit(CoreEvent::Sync(SyncEvent::DeleteFailed {
                        asset_id: asset.id().to_string(),
                        message: e.to_string(),
                    }))
                    .ok();
                false
            }
        }
    }

    async fn delete(&self, asset: &Asset) -> Result<String> {
        let owner = self.sessions.require_owner().await?;
        let path = owner.object_path(object_name(asset));

        self.store.remove(std::slice::from_ref(&path)).await?;

        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        {
            let mut state = self.state.write().await;
            state.backup_index.remove(asset.id());
            state.set_backed_up(asset.id(), false);
        }

        self.event_bus
            .emit(CoreEvent::Sync(SyncEvent::Deleted {
                asset_id: asset.id().to_string(),
                path: path.clone(),
            }))
            .ok();

        self.refresh_remote(&owner).await;
        Ok(path)
    }

    async fn refresh_remote(&self, owner: &OwnerId) {
        if let Err(e) = self.remote_loader.refresh(owner, &self.cancel).await {
            warn!(error = %e, "Remote refresh after sync failed");
        }
    }

    /// Normalized object info for an asset's remote copy.
    #[instrument(skip(self, asset), fields(asset_id = %asset.id()))]
    pub async fn get_info_asset(&self, asset: &Asset) -> Result<RemoteAssetInfo> {
        let owner = self.sessions.require_owner().await?;
        let path = owner.object_path(object_name(asset));

        let info = match self.store.info(&path).await {
            Ok(info) => info,
            Err(e) if e.is_not_found() => {
                return Err(SyncError::AssetNotFound(asset.id().to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let created_at = info
            .created_at
            .ok_or_else(|| SyncError::AssetNotFound(asset.id().to_string()))?;
        let metadata = info
            .metadata
            .as_ref()
            .map(RemoteMetadata::from_map)
            .unwrap_or_default();

        Ok(RemoteAssetInfo {
            id: info.id.unwrap_or_default(),
            name: info.name.unwrap_or_default(),
            version: info.version.unwrap_or_default(),
            bucket_id: info.bucket_id.unwrap_or_default(),
            size: info.size.unwrap_or(0),
            content_type: info.content_type.unwrap_or_default(),
            cache_control: info.cache_control.unwrap_or_default(),
            etag: info.etag.unwrap_or_default(),
            metadata,
            created_at,
            last_modified: info.last_modified,
        })
    }

    /// Native info plus file size for local assets, normalized object info
    /// for remote ones. `None` on any failure.
    #[instrument(skip(self, asset), fields(asset_id = %asset.id()))]
    pub async fn get_detailed_info(&self, asset: &Asset) -> Option<DetailedInfo> {
        match asset {
            Asset::Local(local) => {
                let info = match self.media.get_asset_info(&local.id).await {
                    Ok(info) => info,
                    Err(e) => {
                        debug!(error = %e, "No native info for asset");
                        return None;
                    }
                };
                let size = match info.readable_uri() {
                    Some(uri) => self
                        .file_system
                        .get_info(uri)
                        .await
                        .map(|file| file.size)
                        .unwrap_or(0),
                    None => 0,
                };
                Some(DetailedInfo::Local { info, size })
            }
            Asset::Remote(_) => match self.get_info_asset(asset).await {
                Ok(info) => Some(DetailedInfo::Remote(info)),
                Err(e) => {
                    debug!(error = %e, "No remote info for asset");
                    None
                }
            },
        }
    }

    /// Download a remote image into the cache directory, reusing an earlier
    /// download of the same asset.
    #[instrument(skip(self, url))]
    pub async fn cache_remote_image(&self, url: &str, asset_id: &str) -> Result<PathBuf> {
        let cache_dir = self.file_system.get_cache_directory().await?;
        let path = cache_dir.join(format!("cache_image_{}.jpg", asset_id));

        if self
            .file_system
            .get_info(&path.to_string_lossy())
            .await?
            .exists
        {
            debug!(path = ?path, "Cached image reused");
            return Ok(path);
        }

        let result = self.file_system.download(url, &path).await?;
        if result.status != 200 {
            return Err(SyncError::DownloadFailed {
                status: result.status,
            });
        }
        Ok(result.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LibraryState;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::media::{MediaKind, MediaPage, MediaPageRequest};
    use bridge_traits::object_store::{ListOptions, ObjectEntry, ObjectInfo};
    use bridge_traits::storage::{DownloadResult, FileInfo};
    use bytes::Bytes;
    use core_auth::Session;
    use mockall::mock;
    use serde_json::json;

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
        Library {}

        #[async_trait]
        impl MediaLibrary for Library {
            async fn get_page(&self, request: MediaPageRequest) -> BridgeResult<MediaPage>;
            async fn get_asset_info(&self, asset_id: &str) -> BridgeResult<AssetInfo>;
        }
    }

    mock! {
        Fs {}

        #[async_trait]
        impl FileSystemAccess for Fs {
            async fn get_cache_directory(&self) -> BridgeResult<PathBuf>;
            async fn read_file(&self, uri: &str) -> BridgeResult<Bytes>;
            async fn read_as_base64(&self, uri: &str) -> BridgeResult<String>;
            async fn download(&self, url: &str, dest: &Path) -> BridgeResult<DownloadResult>;
            async fn get_info(&self, uri: &str) -> BridgeResult<FileInfo>;
        }
    }

    fn local(id: &str) -> LocalAsset {
        LocalAsset {
            id: id.to_string(),
            file_name: "IMG_1.HEIC".to_string(),
            uri: "file:///dcim/IMG_1.HEIC".to_string(),
            media_kind: MediaKind::Photo,
            width: 4032,
            height: 3024,
            creation_time: Some(10),
            modification_time: None,
            duration: None,
            is_backed_up: false,
        }
    }

    struct Fixture {
        ops: SyncOperations,
        state: SharedLibraryState,
        owner: OwnerId,
    }

    async fn fixture(store: MockStore, media: MockLibrary, fs: MockFs, signed_in: bool) -> Fixture {
        let store: Arc<dyn ObjectStore> = Arc::new(store);
        let bus = EventBus::default();
        let state = LibraryState::shared();
        state.write().await.local_assets = vec![local("A1")];

        let sessions = Arc::new(SessionManager::new(bus.clone()));
        let owner = OwnerId::new();
        if signed_in {
            sessions.sign_in(Session::new(owner, "token")).await;
        }

        let remote_loader = Arc::new(RemoteAssetLoader::new(
            store.clone(),
            state.clone(),
            bus.clone(),
            1000,
        ));
        let ops = SyncOperations::new(
            store,
            Arc::new(media),
            Arc::new(fs),
            sessions,
            state.clone(),
            remote_loader,
            bus,
            SyncConfig::default(),
            CancellationToken::new(),
        );

        Fixture { ops, state, owner }
    }

    fn failing_media() -> MockLibrary {
        let mut media = MockLibrary::new();
        media
            .expect_get_asset_info()
            .returning(|id| Err(BridgeError::NotFound(id.to_string())));
        media
    }

    #[tokio::test]
    async fn test_upload_success_updates_index_and_asset() {
        let mut store = MockStore::new();
        store
            .expect_upload()
            .withf(|path, data, options| {
                path.ends_with("/IMG_1.HEIC")
                    && &data[..] == b"pixels"
                    && options.upsert
                    && options.cache_control == "3600"
                    && options.metadata["extension"] == json!("heic")
                    && options.metadata["location"] == json!("")
                    && options.metadata["mediaType"] == json!("photo")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        store.expect_list().returning(|_, _| Ok(vec![]));

        let mut fs = MockFs::new();
        fs.expect_read_file()
            .returning(|_| Ok(Bytes::from_static(b"pixels")));

        let f = fixture(store, failing_media(), fs, true).await;
        let path = f.ops.sync_to_cloud(&local("A1")).await.unwrap();

        assert_eq!(path, f.owner.object_path("IMG_1.HEIC"));
        let state = f.state.read().await;
        assert!(state.backup_index.contains("A1"));
        assert!(state.local_assets[0].is_backed_up);
        assert!(!f.ops.is_uploading());
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_state_unchanged() {
        let mut store = MockStore::new();
        store
            .expect_upload()
            .returning(|_, _, _| Err(BridgeError::OperationFailed("status 413".into())));

        let mut fs = MockFs::new();
        fs.expect_read_file()
            .returning(|_| Ok(Bytes::from_static(b"pixels")));

        let f = fixture(store, failing_media(), fs, true).await;
        let result = f.ops.sync_to_cloud(&local("A1")).await;

        assert!(matches!(result, Err(SyncError::UploadFailed { .. })));
        let state = f.state.read().await;
        assert!(!state.backup_index.contains("A1"));
        assert!(!state.local_assets[0].is_backed_up);
    }

    #[tokio::test]
    async fn test_upload_requires_owner() {
        let f = fixture(MockStore::new(), failing_media(), MockFs::new(), false).await;
        let result = f.ops.sync_to_cloud(&local("A1")).await;
        assert!(matches!(result, Err(SyncError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_upload_requires_uri() {
        let mut asset = local("A1");
        asset.uri.clear();

        let f = fixture(MockStore::new(), failing_media(), MockFs::new(), true).await;
        let result = f.ops.sync_to_cloud(&asset).await;
        assert!(matches!(result, Err(SyncError::MissingUri { .. })));
    }

    #[tokio::test]
    async fn test_delete_success_and_failure() {
        let mut store = MockStore::new();
        let mut calls = 0;
        store.expect_remove().returning(move |paths| {
            calls += 1;
            assert_eq!(paths.len(), 1);
            if calls == 1 {
                Ok(())
            } else {
                Err(BridgeError::OperationFailed("status 500".into()))
            }
        });
        store.expect_list().returning(|_, _| Ok(vec![]));

        let f = fixture(store, failing_media(), MockFs::new(), true).await;
        {
            let mut state = f.state.write().await;
            state.backup_index.insert("A1".into());
            state.local_assets[0].is_backed_up = true;
        }

        let asset = Asset::Local(f.state.read().await.local_assets[0].clone());
        assert!(f.ops.delete_from_cloud(&asset).await);
        assert!(!f.state.read().await.backup_index.contains("A1"));
        assert!(!f.state.read().await.local_assets[0].is_backed_up);

        f.state.write().await.backup_index.insert("A1".into());
        assert!(!f.ops.delete_from_cloud(&asset).await);
        assert!(f.state.read().await.backup_index.contains("A1"));
    }

    #[tokio::test]
    async fn test_get_info_asset_normalizes() {
        let mut store = MockStore::new();
        store.expect_info().returning(|path| {
            if path.ends_with("IMG_1.HEIC") {
                Ok(ObjectInfo {
                    id: Some("obj-1".into()),
                    created_at: DateTime::from_timestamp_millis(1_000),
                    metadata: json!({ "id": "A1", "width": "4032" }).as_object().cloned(),
                    ..Default::default()
                })
            } else {
                Ok(ObjectInfo::default())
            }
        });

        let f = fixture(store, failing_media(), MockFs::new(), true).await;
        let info = f
            .ops
            .get_info_asset(&Asset::Local(local("A1")))
            .await
            .unwrap();

        assert_eq!(info.id, "obj-1");
        assert_eq!(info.content_type, "");
        assert_eq!(info.size, 0);
        assert_eq!(info.metadata.width, Some(4032));

        let mut other = local("B2");
        other.file_name = "other.jpg".into();
        let missing = f.ops.get_info_asset(&Asset::Local(other)).await;
        assert!(matches!(missing, Err(SyncError::AssetNotFound(_))));
    }

    #[tokio::test]
    async fn test_detailed_info_for_local_asset() {
        let mut media = MockLibrary::new();
        media.expect_get_asset_info().returning(|id| {
            Ok(AssetInfo {
                id: id.to_string(),
                file_name: "IMG_1.HEIC".into(),
                uri: "file:///dcim/IMG_1.HEIC".into(),
                local_uri: None,
                width: 1,
                height: 1,
                media_kind: MediaKind::Photo,
                location: None,
                exif: None,
                creation_time: None,
                modification_time: None,
            })
        });
        let mut fs = MockFs::new();
        fs.expect_get_info()
            .returning(|_| Err(BridgeError::OperationFailed("stat failed".into())));

        let f = fixture(MockStore::new(), media, fs, true).await;
        let details = f.ops.get_detailed_info(&Asset::Local(local("A1"))).await;

        assert!(matches!(details, Some(DetailedInfo::Local { size: 0, .. })));
    }

    #[tokio::test]
    async fn test_cache_remote_image() {
        let mut fs = MockFs::new();
        fs.expect_get_cache_directory()
            .returning(|| Ok(PathBuf::from("/tmp/cache")));
        fs.expect_get_info().returning(|_| Ok(FileInfo::default()));
        fs.expect_download().returning(|url, dest| {
            Ok(DownloadResult {
                status: if url.contains("missing") { 404 } else { 200 },
                path: dest.to_path_buf(),
            })
        });

        let f = fixture(MockStore::new(), failing_media(), fs, true).await;

        let path = f
            .ops
            .cache_remote_image("https://cdn/a.jpg", "A1")
            .await
            .unwrap();
        assert_eq!(path, PathBuf::from("/tmp/cache/cache_image_A1.jpg"));

        let err = f
            .ops
            .cache_remote_image("https://cdn/missing.jpg", "B2")
            .await;
        assert!(matches!(err, Err(SyncError::DownloadFailed { status: 404 })));
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("IMG_1.HEIC"), "heic");
        assert_eq!(file_extension("noext"), "jpeg");
    }
}
