//! # Media Service
//!
//! Host-facing facade over reconciliation and tagging.
//!
//! [`MediaService`] owns a [`LibraryCoordinator`] and, when a tagging service
//! is configured, a [`TaggingPipeline`]. Hosts drive everything through it and
//! observe progress through the event bus.
//!
//! ```ignore
//! let service = bootstrap_desktop(config).await?;
//! service.sessions().sign_in(Session::new(owner, token)).await;
//! service.start().await?;
//!
//! let merged = service.assets().await;
//! if let Some(outcome) = service.analyze_library().await? {
//!     println!("{} highlights", outcome.highlights.len());
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use core_auth::SessionManager;
use core_library::{Asset, LocalAsset, MergedCollection};
use core_runtime::events::{CoreEvent, EventBus};
use core_sync::{DetailedInfo, LibraryCoordinator, RemoteAssetInfo, SyncConfig};
use core_tagging::{ImageSourceResolver, TagCache, TaggingConfig, TaggingOutcome, TaggingPipeline};
use tracing::{info, instrument};

use crate::error::{CoreError, Result};
use crate::CoreDependencies;

/// Primary facade exposed to host applications.
pub struct MediaService {
    coordinator: LibraryCoordinator,
    tagging: Option<TaggingPipeline>,
    sessions: Arc<SessionManager>,
    event_bus: EventBus,
}

impl MediaService {
    /// Wire the coordinator and, if `deps.tagging_service` is set, the
    /// tagging pipeline.
    pub fn new(
        deps: CoreDependencies,
        sync_config: SyncConfig,
        tagging_config: TaggingConfig,
    ) -> Result<Self> {
        let coordinator = LibraryCoordinator::new(
            sync_config,
            deps.object_store,
            deps.media_library,
            deps.file_system.clone(),
            deps.sessions.clone(),
            deps.event_bus.clone(),
        )?;

        let tagging = match deps.tagging_service {
            Some(service) => {
                let resolver = ImageSourceResolver::new(
                    deps.file_system,
                    deps.url_builder,
                    deps.clock.clone(),
                    tagging_config.remote_preview_width,
                    tagging_config.default_mime_type.clone(),
                );
                Some(TaggingPipeline::new(
                    tagging_config,
                    service,
                    TagCache::new(deps.key_value_store),
                    resolver,
                    deps.sessions.clone(),
                    deps.clock,
                    deps.event_bus.clone(),
                )?)
            }
            None => None,
        };

        Ok(Self {
            coordinator,
            tagging,
            sessions: deps.sessions,
            event_bus: deps.event_bus,
        })
    }

    pub fn sessions(&self) -> Arc<SessionManager> {
        self.sessions.clone()
    }

    pub fn subscribe(&self) -> core_async::sync::broadcast::Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    pub fn coordinator(&self) -> &LibraryCoordinator {
        &self.coordinator
    }

    pub fn has_tagging(&self) -> bool {
        self.tagging.is_some()
    }

    // ========================================================================
    // Reconciliation
    // ========================================================================

    /// Rebuild the backup index, then load local and remote assets.
    pub async fn start(&self) -> Result<()> {
        Ok(self.coordinator.start().await?)
    }

    pub async fn reload_backup_index(&self) -> Result<usize> {
        Ok(self.coordinator.reload_backup_index().await?)
    }

    pub async fn fetch_assets(&self) -> bool {
        self.coordinator.fetch_assets().await
    }

    pub async fn assets(&self) -> MergedCollection {
        self.coordinator.assets().await
    }

    pub async fn uploaded_count(&self) -> usize {
        self.coordinator.uploaded_count().await
    }

    pub async fn get_asset_by_id(&self, id: &str) -> Option<Asset> {
        self.coordinator.get_asset_by_id(id).await
    }

    pub async fn is_fully_loaded(&self) -> bool {
        self.coordinator.is_fully_loaded().await
    }

    pub fn is_loading(&self) -> bool {
        self.coordinator.is_loading()
    }

    // ========================================================================
    // Sync operations
    // ========================================================================

    /// Upload a local asset. Returns the object path.
    pub async fn sync_to_cloud(&self, asset: &LocalAsset) -> Result<String> {
        Ok(self.coordinator.operations().sync_to_cloud(asset).await?)
    }

    pub async fn delete_from_cloud(&self, asset: &Asset) -> bool {
        self.coordinator.operations().delete_from_cloud(asset).await
    }

    pub async fn get_info_asset(&self, asset: &Asset) -> Result<RemoteAssetInfo> {
        Ok(self.coordinator.operations().get_info_asset(asset).await?)
    }

    pub async fn get_detailed_info(&self, asset: &Asset) -> Option<DetailedInfo> {
        self.coordinator.operations().get_detailed_info(asset).await
    }

    pub async fn cache_remote_image(&self, url: &str, asset_id: &str) -> Result<PathBuf> {
        Ok(self
            .coordinator
            .operations()
            .cache_remote_image(url, asset_id)
            .await?)
    }

    pub fn is_uploading(&self) -> bool {
        self.coordinator.operations().is_uploading()
    }

    pub fn is_deleting(&self) -> bool {
        self.coordinator.operations().is_deleting()
    }

    // ========================================================================
    // Tagging
    // ========================================================================

    fn pipeline(&self) -> Result<&TaggingPipeline> {
        self.tagging
            .as_ref()
            .ok_or_else(|| CoreError::CapabilityMissing {
                capability: "TaggingService".to_string(),
                message: "No tagging API configured. Set CoreConfig::tagging to enable analysis."
                    .to_string(),
            })
    }

    /// Tag `assets` and derive highlights.
    ///
    /// `Ok(None)` when a run is already active or the service shut down
    /// meanwhile.
    #[instrument(skip(self, assets), fields(total = assets.len()))]
    pub async fn analyze(&self, assets: &[Asset]) -> Result<Option<TaggingOutcome>> {
        let pipeline = self.pipeline()?;
        let cancel = self.coordinator.cancellation_token();
        Ok(pipeline.run(assets, &cancel).await)
    }

    /// Tag the current merged timeline.
    pub async fn analyze_library(&self) -> Result<Option<TaggingOutcome>> {
        let merged = self.assets().await;
        self.analyze(&merged.assets).await
    }

    pub fn is_tagging(&self) -> bool {
        self.tagging.as_ref().is_some_and(TaggingPipeline::is_running)
    }

    /// Cancel in-flight work; later results are discarded.
    pub fn shutdown(&self) {
        info!("Media service shutting down");
        self.coordinator.shutdown();
    }
}
