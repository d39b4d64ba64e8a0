//! # Remote Asset Loader
//!
//! Rebuilds asset records for objects in the owner's folder. Each listing
//! entry gets its full object info fetched concurrently; entries whose info
//! has no metadata (or cannot be fetched) are not user assets and are
//! dropped.

use std::sync::Arc;

use bridge_traits::object_store::{ListOptions, ObjectEntry, ObjectStore};
use core_async::sync::CancellationToken;
use core_auth::OwnerId;
use core_library::{RemoteAsset, RemoteMetadata};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use futures::future::join_all;
use tracing::{debug, info, instrument};

use crate::error::{Result, SyncError};
use crate::state::SharedLibraryState;

pub struct RemoteAssetLoader {
    store: Arc<dyn ObjectStore>,
    state: SharedLibraryState,
    event_bus: EventBus,
    page_size: u32,
}

impl RemoteAssetLoader {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        state: SharedLibraryState,
        event_bus: EventBus,
        page_size: u32,
    ) -> Self {
        Self {
            store,
            state,
            event_bus,
            page_size,
        }
    }

    /// List the owner's objects and resolve their metadata.
    #[instrument(skip(self), fields(owner_id = %owner))]
    pub async fn load(&self, owner: &OwnerId) -> Result<Vec<RemoteAsset>> {
        let entries = self.list_all(owner).await?;
        let listed = entries.len();

        let resolved = join_all(entries.into_iter().map(|entry| self.resolve(owner, entry))).await;
        let assets: Vec<RemoteAsset> = resolved.into_iter().flatten().collect();

        debug!(listed, kept = assets.len(), "Resolved remote assets");
        Ok(assets)
    }

    /// Reload remote assets into shared state. Returns the number stored.
    #[instrument(skip(self, cancel), fields(owner_id = %owner))]
    pub async fn refresh(&self, owner: &OwnerId, cancel: &CancellationToken) -> Result<usize> {
        let assets = self.load(owner).await?;

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let count = assets.len();
        self.state.write().await.remote_assets = assets;

        info!(count, "Remote assets refreshed");
        self.event_bus
            .emit(CoreEvent::Library(LibraryEvent::RemoteAssetsRefreshed { count }))
            .ok();
        Ok(count)
    }

    async fn list_all(&self, owner: &OwnerId) -> Result<Vec<ObjectEntry>> {
        let prefix = owner.object_prefix();
        let mut entries = Vec::new();
        let mut offset = 0u32;

        loop {
            let page = self
                .store
                .list(&prefix, ListOptions::new(self.page_size, offset))
                .await
                .map_err(|e| SyncError::RemoteListingFailed(e.to_string()))?;

            let short = page.len() < self.page_size as usize;
            entries.extend(page);
            if short {
                return Ok(entries);
            }
            offset += self.page_size;
        }
    }

    async fn resolve(&self, owner: &OwnerId, entry: ObjectEntry) -> Option<RemoteAsset> {
        let info = match self.store.info(&owner.object_path(&entry.name)).await {
            Ok(info) => info,
            Err(e) => {
                debug!(name = %entry.name, error = %e, "Skipping object without info");
                return None;
            }
        };

        let metadata = info.metadata.as_ref().filter(|m| !m.is_empty())?;

        Some(RemoteAsset {
            metadata: RemoteMetadata::from_map(metadata),
            created_at: info.created_at.or(entry.created_at),
            updated_at: entry.updated_at,
            last_modified: info.last_modified,
            size: info.size,
            content_type: info.content_type.clone(),
            name: entry.name,
        })
    }
}
