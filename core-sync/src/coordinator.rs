//! # Library Coordinator
//!
//! Owns the shared [`LibraryState`] and drives the loaders and sync
//! operations against it.
//!
//! ## Workflow
//!
//! 1. [`LibraryCoordinator::start`] rebuilds the backup index for the signed-in
//!    owner.
//! 2. Local and remote assets then load concurrently. Local pages become
//!    visible one by one.
//! 3. Hosts read [`LibraryCoordinator::assets`] for the merged timeline and
//!    call into [`LibraryCoordinator::operations`] for uploads and deletes.
//! 4. [`LibraryCoordinator::shutdown`] cancels the root token; results that
//!    arrive afterwards are discarded.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{LibraryCoordinator, SyncConfig};
//!
//! let coordinator = LibraryCoordinator::new(
//!     SyncConfig::default(),
//!     store,
//!     media_library,
//!     file_system,
//!     sessions,
//!     event_bus,
//! )?;
//!
//! coordinator.start().await?;
//! let merged = coordinator.assets().await;
//! println!("{} of {} backed up", merged.uploaded_count, merged.len());
//! ```

use std::sync::Arc;

use bridge_traits::media::MediaLibrary;
use bridge_traits::object_store::ObjectStore;
use bridge_traits::storage::FileSystemAccess;
use core_async::sync::CancellationToken;
use core_auth::SessionManager;
use core_library::{Asset, MergedCollection};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use futures::future::join;
use tracing::{debug, info, instrument, warn};

use crate::backup_index::BackupIndexBuilder;
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::local_loader::{LocalAssetLoader, LocalLoadSummary};
use crate::operations::SyncOperations;
use crate::remote_loader::RemoteAssetLoader;
use crate::state::{LibraryState, SharedLibraryState};

pub struct LibraryCoordinator {
    state: SharedLibraryState,
    sessions: Arc<SessionManager>,
    event_bus: EventBus,
    index_builder: BackupIndexBuilder,
    local_loader: LocalAssetLoader,
    remote_loader: Arc<RemoteAssetLoader>,
    operations: Arc<SyncOperations>,
    cancel: CancellationToken,
}

impl LibraryCoordinator {
    pub fn new(
        config: SyncConfig,
        store: Arc<dyn ObjectStore>,
        media: Arc<dyn MediaLibrary>,
        file_system: Arc<dyn FileSystemAccess>,
        sessions: Arc<SessionManager>,
        event_bus: EventBus,
    ) -> Result<Self> {
        config.validate()?;

        let state = LibraryState::shared();
        let cancel = CancellationToken::new();

        let remote_loader = Arc::new(RemoteAssetLoader::new(
            store.clone(),
            state.clone(),
            event_bus.clone(),
            config.remote_page_size,
        ));
        let operations = Arc::new(SyncOperations::new(
            store.clone(),
            media.clone(),
            file_system,
            sessions.clone(),
            state.clone(),
            remote_loader.clone(),
            event_bus.clone(),
            config.clone(),
            cancel.clone(),
        ));

        Ok(Self {
            index_builder: BackupIndexBuilder::new(store, config.remote_page_size),
            local_loader: LocalAssetLoader::new(media, state.clone(), event_bus.clone(), config),
            remote_loader,
            operations,
            state,
            sessions,
            event_bus,
            cancel,
        })
    }

    /// Rebuild the backup index, then load local and remote assets together.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        self.reload_backup_index().await?;
        self.load_sources().await;
        Ok(())
    }

    /// Full rebuild of the backup index for the signed-in owner. Loaded local
    /// assets are re-annotated against the new index.
    #[instrument(skip(self))]
    pub async fn reload_backup_index(&self) -> Result<usize> {
        let owner = self.sessions.require_owner().await?;
        let index = self.index_builder.build(&owner, &self.cancel).await;

        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let count = index.len();
        self.state.write().await.replace_backup_index(index.ids);

        info!(count, complete = index.complete, "Backup index rebuilt");
        self.event_bus
            .emit(CoreEvent::Library(LibraryEvent::BackupIndexRebuilt {
                count,
                complete: index.complete,
            }))
            .ok();
        Ok(count)
    }

    /// Load local and remote assets unless the local library is already
    /// fully loaded. Returns whether a load ran.
    #[instrument(skip(self))]
    pub async fn fetch_assets(&self) -> bool {
        if self.state.read().await.fully_loaded {
            debug!("Local library already loaded");
            return false;
        }
        self.load_sources().await;
        true
    }

    /// Local load and remote refresh run concurrently; failures are logged.
    async fn load_sources(&self) -> Option<LocalLoadSummary> {
        let local = self.local_loader.load_all(&self.cancel);
        let remote = async {
            match self.sessions.current_owner().await {
                Some(owner) => self.remote_loader.refresh(&owner, &self.cancel).await.map(Some),
                None => Ok(None),
            }
        };

        let (local, remote) = join(local, remote).await;

        if let Err(e) = remote {
            warn!(error = %e, "Remote assets not refreshed");
        }
        match local {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "Local assets not loaded");
                None
            }
        }
    }

    /// Current merged timeline.
    pub async fn assets(&self) -> MergedCollection {
        self.state.read().await.merged()
    }

    pub async fn uploaded_count(&self) -> usize {
        self.assets().await.uploaded_count
    }

    pub async fn get_asset_by_id(&self, id: &str) -> Option<Asset> {
        self.state.read().await.get_asset(id)
    }

    pub async fn is_fully_loaded(&self) -> bool {
        self.state.read().await.fully_loaded
    }

    pub fn is_loading(&self) -> bool {
        self.local_loader.is_loading()
    }

    /// Snapshot of the shared state.
    pub async fn snapshot(&self) -> LibraryState {
        self.state.read().await.clone()
    }

    pub fn operations(&self) -> Arc<SyncOperations> {
        self.operations.clone()
    }

    pub fn local_loader(&self) -> &LocalAssetLoader {
        &self.local_loader
    }

    /// Token cancelled by [`shutdown`](Self::shutdown).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    pub fn shutdown(&self) {
        info!("Library coordinator shutting down");
        self.cancel.cancel();
    }
}
