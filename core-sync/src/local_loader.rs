//! # Local Asset Loader
//!
//! Pages through the device media library newest-first and appends each page
//! to [`LibraryState::local_assets`] as soon as it arrives, annotated against
//! the current backup index.
//!
//! ## Failure policy
//!
//! - An error on the very first page aborts with [`SyncError::LocalPageFailed`]
//!   and leaves `fully_loaded` unset, so a later fetch tries again.
//! - An error on a later page stops pagination; everything loaded so far stays
//!   and `fully_loaded` is set.
//!
//! Only one load runs at a time. A second call while a load is in flight
//! returns `Ok(None)` without touching the device.
//!
//! [`LibraryState::local_assets`]: crate::state::LibraryState::local_assets

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::media::{MediaLibrary, MediaPage, MediaPageRequest};
use core_async::sync::CancellationToken;
use core_async::time::sleep;
use core_library::LocalAsset;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::state::SharedLibraryState;

/// Outcome of a finished local load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalLoadSummary {
    pub pages: usize,
    pub total: usize,
    pub fully_loaded: bool,
}

enum PageCursor {
    Start,
    After(String),
    Done,
}

/// Clears the loading flag when a load ends, however it ends.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct LocalAssetLoader {
    library: Arc<dyn MediaLibrary>,
    state: SharedLibraryState,
    event_bus: EventBus,
    config: SyncConfig,
    loading: AtomicBool,
}

impl LocalAssetLoader {
    pub fn new(
        library: Arc<dyn MediaLibrary>,
        state: SharedLibraryState,
        event_bus: EventBus,
        config: SyncConfig,
    ) -> Self {
        Self {
            library,
            state,
            event_bus,
            config,
            loading: AtomicBool::new(false),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Device pages in cursor order.
    ///
    /// The stream ends after the last page or right after the first error.
    /// Every page but the first waits `local_page_delay` before it is
    /// requested.
    pub fn pages(&self) -> impl Stream<Item = BridgeResult<MediaPage>> + '_ {
        stream::unfold(PageCursor::Start, move |cursor| async move {
            let request = match cursor {
                PageCursor::Done => return None,
                PageCursor::Start => MediaPageRequest::first(self.config.local_page_size),
                PageCursor::After(cursor) => {
                    sleep(self.config.local_page_delay).await;
                    MediaPageRequest::first(self.config.local_page_size).after(Some(cursor))
                }
            };

            match self.library.get_page(request).await {
                Ok(page) => {
                    let next = match (&page.end_cursor, page.has_next_page) {
                        (Some(cursor), true) => PageCursor::After(cursor.clone()),
                        _ => PageCursor::Done,
                    };
                    Some((Ok(page), next))
                }
                Err(e) => Some((Err(e), PageCursor::Done)),
            }
        })
    }

    /// Load every local page into shared state.
    ///
    /// The first page replaces previously loaded assets; later pages append.
    /// Returns `Ok(None)` if another load is already running.
    #[instrument(skip(self, cancel))]
    pub async fn load_all(&self, cancel: &CancellationToken) -> Result<Option<LocalLoadSummary>> {
        if self.loading.swap(true, Ordering::SeqCst) {
            debug!("Local load already running");
            return Ok(None);
        }
        let _guard = LoadingGuard(&self.loading);

        let mut pages = Box::pin(self.pages());
        let mut loaded_pages = 0usize;
        let mut total = 0usize;

        while let Some(page) = pages.next().await {
            let page = match page {
                Ok(page) => page,
                Err(e) if loaded_pages == 0 => {
                    warn!(error = %e, "First local page failed");
                    return Err(SyncError::LocalPageFailed(e.to_string()));
                }
                Err(e) => {
                    warn!(error = %e, loaded = total, "Local page failed, keeping loaded assets");
                    break;
                }
            };

            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let batch_size = page.items.len();
            {
                let mut state = self.state.write().await;
                let batch: Vec<LocalAsset> = page
                    .items
                    .into_iter()
                    .map(|item| {
                        let backed_up = state.backup_index.contains(&item.id);
                        LocalAsset::from_media_item(item, backed_up)
                    })
                    .collect();

                if loaded_pages == 0 {
                    state.local_assets = batch;
                } else {
                    state.local_assets.extend(batch);
                }
                total = state.local_assets.len();
            }
            loaded_pages += 1;

            debug!(batch_size, total, "Local batch loaded");
            self.event_bus
                .emit(CoreEvent::Library(LibraryEvent::LocalBatchLoaded {
                    batch_size,
                    total_loaded: total,
                }))
                .ok();
        }

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        self.state.write().await.fully_loaded = true;

        info!(pages = loaded_pages, total, "Local library loaded");
        self.event_bus
            .emit(CoreEvent::Library(LibraryEvent::LocalLoadFinished {
                total,
                fully_loaded: true,
            }))
            .ok();

        Ok(Some(LocalLoadSummary {
            pages: loaded_pages,
            total,
            fully_loaded: true,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LibraryState;
    use async_trait::async_trait;
    use bridge_traits::error::BridgeError;
    use bridge_traits::media::{AssetInfo, MediaItem, MediaKind};
    use mockall::mock;
    use std::collections::HashSet;
    use std::time::Duration;

    mock! {
        Library {}

        #[async_trait]
        impl MediaLibrary for Library {
            async fn get_page(&self, request: MediaPageRequest) -> BridgeResult<MediaPage>;
            async fn get_asset_info(&self, asset_id: &str) -> BridgeResult<AssetInfo>;
        }
    }

    fn item(id: &str) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            file_name: format!("{}.jpg", id),
            uri: format!("file:///dcim/{}.jpg", id),
            media_kind: MediaKind::Photo,
            width: 100,
            height: 80,
            creation_time: Some(1_000),
            modification_time: Some(2_000),
            duration: None,
        }
    }

    fn page(ids: &[&str], next: Option<&str>) -> MediaPage {
        MediaPage {
            items: ids.iter().map(|id| item(id)).collect(),
            has_next_page: next.is_some(),
            end_cursor: next.map(str::to_string),
        }
    }

    fn loader(library: MockLibrary, state: SharedLibraryState) -> LocalAssetLoader {
        LocalAssetLoader::new(
            Arc::new(library),
            state,
            EventBus::default(),
            SyncConfig::default().with_local_page_delay(Duration::ZERO),
        )
    }

    #[tokio::test]
    async fn test_loads_pages_in_order_and_annotates() {
        let mut library = MockLibrary::new();
        library.expect_get_page().returning(|request| {
            Ok(match request.cursor.as_deref() {
                None => page(&["1", "2"], Some("c1")),
                Some("c1") => page(&["3"], None),
                Some(other) => panic!("unexpected cursor {}", other),
            })
        });

        let state = LibraryState::shared();
        state.write().await.backup_index = HashSet::from(["2".to_string()]);

        let summary = loader(library, state.clone())
            .load_all(&CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.pages, 2);
        assert_eq!(summary.total, 3);

        let state = state.read().await;
        let ids: Vec<_> = state.local_assets.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(state.local_assets[1].is_backed_up);
        assert!(!state.local_assets[0].is_backed_up);
        assert!(state.fully_loaded);
    }

    #[tokio::test]
    async fn test_first_page_failure_aborts() {
        let mut library = MockLibrary::new();
        library
            .expect_get_page()
            .returning(|_| Err(BridgeError::NotAvailable("permission denied".into())));

        let state = LibraryState::shared();
        let result = loader(library, state.clone())
            .load_all(&CancellationToken::new())
            .await;

        assert!(matches!(result, Err(SyncError::LocalPageFailed(_))));
        assert!(!state.read().await.fully_loaded);
    }

    #[tokio::test]
    async fn test_later_page_failure_keeps_loaded_assets() {
        let mut library = MockLibrary::new();
        library.expect_get_page().returning(|request| match request.cursor {
            None => Ok(page(&["1", "2"], Some("c1"))),
            Some(_) => Err(BridgeError::OperationFailed("media store busy".into())),
        });

        let state = LibraryState::shared();
        let summary = loader(library, state.clone())
            .load_all(&CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.total, 2);
        let state = state.read().await;
        assert_eq!(state.local_assets.len(), 2);
        assert!(state.fully_loaded);
    }

    #[tokio::test]
    async fn test_cancelled_load_does_not_mutate() {
        let mut library = MockLibrary::new();
        library
            .expect_get_page()
            .returning(|_| Ok(page(&["1"], None)));

        let state = LibraryState::shared();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = loader(library, state.clone()).load_all(&cancel).await;

        assert!(matches!(result, Err(SyncError::Cancelled)));
        let state = state.read().await;
        assert!(state.local_assets.is_empty());
        assert!(!state.fully_loaded);
    }

    #[tokio::test]
    async fn test_loading_flag_resets() {
        let mut library = MockLibrary::new();
        library
            .expect_get_page()
            .returning(|_| Ok(page(&["1"], None)));

        let loader = loader(library, LibraryState::shared());
        assert!(!loader.is_loading());
        loader.load_all(&CancellationToken::new()).await.unwrap();
        assert!(!loader.is_loading());
    }
}
