//! # Backup Index Builder
//!
//! Enumerates the owner's folder in the object store and collects the asset
//! identifier of every object.
//!
//! Pages are fetched one after another with an offset cursor and iteration
//! stops at the first short page. Within a page, identifiers that are not in
//! the inline listing metadata are recovered concurrently through
//! [`ObjectStore::info`], falling back to the object name.
//!
//! A listing error or cancellation ends the rebuild early. Whatever was
//! collected so far is returned with `complete == false` rather than failing
//! the caller. The token is checked before every page request.

use std::collections::HashSet;
use std::sync::Arc;

use bridge_traits::object_store::{ListOptions, ObjectEntry, ObjectStore};
use core_async::sync::CancellationToken;
use core_auth::OwnerId;
use futures::future::join_all;
use tracing::{debug, instrument, warn};

/// Result of one full enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupIndex {
    pub ids: HashSet<String>,
    /// False when a listing error or cancellation cut the enumeration short
    pub complete: bool,
}

impl BackupIndex {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

pub struct BackupIndexBuilder {
    store: Arc<dyn ObjectStore>,
    page_size: u32,
}

impl BackupIndexBuilder {
    pub fn new(store: Arc<dyn ObjectStore>, page_size: u32) -> Self {
        Self { store, page_size }
    }

    #[instrument(skip(self, cancel), fields(owner_id = %owner))]
    pub async fn build(&self, owner: &OwnerId, cancel: &CancellationToken) -> BackupIndex {
        let prefix = owner.object_prefix();
        let mut ids = HashSet::new();
        let mut offset = 0u32;

        loop {
            if cancel.is_cancelled() {
                debug!(offset, collected = ids.len(), "Backup index rebuild cancelled");
                return BackupIndex {
                    ids,
                    complete: false,
                };
            }

            let page = match self
                .store
                .list(&prefix, ListOptions::new(self.page_size, offset))
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    warn!(error = %e, offset, collected = ids.len(), "Listing failed, keeping partial backup index");
                    return BackupIndex {
                        ids,
                        complete: false,
                    };
                }
            };

            let page_len = page.len();
            let resolved = join_all(page.iter().map(|entry| self.resolve_id(owner, entry))).await;
            ids.extend(resolved);
            debug!(offset, page_len, total = ids.len(), "Indexed listing page");

            if page_len < self.page_size as usize {
                break;
            }
            offset += self.page_size;
        }

        BackupIndex {
            ids,
            complete: true,
        }
    }

    async fn resolve_id(&self, owner: &OwnerId, entry: &ObjectEntry) -> String {
        if let Some(id) = entry.inline_asset_id() {
            return id;
        }

        match self.store.info(&owner.object_path(&entry.name)).await {
            Ok(info) => match info.metadata_str("id").filter(|id| !id.is_empty()) {
                Some(id) => id.to_string(),
                None => entry.name.clone(),
            },
            Err(e) => {
                debug!(name = %entry.name, error = %e, "Info lookup failed, indexing by object name");
                entry.name.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result};
    use bridge_traits::object_store::{ObjectInfo, UploadOptions};
    use bytes::Bytes;
    use mockall::{mock, predicate::*};
    use serde_json::json;

    mock! {
        Store {}

        #[async_trait]
        impl ObjectStore for Store {
            async fn list(&self, prefix: &str, options: ListOptions) -> Result<Vec<ObjectEntry>>;
            async fn info(&self, path: &str) -> Result<ObjectInfo>;
            async fn upload(&self, path: &str, data: Bytes, options: UploadOptions) -> Result<()>;
            async fn remove(&self, paths: &[String]) -> Result<()>;
        }
    }

    fn entry(name: &str, inline_id: Option<&str>) -> ObjectEntry {
        ObjectEntry {
            name: name.to_string(),
            metadata: inline_id.map(|id| json!({ "id": id }).as_object().unwrap().clone()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pages_until_short_page() {
        let mut store = MockStore::new();
        store
            .expect_list()
            .with(always(), eq(ListOptions::new(2, 0)))
            .times(1)
            .returning(|_, _| Ok(vec![entry("a.jpg", Some("A")), entry("b.jpg", Some("B"))]));
        store
            .expect_list()
            .with(always(), eq(ListOptions::new(2, 2)))
            .times(1)
            .returning(|_, _| Ok(vec![entry("c.jpg", Some("C"))]));

        let index = BackupIndexBuilder::new(Arc::new(store), 2)
            .build(&OwnerId::new(), &CancellationToken::new())
            .await;

        assert!(index.complete);
        assert_eq!(index.len(), 3);
        assert!(index.contains("A") && index.contains("B") && index.contains("C"));
    }

    #[tokio::test]
    async fn test_missing_inline_id_falls_back_to_info_then_name() {
        let owner = OwnerId::new();
        let with_meta = owner.object_path("x.jpg");

        let mut store = MockStore::new();
        store
            .expect_list()
            .returning(|_, _| Ok(vec![entry("x.jpg", None), entry("y.jpg", None)]));
        store.expect_info().returning(move |path| {
            if path == with_meta {
                Ok(ObjectInfo {
                    metadata: json!({ "id": "X" }).as_object().cloned(),
                    ..Default::default()
                })
            } else {
                Err(BridgeError::NotFound(path.to_string()))
            }
        });

        let index = BackupIndexBuilder::new(Arc::new(store), 1000)
            .build(&owner, &CancellationToken::new())
            .await;

        assert_eq!(
            index.ids,
            HashSet::from(["X".to_string(), "y.jpg".to_string()])
        );
    }

    #[tokio::test]
    async fn test_listing_error_returns_partial_set() {
        let mut store = MockStore::new();
        store
            .expect_list()
            .with(always(), eq(ListOptions::new(1, 0)))
            .returning(|_, _| Ok(vec![entry("a.jpg", Some("A"))]));
        store
            .expect_list()
            .with(always(), eq(ListOptions::new(1, 1)))
            .returning(|_, _| Err(BridgeError::OperationFailed("boom".into())));

        let index = BackupIndexBuilder::new(Arc::new(store), 1)
            .build(&OwnerId::new(), &CancellationToken::new())
            .await;

        assert!(!index.complete);
        assert_eq!(index.ids, HashSet::from(["A".to_string()]));
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_paging() {
        let cancel = CancellationToken::new();
        let signal = cancel.clone();

        let mut store = MockStore::new();
        store
            .expect_list()
            .with(always(), eq(ListOptions::new(1, 0)))
            .times(1)
            .returning(move |_, _| {
                signal.cancel();
                Ok(vec![entry("a.jpg", Some("A"))])
            });
        store
            .expect_list()
            .with(always(), eq(ListOptions::new(1, 1)))
            .never();

        let index = BackupIndexBuilder::new(Arc::new(store), 1)
            .build(&OwnerId::new(), &cancel)
            .await;

        assert!(!index.complete);
        assert_eq!(index.ids, HashSet::from(["A".to_string()]));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_lists_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut store = MockStore::new();
        store.expect_list().never();

        let index = BackupIndexBuilder::new(Arc::new(store), 10)
            .build(&OwnerId::new(), &cancel)
            .await;

        assert!(!index.complete);
        assert!(index.is_empty());
    }
}
