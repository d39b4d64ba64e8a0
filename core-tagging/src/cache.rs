//! Persistent tag cache keyed by asset identifier.
//!
//! Entries are never expired. A stored value that no longer parses is
//! treated as a miss and overwritten by the next successful analysis.

use std::sync::Arc;

use bridge_traits::storage::KeyValueStore;
use core_library::TagResult;
use tracing::{debug, warn};

use crate::error::{Result, TaggingError};

/// Cached value as stored, plus its parsed form when it parses.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedTags {
    pub raw: String,
    pub result: Option<TagResult>,
}

pub struct TagCache {
    store: Arc<dyn KeyValueStore>,
}

impl TagCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read an entry. Store errors count as a miss.
    pub async fn lookup(&self, asset_id: &str) -> Option<CachedTags> {
        let raw = match self.store.get(asset_id).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(asset_id, "Tag cache miss");
                return None;
            }
            Err(e) => {
                warn!(asset_id, error = %e, "Tag cache read failed");
                return None;
            }
        };

        let result = match TagResult::from_json_str(&raw) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(asset_id, error = %e, "Tag cache entry does not parse");
                None
            }
        };
        Some(CachedTags { raw, result })
    }

    pub async fn get(&self, asset_id: &str) -> Option<TagResult> {
        self.lookup(asset_id).await.and_then(|cached| cached.result)
    }

    /// Store `result` unless the existing raw value is identical.
    pub async fn put(&self, asset_id: &str, result: &TagResult, previous: Option<&str>) -> Result<bool> {
        let value = result.to_json_string()?;
        if previous == Some(value.as_str()) {
            return Ok(false);
        }

        self.store
            .set(asset_id, &value)
            .await
            .map_err(|e| TaggingError::Cache(e.to_string()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::SqliteKeyValueStore;
    use core_library::Quality;

    async fn cache() -> (TagCache, Arc<SqliteKeyValueStore>) {
        let store = Arc::new(SqliteKeyValueStore::in_memory().await.unwrap());
        (TagCache::new(store.clone()), store)
    }

    fn result() -> TagResult {
        TagResult {
            tags: vec!["beach".into()],
            caption: "Sunny day".into(),
            quality: Quality::High,
        }
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (cache, _) = cache().await;
        assert!(cache.get("a").await.is_none());

        assert!(cache.put("a", &result(), None).await.unwrap());
        assert_eq!(cache.get("a").await, Some(result()));
    }

    #[tokio::test]
    async fn test_identical_value_is_not_rewritten() {
        let (cache, _) = cache().await;
        cache.put("a", &result(), None).await.unwrap();

        let cached = cache.lookup("a").await.unwrap();
        assert!(!cache.put("a", &result(), Some(&cached.raw)).await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let (cache, store) = cache().await;
        store.set("a", "{broken").await.unwrap();

        let cached = cache.lookup("a").await.unwrap();
        assert!(cached.result.is_none());
        assert!(cache.get("a").await.is_none());
    }
}
