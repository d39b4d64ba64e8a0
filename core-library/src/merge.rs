//! Merge of local and remote-only assets into one timeline.

use serde::Serialize;
use std::collections::HashSet;

use crate::error::{LibraryError, Result};
use crate::models::{Asset, LocalAsset, RemoteAsset};

/// Deduplicated, newest-first asset timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedCollection {
    pub assets: Vec<Asset>,
    /// Number of assets with `is_backed_up == true`
    pub uploaded_count: usize,
}

impl MergedCollection {
    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|asset| asset.id() == id)
    }

    pub fn require(&self, id: &str) -> Result<&Asset> {
        self.get(id).ok_or_else(|| LibraryError::NotFound {
            entity_type: "Asset".to_string(),
            id: id.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Merge local assets with remote-only assets.
///
/// Local assets win over remote entries with the same identifier, and only
/// the first occurrence of an identifier is kept. The result is sorted by
/// [`Asset::timestamp_millis`] descending; the sort is stable, so ties keep
/// local-then-remote input order and repeated merges of the same input give
/// the same sequence.
///
/// # Example
///
/// ```ignore
/// let merged = merge(&state.local_assets, &state.remote_assets);
/// println!("{} of {} backed up", merged.uploaded_count, merged.len());
/// ```
pub fn merge(local: &[LocalAsset], remote: &[RemoteAsset]) -> MergedCollection {
    let mut seen: HashSet<&str> = HashSet::with_capacity(local.len() + remote.len());
    let mut assets: Vec<Asset> = Vec::with_capacity(local.len() + remote.len());

    for asset in local {
        if seen.insert(asset.id.as_str()) {
            assets.push(Asset::Local(asset.clone()));
        }
    }

    for asset in remote {
        if seen.insert(asset.id()) {
            assets.push(Asset::Remote(asset.clone()));
        }
    }

    assets.sort_by_key(|asset| std::cmp::Reverse(asset.timestamp_millis()));
    let uploaded_count = assets.iter().filter(|asset| asset.is_backed_up()).count();

    MergedCollection {
        assets,
        uploaded_count,
    }
}
