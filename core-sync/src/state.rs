//! Shared reconciliation state.
//!
//! Written only by the loaders and by the sync operations after a confirmed
//! remote change. Everything else reads snapshots.

use std::collections::HashSet;
use std::sync::Arc;

use core_async::sync::RwLock;
use core_library::{merge, Asset, LocalAsset, MergedCollection, RemoteAsset};

/// Backup index plus the two asset sources
#[derive(Debug, Clone, Default)]
pub struct LibraryState {
    /// Identifiers known to exist in the remote store
    pub backup_index: HashSet<String>,
    pub local_assets: Vec<LocalAsset>,
    /// Every remote object with usable metadata; the merge drops local duplicates
    pub remote_assets: Vec<RemoteAsset>,
    /// Local pagination reached its end (or stopped after a later-page error)
    pub fully_loaded: bool,
}

pub type SharedLibraryState = Arc<RwLock<LibraryState>>;

impl LibraryState {
    pub fn shared() -> SharedLibraryState {
        Arc::new(RwLock::new(Self::default()))
    }

    pub fn merged(&self) -> MergedCollection {
        merge(&self.local_assets, &self.remote_assets)
    }

    pub fn get_asset(&self, id: &str) -> Option<Asset> {
        self.merged().get(id).cloned()
    }

    /// Set `is_backed_up` on the local asset with `id`. Returns false when no
    /// local asset carries that identifier.
    pub fn set_backed_up(&mut self, id: &str, backed_up: bool) -> bool {
        match self.local_assets.iter_mut().find(|asset| asset.id == id) {
            Some(asset) => {
                asset.is_backed_up = backed_up;
                true
            }
            None => false,
        }
    }

    /// Replace the index and re-annotate every loaded local asset against it.
    pub fn replace_backup_index(&mut self, index: HashSet<String>) {
        for asset in &mut self.local_assets {
            asset.is_backed_up = index.contains(&asset.id);
        }
        self.backup_index = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::media::MediaKind;

    fn local(id: &str) -> LocalAsset {
        LocalAsset {
            id: id.to_string(),
            file_name: format!("{}.jpg", id),
            uri: format!("file:///photos/{}.jpg", id),
            media_kind: MediaKind::Photo,
            width: 1,
            height: 1,
            creation_time: Some(1),
            modification_time: None,
            duration: None,
            is_backed_up: false,
        }
    }

    #[test]
    fn test_set_backed_up() {
        let mut state = LibraryState {
            local_assets: vec![local("a")],
            ..Default::default()
        };

        assert!(state.set_backed_up("a", true));
        assert!(state.local_assets[0].is_backed_up);
        assert!(!state.set_backed_up("missing", true));
    }

    #[test]
    fn test_replace_index_reannotates() {
        let mut state = LibraryState {
            local_assets: vec![local("a"), local("b")],
            ..Default::default()
        };
        state.local_assets[1].is_backed_up = true;

        state.replace_backup_index(HashSet::from(["a".to_string()]));

        assert!(state.local_assets[0].is_backed_up);
        assert!(!state.local_assets[1].is_backed_up);
        assert_eq!(state.merged().uploaded_count, 1);
    }
}
