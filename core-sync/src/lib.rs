//! # Asset Reconciliation
//!
//! Keeps the device media library and the remote object store in one
//! consistent view.
//!
//! ## Components
//!
//! - **Backup Index** (`backup_index`): identifiers of every backed-up asset
//! - **Local Loader** (`local_loader`): paged, incremental device library load
//! - **Remote Loader** (`remote_loader`): cloud-only assets from object info
//! - **Sync Operations** (`operations`): upload, delete and info lookups
//! - **Coordinator** (`coordinator`): owns shared state and drives the rest

pub mod backup_index;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod local_loader;
pub mod operations;
pub mod remote_loader;
pub mod state;

pub use backup_index::{BackupIndex, BackupIndexBuilder};
pub use config::SyncConfig;
pub use coordinator::LibraryCoordinator;
pub use error::{Result, SyncError};
pub use local_loader::{LocalAssetLoader, LocalLoadSummary};
pub use operations::{DetailedInfo, RemoteAssetInfo, SyncOperations};
pub use remote_loader::RemoteAssetLoader;
pub use state::{LibraryState, SharedLibraryState};
