//! Storage and File System Abstractions
//!
//! File access for reading local media and caching downloaded previews, and
//! the persisted key-value store backing the tag cache.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File information returned by [`FileSystemAccess::get_info`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    pub exists: bool,
    pub size: u64,
    pub is_directory: bool,
}

/// Outcome of [`FileSystemAccess::download`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// HTTP status reported by the remote server
    pub status: u16,
    /// Where the body was written
    pub path: PathBuf,
}

/// File system access trait
///
/// URIs may be plain paths or `file://` URIs, the form the device media
/// library hands out.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn payload(fs: &dyn FileSystemAccess, uri: &str) -> Result<String> {
///     fs.read_as_base64(uri).await
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Directory for temporary files the system may purge.
    async fn get_cache_directory(&self) -> Result<PathBuf>;

    /// Read entire file contents into memory
    async fn read_file(&self, uri: &str) -> Result<Bytes>;

    /// Read a file and return it base64-encoded (standard alphabet, padded)
    async fn read_as_base64(&self, uri: &str) -> Result<String>;

    /// Download `url` into `dest`.
    ///
    /// A non-2xx status is reported in the result, not as an error; the
    /// caller decides whether the file is usable.
    async fn download(&self, url: &str, dest: &Path) -> Result<DownloadResult>;

    /// Existence and size of a file. Missing files yield `exists: false`.
    async fn get_info(&self, uri: &str) -> Result<FileInfo>;
}

/// Persisted string key-value store
///
/// No expiry and no transactions. Used for the tag cache, keyed by asset
/// identifier.
///
/// # Example
///
/// ```ignore
/// async fn remember(store: &dyn KeyValueStore, id: &str, json: &str) -> Result<()> {
///     store.set(id, json).await
/// }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}
