//! File System Access Implementation using Tokio

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{DownloadResult, FileInfo, FileSystemAccess},
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::http::ReqwestHttpClient;

/// Tokio-based file system implementation
///
/// Accepts plain paths and `file://` URIs. Downloads go through the shared
/// reqwest client.
pub struct TokioFileSystem {
    cache_dir: PathBuf,
    http: ReqwestHttpClient,
}

impl TokioFileSystem {
    /// Use the platform cache directory (`~/.cache/photo-vault` on Linux)
    pub fn new(http: ReqwestHttpClient) -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("photo-vault");

        Self { cache_dir, http }
    }

    pub fn with_cache_directory(cache_dir: PathBuf, http: ReqwestHttpClient) -> Self {
        Self { cache_dir, http }
    }

    fn resolve(uri: &str) -> PathBuf {
        PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn get_cache_directory(&self) -> Result<PathBuf> {
        if !self.cache_dir.exists() {
            fs::create_dir_all(&self.cache_dir).await?;
            debug!(path = ?self.cache_dir, "Created cache directory");
        }
        Ok(self.cache_dir.clone())
    }

    async fn read_file(&self, uri: &str) -> Result<Bytes> {
        let path = Self::resolve(uri);
        let data = fs::read(&path).await?;
        debug!(path = ?path, size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }

    async fn read_as_base64(&self, uri: &str) -> Result<String> {
        let data = self.read_file(uri).await?;
        Ok(STANDARD.encode(&data))
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<DownloadResult> {
        let response = self
            .http
            .inner()
            .get(url)
            .send()
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Download failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Download failed: {}", e)))?;

        if !(200..300).contains(&status) {
            warn!(status, "Download returned non-success status");
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(dest, &body).await?;
        debug!(path = ?dest, size = body.len(), status, "Downloaded file");

        Ok(DownloadResult {
            status,
            path: dest.to_path_buf(),
        })
    }

    async fn get_info(&self, uri: &str) -> Result<FileInfo> {
        match fs::metadata(Self::resolve(uri)).await {
            Ok(metadata) => Ok(FileInfo {
                exists: true,
                size: metadata.len(),
                is_directory: metadata.is_dir(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileInfo::default()),
            Err(e) => Err(BridgeError::Io(e)),
        }
    }
}
