//! Turns an asset into the base64 payload sent to the tagging service.
//!
//! Local assets are read from their device URI. Remote-only assets are
//! fetched as a resized CDN preview, written to the cache directory first and
//! read back from there.

use std::path::Path;
use std::sync::Arc;

use bridge_traits::image_url::{ImageUrlBuilder, Transformation};
use bridge_traits::storage::FileSystemAccess;
use bridge_traits::time::Clock;
use core_auth::OwnerId;
use core_library::Asset;
use tracing::debug;

use crate::error::{Result, TaggingError};

/// Encoded image ready for the tagging service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub base64: String,
    pub mime_type: String,
}

/// Extension of the last path segment of a URL, ignoring the query.
fn url_extension(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => ext,
        _ => "jpg",
    }
}

pub struct ImageSourceResolver {
    file_system: Arc<dyn FileSystemAccess>,
    url_builder: Arc<dyn ImageUrlBuilder>,
    clock: Arc<dyn Clock>,
    preview_width: u32,
    default_mime_type: String,
}

impl ImageSourceResolver {
    pub fn new(
        file_system: Arc<dyn FileSystemAccess>,
        url_builder: Arc<dyn ImageUrlBuilder>,
        clock: Arc<dyn Clock>,
        preview_width: u32,
        default_mime_type: impl Into<String>,
    ) -> Self {
        Self {
            file_system,
            url_builder,
            clock,
            preview_width,
            default_mime_type: default_mime_type.into(),
        }
    }

    /// CDN URL of a remote asset's preview.
    pub fn preview_url(&self, owner: &OwnerId, object_name: &str) -> String {
        self.url_builder.build_url(
            &owner.object_path(object_name),
            &[Transformation::width(self.preview_width)],
        )
    }

    pub fn mime_type(&self, asset: &Asset) -> String {
        let file_name = match asset {
            Asset::Local(local) => local.file_name.as_str(),
            Asset::Remote(remote) => remote.metadata.file_name.as_deref().unwrap_or(""),
        };
        mime_guess::from_path(file_name)
            .first_raw()
            .unwrap_or(self.default_mime_type.as_str())
            .to_string()
    }

    pub async fn resolve(&self, asset: &Asset, owner: Option<&OwnerId>) -> Result<ImagePayload> {
        let base64 = match asset {
            Asset::Local(local) if !local.uri.is_empty() => {
                self.file_system.read_as_base64(&local.uri).await?
            }
            Asset::Remote(remote) => {
                let owner = owner.ok_or_else(|| TaggingError::MissingSource {
                    asset_id: asset.id().to_string(),
                })?;
                self.download_preview(&self.preview_url(owner, &remote.name))
                    .await?
            }
            Asset::Local(_) => {
                return Err(TaggingError::MissingSource {
                    asset_id: asset.id().to_string(),
                })
            }
        };

        Ok(ImagePayload {
            base64,
            mime_type: self.mime_type(asset),
        })
    }

    async fn download_preview(&self, url: &str) -> Result<String> {
        let cache_dir = self.file_system.get_cache_directory().await?;
        let dest = cache_dir.join(format!(
            "{}.{}",
            self.clock.unix_timestamp_millis(),
            url_extension(url)
        ));

        let download = self.file_system.download(url, &dest).await?;
        if download.status != 200 {
            return Err(TaggingError::PreviewDownload {
                status: download.status,
            });
        }
        debug!(path = ?download.path, "Preview downloaded");

        Ok(self
            .file_system
            .read_as_base64(&path_str(&download.path))
            .await?)
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_extension() {
        assert_eq!(url_extension("https://ik.imagekit.io/x/owner/a.png?tr=w-500"), "png");
        assert_eq!(url_extension("https://cdn/owner/IMG_1.HEIC"), "HEIC");
        assert_eq!(url_extension("https://cdn/owner/noext"), "jpg");
        assert_eq!(url_extension("https://cdn.example.com/owner/"), "jpg");
    }
}
