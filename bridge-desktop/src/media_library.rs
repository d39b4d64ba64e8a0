//! Media library over a directory tree
//!
//! Desktop stand-in for the device photo library: every image or video file
//! under a root directory is one media item. The identifier is the path
//! relative to the root, which is stable across runs.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    media::{AssetInfo, MediaItem, MediaKind, MediaLibrary, MediaPage, MediaPageRequest, SortBy},
};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

/// Directory-backed [`MediaLibrary`]
///
/// The cursor is the offset of the next item as a decimal string. The tree is
/// rescanned on each page, so files added between pages may shift items.
pub struct DirectoryMediaLibrary {
    root: PathBuf,
}

struct ScannedFile {
    id: String,
    path: PathBuf,
    kind: MediaKind,
    created: Option<i64>,
    modified: Option<i64>,
}

impl DirectoryMediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn kind_of(path: &Path) -> MediaKind {
        match mime_guess::from_path(path).first() {
            Some(mime) if mime.type_() == mime_guess::mime::IMAGE => MediaKind::Photo,
            Some(mime) if mime.type_() == mime_guess::mime::VIDEO => MediaKind::Video,
            _ => MediaKind::Unknown,
        }
    }

    fn millis(time: std::io::Result<SystemTime>) -> Option<i64> {
        time.ok()
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
    }

    fn relative_id(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn scan(&self, kinds: &[MediaKind], sort_by: SortBy) -> Vec<ScannedFile> {
        let mut files: Vec<ScannedFile> = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let kind = Self::kind_of(entry.path());
                if !kinds.contains(&kind) {
                    return None;
                }
                let metadata = entry.metadata().ok()?;
                Some(ScannedFile {
                    id: self.relative_id(entry.path()),
                    path: entry.path().to_path_buf(),
                    kind,
                    created: Self::millis(metadata.created()),
                    modified: Self::millis(metadata.modified()),
                })
            })
            .collect();

        match sort_by {
            SortBy::ModificationTimeDesc => files.sort_by(|a, b| {
                b.modified.cmp(&a.modified).then_with(|| a.id.cmp(&b.id))
            }),
            SortBy::CreationTimeDesc => files.sort_by(|a, b| {
                b.created
                    .or(b.modified)
                    .cmp(&a.created.or(a.modified))
                    .then_with(|| a.id.cmp(&b.id))
            }),
        }
        files
    }

    fn dimensions(path: &Path, kind: MediaKind) -> (u32, u32) {
        if kind != MediaKind::Photo {
            return (0, 0);
        }
        image::image_dimensions(path).unwrap_or((0, 0))
    }

    fn file_uri(path: &Path) -> String {
        format!("file://{}", path.to_string_lossy())
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MediaLibrary for DirectoryMediaLibrary {
    #[instrument(skip(self, request), fields(cursor = ?request.cursor, page_size = request.page_size))]
    async fn get_page(&self, request: MediaPageRequest) -> Result<MediaPage> {
        let offset = match request.cursor.as_deref() {
            None => 0,
            Some(cursor) => cursor.parse::<usize>().map_err(|_| {
                BridgeError::OperationFailed(format!("Invalid media cursor: {}", cursor))
            })?,
        };

        if !self.root.is_dir() {
            return Err(BridgeError::NotFound(format!(
                "Media root {} is not a directory",
                self.root.display()
            )));
        }

        let files = self.scan(&request.media_kinds, request.sort_by);
        let total = files.len();
        let page_size = request.page_size.max(1) as usize;

        let items: Vec<MediaItem> = files
            .into_iter()
            .skip(offset)
            .take(page_size)
            .map(|file| {
                let (width, height) = Self::dimensions(&file.path, file.kind);
                MediaItem {
                    file_name: Self::file_name(&file.path),
                    uri: Self::file_uri(&file.path),
                    id: file.id,
                    media_kind: file.kind,
                    width,
                    height,
                    creation_time: file.created,
                    modification_time: file.modified,
                    duration: None,
                }
            })
            .collect();

        let next = offset + items.len();
        let has_next_page = next < total;
        debug!(returned = items.len(), total, "Loaded media page");

        Ok(MediaPage {
            items,
            has_next_page,
            end_cursor: Some(next.to_string()),
        })
    }

    async fn get_asset_info(&self, asset_id: &str) -> Result<AssetInfo> {
        let path = self.root.join(asset_id);
        let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BridgeError::NotFound(format!("Media item {}", asset_id))
            } else {
                BridgeError::Io(e)
            }
        })?;

        let kind = Self::kind_of(&path);
        let (width, height) = Self::dimensions(&path, kind);
        let uri = Self::file_uri(&path);

        Ok(AssetInfo {
            id: asset_id.to_string(),
            file_name: Self::file_name(&path),
            local_uri: Some(uri.clone()),
            uri,
            width,
            height,
            media_kind: kind,
            location: None,
            exif: None,
            creation_time: Self::millis(metadata.created()),
            modification_time: Self::millis(metadata.modified()),
        })
    }
}
