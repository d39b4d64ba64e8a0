//! # Desktop Bridge Implementations
//!
//! Default implementations of the bridge traits for desktop hosts
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `FileSystemAccess` using `tokio::fs`, `base64` and `reqwest` downloads
//! - `KeyValueStore` using a SQLite table through `sqlx`
//! - `MediaLibrary` over a directory tree of photos and videos (`walkdir`)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DirectoryMediaLibrary, ReqwestHttpClient, SqliteKeyValueStore, TokioFileSystem};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let fs = TokioFileSystem::new(http_client.clone());
//!     let cache = SqliteKeyValueStore::new("tags.db".into()).await?;
//!     let media = DirectoryMediaLibrary::new("/home/me/Pictures");
//!     Ok(())
//! }
//! ```

mod filesystem;
mod http;
mod key_value;
mod media_library;

pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;
pub use key_value::SqliteKeyValueStore;
pub use media_library::DirectoryMediaLibrary;
