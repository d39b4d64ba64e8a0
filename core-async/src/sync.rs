//! Synchronization primitives.
//!
//! Async-aware locks and channels from `tokio::sync`, plus the cancellation
//! token from `tokio-util`. Locks never block the executor thread, so holding a
//! guard across an `.await` is allowed, though the reconciliation code keeps
//! guards short and never holds one across network I/O.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::{CancellationToken, RwLock};
//!
//! async fn example() {
//!     let index = RwLock::new(vec!["a".to_string()]);
//!     let token = CancellationToken::new();
//!
//!     if !token.is_cancelled() {
//!         index.write().await.push("b".to_string());
//!     }
//!     assert_eq!(index.read().await.len(), 2);
//! }
//! ```

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, RwLock, RwLockReadGuard,
    RwLockWriteGuard, Semaphore,
};

pub use tokio_util::sync::{CancellationToken, DropGuard, WaitForCancellationFuture};
