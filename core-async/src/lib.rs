//! Async runtime facade for the photo vault core.
//!
//! Every `core-*`, `bridge-*` and `provider-*` crate reaches tokio through this
//! crate, so the runtime choice stays in one place.
//!
//! # Modules
//!
//! - `sync`: locks, channels and the [`CancellationToken`](sync::CancellationToken)
//!   that reconciliation operations check before mutating shared state
//! - `time`: sleeping, timeouts and wall-clock helpers
//! - `task`: task spawning
//! - `runtime`: handles for code that must reach the ambient runtime
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::CancellationToken;
//! use core_async::time::{sleep, Duration};
//!
//! async fn paced(token: CancellationToken) {
//!     while !token.is_cancelled() {
//!         sleep(Duration::from_millis(50)).await;
//!     }
//! }
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
