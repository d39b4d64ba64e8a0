//! Runtime handles.
//!
//! Synchronous code that needs to hand work to the runtime (for example the
//! logging layer forwarding entries to a host sink) uses [`Handle::try_current`]
//! and falls back to [`block_on`] when no runtime is active.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs a future to completion on a fresh current-thread runtime.
///
/// Returns `None` when the runtime cannot be constructed.
pub fn block_on<F>(future: F) -> Option<F::Output>
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .ok()
        .map(|runtime| runtime.block_on(future))
}
