//! Workspace placeholder crate.
//!
//! Exposes feature flags that map onto the workspace crates so a host
//! application can depend on `photo-vault-workspace` alone and pick the
//! desktop wiring (`desktop-shims`) or the standalone highlight tooling
//! (`highlights`) without naming each crate.

#[cfg(feature = "desktop-shims")]
pub use core_service;

#[cfg(feature = "highlights")]
pub use core_tagging;
