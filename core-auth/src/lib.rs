//! # Authentication Module
//!
//! The authenticated owner of the photo library.
//!
//! ## Overview
//!
//! Signing in happens outside the core (the host runs the identity provider's
//! flow). The host hands the resulting [`Session`] to a [`SessionManager`],
//! which every owner-scoped operation asks for the current [`OwnerId`] and
//! bearer token. No ambient global session exists; the manager is constructed
//! once and shared by `Arc`.

pub mod error;
pub mod manager;
pub mod types;

pub use error::{AuthError, Result};
pub use manager::SessionManager;
pub use types::{OwnerId, Session};
