//! # Core Runtime Module
//!
//! Foundational infrastructure shared by the photo vault core crates:
//! - Logging and tracing setup
//! - Configuration ([`config::CoreConfig`])
//! - Event bus for progress and outcome notifications
//!
//! ## Overview
//!
//! Nothing in here knows about assets. Domain crates depend on this one for
//! the conventions they share: how errors about configuration are reported,
//! how logs are filtered and forwarded, and how events reach the host.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
