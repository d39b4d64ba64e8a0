//! # Supabase Storage Provider
//!
//! Implements `ObjectStore` over the Supabase Storage REST API.
//!
//! ## Overview
//!
//! This module provides:
//! - Offset-paged object listing under an owner prefix
//! - Object info lookups including user metadata
//! - Upserting uploads with metadata sent as a base64 JSON header
//! - Batch removal by path
//! - Backoff on 429 and 5xx answers

pub mod connector;
pub mod error;
pub mod types;

pub use connector::SupabaseStorageConnector;
pub use error::{Result, SupabaseError};
