//! # Gemini Provider
//!
//! Implements `TaggingService` against the Gemini `generateContent` REST
//! endpoint.
//!
//! One image plus one text prompt per request. The client never retries on
//! its own; a 429 answer surfaces as an error mentioning the status so the
//! tagging pipeline can run its own backoff.

pub mod client;
pub mod error;
pub mod types;

pub use client::GeminiClient;
pub use error::{GeminiError, Result};
