//! # Tagging & Highlights
//!
//! Enriches timeline assets through an external vision service and groups
//! them into tag highlights.
//!
//! ## Overview
//!
//! - Cache-first lookups against a persistent key-value store
//! - Strictly sequential service calls with a fixed pause between them
//! - Exponential backoff while the service answers 429
//! - Lenient parsing of fenced or prose-wrapped JSON answers
//! - Highlights for tags shared by two or more assets

pub mod cache;
pub mod config;
pub mod error;
pub mod highlights;
pub mod parser;
pub mod pipeline;
pub mod source;

pub use cache::{CachedTags, TagCache};
pub use config::{TaggingConfig, DEFAULT_PROMPT};
pub use error::{Result, TaggingError};
pub use highlights::{group_highlights, Highlight, HighlightKind};
pub use parser::parse_tag_response;
pub use pipeline::{TaggingOutcome, TaggingPipeline};
pub use source::{ImagePayload, ImageSourceResolver};
