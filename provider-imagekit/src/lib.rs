//! # ImageKit Provider
//!
//! Implements `ImageUrlBuilder` for the ImageKit CDN.
//!
//! Stored objects are fetched through the configured URL endpoint with
//! transformations passed in the `tr` query parameter. Parameters of one step
//! are joined with `,` and chained steps with `:`, so a 500px wide preview of
//! `owner/IMG_1.jpg` becomes:
//!
//! ```text
//! https://ik.imagekit.io/vault/owner/IMG_1.jpg?tr=w-500
//! ```

pub mod url_builder;

pub use url_builder::ImageKitUrlBuilder;
