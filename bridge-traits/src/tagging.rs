//! Image Tagging Service Abstraction

use async_trait::async_trait;

use crate::error::Result;

/// Payload sent to a vision/captioning service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggingRequest {
    /// Base64-encoded image bytes
    pub image_base64: String,
    pub mime_type: String,
    pub prompt: String,
}

/// External vision/captioning service
///
/// Returns the raw text the model produced, which is expected to be JSON but
/// may be wrapped in prose or code fences. Rate limiting must surface as an
/// error whose message contains `429`.
#[async_trait]
pub trait TaggingService: Send + Sync {
    async fn generate(&self, request: TaggingRequest) -> Result<String>;
}
