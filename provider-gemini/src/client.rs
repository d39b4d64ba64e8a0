//! Gemini API client
//!
//! Implements the `TaggingService` trait for the `generateContent` endpoint.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::tagging::{TaggingRequest, TaggingService};
use core_runtime::config::TaggingApiConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::GeminiError;
use crate::types::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};

const API_VERSION: &str = "v1beta";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Gemini vision client
///
/// # Example
///
/// ```ignore
/// use provider_gemini::GeminiClient;
/// use bridge_traits::tagging::{TaggingRequest, TaggingService};
///
/// let client = GeminiClient::new(http_client, TaggingApiConfig::new(api_key));
/// let text = client.generate(request).await?;
/// ```
pub struct GeminiClient {
    http_client: Arc<dyn HttpClient>,
    config: TaggingApiConfig,
}

impl GeminiClient {
    pub fn new(http_client: Arc<dyn HttpClient>, config: TaggingApiConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Endpoint URL. Contains the API key, so never log it.
    fn endpoint(&self) -> String {
        format!(
            "{}/{}/models/{}:generateContent?key={}",
            self.config.base_url.trim_end_matches('/'),
            API_VERSION,
            self.config.model,
            urlencoding::encode(&self.config.api_key)
        )
    }

    fn error_for(response: &HttpResponse) -> GeminiError {
        let message = serde_json::from_slice::<ErrorEnvelope>(&response.body)
            .map(|envelope| match envelope.error.status {
                Some(status) => format!("{}: {}", status, envelope.error.message),
                None => envelope.error.message,
            })
            .unwrap_or_else(|_| response.text_lossy());

        GeminiError::ApiError {
            status_code: response.status,
            message,
        }
    }
}

#[async_trait]
impl TaggingService for GeminiClient {
    #[instrument(skip(self, request), fields(model = %self.config.model, mime_type = %request.mime_type))]
    async fn generate(&self, request: TaggingRequest) -> Result<String> {
        let body = GenerateContentRequest::image_with_prompt(
            request.image_base64,
            request.mime_type,
            request.prompt,
        );

        let http_request = HttpRequest::new(HttpMethod::Post, self.endpoint())
            .json(&body)?
            .timeout(REQUEST_TIMEOUT);

        // Backoff belongs to the caller.
        let response = self
            .http_client
            .execute_with_retry(http_request, RetryPolicy::no_retry())
            .await?;

        if !response.is_success() {
            let error = Self::error_for(&response);
            warn!(status = response.status, "Tagging request rejected");
            return Err(error.into());
        }

        let parsed: GenerateContentResponse = serde_json::from_slice(&response.body)
            .map_err(|e| GeminiError::ParseError(format!("Failed to parse response: {}", e)))?;

        let text = parsed.first_text().to_string();
        debug!(chars = text.len(), "Tagging response received");
        Ok(text)
    }
}
