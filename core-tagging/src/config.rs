//! Pipeline pacing and prompt.

use std::time::Duration;

use crate::error::{Result, TaggingError};

/// Instruction sent with every image.
pub const DEFAULT_PROMPT: &str = "Describe this image briefly and identify key objects or themes. Return the result as ONLY valid JSON without markdown, no backticks or explanation. with fields: tags (array of strings only 2 or less that describe the image the most clearly and more generically), caption (string), quality (string: 'high', 'medium', or 'low')";

/// Tagging pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggingConfig {
    /// Attempts per asset while the service keeps answering 429
    pub max_retries: u32,

    /// Backoff before retry `n` is `base_retry_delay * 2^n`
    pub base_retry_delay: Duration,

    /// Pause after every asset that needed a network call
    pub rate_limit_delay: Duration,

    /// Width requested from the image CDN for remote previews
    pub remote_preview_width: u32,

    pub prompt: String,

    /// MIME type sent when the file name does not reveal one
    pub default_mime_type: String,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_retry_delay: Duration::from_millis(4000),
            rate_limit_delay: Duration::from_millis(4000),
            remote_preview_width: 500,
            prompt: DEFAULT_PROMPT.to_string(),
            default_mime_type: "image/jpeg".to_string(),
        }
    }
}

impl TaggingConfig {
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_base_retry_delay(mut self, delay: Duration) -> Self {
        self.base_retry_delay = delay;
        self
    }

    pub fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Delay before the retry that follows 1-based `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_retry_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(TaggingError::InvalidConfig(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.max_retries > 10 {
            return Err(TaggingError::InvalidConfig(
                "max_retries must not exceed 10".to_string(),
            ));
        }
        if self.remote_preview_width == 0 {
            return Err(TaggingError::InvalidConfig(
                "remote_preview_width must be greater than zero".to_string(),
            ));
        }
        if self.prompt.trim().is_empty() {
            return Err(TaggingError::InvalidConfig("prompt cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let config = TaggingConfig::default();
        assert_eq!(config.backoff(1), Duration::from_millis(8_000));
        assert_eq!(config.backoff(2), Duration::from_millis(16_000));
    }

    #[test]
    fn test_validate() {
        assert!(TaggingConfig::default().validate().is_ok());
        assert!(TaggingConfig::default().with_max_retries(0).validate().is_err());
        assert!(TaggingConfig::default().with_prompt("  ").validate().is_err());
    }
}
