//! Reconciliation tuning knobs.

use std::time::Duration;

use crate::error::{Result, SyncError};

/// Paging and upload settings for the reconciliation engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Objects requested per remote listing page
    pub remote_page_size: u32,

    /// Items requested per device media page
    pub local_page_size: u32,

    /// Pause between device media pages
    pub local_page_delay: Duration,

    /// `cache-control` sent with every upload
    pub bucket_cache_control: String,

    /// Content type used when the file name does not reveal one
    pub default_content_type: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_page_size: 1000,
            local_page_size: 500,
            local_page_delay: Duration::from_millis(50),
            bucket_cache_control: "3600".to_string(),
            default_content_type: "image/jpeg".to_string(),
        }
    }
}

impl SyncConfig {
    pub fn with_remote_page_size(mut self, size: u32) -> Self {
        self.remote_page_size = size;
        self
    }

    pub fn with_local_page_size(mut self, size: u32) -> Self {
        self.local_page_size = size;
        self
    }

    pub fn with_local_page_delay(mut self, delay: Duration) -> Self {
        self.local_page_delay = delay;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.remote_page_size == 0 {
            return Err(SyncError::InvalidConfig(
                "remote_page_size must be greater than zero".to_string(),
            ));
        }
        if self.local_page_size == 0 {
            return Err(SyncError::InvalidConfig(
                "local_page_size must be greater than zero".to_string(),
            ));
        }
        if self.local_page_delay > Duration::from_secs(10) {
            return Err(SyncError::InvalidConfig(
                "local_page_delay must not exceed 10s".to_string(),
            ));
        }
        if self.default_content_type.trim().is_empty() {
            return Err(SyncError::InvalidConfig(
                "default_content_type cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
