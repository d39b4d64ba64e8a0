//! Image CDN URL Builder

/// A single resize/quality step applied by the CDN
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transformation {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u8>,
}

impl Transformation {
    pub fn width(width: u32) -> Self {
        Self {
            width: Some(width),
            ..Default::default()
        }
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }
}

/// Builds fetchable URLs for stored objects. Pure, no I/O.
pub trait ImageUrlBuilder: Send + Sync {
    fn build_url(&self, path: &str, transformations: &[Transformation]) -> String;
}
