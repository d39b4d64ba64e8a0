//! ImageKit URL construction

use bridge_traits::image_url::{ImageUrlBuilder, Transformation};
use core_runtime::config::ImageCdnConfig;
use tracing::trace;

/// Builds ImageKit delivery URLs. Pure; performs no I/O.
#[derive(Debug, Clone)]
pub struct ImageKitUrlBuilder {
    url_endpoint: String,
}

impl ImageKitUrlBuilder {
    pub fn new(config: &ImageCdnConfig) -> Self {
        Self {
            url_endpoint: config.url_endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// `w-500,h-300,q-80`, or `None` for a step with no parameters.
    fn step(transformation: &Transformation) -> Option<String> {
        let mut params = Vec::with_capacity(3);
        if let Some(width) = transformation.width {
            params.push(format!("w-{}", width));
        }
        if let Some(height) = transformation.height {
            params.push(format!("h-{}", height));
        }
        if let Some(quality) = transformation.quality {
            params.push(format!("q-{}", quality));
        }

        (!params.is_empty()).then(|| params.join(","))
    }

    fn encode_path(path: &str) -> String {
        path.trim_start_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl ImageUrlBuilder for ImageKitUrlBuilder {
    fn build_url(&self, path: &str, transformations: &[Transformation]) -> String {
        let base = format!("{}/{}", self.url_endpoint, Self::encode_path(path));

        let steps: Vec<String> = transformations.iter().filter_map(Self::step).collect();
        let url = if steps.is_empty() {
            base
        } else {
            format!("{}?tr={}", base, steps.join(":"))
        };

        trace!(url = %url, "Built image URL");
        url
    }
}
