//! # Tagging Pipeline
//!
//! Enriches assets with tags, a caption and a quality grade from an external
//! vision service, then derives highlights from the tags.
//!
//! ## Per-asset flow
//!
//! ```text
//! cache lookup ──hit──────────────────────────────────────────> done
//!      │
//!     miss ──> call ──ok──> cache write ──> done (enriched)
//!               │
//!               ├──429, attempts left──> backoff ──> call
//!               ├──429, attempts exhausted──────────> done (plain)
//!               └──other error / unparseable───────> done (plain)
//! ```
//!
//! Assets are processed one at a time in collection order. Every asset that
//! needed a network call is followed by a fixed pause; cache hits are not.
//! Every input asset appears exactly once in the output.
//!
//! Only one run may be active. Calling [`TaggingPipeline::run`] while a run is
//! in progress returns `None` immediately.
//!
//! ## Usage
//!
//! ```ignore
//! let pipeline = TaggingPipeline::new(config, service, cache, resolver, sessions, clock, bus)?;
//! if let Some(outcome) = pipeline.run(&merged.assets, &cancel).await {
//!     for highlight in &outcome.highlights {
//!         println!("{} ({} photos)", highlight.title, highlight.images.len());
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bridge_traits::tagging::{TaggingRequest, TaggingService};
use bridge_traits::time::Clock;
use core_async::sync::CancellationToken;
use core_async::time::sleep;
use core_auth::{OwnerId, SessionManager};
use core_library::{Asset, TagResult, TaggedAsset};
use core_runtime::events::{CoreEvent, EventBus, TaggingEvent};
use tracing::{debug, info, instrument, warn};

use crate::cache::TagCache;
use crate::config::TaggingConfig;
use crate::error::Result;
use crate::highlights::{group_highlights, Highlight};
use crate::parser::parse_tag_response;
use crate::source::{ImagePayload, ImageSourceResolver};

/// Output of one completed run
#[derive(Debug, Clone, PartialEq)]
pub struct TaggingOutcome {
    /// One record per input asset, in input order
    pub assets: Vec<TaggedAsset>,
    pub highlights: Vec<Highlight>,
}

impl TaggingOutcome {
    pub fn enriched_count(&self) -> usize {
        self.assets.iter().filter(|a| a.is_enriched()).count()
    }
}

/// Clears the running flag when a run ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct Analysis {
    tagged: TaggedAsset,
    from_cache: bool,
}

pub struct TaggingPipeline {
    config: TaggingConfig,
    service: Arc<dyn TaggingService>,
    cache: TagCache,
    resolver: ImageSourceResolver,
    sessions: Arc<SessionManager>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
    running: AtomicBool,
}

impl TaggingPipeline {
    pub fn new(
        config: TaggingConfig,
        service: Arc<dyn TaggingService>,
        cache: TagCache,
        resolver: ImageSourceResolver,
        sessions: Arc<SessionManager>,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            service,
            cache,
            resolver,
            sessions,
            clock,
            event_bus,
            running: AtomicBool::new(false),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Analyse `assets` and group the result into highlights.
    ///
    /// Returns `None` if another run is active or `cancel` fires before the
    /// run completes.
    #[instrument(skip(self, assets, cancel), fields(total = assets.len()))]
    pub async fn run(&self, assets: &[Asset], cancel: &CancellationToken) -> Option<TaggingOutcome> {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Tagging already running");
            return None;
        }
        let _guard = RunGuard(&self.running);

        self.event_bus
            .emit(CoreEvent::Tagging(TaggingEvent::Started {
                total: assets.len(),
            }))
            .ok();

        let owner = self.sessions.current_owner().await;
        let mut analyzed = Vec::with_capacity(assets.len());

        for asset in assets {
            if cancel.is_cancelled() {
                info!(processed = analyzed.len(), "Tagging cancelled");
                return None;
            }

            let analysis = self.analyze(asset, owner.as_ref()).await;
            self.event_bus
                .emit(CoreEvent::Tagging(TaggingEvent::AssetAnalyzed {
                    asset_id: asset.id().to_string(),
                    from_cache: analysis.from_cache,
                    enriched: analysis.tagged.is_enriched(),
                }))
                .ok();

            if !analysis.from_cache {
                sleep(self.config.rate_limit_delay).await;
            }
            analyzed.push(analysis.tagged);
        }

        if cancel.is_cancelled() {
            return None;
        }

        let outcome = TaggingOutcome {
            highlights: group_highlights(&analyzed, self.clock.as_ref()),
            assets: analyzed,
        };

        info!(
            processed = outcome.assets.len(),
            enriched = outcome.enriched_count(),
            highlights = outcome.highlights.len(),
            "Tagging completed"
        );
        self.event_bus
            .emit(CoreEvent::Tagging(TaggingEvent::Completed {
                processed: outcome.assets.len(),
                enriched: outcome.enriched_count(),
            }))
            .ok();

        Some(outcome)
    }

    #[instrument(skip(self, asset, owner), fields(asset_id = %asset.id()))]
    async fn analyze(&self, asset: &Asset, owner: Option<&OwnerId>) -> Analysis {
        let cached = self.cache.lookup(asset.id()).await;

        if let Some(result) = cached.as_ref().and_then(|c| c.result.clone()) {
            debug!("Tag cache hit");
            return Analysis {
                tagged: TaggedAsset::enriched(asset.clone(), result),
                from_cache: true,
            };
        }

        let tagged = match self.call_with_retry(asset, owner).await {
            Some(result) => {
                let previous = cached.as_ref().map(|c| c.raw.as_str());
                if let Err(e) = self.cache.put(asset.id(), &result, previous).await {
                    warn!(error = %e, "Failed to cache tags");
                }
                TaggedAsset::enriched(asset.clone(), result)
            }
            None => TaggedAsset::plain(asset.clone()),
        };

        Analysis {
            tagged,
            from_cache: false,
        }
    }

    async fn call_with_retry(&self, asset: &Asset, owner: Option<&OwnerId>) -> Option<TagResult> {
        // Resolved once; retries reuse the same preview.
        let payload = match self.resolver.resolve(asset, owner).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Image source unavailable");
                return None;
            }
        };
        let max_attempts = self.config.max_retries;

        for attempt in 1..=max_attempts {
            match self.call(&payload).await {
                Ok(result) => return result,
                Err(e) if e.is_rate_limited() => {
                    if attempt == max_attempts {
                        break;
                    }
                    let delay = self.config.backoff(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited, backing off"
                    );
                    self.event_bus
                        .emit(CoreEvent::Tagging(TaggingEvent::RateLimited {
                            asset_id: asset.id().to_string(),
                            attempt,
                            delay_ms: delay.as_millis() as u64,
                        }))
                        .ok();
                    sleep(delay).await;
                }
                Err(e) => {
                    warn!(error = %e, "Tagging call failed");
                    return None;
                }
            }
        }

        warn!(max_attempts, "Still rate limited, giving up on asset");
        None
    }

    /// One service call. `Ok(None)` when the answer is empty or unparseable.
    async fn call(&self, payload: &ImagePayload) -> Result<Option<TagResult>> {
        let text = self
            .service
            .generate(TaggingRequest {
                image_base64: payload.base64.clone(),
                mime_type: payload.mime_type.clone(),
                prompt: self.config.prompt.clone(),
            })
            .await?;

        if text.trim().is_empty() {
            warn!("Empty tagging response");
            return Ok(None);
        }
        Ok(parse_tag_response(&text))
    }
}
