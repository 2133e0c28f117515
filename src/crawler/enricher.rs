//! Detail-page enrichment
//!
//! After the list phase every known listing is visited once more on its own
//! detail page. A failing detail page costs only that listing's enrichment;
//! the coarse record from the list phase stays as it was.

use crate::config::CrawlConfig;
use crate::crawler::pacer::Pacer;
use crate::crawler::renderer::{Attachment, RenderError, Renderer};
use crate::extract::Extractor;
use crate::state::{IdentityStore, ListingFields};
use crate::url::ListingId;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Why one listing could not be enriched
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Listing identifier {0} is not a navigable URL")]
    NotNavigable(String),
}

/// Counts from one detail pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    /// Detail pages attempted
    pub attempted: usize,
    /// Detail pages whose fields were merged
    pub enriched: usize,
    /// Detail pages that failed
    pub failed: usize,
    /// True if the pass stopped early on consecutive failures
    pub aborted: bool,
}

/// Visits detail pages and merges what they show into the store
#[derive(Debug, Clone)]
pub struct DetailEnricher {
    extractor: Extractor,
    detail_markers: Vec<String>,
    navigation_timeout: Duration,
    selector_timeout: Duration,
    settle_delay: Duration,
    max_consecutive_failures: u32,
}

impl DetailEnricher {
    pub fn new(extractor: Extractor, detail_markers: Vec<String>, crawl: &CrawlConfig) -> Self {
        Self {
            extractor,
            detail_markers,
            navigation_timeout: Duration::from_millis(crawl.navigation_timeout_ms),
            selector_timeout: Duration::from_millis(crawl.selector_timeout_ms),
            settle_delay: Duration::from_millis(crawl.settle_delay_ms),
            max_consecutive_failures: crawl.max_consecutive_detail_failures,
        }
    }

    /// Loads one listing's detail page and extracts its fields
    ///
    /// Detail markers that never appear are tolerated; the page is still
    /// extracted as it is.
    pub async fn enrich_one<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        id: &ListingId,
    ) -> Result<ListingFields, EnrichError> {
        let url = id
            .to_url()
            .map_err(|_| EnrichError::NotNavigable(id.to_string()))?;

        renderer.navigate(&url, self.navigation_timeout).await?;

        if !self.detail_markers.is_empty() {
            match renderer
                .wait_for_any(&self.detail_markers, self.selector_timeout, Attachment::Attached)
                .await
            {
                Ok(()) => {}
                Err(RenderError::SelectorTimeout { .. }) => {
                    tracing::debug!("No detail markers on {}, extracting anyway", url);
                }
                Err(e) => return Err(e.into()),
            }
        }

        renderer.settle(self.settle_delay).await;
        let snapshot = renderer.snapshot().await?;
        Ok(self.extractor.extract_detail_fields(&snapshot))
    }

    /// Enriches every listing in first-seen order
    pub async fn run<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        store: &mut IdentityStore,
        pacer: &mut Pacer,
    ) -> EnrichmentReport {
        let identifiers: Vec<ListingId> = store.identifiers().cloned().collect();
        let total = identifiers.len();
        let mut report = EnrichmentReport::default();
        let mut consecutive_failures = 0u32;

        tracing::info!("Enriching {} listings from their detail pages", total);

        for (position, id) in identifiers.iter().enumerate() {
            pacer.wait().await;
            report.attempted += 1;

            match self.enrich_one(renderer, id).await {
                Ok(fields) => {
                    store.merge(id, fields);
                    report.enriched += 1;
                    consecutive_failures = 0;
                    tracing::debug!("Enriched {} ({}/{})", id, position + 1, total);
                }
                Err(e) => {
                    report.failed += 1;
                    consecutive_failures += 1;
                    tracing::warn!("Detail page for {} failed: {}", id, e);

                    if self.max_consecutive_failures > 0
                        && consecutive_failures >= self.max_consecutive_failures
                    {
                        tracing::warn!(
                            "Stopping detail pass after {} consecutive failures",
                            consecutive_failures
                        );
                        report.aborted = true;
                        break;
                    }
                }
            }
        }

        tracing::info!(
            "Detail pass: {} attempted, {} enriched, {} failed",
            report.attempted,
            report.enriched,
            report.failed
        );
        report
    }
}
