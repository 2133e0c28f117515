//! Crawler coordinator - main harvest orchestration logic
//!
//! This module contains the list-page loop and the optional detail pass:
//! - Selecting and driving the paginator
//! - Extracting each list page and merging it into the identity store
//! - Applying the termination policy after every page
//! - Enriching the collected listings from their detail pages
//! - Assembling the final outcome

use crate::config::{Config, OutputMode, PaginationMode};
use crate::crawler::enricher::{DetailEnricher, EnrichmentReport};
use crate::crawler::pacer::Pacer;
use crate::crawler::paginator::{mode_name, Advance, Paginator};
use crate::crawler::renderer::{Attachment, RenderError, Renderer};
use crate::crawler::termination::{Decision, PageSignals, StopReason, TerminationPolicy};
use crate::extract::Extractor;
use crate::state::{CrawlState, IdentityStore, ListingFragment, ListingRecord};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Whether the result can be trusted as a picture of the site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrawlStatus {
    /// At least one listing was collected
    Complete,
    /// The first page rendered its listing container and it was empty
    ConfirmedEmpty,
    /// The first page never established a baseline; zero means nothing
    Undetermined,
}

/// Everything one harvest produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub updated_at: DateTime<Utc>,
    pub source: String,
    pub pagination: PaginationMode,
    pub pages_visited: u32,
    pub status: CrawlStatus,
    pub stop_reason: StopReason,
    pub enrichment: Option<EnrichmentReport>,
    pub records: Vec<ListingRecord>,
}

impl CrawlOutcome {
    /// Outcome of a harvest that failed before reading any list page
    ///
    /// Publishing it keeps the output document well-formed: zero listings,
    /// marked as undetermined rather than confirmed empty.
    pub fn undetermined(config: &Config) -> Self {
        Self {
            updated_at: Utc::now(),
            source: config.target.base_url.clone(),
            pagination: config.target.pagination,
            pages_visited: 0,
            status: CrawlStatus::Undetermined,
            stop_reason: StopReason::Unreachable,
            enrichment: None,
            records: Vec::new(),
        }
    }

    /// Number of unique listings
    pub fn count(&self) -> usize {
        self.records.len()
    }
}

/// What reading one list page yielded
enum PageRead {
    Unreachable,
    Read {
        fragments: Vec<ListingFragment>,
        has_markup: bool,
    },
}

/// Main harvest coordinator
pub struct Coordinator<R: Renderer> {
    config: Config,
    renderer: R,
    extractor: Extractor,
    policy: TerminationPolicy,
    pacer: Pacer,
}

impl<R: Renderer> Coordinator<R> {
    /// Creates a coordinator driving `renderer` for the given site profile
    pub fn new(config: Config, renderer: R) -> Result<Self, HarvestError> {
        let extractor = Extractor::from_config(&config.selectors, &config.fields)?;
        let policy = TerminationPolicy::from_config(&config.crawl);
        let pacer = Pacer::new(Duration::from_millis(config.crawl.politeness_delay_ms));

        Ok(Self {
            config,
            renderer,
            extractor,
            policy,
            pacer,
        })
    }

    /// Runs the list phase and, when enabled, the detail pass
    ///
    /// Navigation failures end the phase they occur in; whatever was
    /// collected until then is kept and reported.
    pub async fn run(&mut self) -> Result<CrawlOutcome, HarvestError> {
        tracing::info!("Starting harvest of {}", self.config.target.base_url);

        let mut paginator =
            Paginator::select(&self.config, &mut self.renderer, &mut self.pacer).await?;
        let mut store = IdentityStore::new();
        let mut state = CrawlState::new();
        let mut first_page_markup = false;

        let stop_reason = loop {
            let iteration = state.begin_page();

            self.pacer.wait().await;
            let reachable = match paginator.advance(&mut self.renderer).await {
                Ok(Advance::Advanced) => true,
                Ok(Advance::Exhausted) => {
                    tracing::info!("Pagination exhausted before list page {}", iteration);
                    break StopReason::Exhausted;
                }
                Err(e) => {
                    tracing::warn!("List page {} could not be loaded: {}", iteration, e);
                    false
                }
            };

            let (fragments, has_markup) = if reachable {
                match self.read_list_page(iteration).await {
                    PageRead::Read {
                        fragments,
                        has_markup,
                    } => (Some(fragments), has_markup),
                    PageRead::Unreachable => (None, false),
                }
            } else {
                (None, false)
            };

            if state.on_first_page() {
                first_page_markup = has_markup;
            }

            let page_read = fragments.is_some();
            let unique_before = store.len();
            let records_found = fragments.as_ref().map_or(0, Vec::len);
            let mut new_records = 0;
            for fragment in fragments.into_iter().flatten() {
                if store.upsert(fragment).is_new {
                    new_records += 1;
                }
            }

            if page_read {
                tracing::info!(
                    "List page {}: {} listings found, {} new, {} unique",
                    iteration,
                    records_found,
                    new_records,
                    store.len()
                );
            }

            let decision = self.policy.decide(&PageSignals {
                reachable: page_read,
                records_found,
                unique_before,
                unique_after: store.len(),
                iteration,
            });

            if decision.counts_page() {
                state.record_visit();
            }

            if let Decision::Stop(reason) = decision {
                tracing::info!("Stopping after list page {}: {}", iteration, reason);
                break reason;
            }
        };

        let enrichment = if self.should_enrich(&store) {
            let enricher = DetailEnricher::new(
                self.extractor.clone(),
                self.config.selectors.detail_markers.clone(),
                &self.config.crawl,
            );
            Some(
                enricher
                    .run(&mut self.renderer, &mut store, &mut self.pacer)
                    .await,
            )
        } else {
            None
        };

        let status = if !store.is_empty() {
            CrawlStatus::Complete
        } else if first_page_markup {
            CrawlStatus::ConfirmedEmpty
        } else {
            CrawlStatus::Undetermined
        };

        tracing::info!(
            "Harvest finished: {} listings over {} pages ({}, status {:?})",
            store.len(),
            state.pages_visited,
            stop_reason,
            status
        );

        Ok(CrawlOutcome {
            updated_at: Utc::now(),
            source: self.config.target.base_url.clone(),
            pagination: paginator.mode(),
            pages_visited: state.pages_visited,
            status,
            stop_reason,
            enrichment,
            records: store.into_records(),
        })
    }

    /// Waits for listing markup, settles and extracts the current page
    ///
    /// Markup that never appears is read as an empty page, not a failure.
    async fn read_list_page(&mut self, iteration: u32) -> PageRead {
        let crawl = &self.config.crawl;

        let has_markup = match self
            .renderer
            .wait_for_any(
                &self.config.selectors.listing_markers,
                Duration::from_millis(crawl.selector_timeout_ms),
                Attachment::Attached,
            )
            .await
        {
            Ok(()) => true,
            Err(RenderError::SelectorTimeout { .. }) => {
                tracing::debug!("No listing markup on list page {}", iteration);
                false
            }
            Err(e) => {
                tracing::warn!("List page {} never rendered: {}", iteration, e);
                return PageRead::Unreachable;
            }
        };

        if !has_markup {
            return PageRead::Read {
                fragments: Vec::new(),
                has_markup,
            };
        }

        self.renderer
            .settle(Duration::from_millis(crawl.settle_delay_ms))
            .await;

        match self.renderer.snapshot().await {
            Ok(snapshot) => {
                tracing::debug!("List page {}: {}", iteration, snapshot.url);
                PageRead::Read {
                    fragments: self.extractor.extract_list_page(&snapshot),
                    has_markup,
                }
            }
            Err(e) => {
                tracing::warn!("List page {} could not be read: {}", iteration, e);
                PageRead::Unreachable
            }
        }
    }

    fn should_enrich(&self, store: &IdentityStore) -> bool {
        if store.is_empty() || !self.config.crawl.enrich_details {
            return false;
        }
        if self.config.output.mode == OutputMode::UrlsOnly {
            tracing::debug!("Skipping detail pass in urls-only mode");
            return false;
        }
        true
    }
}

/// Kebab-case name of the pagination strategy an outcome used
pub fn pagination_name(outcome: &CrawlOutcome) -> &'static str {
    mode_name(outcome.pagination)
}
