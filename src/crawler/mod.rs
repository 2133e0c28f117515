//! Crawler module for list-page harvesting
//!
//! This module contains the core harvesting logic, including:
//! - The rendering session abstraction and its HTTP implementation
//! - Pagination across the three supported mechanisms
//! - The termination policy for the list phase
//! - Politeness pacing
//! - The detail-page enrichment pass
//! - Overall harvest coordination

mod coordinator;
mod enricher;
mod pacer;
mod paginator;
mod renderer;
mod termination;

#[cfg(test)]
mod testing;

pub use coordinator::{pagination_name, Coordinator, CrawlOutcome, CrawlStatus};
pub use enricher::{DetailEnricher, EnrichError, EnrichmentReport};
pub use pacer::Pacer;
pub use paginator::{detect_mode, mode_name, Advance, PageTarget, Paginator};
pub use renderer::{
    build_http_client, Attachment, ControlTarget, HttpRenderer, RenderError, Renderer,
};
pub use termination::{Decision, PageSignals, StopReason, TerminationPolicy};

use crate::config::Config;
use crate::HarvestError;

/// Runs a complete harvest over HTTP
///
/// This is the main entry point for a harvest. It will:
/// 1. Build the HTTP renderer from the user agent settings
/// 2. Walk the list pages until the termination policy stops
/// 3. Enrich the collected listings from their detail pages (if enabled)
/// 4. Return the assembled outcome
pub async fn harvest(config: Config) -> Result<CrawlOutcome, HarvestError> {
    let renderer = HttpRenderer::new(&config.user_agent)?;
    let mut coordinator = Coordinator::new(config, renderer)?;
    coordinator.run().await
}
