//! Deciding when the list phase is over
//!
//! No single page signal is trustworthy on its own: a "next" control may
//! linger on the last page, a page index may wrap around to page 1, and a
//! slow page may render empty. The policy therefore triangulates from what a
//! page actually contributed, with a hard cap as the final backstop.

use crate::config::CrawlConfig;
use serde::Serialize;

/// What one list page produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSignals {
    /// The page loaded and could be read
    pub reachable: bool,

    /// Listing sightings on the page, repeats included
    pub records_found: usize,

    /// Unique listings known before the page was merged
    pub unique_before: usize,

    /// Unique listings known after the page was merged
    pub unique_after: usize,

    /// 1-based page index
    pub iteration: u32,
}

/// Why the list phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    /// The paginator had no further page
    Exhausted,
    /// A page failed to load
    Unreachable,
    /// A page carried no listings
    NoListings,
    /// A page added nothing new
    Stale,
    /// The hard page cap was reached
    PageCap,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::Unreachable => "unreachable",
            Self::NoListings => "no-listings",
            Self::Stale => "stale",
            Self::PageCap => "page-cap",
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Stop(StopReason),
}

impl Decision {
    /// Returns true if the page that produced this decision advanced the crawl
    ///
    /// A page cut off by the cap still contributed; pages that failed to
    /// load, were empty or were stale did not.
    pub fn counts_page(&self) -> bool {
        matches!(self, Self::Continue | Self::Stop(StopReason::PageCap))
    }
}

/// Continue/stop rules for the list phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationPolicy {
    pub hard_page_cap: u32,
    pub min_iterations_before_stale_check: u32,
}

impl TerminationPolicy {
    pub fn new(hard_page_cap: u32, min_iterations_before_stale_check: u32) -> Self {
        Self {
            hard_page_cap,
            min_iterations_before_stale_check,
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(config.max_pages, config.min_iterations_before_stale_check)
    }

    /// Evaluates the rules in order; the first that fires wins
    pub fn decide(&self, signals: &PageSignals) -> Decision {
        if !signals.reachable {
            return Decision::Stop(StopReason::Unreachable);
        }

        if signals.records_found == 0 {
            return Decision::Stop(StopReason::NoListings);
        }

        if signals.unique_after == signals.unique_before
            && signals.iteration >= self.min_iterations_before_stale_check
        {
            return Decision::Stop(StopReason::Stale);
        }

        if signals.iteration >= self.hard_page_cap {
            return Decision::Stop(StopReason::PageCap);
        }

        Decision::Continue
    }
}
