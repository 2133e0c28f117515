/// Progress of one crawl invocation
///
/// Lives only for the duration of a run; the identifiers seen so far are
/// tracked by the identity store, not here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlState {
    /// 1-based index of the list page currently being processed
    pub iteration: u32,

    /// Number of list pages whose results advanced the crawl
    pub pages_visited: u32,
}

impl CrawlState {
    /// Creates the state for a fresh run
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves on to the next list page and returns its index
    pub fn begin_page(&mut self) -> u32 {
        self.iteration += 1;
        self.iteration
    }

    /// Records that the current page counted toward the crawl
    pub fn record_visit(&mut self) {
        self.pages_visited += 1;
    }

    /// Returns true while the first page is being processed
    pub fn on_first_page(&self) -> bool {
        self.iteration == 1
    }
}
