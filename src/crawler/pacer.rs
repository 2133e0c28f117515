//! Politeness pacing between navigations

use std::time::{Duration, Instant};

/// Enforces a minimum time between consecutive navigations
///
/// The crawl talks to a single site from a single session, so one clock is
/// enough; both the list phase and the detail phase share it.
#[derive(Debug, Clone)]
pub struct Pacer {
    min_interval: Duration,
    last_navigation: Option<Instant>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_navigation: None,
        }
    }

    /// Calculates the time until the next navigation may start
    ///
    /// Returns None if a navigation can start now.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        let last = self.last_navigation?;
        let elapsed = now.duration_since(last);
        if elapsed < self.min_interval {
            Some(self.min_interval - elapsed)
        } else {
            None
        }
    }

    /// Records that a navigation started at `now`
    pub fn record(&mut self, now: Instant) {
        self.last_navigation = Some(now);
    }

    /// Sleeps until the next navigation is allowed, then records it
    pub async fn wait(&mut self) {
        if let Some(delay) = self.time_until_next(Instant::now()) {
            tracing::debug!("Politeness delay: waiting {:?}", delay);
            tokio::time::sleep(delay).await;
        }
        self.record(Instant::now());
    }
}
