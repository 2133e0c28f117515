//! In-memory renderer for crawler unit tests

use crate::crawler::renderer::{
    control_destination, document_matches_any, Attachment, ControlTarget, RenderError, Renderer,
};
use crate::extract::Snapshot;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Serves a fixed set of pages; unknown URLs fail to navigate
#[derive(Debug, Default)]
pub struct ScriptedRenderer {
    pages: HashMap<String, String>,
    current: Option<Snapshot>,
    visited: Vec<String>,
    waits: Vec<Attachment>,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page served at `url`
    pub fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(key(url), html.into());
        self
    }

    /// Every URL a navigation was attempted for, in order
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    /// The attachment mode of every wait, in order
    pub fn waits(&self) -> &[Attachment] {
        &self.waits
    }

    /// Returns true if a navigation to `url` was attempted
    pub fn was_visited(&self, url: &str) -> bool {
        let wanted = key(url);
        self.visited.iter().any(|visited| *visited == wanted)
    }

    fn current(&self) -> Result<&Snapshot, RenderError> {
        self.current.as_ref().ok_or(RenderError::NoDocument)
    }
}

fn key(url: &str) -> String {
    Url::parse(url)
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn navigate(&mut self, url: &Url, _timeout: Duration) -> Result<(), RenderError> {
        self.visited.push(url.to_string());
        self.current = None;

        let html = self
            .pages
            .get(url.as_str())
            .ok_or_else(|| RenderError::Navigation {
                url: url.to_string(),
                message: "HTTP 404".to_string(),
            })?;
        self.current = Some(Snapshot::new(url.clone(), html.clone()));
        Ok(())
    }

    async fn wait_for_any(
        &mut self,
        selectors: &[String],
        _timeout: Duration,
        attachment: Attachment,
    ) -> Result<(), RenderError> {
        self.waits.push(attachment);
        document_matches_any(self.current()?, selectors)
    }

    async fn settle(&mut self, _duration: Duration) {}

    async fn snapshot(&mut self) -> Result<Snapshot, RenderError> {
        self.current().cloned()
    }

    async fn click(&mut self, target: &ControlTarget, timeout: Duration) -> Result<(), RenderError> {
        let destination = control_destination(self.current()?, target)?;
        self.navigate(&destination, timeout).await
    }
}
