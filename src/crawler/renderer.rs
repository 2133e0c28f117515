//! Rendering session abstraction and the HTTP-backed renderer
//!
//! The crawl core never talks to the network directly. It drives a
//! [`Renderer`]: navigate somewhere, wait for markup, let the page settle,
//! take a snapshot, click a control. A headless browser session fits this
//! shape naturally; [`HttpRenderer`] implements it over plain HTTP for sites
//! whose list pages are served pre-rendered.

use crate::config::{compile_selector, UserAgentConfig};
use crate::extract::{locate_control, Snapshot};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised by a rendering session
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    #[error("None of the selectors appeared: {selectors}")]
    SelectorTimeout { selectors: String },

    #[error("Control not found: {target}")]
    ControlNotFound { target: String },

    #[error("Interaction failed: {0}")]
    Interaction(String),

    #[error("No document loaded")]
    NoDocument,
}

/// How strictly a waited-for element must be present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// Present in the DOM, visible or not
    Attached,
    /// Present and visible
    Visible,
}

/// A control to activate: the first element matching `selector`, or, with
/// `text`, the first one whose text equals it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlTarget {
    pub selector: String,
    pub text: Option<String>,
}

impl ControlTarget {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            text: None,
        }
    }

    pub fn with_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            text: Some(text.into()),
        }
    }
}

impl fmt::Display for ControlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{} with text '{}'", self.selector, text),
            None => f.write_str(&self.selector),
        }
    }
}

/// One rendering session
///
/// Calls are strictly sequential; a session holds exactly one current
/// document.
#[async_trait]
pub trait Renderer: Send {
    /// Loads `url` as the current document
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<(), RenderError>;

    /// Waits until any of `selectors` matches in the current document
    async fn wait_for_any(
        &mut self,
        selectors: &[String],
        timeout: Duration,
        attachment: Attachment,
    ) -> Result<(), RenderError>;

    /// Lets late content settle; carries no correctness role
    async fn settle(&mut self, duration: Duration);

    /// Returns the current document as rendered
    async fn snapshot(&mut self) -> Result<Snapshot, RenderError>;

    /// Locates a control in the current document and activates it
    async fn click(&mut self, target: &ControlTarget, timeout: Duration) -> Result<(), RenderError>;
}

/// Builds an HTTP client with proper configuration
///
/// The user agent has the form `Name/Version (+ContactURL; ContactEmail)`.
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Renderer that fetches documents over HTTP and treats them as rendered
///
/// Waiting is answered from the fetched document alone (a static document
/// will not grow the markup later), visibility is not modelled, and clicking
/// a control follows its `href`.
pub struct HttpRenderer {
    client: Client,
    current: Option<Snapshot>,
}

impl HttpRenderer {
    /// Creates a renderer with a client built from the user agent config
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Creates a renderer around an existing client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            current: None,
        }
    }

    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<Snapshot, RenderError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        Ok(Snapshot::new(final_url, body))
    }

    fn current(&self) -> Result<&Snapshot, RenderError> {
        self.current.as_ref().ok_or(RenderError::NoDocument)
    }
}

fn classify_error(url: &Url, timeout: Duration, error: reqwest::Error) -> RenderError {
    if error.is_timeout() {
        RenderError::Timeout {
            what: format!("navigation to {}", url),
            after: timeout,
        }
    } else if error.is_connect() {
        RenderError::Navigation {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        RenderError::Navigation {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<(), RenderError> {
        // The previous document is gone whether or not the new one arrives.
        self.current = None;
        let snapshot = self.fetch(url, timeout).await?;
        self.current = Some(snapshot);
        Ok(())
    }

    async fn wait_for_any(
        &mut self,
        selectors: &[String],
        _timeout: Duration,
        _attachment: Attachment,
    ) -> Result<(), RenderError> {
        document_matches_any(self.current()?, selectors)
    }

    async fn settle(&mut self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    async fn snapshot(&mut self) -> Result<Snapshot, RenderError> {
        self.current().cloned()
    }

    async fn click(&mut self, target: &ControlTarget, timeout: Duration) -> Result<(), RenderError> {
        let destination = control_destination(self.current()?, target)?;
        tracing::debug!("Following control {} to {}", target, destination);
        self.navigate(&destination, timeout).await
    }
}

/// Succeeds if any selector matches in the snapshot
pub(crate) fn document_matches_any(
    snapshot: &Snapshot,
    selectors: &[String],
) -> Result<(), RenderError> {
    let document = snapshot.document();
    for text in selectors {
        let selector =
            compile_selector(text).map_err(|e| RenderError::Interaction(e.to_string()))?;
        if document.select(&selector).next().is_some() {
            return Ok(());
        }
    }

    Err(RenderError::SelectorTimeout {
        selectors: selectors.join(", "),
    })
}

/// Resolves where activating a link-like control leads
pub(crate) fn control_destination(
    snapshot: &Snapshot,
    target: &ControlTarget,
) -> Result<Url, RenderError> {
    let selector =
        compile_selector(&target.selector).map_err(|e| RenderError::Interaction(e.to_string()))?;
    let document = snapshot.document();

    let control = locate_control(&document, &selector, target.text.as_deref()).ok_or_else(|| {
        RenderError::ControlNotFound {
            target: target.to_string(),
        }
    })?;

    let href = control
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty() && !href.starts_with('#'))
        .ok_or_else(|| {
            RenderError::Interaction(format!("control {} has no navigable href", target))
        })?;

    let destination = snapshot
        .url
        .join(href)
        .map_err(|e| RenderError::Interaction(format!("bad href '{}': {}", href, e)))?;

    if destination.scheme() != "http" && destination.scheme() != "https" {
        return Err(RenderError::Interaction(format!(
            "control {} does not lead to a page",
            target
        )));
    }

    Ok(destination)
}
