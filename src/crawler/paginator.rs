//! Moving from one list page to the next
//!
//! Sites paginate in one of three ways: a page index in the query string, a
//! "next" control, or a row of numbered controls. [`Paginator`] covers all
//! three behind a single `advance` operation; the variant is fixed for the
//! whole run.

use crate::config::{Config, PaginationMode};
use crate::crawler::pacer::Pacer;
use crate::crawler::renderer::{Attachment, ControlTarget, RenderError, Renderer};
use crate::extract::{
    find_next_control, locate_control, probe_page_controls, NamedSelector, NextControl, Snapshot,
};
use crate::url::with_query_param;
use crate::{ConfigError, HarvestError, UrlError};
use std::time::Duration;
use url::Url;

/// Result of asking for the next list page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The renderer now shows the next list page
    Advanced,
    /// There is no next page
    Exhausted,
}

/// Where pagination starts and how long one step may take
#[derive(Debug, Clone)]
pub struct PageTarget {
    pub base: Url,
    pub navigation_timeout: Duration,
}

/// Pagination driver
#[derive(Debug, Clone)]
pub enum Paginator {
    /// Navigates to `base?{parameter}=N` for N = 1, 2, ...
    IndexedParameter {
        target: PageTarget,
        parameter: String,
        page: u32,
    },

    /// Loads the base page, then clicks the next control until it is gone
    /// or disabled
    NextControl {
        target: PageTarget,
        candidates: Vec<NamedSelector>,
        started: bool,
    },

    /// Loads the base page, then clicks the numbered control for page k
    /// while k does not exceed the highest number shown
    IndexedControl {
        target: PageTarget,
        controls: Vec<NamedSelector>,
        parameter: String,
        page: u32,
        total: Option<u32>,
    },
}

impl Paginator {
    /// Builds the paginator for a concrete mode
    ///
    /// `PaginationMode::Auto` needs a look at the site; use
    /// [`Paginator::select`] for it.
    pub fn new(mode: PaginationMode, config: &Config) -> Result<Self, HarvestError> {
        let target = PageTarget {
            base: parse_base(&config.target.base_url)?,
            navigation_timeout: Duration::from_millis(config.crawl.navigation_timeout_ms),
        };

        Ok(match mode {
            PaginationMode::IndexedParameter => Self::IndexedParameter {
                target,
                parameter: config.target.page_parameter.clone(),
                page: 0,
            },
            PaginationMode::NextControl => Self::NextControl {
                target,
                candidates: NamedSelector::parse_all(&config.selectors.next_control)?,
                started: false,
            },
            PaginationMode::IndexedControl => Self::IndexedControl {
                target,
                controls: NamedSelector::parse_all(&config.selectors.page_controls)?,
                parameter: config.target.page_parameter.clone(),
                page: 0,
                total: None,
            },
            PaginationMode::Auto => {
                return Err(ConfigError::Validation(
                    "auto pagination must be resolved against the site first".to_string(),
                )
                .into())
            }
        })
    }

    /// Builds the paginator the configuration asks for, probing the first
    /// list page when the mode is `auto`
    pub async fn select<R: Renderer + ?Sized>(
        config: &Config,
        renderer: &mut R,
        pacer: &mut Pacer,
    ) -> Result<Self, HarvestError> {
        let mode = match config.target.pagination {
            PaginationMode::Auto => probe_mode(config, renderer, pacer).await?,
            mode => mode,
        };
        tracing::info!("Pagination strategy: {}", mode_name(mode));
        Self::new(mode, config)
    }

    /// The strategy this paginator drives
    pub fn mode(&self) -> PaginationMode {
        match self {
            Self::IndexedParameter { .. } => PaginationMode::IndexedParameter,
            Self::NextControl { .. } => PaginationMode::NextControl,
            Self::IndexedControl { .. } => PaginationMode::IndexedControl,
        }
    }

    /// Moves the renderer to the next list page
    ///
    /// The first call loads the first list page. `Ok(Exhausted)` means
    /// there is no further page; `Err` is a real navigation failure.
    pub async fn advance<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
    ) -> Result<Advance, RenderError> {
        match self {
            Self::IndexedParameter {
                target,
                parameter,
                page,
            } => {
                *page += 1;
                let url = with_query_param(&target.base, parameter, &page.to_string());
                tracing::debug!("Loading list page {} at {}", page, url);
                renderer.navigate(&url, target.navigation_timeout).await?;
                Ok(Advance::Advanced)
            }

            Self::NextControl {
                target,
                candidates,
                started,
            } => {
                if !*started {
                    *started = true;
                    renderer
                        .navigate(&target.base, target.navigation_timeout)
                        .await?;
                    return Ok(Advance::Advanced);
                }

                let snapshot = renderer.snapshot().await?;
                match next_control_state(&snapshot, candidates) {
                    NextControl::Missing => {
                        tracing::debug!("No next control on {}", snapshot.url);
                        Ok(Advance::Exhausted)
                    }
                    NextControl::Disabled => {
                        tracing::debug!("Next control disabled on {}", snapshot.url);
                        Ok(Advance::Exhausted)
                    }
                    NextControl::Enabled { selector } => {
                        if !control_visible(renderer, &selector, target.navigation_timeout).await? {
                            tracing::debug!("Next control {} never became visible", selector);
                            return Ok(Advance::Exhausted);
                        }
                        renderer
                            .click(&ControlTarget::new(selector), target.navigation_timeout)
                            .await?;
                        Ok(Advance::Advanced)
                    }
                }
            }

            Self::IndexedControl {
                target,
                controls,
                parameter,
                page,
                total,
            } => {
                if *page == 0 {
                    *page = 1;
                    renderer
                        .navigate(&target.base, target.navigation_timeout)
                        .await?;
                    return Ok(Advance::Advanced);
                }

                // Pagers often show a window of numbers, so the total is
                // re-read from every settled page.
                let snapshot = renderer.snapshot().await?;
                let (shown_max, control) =
                    numbered_control(&snapshot, controls, parameter, *page + 1);
                let known_total = total.unwrap_or(1).max(shown_max.unwrap_or(1));
                *total = Some(known_total);

                let next = *page + 1;
                if next > known_total {
                    tracing::debug!("Page {} exceeds the {} pages shown", next, known_total);
                    return Ok(Advance::Exhausted);
                }

                let Some(selector) = control else {
                    tracing::debug!("No control for page {} on {}", next, snapshot.url);
                    return Ok(Advance::Exhausted);
                };

                if !control_visible(renderer, &selector, target.navigation_timeout).await? {
                    tracing::debug!("Control for page {} never became visible", next);
                    return Ok(Advance::Exhausted);
                }

                renderer
                    .click(
                        &ControlTarget::with_text(selector, next.to_string()),
                        target.navigation_timeout,
                    )
                    .await?;
                *page = next;
                Ok(Advance::Advanced)
            }
        }
    }
}

/// Picks a pagination strategy from what a rendered list page offers
///
/// Numbered controls linking through the page parameter mean the index can
/// be addressed directly; numbered controls without it have to be clicked;
/// a lone enabled "next" control has to be followed. With none of these,
/// the page parameter is tried.
pub fn detect_mode(
    snapshot: &Snapshot,
    next_candidates: &[NamedSelector],
    page_controls: &[NamedSelector],
    page_parameter: &str,
) -> PaginationMode {
    let document = snapshot.document();
    let probe = probe_page_controls(&document, &snapshot.url, page_controls, page_parameter);

    if probe.carries_parameter {
        return PaginationMode::IndexedParameter;
    }

    if probe.max_page.is_some_and(|max| max >= 2) {
        return PaginationMode::IndexedControl;
    }

    if matches!(
        find_next_control(&document, next_candidates),
        NextControl::Enabled { .. }
    ) {
        return PaginationMode::NextControl;
    }

    PaginationMode::IndexedParameter
}

/// Kebab-case name of a pagination mode, as written to the output
pub fn mode_name(mode: PaginationMode) -> &'static str {
    match mode {
        PaginationMode::IndexedParameter => "indexed-parameter",
        PaginationMode::NextControl => "next-control",
        PaginationMode::IndexedControl => "indexed-control",
        PaginationMode::Auto => "auto",
    }
}

async fn probe_mode<R: Renderer + ?Sized>(
    config: &Config,
    renderer: &mut R,
    pacer: &mut Pacer,
) -> Result<PaginationMode, HarvestError> {
    let base = parse_base(&config.target.base_url)?;
    let next_candidates = NamedSelector::parse_all(&config.selectors.next_control)?;
    let page_controls = NamedSelector::parse_all(&config.selectors.page_controls)?;
    let timeout = Duration::from_millis(config.crawl.navigation_timeout_ms);

    pacer.wait().await;
    if let Err(e) = renderer.navigate(&base, timeout).await {
        tracing::warn!("Could not probe pagination at {}: {}", base, e);
        return Ok(PaginationMode::IndexedParameter);
    }
    renderer
        .settle(Duration::from_millis(config.crawl.settle_delay_ms))
        .await;

    match renderer.snapshot().await {
        Ok(snapshot) => Ok(detect_mode(
            &snapshot,
            &next_candidates,
            &page_controls,
            &config.target.page_parameter,
        )),
        Err(e) => {
            tracing::warn!("Could not probe pagination at {}: {}", base, e);
            Ok(PaginationMode::IndexedParameter)
        }
    }
}

/// Waits for a control to be visible before it is clicked
///
/// A control that never shows up is not a navigation failure; the caller
/// treats it like a missing control.
async fn control_visible<R: Renderer + ?Sized>(
    renderer: &mut R,
    selector: &str,
    timeout: Duration,
) -> Result<bool, RenderError> {
    match renderer
        .wait_for_any(&[selector.to_string()], timeout, Attachment::Visible)
        .await
    {
        Ok(()) => Ok(true),
        Err(RenderError::SelectorTimeout { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

fn parse_base(base_url: &str) -> Result<Url, UrlError> {
    Url::parse(base_url).map_err(|e| UrlError::Parse(format!("{}: {}", base_url, e)))
}

fn next_control_state(snapshot: &Snapshot, candidates: &[NamedSelector]) -> NextControl {
    find_next_control(&snapshot.document(), candidates)
}

/// Returns the highest page number shown and the selector of the first
/// control group holding page `wanted`
fn numbered_control(
    snapshot: &Snapshot,
    controls: &[NamedSelector],
    parameter: &str,
    wanted: u32,
) -> (Option<u32>, Option<String>) {
    let document = snapshot.document();
    let probe = probe_page_controls(&document, &snapshot.url, controls, parameter);
    let label = wanted.to_string();

    let selector = controls
        .iter()
        .find(|named| locate_control(&document, &named.selector, Some(&label)).is_some())
        .map(|named| named.text.clone());

    (probe.max_page, selector)
}
