//! Pagination control inspection
//!
//! These helpers look at a rendered document and report what pagination
//! controls it offers. They never act on the controls; clicking is the
//! renderer's job.

use crate::extract::text::element_text;
use crate::extract::NamedSelector;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// State of the "next page" control in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextControl {
    /// No candidate selector matched anything
    Missing,
    /// The first matching control is present but disabled
    Disabled,
    /// The first matching control can be activated through `selector`
    Enabled { selector: String },
}

/// Finds the first next-control candidate, in selector priority order
pub fn find_next_control(document: &Html, candidates: &[NamedSelector]) -> NextControl {
    for candidate in candidates {
        if let Some(control) = document.select(&candidate.selector).next() {
            if is_disabled(control) {
                return NextControl::Disabled;
            }
            return NextControl::Enabled {
                selector: candidate.text.clone(),
            };
        }
    }
    NextControl::Missing
}

/// Returns true if a control is marked disabled
///
/// A control is disabled if it carries the `disabled` attribute,
/// `aria-disabled="true"`, or a `disabled` class on itself or its parent
/// (pagers commonly mark the wrapping `<li>`).
pub fn is_disabled(control: ElementRef<'_>) -> bool {
    let element = control.value();

    if element.attr("disabled").is_some() {
        return true;
    }

    if element
        .attr("aria-disabled")
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
    {
        return true;
    }

    if has_disabled_class(control) {
        return true;
    }

    control
        .parent()
        .and_then(ElementRef::wrap)
        .is_some_and(has_disabled_class)
}

fn has_disabled_class(element: ElementRef<'_>) -> bool {
    element
        .value()
        .classes()
        .any(|class| class.eq_ignore_ascii_case("disabled"))
}

/// What the numbered page controls of a document reveal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageControlProbe {
    /// Highest page number shown on a numbered control
    pub max_page: Option<u32>,

    /// True if any numbered control links through the page parameter
    pub carries_parameter: bool,
}

/// Inspects the numbered page controls of a document
///
/// Only controls whose text is a page number count; "Next", "Last" and
/// ellipsis entries are ignored.
pub fn probe_page_controls(
    document: &Html,
    document_url: &Url,
    controls: &[NamedSelector],
    page_parameter: &str,
) -> PageControlProbe {
    let mut probe = PageControlProbe::default();

    for control in controls
        .iter()
        .flat_map(|named| document.select(&named.selector))
    {
        let Some(number) = page_number(control) else {
            continue;
        };
        probe.max_page = Some(probe.max_page.map_or(number, |max| max.max(number)));

        if !probe.carries_parameter {
            probe.carries_parameter = control
                .value()
                .attr("href")
                .and_then(|href| document_url.join(href).ok())
                .is_some_and(|target| target.query_pairs().any(|(key, _)| key == page_parameter));
        }
    }

    probe
}

/// Parses a control's text as a page number
pub fn page_number(control: ElementRef<'_>) -> Option<u32> {
    let text = element_text(control);
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Locates the control a renderer should activate
///
/// With `text`, the first element matching `selector` whose collapsed text
/// equals it; otherwise the first element matching `selector`.
pub fn locate_control<'a>(
    document: &'a Html,
    selector: &Selector,
    text: Option<&str>,
) -> Option<ElementRef<'a>> {
    let mut matches = document.select(selector);
    match text {
        Some(wanted) => matches.find(|element| element_text(*element) == wanted.trim()),
        None => matches.next(),
    }
}
