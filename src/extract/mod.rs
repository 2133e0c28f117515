//! Record extraction module for Sumi-Harvest
//!
//! Everything here is a pure function of a rendered document snapshot: list
//! pages yield listing fragments (identifier plus whatever coarse fields the
//! card shows), detail pages yield richer field sets. Documents are parsed
//! per call, so no parsed tree ever outlives the call that needed it.

mod chain;
mod collections;
mod controls;
mod text;

pub use chain::{within, FieldChain, Strategy};
pub use collections::{FeatureCollector, ImageCollector};
pub use controls::{
    find_next_control, is_disabled, locate_control, page_number, probe_page_controls,
    NextControl, PageControlProbe,
};
pub use text::{collapse_whitespace, element_text, CountRule};

use crate::config::{compile_selector, FieldConfig, SelectorConfig};
use crate::state::{IdentityStore, ListingFields, ListingFragment};
use crate::url::ListingId;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A rendered document at its own location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Final location of the document (after redirects)
    pub url: Url,

    /// Serialized rendered DOM
    pub html: String,
}

impl Snapshot {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }

    /// Parses the snapshot into a queryable document
    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

/// A compiled selector that remembers its source text
#[derive(Debug, Clone)]
pub struct NamedSelector {
    pub text: String,
    pub selector: Selector,
}

impl NamedSelector {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            text: text.to_string(),
            selector: compile_selector(text)?,
        })
    }

    /// Compiles a list of selectors, keeping their order
    pub fn parse_all(texts: &[String]) -> Result<Vec<Self>, ConfigError> {
        texts.iter().map(|text| Self::parse(text)).collect()
    }
}

/// Where a listing identifier can be read from
#[derive(Debug, Clone)]
struct IdentitySource {
    selector: Selector,
    attribute: String,
}

/// Applies the configured selectors and fallback chains to snapshots
#[derive(Debug, Clone)]
pub struct Extractor {
    identity_sources: Vec<IdentitySource>,
    cards: Vec<Selector>,
    price: FieldChain,
    bedrooms: FieldChain,
    bathrooms: FieldChain,
    address: FieldChain,
    description: FieldChain,
    bedroom_rule: CountRule,
    bathroom_rule: CountRule,
    images: ImageCollector,
    features: FeatureCollector,
}

impl Extractor {
    /// Compiles every selector and pattern of a site profile
    pub fn from_config(selectors: &SelectorConfig, fields: &FieldConfig) -> Result<Self, ConfigError> {
        let compile_all = |texts: &[String]| {
            texts
                .iter()
                .map(|text| compile_selector(text))
                .collect::<Result<Vec<_>, _>>()
        };

        let identity_sources = selectors
            .identity_sources
            .iter()
            .map(|source| {
                Ok(IdentitySource {
                    selector: compile_selector(&source.selector)?,
                    attribute: source.attribute.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            identity_sources,
            cards: compile_all(&selectors.cards)?,
            price: FieldChain::compile("price", &fields.price)?,
            bedrooms: FieldChain::compile("bedrooms", &fields.bedrooms)?,
            bathrooms: FieldChain::compile("bathrooms", &fields.bathrooms)?,
            address: FieldChain::compile("address", &fields.address)?,
            description: FieldChain::compile("description", &fields.description)?,
            bedroom_rule: CountRule::bedrooms()?,
            bathroom_rule: CountRule::bathrooms()?,
            images: ImageCollector::new(&fields.images, &fields.asset_hosts, fields.max_images)?,
            features: FeatureCollector::new(&fields.features, fields.max_features)?,
        })
    }

    /// Extracts every listing visible on a list page
    ///
    /// Identity sources are read in priority order, elements in document
    /// order. A listing seen through several sources yields one fragment at
    /// the position of its first sighting, with the card fields of all its
    /// sightings folded together.
    pub fn extract_list_page(&self, snapshot: &Snapshot) -> Vec<ListingFragment> {
        let document = snapshot.document();
        let mut page = IdentityStore::new();

        for source in &self.identity_sources {
            for element in document.select(&source.selector) {
                let Some(raw) = element.value().attr(&source.attribute) else {
                    continue;
                };
                let raw = raw.trim();
                if raw.is_empty() || raw.starts_with('#') {
                    continue;
                }

                let id = match ListingId::resolve(raw, &snapshot.url) {
                    Ok(id) => id,
                    Err(e) => {
                        tracing::debug!("Skipping listing reference '{}': {}", raw, e);
                        continue;
                    }
                };

                let card = self.card_scope(element);
                page.upsert(ListingFragment {
                    id,
                    fields: self.card_fields(card, &snapshot.url),
                });
            }
        }

        page.into_records().into_iter().map(ListingFragment::from).collect()
    }

    /// Extracts the detail-page field set over the whole document
    pub fn extract_detail_fields(&self, snapshot: &Snapshot) -> ListingFields {
        let document = snapshot.document();
        let root = document.root_element();

        let mut fields = self.card_fields(root, &snapshot.url);
        fields.description = self.description.resolve(root);
        fields.features = self.features.collect(root);
        fields
    }

    /// The element itself if it is a card, else its nearest card ancestor,
    /// else the element
    fn card_scope<'a>(&self, element: ElementRef<'a>) -> ElementRef<'a> {
        let is_card = |candidate: &ElementRef<'_>| self.cards.iter().any(|card| card.matches(candidate));

        if is_card(&element) {
            return element;
        }

        element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|ancestor| is_card(ancestor))
            .unwrap_or(element)
    }

    fn card_fields(&self, scope: ElementRef<'_>, base: &Url) -> ListingFields {
        ListingFields {
            price: self.price.resolve(scope),
            bedroom_count: self
                .bedrooms
                .resolve_with(scope, |raw| self.bedroom_rule.parse(&raw)),
            bathroom_count: self
                .bathrooms
                .resolve_with(scope, |raw| self.bathroom_rule.parse(&raw)),
            address: self.address.resolve(scope),
            images: self.images.collect(scope, base),
            description: None,
            features: Vec::new(),
        }
    }
}
