//! Multi-valued fields: images and feature lists

use crate::config::{compile_selector, AttributeSource};
use crate::extract::chain::within;
use crate::extract::text::element_text;
use crate::url::is_allowed_asset;
use crate::ConfigError;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use url::Url;

/// Gathers image URLs from every configured source
#[derive(Debug, Clone)]
pub struct ImageCollector {
    sources: Vec<(Selector, String)>,
    asset_hosts: Vec<String>,
    max: usize,
}

impl ImageCollector {
    pub fn new(
        sources: &[AttributeSource],
        asset_hosts: &[String],
        max: usize,
    ) -> Result<Self, ConfigError> {
        let sources = sources
            .iter()
            .map(|source| Ok((compile_selector(&source.selector)?, source.attribute.clone())))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            sources,
            asset_hosts: asset_hosts.to_vec(),
            max,
        })
    }

    /// Collects absolute, allow-listed, deduplicated image URLs in first-seen
    /// order, capped at the configured maximum
    ///
    /// Sources are visited in configuration order, elements in document
    /// order.
    pub fn collect(&self, scope: ElementRef<'_>, base: &Url) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut images = Vec::new();

        for (selector, attribute) in &self.sources {
            for element in within(scope, selector) {
                let Some(value) = element.value().attr(attribute) else {
                    continue;
                };

                for candidate in candidates(attribute, value) {
                    let Some(url) = self.accept(candidate, base) else {
                        continue;
                    };
                    if seen.insert(url.clone()) {
                        images.push(url);
                        if images.len() >= self.max {
                            return images;
                        }
                    }
                }
            }
        }

        images
    }

    fn accept(&self, raw: &str, base: &Url) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with("data:") {
            return None;
        }

        let mut url = base.join(raw).ok()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return None;
        }
        if !is_allowed_asset(&url, &self.asset_hosts) {
            tracing::trace!(image = %url, "image host not allowed");
            return None;
        }

        url.set_fragment(None);
        Some(url.into())
    }
}

/// Splits an attribute value into image URL candidates
///
/// `srcset` lists `url descriptor` pairs separated by commas; only the URL
/// part of each is kept. Any other attribute holds a single URL.
fn candidates<'a>(attribute: &str, value: &'a str) -> Vec<&'a str> {
    if attribute.eq_ignore_ascii_case("srcset") {
        value
            .split(',')
            .filter_map(|entry| entry.split_whitespace().next())
            .collect()
    } else {
        vec![value]
    }
}

/// Gathers feature bullet points
#[derive(Debug, Clone)]
pub struct FeatureCollector {
    selectors: Vec<Selector>,
    max: usize,
}

impl FeatureCollector {
    pub fn new(selectors: &[String], max: usize) -> Result<Self, ConfigError> {
        let selectors = selectors
            .iter()
            .map(|selector| compile_selector(selector))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { selectors, max })
    }

    /// Returns the items of the first selector yielding any non-empty item
    pub fn collect(&self, scope: ElementRef<'_>) -> Vec<String> {
        for selector in &self.selectors {
            let mut seen = HashSet::new();
            let features: Vec<String> = within(scope, selector)
                .map(element_text)
                .filter(|item| !item.is_empty())
                .filter(|item| seen.insert(item.clone()))
                .take(self.max)
                .collect();

            if !features.is_empty() {
                return features;
            }
        }
        Vec::new()
    }
}
