//! URL handling module for Sumi-Harvest
//!
//! This module provides the listing identifier type, the normalization it
//! depends on, and the asset-host allow-list matching used for images.

mod matcher;
mod normalize;

use crate::UrlError;
use serde::Serialize;
use std::fmt;
use url::Url;

pub use matcher::{is_allowed_asset, matches_wildcard};
pub use normalize::{normalize_url, resolve_url, with_query_param};

/// A normalized absolute URL naming exactly one listing
///
/// Two identifiers are the same listing if and only if their normalized
/// strings are equal. The only ways to build one go through [`resolve_url`]
/// or [`normalize_url`], so no unnormalized identifier can reach the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    /// Resolves a raw reference found in a document against the document's
    /// own location
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_harvest::url::ListingId;
    /// use url::Url;
    ///
    /// let page = Url::parse("https://site.test/homes?pageno=2").unwrap();
    /// let a = ListingId::resolve("/listing/42", &page).unwrap();
    /// let b = ListingId::resolve("https://site.test/listing/42/", &page).unwrap();
    /// assert_eq!(a, b);
    /// ```
    pub fn resolve(raw: &str, document_url: &Url) -> Result<Self, UrlError> {
        resolve_url(raw, document_url).map(|url| Self(url.into()))
    }

    /// Normalizes an already absolute URL string
    pub fn parse(absolute: &str) -> Result<Self, UrlError> {
        normalize_url(absolute).map(|url| Self(url.into()))
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the identifier as a navigable URL
    pub fn to_url(&self) -> Result<Url, UrlError> {
        Url::parse(&self.0).map_err(|e| UrlError::Parse(e.to_string()))
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ListingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
