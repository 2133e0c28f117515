//! The JSON document a harvest is published as

use crate::config::OutputMode;
use crate::crawler::{mode_name, CrawlOutcome, CrawlStatus, EnrichmentReport, StopReason};
use crate::state::ListingRecord;
use crate::url::ListingId;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Serializable view of a [`CrawlOutcome`]
///
/// `count` always equals the length of `listings`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDocument<'a> {
    #[serde(serialize_with = "iso_timestamp")]
    pub updated_at: DateTime<Utc>,
    pub source: &'a str,
    pub pagination: &'static str,
    pub pages_visited: u32,
    pub count: usize,
    pub status: CrawlStatus,
    pub stop_reason: StopReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentReport>,
    pub listings: Listings<'a>,
}

/// The listings array: full records or bare identifiers
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Listings<'a> {
    Full(&'a [ListingRecord]),
    UrlsOnly(Vec<&'a ListingId>),
}

impl Listings<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::Full(records) => records.len(),
            Self::UrlsOnly(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> OutputDocument<'a> {
    /// Builds the document for an outcome in the given mode
    pub fn new(outcome: &'a CrawlOutcome, mode: OutputMode) -> Self {
        let listings = match mode {
            OutputMode::Full => Listings::Full(&outcome.records),
            OutputMode::UrlsOnly => {
                Listings::UrlsOnly(outcome.records.iter().map(|record| &record.id).collect())
            }
        };

        Self {
            updated_at: outcome.updated_at,
            source: &outcome.source,
            pagination: mode_name(outcome.pagination),
            pages_visited: outcome.pages_visited,
            count: listings.len(),
            status: outcome.status,
            stop_reason: outcome.stop_reason,
            enrichment: outcome.enrichment,
            listings,
        }
    }

    /// Pretty-printed JSON, newline-terminated
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

fn iso_timestamp<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}
