//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `IdentityStore`: the deduplicating, first-seen-ordered owner of every listing record
//! - `ListingRecord` / `ListingFields` / `ListingFragment`: the record model and its merge rule
//! - `CrawlState`: per-run page counters

mod crawl_state;
mod identity_store;
mod record;

pub use crawl_state::CrawlState;
pub use identity_store::{IdentityStore, UpsertOutcome};
pub use record::{ListingFields, ListingFragment, ListingRecord};
