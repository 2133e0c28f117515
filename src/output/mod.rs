//! Output module for publishing harvest results
//!
//! This module handles:
//! - Shaping a harvest outcome into the published JSON document
//! - Writing that document to disk
//! - Printing a console summary

mod document;
mod json_output;
mod summary;
mod traits;

pub use document::{Listings, OutputDocument};
pub use json_output::{write_document, JsonOutputHandler};
pub use summary::{format_summary, print_summary};
pub use traits::{OutputError, OutputHandler, OutputResult};
