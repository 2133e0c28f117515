//! Output handler trait and error types

use crate::crawler::CrawlOutcome;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for output handlers
///
/// An output handler persists a finished harvest somewhere. It is called
/// once per run, after both phases, whatever the run's status.
pub trait OutputHandler {
    /// Writes the outcome of a harvest
    fn write_outcome(&self, outcome: &CrawlOutcome) -> OutputResult<()>;
}
