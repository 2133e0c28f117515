//! JSON file output handler

use crate::config::{OutputConfig, OutputMode};
use crate::crawler::CrawlOutcome;
use crate::output::document::OutputDocument;
use crate::output::traits::{OutputHandler, OutputResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes the harvest to a JSON file, creating parent directories as needed
#[derive(Debug, Clone)]
pub struct JsonOutputHandler {
    path: PathBuf,
    mode: OutputMode,
}

impl JsonOutputHandler {
    pub fn new(path: impl Into<PathBuf>, mode: OutputMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.path, config.mode)
    }

    /// Destination file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputHandler for JsonOutputHandler {
    fn write_outcome(&self, outcome: &CrawlOutcome) -> OutputResult<()> {
        write_document(&self.path, &OutputDocument::new(outcome, self.mode))
    }
}

/// Serializes a document and writes it to `path`
pub fn write_document(path: &Path, document: &OutputDocument<'_>) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, document.to_json()?)?;
    tracing::info!("Wrote {} listings to {}", document.count, path.display());
    Ok(())
}
