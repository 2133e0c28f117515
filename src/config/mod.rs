//! Configuration module for Sumi-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. A configuration describes one site profile: where the list pages
//! live, how they paginate, and where each field can be found.
//!
//! # Example
//!
//! ```no_run
//! use sumi_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Will visit at most {} list pages", config.crawl.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AttributeSource, Config, CrawlConfig, FieldConfig, OutputConfig, OutputMode, PaginationMode,
    SelectorConfig, StrategyConfig, TargetConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;

pub(crate) use validation::{compile_pattern, compile_selector};
