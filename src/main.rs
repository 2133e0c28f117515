//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest listing harvester.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use sumi_harvest::config::{load_config_with_hash, validate, Config, OutputMode};
use sumi_harvest::crawler::{harvest, mode_name, CrawlOutcome, CrawlStatus};
use sumi_harvest::output::{print_summary, JsonOutputHandler, OutputHandler};
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: a resilient listing harvester
///
/// Sumi-Harvest walks the list pages of a paginated listing site, collects
/// every listing it can identify, decides when pagination has really ended
/// and optionally enriches each listing from its detail page. The result is
/// written as a single JSON document.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version)]
#[command(about = "A resilient listing harvester", long_about = None)]
struct Cli {
    /// Path to TOML site profile (built-in profile if omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// First list page (overrides the profile; required without --config)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Hard cap on list pages
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Write identifiers only and skip the detail pass
    #[arg(long)]
    urls_only: bool,

    /// Skip the detail pass
    #[arg(long)]
    no_details: bool,

    /// Output file (overrides the profile)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(ExitCode::SUCCESS);
    }

    handle_harvest(config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the site profile and applies command-line overrides
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => match &cli.url {
            Some(url) => Config::for_url(url.clone()),
            None => bail!("--url is required when no --config is given"),
        },
    };

    if let Some(url) = &cli.url {
        config.target.base_url = url.clone();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawl.max_pages = max_pages;
    }
    if cli.urls_only {
        config.output.mode = OutputMode::UrlsOnly;
    }
    if cli.no_details {
        config.crawl.enrich_details = false;
    }
    if let Some(output) = &cli.output {
        config.output.path = output.display().to_string();
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Harvest Dry Run ===\n");

    println!("Target:");
    println!("  Base URL: {}", config.target.base_url);
    println!("  Pagination: {}", mode_name(config.target.pagination));
    println!("  Page parameter: {}", config.target.page_parameter);

    println!("\nCrawl:");
    println!("  Max pages: {}", config.crawl.max_pages);
    println!(
        "  Stale check from page: {}",
        config.crawl.min_iterations_before_stale_check
    );
    println!("  Navigation timeout: {}ms", config.crawl.navigation_timeout_ms);
    println!("  Selector timeout: {}ms", config.crawl.selector_timeout_ms);
    println!("  Settle delay: {}ms", config.crawl.settle_delay_ms);
    println!("  Politeness delay: {}ms", config.crawl.politeness_delay_ms);
    println!(
        "  Detail pass: {}",
        if config.crawl.enrich_details && config.output.mode == OutputMode::Full {
            "enabled"
        } else {
            "disabled"
        }
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nSelectors:");
    println!("  Listing markers: {}", config.selectors.listing_markers.join(", "));
    for source in &config.selectors.identity_sources {
        println!("  Identity source: {}@{}", source.selector, source.attribute);
    }

    println!("\nOutput:");
    println!("  Path: {}", config.output.path);
    println!(
        "  Mode: {}",
        match config.output.mode {
            OutputMode::Full => "full",
            OutputMode::UrlsOnly => "urls-only",
        }
    );

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, quiet: bool) -> Result<ExitCode> {
    let handler = JsonOutputHandler::from_config(&config.output);

    let outcome = match harvest(config.clone()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            // A failed harvest still publishes an undetermined document
            if let Err(write_error) = handler.write_outcome(&CrawlOutcome::undetermined(&config)) {
                tracing::error!(
                    "Failed to write {}: {}",
                    handler.path().display(),
                    write_error
                );
            }
            return Err(anyhow::Error::new(e).context("Harvest failed"));
        }
    };

    handler
        .write_outcome(&outcome)
        .with_context(|| format!("Failed to write {}", handler.path().display()))?;

    if !quiet {
        print_summary(&outcome);
    }

    match outcome.status {
        CrawlStatus::Complete | CrawlStatus::ConfirmedEmpty => Ok(ExitCode::SUCCESS),
        CrawlStatus::Undetermined => {
            tracing::error!("The first list page never rendered; the result is not trustworthy");
            Ok(ExitCode::from(2))
        }
    }
}
