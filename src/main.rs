//! Gram-Ripple main entry point
//!
//! This is the command-line interface for the Gram-Ripple scraper.

use clap::Parser;
use gram_ripple::config::{config_hash, read_config, validate, Config, ResultsType, Strategy};
use gram_ripple::crawler::{run_scrape, seed_requests};
use gram_ripple::output::print_statistics;
use gram_ripple::url::{classify, Classification};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Gram-Ripple: a content-routing scraper for social-media pages
///
/// Gram-Ripple classifies profile, post, hashtag, location and search URLs,
/// fetches each target with the configured strategy, and writes one
/// normalized record per entity, following child collections up to a limit.
#[derive(Parser, Debug)]
#[command(name = "gram-ripple")]
#[command(version)]
#[command(about = "A content-routing scraper for social-media pages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show how each input would be routed
    #[arg(long)]
    dry_run: bool,

    /// Override the fetch strategy (static-html, api, rendered)
    #[arg(long, value_name = "STRATEGY")]
    strategy: Option<Strategy>,

    /// Override the child collection (posts, reels, comments)
    #[arg(long, value_name = "TYPE")]
    results_type: Option<ResultsType>,

    /// Override the number of child records per parent
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Add a direct URL or username (repeatable)
    #[arg(long = "url", value_name = "URL")]
    urls: Vec<String>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(strategy) = self.strategy {
            config.scraper.strategy = strategy;
        }
        if let Some(results_type) = self.results_type {
            config.scraper.results_type = results_type;
        }
        if let Some(limit) = self.limit {
            config.scraper.results_limit = limit;
        }
        config.input.direct_urls.extend(self.urls.iter().cloned());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = read_config(&cli.config)?;
    cli.apply_overrides(&mut config);
    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }
    let hash = config_hash(&config)?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    match run_scrape(&config, &hash).await {
        Ok(stats) => {
            if !cli.quiet {
                print_statistics(&stats);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gram_ripple=info,warn"),
            1 => EnvFilter::new("gram_ripple=debug,info"),
            2 => EnvFilter::new("gram_ripple=trace,debug"),
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

/// Handles the --dry-run mode: shows the settings and where each input routes
fn handle_dry_run(config: &Config) {
    println!("=== Gram-Ripple Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Strategy: {:?}", config.scraper.strategy);
    println!("  Results type: {:?}", config.scraper.results_type);
    println!("  Results limit: {}", config.scraper.effective_limit());
    println!("  Max requests: {}", config.scraper.max_requests_per_crawl);
    println!("  Max concurrency: {}", config.scraper.max_concurrency);
    println!("  Base URL: {}", config.site.base_url);

    println!("\nOutput:");
    println!("  Format: {:?}", config.output.format);
    println!("  Path: {}", config.output.path);

    let requests = seed_requests(config);
    println!("\nTargets ({}):", requests.len());
    for request in &requests {
        match classify(&request.url, &config.site.domains) {
            Classification::Target(target) => {
                println!("  - {} {} ({})", target.content_type(), target.identifier(), request.url)
            }
            Classification::Unknown => println!("  - unclassified ({}), would be skipped", request.url),
        }
    }

    println!("\n✓ Configuration is valid");
}
