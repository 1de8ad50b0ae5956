//! Configuration module for Gram-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section except `[input]` has working defaults.
//!
//! # Example
//!
//! ```no_run
//! use gram_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scrape.toml")).unwrap();
//! println!("Child records per parent: {}", config.scraper.effective_limit());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, BrowserConfig, Config, FieldPriorities, HttpConfig, InputConfig, OutputConfig,
    OutputFormat, QueryHashes, ResultsType, ScraperConfig, SessionConfig, SiteConfig, Strategy,
    DEFAULT_RESULTS_LIMIT,
};

// Re-export parser functions
pub use parser::{config_hash, load_config, load_config_with_hash, parse_config, read_config};
pub use validation::validate;
