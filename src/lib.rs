//! Gram-Ripple: a content-routing scraper for social-media pages
//!
//! This crate classifies input URLs, fetches their payload through one of
//! several strategies, extracts normalized records, and pages through child
//! collections (a profile's posts, a post's comments) up to a result limit.

pub mod config;
pub mod crawler;
pub mod document;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod paginate;
pub mod record;
pub mod session;
pub mod url;

use thiserror::Error;

/// Main error type for Gram-Ripple operations
///
/// These are run-level failures. Per-target problems are reported through
/// [`fetch::FetchFailure`], [`url::Classification::Unknown`] and
/// [`extract::Extraction::NoMatch`] and never abort a run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("No targets: provide at least one direct URL or a search query")]
    NoTargets,

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Gram-Ripple operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use record::{FieldValue, NormalizedRecord};
pub use url::{classify, Classification, ContentType, ScrapeTarget};
