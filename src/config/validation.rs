use crate::config::types::{
    Config, FieldPriorities, HttpConfig, InputConfig, OutputConfig, ScraperConfig, SiteConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// A configuration without any direct URL and without a search query is the
/// one fatal input condition and yields [`ConfigError::NoTargets`].
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_input(&config.input)?;
    validate_scraper_config(&config.scraper)?;
    validate_site_config(&config.site)?;
    validate_http_config(&config.http)?;
    validate_field_priorities(&config.fields)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the input section
fn validate_input(input: &InputConfig) -> Result<(), ConfigError> {
    let has_urls = input.direct_urls.iter().any(|u| !u.trim().is_empty());
    let has_search = input
        .search
        .as_deref()
        .map(|q| !q.trim().is_empty())
        .unwrap_or(false);

    if !has_urls && !has_search {
        return Err(ConfigError::NoTargets);
    }

    Ok(())
}

/// Validates scraper configuration
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 || config.page_size > 50 {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and 50, got {}",
            config.page_size
        )));
    }

    if config.max_concurrency < 1 || config.max_concurrency > 32 {
        return Err(ConfigError::Validation(format!(
            "max-concurrency must be between 1 and 32, got {}",
            config.max_concurrency
        )));
    }

    if config.max_requests_per_crawl < 1 {
        return Err(ConfigError::Validation(format!(
            "max-requests-per-crawl must be >= 1, got {}",
            config.max_requests_per_crawl
        )));
    }

    Ok(())
}

/// Validates the site description
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if config.domains.is_empty() {
        return Err(ConfigError::Validation(
            "site.domains must list at least one domain pattern".to_string(),
        ));
    }

    for pattern in &config.domains {
        validate_domain_pattern(pattern)?;
    }

    Ok(())
}

/// Validates the request headers
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Every priority list needs at least one path
fn validate_field_priorities(fields: &FieldPriorities) -> Result<(), ConfigError> {
    for (key, list) in fields.lists() {
        if list.is_empty() || list.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "fields.{} must contain at least one non-empty path",
                key
            )));
        }
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "output.path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)?;
    } else {
        validate_domain_string(pattern)?;
    }

    Ok(())
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'instagram.com')",
            domain
        )));
    }

    Ok(())
}
