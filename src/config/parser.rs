use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use gram_ripple::config::load_config;
///
/// let config = load_config(Path::new("scrape.toml")).unwrap();
/// println!("Strategy: {:?}", config.scraper.strategy);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Reads a configuration file without validating it
///
/// Used when command-line overrides are applied before validation; the
/// caller is expected to run [`validate`] afterwards.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the effective configuration
///
/// The hash covers the parsed settings, including defaults and command-line
/// overrides, so two runs share a hash exactly when they ran with the same
/// settings. It is logged at startup and stored with SQLite runs.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the serialized config
/// * `Err(ConfigError)` - The config could not be serialized
pub fn config_hash(config: &Config) -> Result<String, ConfigError> {
    let bytes = serde_json::to_vec(config)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = config_hash(&config)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputFormat, ResultsType, Strategy};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[input]
direct-urls = ["https://www.instagram.com/natgeo/", "nasa"]

[scraper]
strategy = "api"
results-type = "comments"
results-limit = 25

[output]
format = "sqlite"
path = "./records.db"

[session.cookies]
csrftoken = "abc"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.input.direct_urls.len(), 2);
        assert_eq!(config.scraper.strategy, Strategy::Api);
        assert_eq!(config.scraper.results_type, ResultsType::Comments);
        assert_eq!(config.scraper.effective_limit(), 25);
        assert_eq!(config.output.format, OutputFormat::Sqlite);
        assert_eq!(config.session.cookies.get("csrftoken").unwrap(), "abc");
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse_config("[input]\ndirect-urls = [\"nasa\"]\n").unwrap();

        assert_eq!(config.scraper.strategy, Strategy::StaticHtml);
        assert_eq!(config.scraper.results_type, ResultsType::Posts);
        assert_eq!(config.scraper.results_limit, 0);
        assert_eq!(config.scraper.effective_limit(), 10);
        assert_eq!(config.scraper.max_concurrency, 1);
        assert_eq!(config.scraper.max_requests_per_crawl, 100);
        assert_eq!(config.site.base_url, "https://www.instagram.com");
        assert_eq!(config.browser.element_wait_timeout_secs, 10);
        assert_eq!(
            config.fields.likes,
            vec![
                "edge_liked_by.count",
                "edge_media_preview_like.count",
                "like_count"
            ]
        );
    }

    #[test]
    fn test_custom_priority_list() {
        let config = parse_config(
            r#"
[input]
search = "coffee"

[fields]
likes = ["like_count", "edge_liked_by.count"]
"#,
        )
        .unwrap();

        assert_eq!(config.fields.likes[0], "like_count");
        assert_eq!(
            config.fields.caption,
            crate::config::FieldPriorities::default().caption
        );
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/scrape.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let result = parse_config("[input]\nsearch = \"x\"\n[scraper]\nstrategy = \"telepathy\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_no_targets_is_fatal() {
        let result = parse_config("[scraper]\nresults-limit = 5\n");
        assert!(matches!(result, Err(ConfigError::NoTargets)));
    }

    #[test]
    fn test_read_config_skips_validation() {
        let file = create_temp_config("[scraper]\nresults-limit = 5\n");
        let mut config = read_config(file.path()).unwrap();
        assert!(matches!(validate(&config), Err(ConfigError::NoTargets)));

        config.input.direct_urls.push("nasa".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_config_hash_is_stable() {
        let config = parse_config("[input]\ndirect-urls = [\"nasa\"]\n").unwrap();

        let hash1 = config_hash(&config).unwrap();
        let hash2 = config_hash(&config.clone()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_config_hash_ignores_formatting() {
        let compact = parse_config("[input]\ndirect-urls = [\"nasa\"]\n").unwrap();
        let spaced = parse_config(
            r#"
# same settings, different layout
[input]
direct-urls = [ "nasa" ]

[scraper]
results-limit = 0
"#,
        )
        .unwrap();

        assert_eq!(config_hash(&compact).unwrap(), config_hash(&spaced).unwrap());
    }

    #[test]
    fn test_config_hash_tracks_overrides() {
        let file = create_temp_config("[input]\ndirect-urls = [\"nasa\"]\n");
        let (mut config, file_hash) = load_config_with_hash(file.path()).unwrap();

        config.scraper.results_limit = 25;

        assert_ne!(config_hash(&config).unwrap(), file_hash);
    }
}
