//! HTTP client shared by the static-HTML and API strategies

use super::FetchFailure;
use crate::config::HttpConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use tracing::trace;

/// Builds an HTTP client that presents itself like a desktop browser
///
/// # Arguments
///
/// * `config` - Header values and request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - A header value is invalid or TLS setup failed
///
/// # Example
///
/// ```no_run
/// use gram_ripple::config::HttpConfig;
/// use gram_ripple::fetch::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    if let Ok(v) = HeaderValue::from_str(&config.accept) {
        headers.insert(ACCEPT, v);
    }
    if let Ok(v) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, v);
    }
    if let Ok(v) = HeaderValue::from_str(&config.referer) {
        headers.insert(REFERER, v);
    }

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(5))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends a GET request and returns the body of a successful response
///
/// Non-success statuses become [`FetchFailure::Status`].
pub async fn get_text(
    client: &Client,
    url: &str,
    headers: HeaderMap,
) -> Result<String, FetchFailure> {
    trace!("GET {}", url);

    let response = client.get(url).headers(headers).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchFailure::Status(status.as_u16()));
    }

    Ok(response.text().await?)
}
