use crate::UrlError;
use url::Url;

/// Query parameters added by share links that never change the target
const TRACKING_PARAMS: &[&str] = &["igshid", "igsh", "fbclid", "hl", "ref"];

/// Turns a raw input entry into an absolute URL
///
/// Inputs that are already absolute http(s) URLs are kept; anything else is
/// treated as a username or path relative to the site base URL, so `nasa`,
/// `@nasa` and `/nasa/` all resolve to `{base}/nasa`. A host written without
/// a scheme (`instagram.com/nasa`) gets `https://` prepended.
///
/// # Arguments
///
/// * `raw` - One entry of the configured direct URLs
/// * `base_url` - The configured site base URL
///
/// # Returns
///
/// * `Ok(Url)` - The cleaned absolute URL
/// * `Err(UrlError)` - The entry is empty, uses another scheme, or has no host
///
/// # Examples
///
/// ```
/// use gram_ripple::url::normalize_input;
///
/// let url = normalize_input("nasa", "https://www.instagram.com").unwrap();
/// assert_eq!(url.as_str(), "https://www.instagram.com/nasa");
/// ```
pub fn normalize_input(raw: &str, base_url: &str) -> Result<Url, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Parse("empty input".to_string()));
    }

    let mut url = if raw.contains("://") {
        let url = Url::parse(raw).map_err(|e| UrlError::Parse(e.to_string()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(url.scheme().to_string()));
        }
        url
    } else if looks_like_host(raw) {
        Url::parse(&format!("https://{}", raw)).map_err(|e| UrlError::Parse(e.to_string()))?
    } else {
        let base = Url::parse(base_url).map_err(|e| UrlError::Parse(e.to_string()))?;
        let relative = raw.trim_start_matches('/').trim_start_matches('@');
        base.join(relative)
            .map_err(|e| UrlError::Parse(e.to_string()))?
    };

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    let path = normalize_path(url.path());
    url.set_path(&path);
    url.set_fragment(None);

    if url.query().is_some() {
        let kept = filter_query_params(&url);
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    Ok(url)
}

/// True for `host.tld/path` inputs; a lone `leo.messi` stays a username
fn looks_like_host(raw: &str) -> bool {
    match raw.split_once('/') {
        Some((first, _)) => first.contains('.') && !first.starts_with(['.', '@']),
        None => false,
    }
}

/// Removes empty and dot segments and the trailing slash (except for root)
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

fn filter_query_params(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
