/// Checks if a host matches a site domain pattern
///
/// Two kinds of patterns are supported:
/// 1. Exact: "instagram.com" matches only "instagram.com"
/// 2. Wildcard: "*.instagram.com" matches the bare domain and every
///    subdomain ("www.instagram.com", "m.instagram.com")
///
/// Comparison is case-insensitive.
///
/// # Examples
///
/// ```
/// use gram_ripple::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.instagram.com", "www.instagram.com"));
/// assert!(matches_wildcard("*.instagram.com", "INSTAGRAM.com"));
/// assert!(!matches_wildcard("instagram.com", "www.instagram.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let candidate = candidate.to_ascii_lowercase();

    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}

/// True when `host` matches any of the configured site patterns
pub fn matches_any(patterns: &[String], host: &str) -> bool {
    patterns.iter().any(|p| matches_wildcard(p, host))
}
