//! URL handling module for Gram-Ripple
//!
//! This module turns raw inputs into absolute URLs, matches hosts against the
//! configured site domains, and classifies URLs into scrape targets. The
//! classifier is pure: no I/O, no logging.

mod matcher;
mod normalize;

use serde::Serialize;
use std::fmt;
use url::Url;

// Re-export main functions
pub use matcher::{matches_any, matches_wildcard};
pub use normalize::normalize_input;

/// Semantic type of a page or record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentType {
    Post,
    Profile,
    Hashtag,
    Location,
    Comment,
    SearchResult,
}

impl ContentType {
    /// All content types, in record-table order
    pub const ALL: [ContentType; 6] = [
        ContentType::Profile,
        ContentType::Post,
        ContentType::Comment,
        ContentType::Hashtag,
        ContentType::Location,
        ContentType::SearchResult,
    ];

    /// The record `type` tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Profile => "profile",
            Self::Hashtag => "hashtag",
            Self::Location => "location",
            Self::Comment => "comment",
            Self::SearchResult => "searchResult",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A URL classified with a content type and identifier
///
/// The identifier is type-specific: username for profiles, shortcode for
/// posts, tag text for hashtags, numeric id for locations and the query text
/// for searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTarget {
    url: Url,
    content_type: ContentType,
    identifier: String,
}

impl ScrapeTarget {
    pub fn new(url: Url, content_type: ContentType, identifier: impl Into<String>) -> Self {
        Self {
            url,
            content_type,
            identifier: identifier.into(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Builds the canonical page URL for this target on `base`
    ///
    /// # Examples
    ///
    /// ```
    /// use gram_ripple::url::{classify, Classification};
    ///
    /// let domains = vec!["*.instagram.com".to_string()];
    /// if let Classification::Target(t) = classify("https://instagram.com/reel/XYZ?x=1", &domains) {
    ///     assert_eq!(
    ///         t.canonical_url("https://www.instagram.com").unwrap().as_str(),
    ///         "https://www.instagram.com/p/XYZ/"
    ///     );
    /// }
    /// ```
    pub fn canonical_url(&self, base: &str) -> Result<Url, url::ParseError> {
        let base = Url::parse(base)?;
        let id = &self.identifier;
        let mut url = match self.content_type {
            ContentType::Profile => base.join(&format!("{}/", id))?,
            ContentType::Post | ContentType::Comment => base.join(&format!("p/{}/", id))?,
            ContentType::Hashtag => base.join(&format!("explore/tags/{}/", id))?,
            ContentType::Location => base.join(&format!("explore/locations/{}/", id))?,
            ContentType::SearchResult => base.join("explore/search/keyword/")?,
        };
        if self.content_type == ContentType::SearchResult {
            url.query_pairs_mut().append_pair("q", id);
        }
        Ok(url)
    }
}

/// Result of classifying a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Target(ScrapeTarget),
    /// No rule matched; the caller logs and skips
    Unknown,
}

impl Classification {
    pub fn target(self) -> Option<ScrapeTarget> {
        match self {
            Self::Target(t) => Some(t),
            Self::Unknown => None,
        }
    }
}

/// Classifies a URL into a scrape target
///
/// Rules in priority order, first match wins:
/// 1. a `p` or `reel` segment followed by another segment → Post
/// 2. `explore/tags/<tag>` → Hashtag (trailing segment)
/// 3. `explore/locations/<id>` → Location (segment after `locations`)
/// 4. `explore/search/...?q=<query>` → SearchResult
/// 5. host matches a site domain and no `explore` segment → Profile (first segment)
/// 6. otherwise Unknown
///
/// Trailing slashes, query strings and fragments never affect the identifier.
/// Host matching is case-insensitive.
///
/// # Arguments
///
/// * `url` - Absolute URL to classify
/// * `domains` - Site domain patterns (see [`matches_wildcard`])
pub fn classify(url: &str, domains: &[String]) -> Classification {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return Classification::Unknown,
    };

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let target = |content_type: ContentType, identifier: &str| {
        let mut clean = parsed.clone();
        clean.set_fragment(None);
        Classification::Target(ScrapeTarget::new(clean, content_type, identifier))
    };

    // Rule 1: post or reel
    if let Some(pos) = segments.iter().position(|s| *s == "p" || *s == "reel") {
        return match segments.get(pos + 1) {
            Some(code) => target(ContentType::Post, *code),
            None => Classification::Unknown,
        };
    }

    let explore = segments.iter().position(|s| *s == "explore");

    if let Some(pos) = explore {
        match segments.get(pos + 1).copied() {
            // Rule 2: hashtag
            Some("tags") => {
                if segments.len() > pos + 2 {
                    if let Some(tag) = segments.last() {
                        return target(ContentType::Hashtag, *tag);
                    }
                }
            }
            // Rule 3: location
            Some("locations") => {
                if let Some(id) = segments.get(pos + 2) {
                    return target(ContentType::Location, *id);
                }
            }
            // Rule 4: search
            Some("search") => {
                let query = parsed
                    .query_pairs()
                    .find(|(k, _)| k == "q")
                    .map(|(_, v)| v.trim().to_string())
                    .filter(|q| !q.is_empty());
                if let Some(q) = query {
                    return target(ContentType::SearchResult, q.as_str());
                }
            }
            _ => {}
        }
        return Classification::Unknown;
    }

    // Rule 5: profile
    let host_matches = parsed
        .host_str()
        .map(|h| matches_any(domains, h))
        .unwrap_or(false);

    if host_matches {
        if let Some(username) = segments.first() {
            return target(ContentType::Profile, *username);
        }
    }

    Classification::Unknown
}
