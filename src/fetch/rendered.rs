//! Rendered-page strategy
//!
//! Opens the canonical page in a browser, waits for the content marker of the
//! target type, and reads a snapshot of the visible fields into the same JSON
//! vocabulary the API uses. Child collections are read by scrolling the live
//! page, so the page handle travels with the [`Document`].

use super::{FetchFailure, Fetcher};
use crate::config::BrowserConfig;
use crate::document::{Document, DocumentShape};
use crate::extract::{parse_count, search_hits, ChildKind};
use crate::paginate::{ChildSource, EdgeListSource, ScrollSource, TileMapper};
use crate::session::Session;
use crate::url::{ContentType, ScrapeTarget};
use async_trait::async_trait;
use chrono::DateTime;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// One value read from each collected item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelector {
    /// Key of the value in the collected object
    pub key: &'static str,
    /// Selector relative to the item; empty selects the item itself
    pub selector: &'static str,
    /// Attribute to read; `None` reads the text content
    pub attribute: Option<&'static str>,
}

impl FieldSelector {
    pub const fn text(key: &'static str, selector: &'static str) -> Self {
        Self {
            key,
            selector,
            attribute: None,
        }
    }

    pub const fn attr(key: &'static str, selector: &'static str, attribute: &'static str) -> Self {
        Self {
            key,
            selector,
            attribute: Some(attribute),
        }
    }
}

/// A loaded page in a live browser
#[async_trait]
pub trait RenderedPage: Send + Sync {
    /// Waits until `selector` matches, failing with
    /// [`FetchFailure::MissingElement`] after `timeout`
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), FetchFailure>;

    /// Text content of the first match
    async fn text(&self, selector: &str) -> Result<Option<String>, FetchFailure>;

    /// Attribute of the first match
    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, FetchFailure>;

    /// One object per `item_selector` match, keyed by the field keys
    ///
    /// Fields that do not resolve are null.
    async fn collect(
        &self,
        item_selector: &str,
        fields: &[FieldSelector],
    ) -> Result<Vec<Value>, FetchFailure>;

    async fn scroll_to_bottom(&self) -> Result<(), FetchFailure>;

    /// Current scroll height of the document
    async fn content_height(&self) -> Result<u64, FetchFailure>;
}

/// Opens pages in a browser
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn open(&self, url: &str, timeout: Duration) -> Result<Box<dyn RenderedPage>, FetchFailure>;
}

const OG_TITLE: &str = r#"meta[property="og:title"]"#;
const OG_DESCRIPTION: &str = r#"meta[property="og:description"]"#;

/// Media grid tiles of profiles, hashtags and locations
const POST_TILES: &str = r#"main a[href*="/p/"], main a[href*="/reel/"]"#;
const POST_TILE_FIELDS: [FieldSelector; 4] = [
    FieldSelector::attr("href", "", "href"),
    FieldSelector::attr("display_url", "img", "src"),
    FieldSelector::attr("accessibility_caption", "img", "alt"),
    FieldSelector::attr("video_label", r#"svg[aria-label="Clip"], svg[aria-label="Video"]"#, "aria-label"),
];

const COMMENT_TILES: &str = "article ul > div > li";
const COMMENT_TILE_FIELDS: [FieldSelector; 3] = [
    FieldSelector::text("username", "h3 a"),
    FieldSelector::text("text", "h3 + div span, h3 ~ span"),
    FieldSelector::attr("datetime", "time", "datetime"),
];

const SEARCH_HITS: &str = r#"div[role="dialog"] a[href], main a[href]"#;
const SEARCH_HIT_FIELDS: [FieldSelector; 2] = [
    FieldSelector::attr("href", "", "href"),
    FieldSelector::text("label", ""),
];

/// Element that marks a loaded page of each type
fn ready_marker(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Profile | ContentType::Hashtag | ContentType::Location => "header",
        ContentType::Post | ContentType::Comment => "article",
        ContentType::SearchResult => "main",
    }
}

/// Reads the live DOM of the canonical page
pub struct RenderedFetcher {
    driver: Arc<dyn PageDriver>,
    base_url: String,
    timing: BrowserConfig,
    page_size: usize,
}

impl RenderedFetcher {
    pub fn new(
        driver: Arc<dyn PageDriver>,
        base_url: impl Into<String>,
        timing: BrowserConfig,
        page_size: usize,
    ) -> Self {
        Self {
            driver,
            base_url: base_url.into(),
            timing,
            page_size,
        }
    }

    async fn snapshot(
        &self,
        page: &dyn RenderedPage,
        target: &ScrapeTarget,
    ) -> Result<Value, FetchFailure> {
        let id = target.identifier();
        let title = page.attribute(OG_TITLE, "content").await?;
        let description = page.attribute(OG_DESCRIPTION, "content").await?;
        let summary = description.as_deref().map(leading_counts).unwrap_or_default();

        let snapshot = match target.content_type() {
            ContentType::Profile => {
                let full_name = title
                    .as_deref()
                    .and_then(|t| t.split(" (@").next())
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string);
                let verified = page
                    .attribute(r#"header svg[aria-label="Verified"]"#, "aria-label")
                    .await?
                    .is_some();
                let private = page.text("main h2").await?.map_or(false, |t| {
                    t.to_lowercase().contains("private")
                });
                json!({"user": {
                    "username": id,
                    "full_name": full_name,
                    "biography": page.text("header section h1").await?,
                    "follower_count": summary.get("followers"),
                    "following_count": summary.get("following"),
                    "media_count": summary.get("posts"),
                    "is_verified": verified,
                    "is_private": private,
                    "timeline": {},
                }})
            }
            ContentType::Post | ContentType::Comment => {
                let taken_at = page
                    .attribute("article time", "datetime")
                    .await?
                    .and_then(|t| epoch_seconds(&t));
                let is_video = page.attribute("article video", "src").await?.is_some()
                    || page.text("article video").await?.is_some();
                let typename = if is_video { "GraphVideo" } else { "GraphImage" };
                json!({"media": {
                    "shortcode": id,
                    "owner": {"username": page.text("article header a").await?},
                    "caption": page.text("article h1").await?,
                    "like_count": summary.get("likes"),
                    "comment_count": summary.get("comments"),
                    "taken_at": taken_at,
                    "__typename": typename,
                    "is_video": is_video,
                    "display_url": page.attribute("article img", "src").await?,
                    "comments": {},
                }})
            }
            ContentType::Hashtag => json!({"hashtag": {
                "name": id,
                "media_count": summary.get("posts"),
                "profile_pic_url": page.attribute("header img", "src").await?,
                "media": {},
            }}),
            ContentType::Location => {
                let name = title
                    .as_deref()
                    .and_then(|t| t.split(" \u{2022} ").next())
                    .map(str::trim)
                    .map(str::to_string);
                json!({"location": {
                    "id": id,
                    "name": name,
                    "lat": page.attribute(r#"meta[property="place:location:latitude"]"#, "content").await?,
                    "lng": page.attribute(r#"meta[property="place:location:longitude"]"#, "content").await?,
                    "media": {},
                }})
            }
            ContentType::SearchResult => {
                let tiles = page.collect(SEARCH_HITS, &SEARCH_HIT_FIELDS).await?;
                json!({"search": search_lists(&tiles)})
            }
        };

        Ok(snapshot)
    }
}

#[async_trait]
impl Fetcher for RenderedFetcher {
    async fn fetch(
        &self,
        target: &ScrapeTarget,
        _session: &dyn Session,
    ) -> Result<Document, FetchFailure> {
        let url = target
            .canonical_url(&self.base_url)
            .map_err(|e| FetchFailure::MalformedPayload(format!("target URL: {}", e)))?;

        let page = self
            .driver
            .open(url.as_str(), Duration::from_secs(self.timing.navigation_timeout_secs))
            .await?;

        let marker = ready_marker(target.content_type());
        page.wait_for(marker, Duration::from_secs(self.timing.element_wait_timeout_secs))
            .await?;
        debug!("Page for {} is ready", target.identifier());

        let snapshot = self.snapshot(page.as_ref(), target).await?;
        Ok(Document::new(DocumentShape::Rendered, snapshot).with_page(page))
    }

    fn child_source(
        &self,
        target: &ScrapeTarget,
        kind: ChildKind,
        document: &mut Document,
        _session: &dyn Session,
    ) -> Option<Box<dyn ChildSource>> {
        if kind == ChildKind::SearchHits {
            let container = document.child_container(target.content_type())?;
            return Some(Box::new(EdgeListSource::new(
                search_hits(container),
                self.page_size,
            )));
        }

        let page = document.take_page()?;
        let settle = Duration::from_millis(self.timing.scroll_settle_ms);
        let (selector, fields, mapper): (&str, Vec<FieldSelector>, TileMapper) = match kind {
            ChildKind::Comments => (COMMENT_TILES, COMMENT_TILE_FIELDS.to_vec(), comment_tile),
            _ => (POST_TILES, POST_TILE_FIELDS.to_vec(), post_tile),
        };

        Some(Box::new(ScrollSource::new(page, selector, fields, mapper, settle)))
    }
}

/// Parses `"1,234 Followers, 56 Following, 78 Posts - ..."` style summaries
///
/// Keys are the lowercased labels. Only the part before ` - ` is read.
fn leading_counts(description: &str) -> Map<String, Value> {
    let head = description.split(" - ").next().unwrap_or_default();
    let mut counts = Map::new();
    for part in head.split(", ") {
        let mut words = part.trim().splitn(2, ' ');
        let (number, label) = match (words.next(), words.next()) {
            (Some(n), Some(l)) => (n, l),
            _ => continue,
        };
        if let Some(n) = parse_count(number) {
            counts.insert(label.trim().to_lowercase(), json!(n));
        }
    }
    counts
}

fn epoch_seconds(datetime: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(datetime)
        .ok()
        .map(|t| t.timestamp())
}

/// Base that site-relative tile links resolve against; only the path is read
const LINK_BASE: &str = "https://www.instagram.com/";

/// Decoded, non-empty path segments of a relative, protocol-relative or absolute href
fn href_segments(href: &str) -> Vec<String> {
    let resolved = match Url::parse(LINK_BASE).and_then(|base| base.join(href)) {
        Ok(url) => url,
        Err(_) => return Vec::new(),
    };
    resolved
        .path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(|s| urlencoding::decode(s).map_or_else(|_| s.to_string(), |d| d.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

/// Maps a media grid tile to a post item
fn post_tile(tile: Value) -> Option<Value> {
    let href = tile.get("href").and_then(Value::as_str)?;
    let segments = href_segments(href);
    let at = segments.iter().position(|s| s == "p" || s == "reel")?;
    let code = segments.get(at + 1)?;

    let is_video = segments[at] == "reel" || tile.get("video_label").map_or(false, |v| !v.is_null());
    Some(json!({
        "shortcode": code,
        "display_url": tile.get("display_url"),
        "accessibility_caption": tile.get("accessibility_caption"),
        "is_video": is_video,
        "__typename": if is_video { "GraphVideo" } else { "GraphImage" },
    }))
}

/// Maps a comment list entry to a comment item
fn comment_tile(tile: Value) -> Option<Value> {
    let username = tile.get("username").and_then(Value::as_str)?.trim().to_string();
    let text = tile.get("text").and_then(Value::as_str)?.trim().to_string();
    if username.is_empty() || text.is_empty() {
        return None;
    }
    let created_at = tile
        .get("datetime")
        .and_then(Value::as_str)
        .and_then(epoch_seconds);

    Some(json!({
        "id": format!("{}:{}", username, created_at.unwrap_or_default()),
        "owner": {"username": username},
        "text": text,
        "created_at": created_at,
    }))
}

/// Sorts result links into the hit lists of a search payload
fn search_lists(tiles: &[Value]) -> Value {
    let mut users = Vec::new();
    let mut hashtags = Vec::new();
    let mut places = Vec::new();

    for (position, tile) in tiles.iter().enumerate() {
        let href = match tile.get("href").and_then(Value::as_str) {
            Some(href) => href,
            None => continue,
        };
        let label = tile.get("label").and_then(Value::as_str).map(str::trim);

        let segments = href_segments(href);
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        match segments.as_slice() {
            ["explore", "tags", tag, ..] => hashtags.push(json!({
                "position": position,
                "hashtag": {"name": tag},
            })),
            ["explore", "locations", id, ..] => places.push(json!({
                "position": position,
                "place": {"location": {"pk": id}, "title": label},
            })),
            [username] => users.push(json!({
                "position": position,
                "user": {"username": username, "full_name": label},
            })),
            _ => {}
        }
    }

    json!({"users": users, "hashtags": hashtags, "places": places})
}
