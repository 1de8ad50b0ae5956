use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main configuration structure for Gram-Ripple
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub fields: FieldPriorities,
    #[serde(default)]
    pub output: OutputConfig,
}

/// What to scrape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    /// Profile, post, hashtag or location URLs; bare usernames are accepted
    #[serde(rename = "direct-urls", default)]
    pub direct_urls: Vec<String>,

    /// Optional search query, expanded into a search target
    #[serde(default)]
    pub search: Option<String>,

    /// Hand every search hit URL back to the queue
    #[serde(rename = "follow-search-results", default)]
    pub follow_search_results: bool,
}

/// Fetch strategy, chosen once per deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Parse the JSON blob embedded in the server-rendered HTML
    StaticHtml,
    /// Call the site's JSON endpoints
    Api,
    /// Drive a browser and read the live DOM
    Rendered,
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static-html" => Ok(Self::StaticHtml),
            "api" => Ok(Self::Api),
            "rendered" => Ok(Self::Rendered),
            other => Err(format!(
                "unknown strategy '{}', expected static-html, api or rendered",
                other
            )),
        }
    }
}

/// Which child collection to page through after a parent record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultsType {
    Posts,
    Reels,
    Comments,
}

impl std::str::FromStr for ResultsType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(Self::Posts),
            "reels" => Ok(Self::Reels),
            "comments" => Ok(Self::Comments),
            other => Err(format!(
                "unknown results type '{}', expected posts, reels or comments",
                other
            )),
        }
    }
}

/// Default number of child records per parent
pub const DEFAULT_RESULTS_LIMIT: usize = 10;

/// Scraper behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_strategy")]
    pub strategy: Strategy,

    #[serde(rename = "results-type", default = "default_results_type")]
    pub results_type: ResultsType,

    /// Maximum child records per parent; 0 means the default of 10
    #[serde(rename = "results-limit", default)]
    pub results_limit: usize,

    /// Items requested per child page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: usize,

    #[serde(rename = "max-requests-per-crawl", default = "default_max_requests")]
    pub max_requests_per_crawl: usize,

    #[serde(rename = "max-request-retries", default = "default_max_retries")]
    pub max_request_retries: u32,

    /// Delay before the first retry; doubles on each further attempt
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    #[serde(rename = "max-concurrency", default = "default_concurrency")]
    pub max_concurrency: usize,
}

impl ScraperConfig {
    /// The limit actually applied to child pagination
    pub fn effective_limit(&self) -> usize {
        if self.results_limit == 0 {
            DEFAULT_RESULTS_LIMIT
        } else {
            self.results_limit
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            results_type: default_results_type(),
            results_limit: 0,
            page_size: default_page_size(),
            max_requests_per_crawl: default_max_requests(),
            max_request_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
            max_concurrency: default_concurrency(),
        }
    }
}

/// Target site description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Scheme and host used to build canonical and API URLs
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Domain patterns (e.g., "instagram.com" or "*.instagram.com")
    #[serde(default = "default_domains")]
    pub domains: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            domains: default_domains(),
        }
    }
}

/// Browser-like request headers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept")]
    pub accept: String,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,

    #[serde(default = "default_referer")]
    pub referer: String,

    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept: default_accept(),
            accept_language: default_accept_language(),
            referer: default_referer(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// JSON API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Value sent as `X-IG-App-ID`
    #[serde(rename = "app-id", default = "default_app_id")]
    pub app_id: String,

    /// Cookie holding the anti-forgery token
    #[serde(rename = "csrf-cookie", default = "default_csrf_cookie")]
    pub csrf_cookie: String,

    #[serde(rename = "query-hashes", default)]
    pub query_hashes: QueryHashes,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            csrf_cookie: default_csrf_cookie(),
            query_hashes: QueryHashes::default(),
        }
    }
}

/// GraphQL query hashes for the post and comment single-page endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryHashes {
    #[serde(default = "default_posts_hash")]
    pub posts: String,

    #[serde(default = "default_post_hash")]
    pub post: String,

    #[serde(default = "default_comments_hash")]
    pub comments: String,

    #[serde(rename = "hashtag-media", default = "default_hashtag_hash")]
    pub hashtag_media: String,

    #[serde(rename = "location-media", default = "default_location_hash")]
    pub location_media: String,
}

impl Default for QueryHashes {
    fn default() -> Self {
        Self {
            posts: default_posts_hash(),
            post: default_post_hash(),
            comments: default_comments_hash(),
            hashtag_media: default_hashtag_hash(),
            location_media: default_location_hash(),
        }
    }
}

/// Rendered-page strategy timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(rename = "navigation-timeout-secs", default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,

    #[serde(rename = "element-wait-timeout-secs", default = "default_element_timeout")]
    pub element_wait_timeout_secs: u64,

    /// Delay after each scroll before the page height is re-read
    #[serde(rename = "scroll-settle-ms", default = "default_scroll_settle")]
    pub scroll_settle_ms: u64,

    #[serde(default = "default_true")]
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: default_navigation_timeout(),
            element_wait_timeout_secs: default_element_timeout(),
            scroll_settle_ms: default_scroll_settle(),
            headless: true,
        }
    }
}

/// Static session cookies handed to the API strategy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
}

/// Ordered source paths for fields that different API generations populate
/// differently. The first path that resolves to a non-null value wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldPriorities {
    #[serde(default = "default_likes")]
    pub likes: Vec<String>,

    #[serde(rename = "comment-count", default = "default_comment_count")]
    pub comment_count: Vec<String>,

    #[serde(default = "default_caption")]
    pub caption: Vec<String>,

    #[serde(default = "default_owner")]
    pub owner: Vec<String>,

    #[serde(default = "default_timestamp")]
    pub timestamp: Vec<String>,

    #[serde(rename = "media-type", default = "default_media_type")]
    pub media_type: Vec<String>,

    #[serde(default = "default_shortcode")]
    pub shortcode: Vec<String>,

    #[serde(default = "default_followers")]
    pub followers: Vec<String>,

    #[serde(default = "default_following")]
    pub following: Vec<String>,

    #[serde(rename = "post-count", default = "default_post_count")]
    pub post_count: Vec<String>,

    #[serde(rename = "comment-likes", default = "default_comment_likes")]
    pub comment_likes: Vec<String>,

    #[serde(rename = "comment-timestamp", default = "default_comment_timestamp")]
    pub comment_timestamp: Vec<String>,
}

impl FieldPriorities {
    /// All lists with their config keys, for validation
    pub fn lists(&self) -> [(&'static str, &[String]); 12] {
        [
            ("likes", &self.likes),
            ("comment-count", &self.comment_count),
            ("caption", &self.caption),
            ("owner", &self.owner),
            ("timestamp", &self.timestamp),
            ("media-type", &self.media_type),
            ("shortcode", &self.shortcode),
            ("followers", &self.followers),
            ("following", &self.following),
            ("post-count", &self.post_count),
            ("comment-likes", &self.comment_likes),
            ("comment-timestamp", &self.comment_timestamp),
        ]
    }
}

impl Default for FieldPriorities {
    fn default() -> Self {
        Self {
            likes: default_likes(),
            comment_count: default_comment_count(),
            caption: default_caption(),
            owner: default_owner(),
            timestamp: default_timestamp(),
            media_type: default_media_type(),
            shortcode: default_shortcode(),
            followers: default_followers(),
            following: default_following(),
            post_count: default_post_count(),
            comment_likes: default_comment_likes(),
            comment_timestamp: default_comment_timestamp(),
        }
    }
}

/// Record sink backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jsonl,
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_format")]
    pub format: OutputFormat,

    /// Path to the JSON-lines file or SQLite database
    #[serde(default = "default_output_path")]
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
            path: default_output_path(),
        }
    }
}

fn paths(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_strategy() -> Strategy {
    Strategy::StaticHtml
}

fn default_results_type() -> ResultsType {
    ResultsType::Posts
}

fn default_page_size() -> usize {
    12
}

fn default_max_requests() -> usize {
    100
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_backoff() -> u64 {
    500
}

fn default_concurrency() -> usize {
    1
}

fn default_base_url() -> String {
    "https://www.instagram.com".to_string()
}

fn default_domains() -> Vec<String> {
    paths(&["*.instagram.com"])
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.5".to_string()
}

fn default_referer() -> String {
    "https://www.instagram.com/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_app_id() -> String {
    "936619743392459".to_string()
}

fn default_csrf_cookie() -> String {
    "csrftoken".to_string()
}

fn default_posts_hash() -> String {
    "e769aa130647d2354c40ea6a439bfc08".to_string()
}

fn default_post_hash() -> String {
    "b3055c01b4b222b8a47dc12b090e4e64".to_string()
}

fn default_comments_hash() -> String {
    "bc3296d1ce80a24b1b6e40b1e72903f5".to_string()
}

fn default_hashtag_hash() -> String {
    "9b498c08113f1e09617a1703c22b2f32".to_string()
}

fn default_location_hash() -> String {
    "1b84447a4d8b6d6d0426fefb34514485".to_string()
}

fn default_navigation_timeout() -> u64 {
    30
}

fn default_element_timeout() -> u64 {
    10
}

fn default_scroll_settle() -> u64 {
    1500
}

fn default_true() -> bool {
    true
}

fn default_likes() -> Vec<String> {
    paths(&[
        "edge_liked_by.count",
        "edge_media_preview_like.count",
        "like_count",
    ])
}

fn default_comment_count() -> Vec<String> {
    paths(&[
        "edge_media_to_comment.count",
        "edge_media_to_parent_comment.count",
        "comment_count",
    ])
}

fn default_caption() -> Vec<String> {
    paths(&["edge_media_to_caption.edges.0.node.text", "caption.text", "caption"])
}

fn default_owner() -> Vec<String> {
    paths(&["owner.username", "user.username"])
}

fn default_timestamp() -> Vec<String> {
    paths(&["taken_at_timestamp", "taken_at"])
}

fn default_media_type() -> Vec<String> {
    paths(&["__typename", "media_type"])
}

fn default_shortcode() -> Vec<String> {
    paths(&["shortcode", "code"])
}

fn default_followers() -> Vec<String> {
    paths(&["edge_followed_by.count", "follower_count"])
}

fn default_following() -> Vec<String> {
    paths(&["edge_follow.count", "following_count"])
}

fn default_post_count() -> Vec<String> {
    paths(&["edge_owner_to_timeline_media.count", "media_count"])
}

fn default_comment_likes() -> Vec<String> {
    paths(&["edge_liked_by.count", "comment_like_count"])
}

fn default_comment_timestamp() -> Vec<String> {
    paths(&["created_at", "created_at_utc"])
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Jsonl
}

fn default_output_path() -> String {
    "./records.jsonl".to_string()
}
