//! Integration tests for the scrape pipeline
//!
//! These tests use wiremock to serve pages and JSON endpoints and run the
//! full classify, fetch, extract and paginate cycle end-to-end.

use async_trait::async_trait;
use gram_ripple::config::{parse_config, Config, HttpConfig};
use gram_ripple::crawler::{run_scrape, scrape_with};
use gram_ripple::fetch::{
    build_http_client, ApiFetcher, FetchFailure, FieldSelector, PageDriver, RenderedFetcher,
    RenderedPage, StaticHtmlFetcher,
};
use gram_ripple::output::MemorySink;
use gram_ripple::ContentType;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Builds a validated config pointed at the mock server
fn test_config(base_url: &str, inputs: &[&str], extra: &str) -> Config {
    let urls = inputs
        .iter()
        .map(|u| format!("\"{}\"", u))
        .collect::<Vec<_>>()
        .join(", ");
    parse_config(&format!(
        r#"
[input]
direct-urls = [{urls}]

[site]
base-url = "{base_url}"
domains = ["127.0.0.1"]

[http]
timeout-secs = 5

{extra}
"#
    ))
    .expect("test config should be valid")
}

/// Wraps an application state blob in a server-rendered page
fn page_with_app_data(data: &Value) -> String {
    format!(
        r#"<html><head><title>Test</title>
        <script type="application/json" id="__A_APP_DATA">{}</script>
        </head><body><main></main></body></html>"#,
        data
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

fn timeline(posts: usize) -> Vec<Value> {
    (0..posts)
        .map(|i| {
            json!({"node": {
                "id": i.to_string(),
                "shortcode": format!("C{:02}", i),
                "edge_liked_by": {"count": i},
            }})
        })
        .collect()
}

fn static_fetcher(config: &Config) -> Arc<StaticHtmlFetcher> {
    Arc::new(StaticHtmlFetcher::new(
        build_http_client(&config.http).unwrap(),
        config.site.base_url.clone(),
        config.scraper.page_size,
    ))
}

async fn mount_profile(server: &MockServer, username: &str, posts: usize) {
    let data = json!({"nativeState": {"feed": {
        "user_detail": {"user": {
            "username": username,
            "full_name": "Test User",
            "edge_followed_by": {"count": 500},
        }},
        "timeline": {"edges": timeline(posts)},
    }}});
    Mock::given(method("GET"))
        .and(path(format!("/{}/", username)))
        .respond_with(html(page_with_app_data(&data)))
        .mount(server)
        .await;
}

const POSTS_HASH: &str = "e769aa130647d2354c40ea6a439bfc08";
const POST_HASH: &str = "b3055c01b4b222b8a47dc12b090e4e64";
const COMMENTS_HASH: &str = "bc3296d1ce80a24b1b6e40b1e72903f5";
const HASHTAG_HASH: &str = "9b498c08113f1e09617a1703c22b2f32";
const LOCATION_HASH: &str = "1b84447a4d8b6d6d0426fefb34514485";

/// Matches one GraphQL page by query hash, page size and `after` cursor
struct GraphQlPage {
    query_hash: &'static str,
    first: u64,
    after: Option<&'static str>,
}

impl GraphQlPage {
    fn first(query_hash: &'static str, first: u64) -> Self {
        Self {
            query_hash,
            first,
            after: None,
        }
    }

    fn after(query_hash: &'static str, first: u64, cursor: &'static str) -> Self {
        Self {
            query_hash,
            first,
            after: Some(cursor),
        }
    }
}

impl Match for GraphQlPage {
    fn matches(&self, request: &Request) -> bool {
        let mut query_hash = None;
        let mut variables = Value::Null;
        for (key, value) in request.url.query_pairs() {
            match key.as_ref() {
                "query_hash" => query_hash = Some(value.into_owned()),
                "variables" => variables = serde_json::from_str(&value).unwrap_or(Value::Null),
                _ => {}
            }
        }
        request.url.path() == "/graphql/query/"
            && query_hash.as_deref() == Some(self.query_hash)
            && variables.get("first").and_then(Value::as_u64) == Some(self.first)
            && variables.get("after").and_then(Value::as_str) == self.after
    }
}

fn api_fetcher(config: &Config) -> Arc<ApiFetcher> {
    Arc::new(
        ApiFetcher::new(
            build_http_client(&config.http).unwrap(),
            &config.site.base_url,
            config.api.clone(),
            config.scraper.page_size,
        )
        .unwrap(),
    )
}

/// Edge page with string ids `ids`
fn edges(ids: &[&str], next: Option<&str>) -> Value {
    let edges: Vec<Value> = ids
        .iter()
        .map(|id| json!({"node": {"id": id, "shortcode": format!("S{}", id)}}))
        .collect();
    json!({
        "edges": edges,
        "page_info": {"has_next_page": next.is_some(), "end_cursor": next},
    })
}

fn comment_edges(ids: &[&str], next: Option<&str>) -> Value {
    let edges: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({"node": {
                "id": id,
                "text": format!("comment {}", id),
                "owner": {"username": "fan"},
                "edge_liked_by": {"count": 1},
                "created_at": 1700000000,
            }})
        })
        .collect();
    json!({
        "edges": edges,
        "page_info": {"has_next_page": next.is_some(), "end_cursor": next},
    })
}

async fn mount_graphql(server: &MockServer, page: GraphQlPage, body: Value, times: u64) {
    Mock::given(method("GET"))
        .and(page)
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_static_post_record() {
    let server = MockServer::start().await;
    let data = json!({"nativeState": {"feed": {"post": {"media": {
        "shortcode": "ABC",
        "owner": {"username": "natgeo"},
        "edge_liked_by": {"count": 42},
        "edge_media_to_caption": {"edges": [{"node": {"text": "Sunrise"}}]},
        "taken_at_timestamp": 1700000000,
    }}}}});
    Mock::given(method("GET"))
        .and(path("/p/ABC/"))
        .and(query_param("__a", "1"))
        .respond_with(html(page_with_app_data(&data)))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), &[&format!("{}/p/ABC/", server.uri())], "");
    let sink = Arc::new(MemorySink::new());
    let stats = scrape_with(&config, static_fetcher(&config), sink.clone()).await;

    let posts = sink.records_of(ContentType::Post);
    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert_eq!(post.get("shortcode").and_then(|v| v.as_str()), Some("ABC"));
    assert_eq!(post.get("username").and_then(|v| v.as_str()), Some("natgeo"));
    assert_eq!(post.get("likes").and_then(|v| v.as_i64()), Some(42));
    assert_eq!(post.get("caption").and_then(|v| v.as_str()), Some("Sunrise"));
    assert_eq!(post.get("timestamp").and_then(|v| v.as_i64()), Some(1700000000));
    assert!(post.has_required_fields());

    assert_eq!(stats.targets_scraped, 1);
    assert_eq!(stats.fetch_failures, 0);
}

#[tokio::test]
async fn test_missing_embedded_data_does_not_stop_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/BROKEN/"))
        .respond_with(html("<html><body>Login required</body></html>".to_string()))
        .mount(&server)
        .await;
    mount_profile(&server, "nasa", 0).await;

    let config = test_config(
        &server.uri(),
        &[&format!("{}/p/BROKEN/", server.uri()), "nasa"],
        "",
    );
    let sink = Arc::new(MemorySink::new());
    let stats = scrape_with(&config, static_fetcher(&config), sink.clone()).await;

    assert!(sink.records_of(ContentType::Post).is_empty());
    assert_eq!(sink.records_of(ContentType::Profile).len(), 1);
    assert_eq!(stats.fetch_failures, 1);
    assert_eq!(stats.retries, 0);
    assert_eq!(stats.targets_scraped, 1);
}

#[tokio::test]
async fn test_profile_posts_stop_at_results_limit() {
    let server = MockServer::start().await;
    mount_profile(&server, "natgeo", 15).await;

    let config = test_config(&server.uri(), &["natgeo"], "");
    let sink = Arc::new(MemorySink::new());
    let stats = scrape_with(&config, static_fetcher(&config), sink.clone()).await;

    let profiles = sink.records_of(ContentType::Profile);
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].get("followers").and_then(|v| v.as_i64()), Some(500));

    let posts = sink.records_of(ContentType::Post);
    assert_eq!(posts.len(), 10);
    assert!(posts
        .iter()
        .all(|p| p.get("username").and_then(|v| v.as_str()) == Some("natgeo")));
    assert_eq!(stats.records_by_type.get(&ContentType::Post), Some(&10));
}

#[tokio::test]
async fn test_api_strategy_pages_with_cursor() {
    let server = MockServer::start().await;

    let first_page = json!({"data": {"user": {
        "id": "528817151",
        "username": "nasa",
        "edge_followed_by": {"count": 96000000},
        "edge_owner_to_timeline_media": {
            "count": 4,
            "edges": timeline(2),
            "page_info": {"has_next_page": true, "end_cursor": "cursor-1"},
        },
    }}});
    Mock::given(method("GET"))
        .and(path("/api/v1/users/web_profile_info/"))
        .and(query_param("username", "nasa"))
        .and(header("x-ig-app-id", "936619743392459"))
        .and(header("x-csrftoken", "tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page))
        .expect(1)
        .mount(&server)
        .await;

    let second_page = json!({"data": {"user": {"edge_owner_to_timeline_media": {
        "edges": [
            {"node": {"id": "2", "shortcode": "C02"}},
            {"node": {"id": "3", "shortcode": "C03"}},
        ],
        "page_info": {"has_next_page": false, "end_cursor": null},
    }}}});
    Mock::given(method("GET"))
        .and(path("/graphql/query/"))
        .and(header("x-csrftoken", "tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(second_page))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(
        &server.uri(),
        &["nasa"],
        "[scraper]\nstrategy = \"api\"\n\n[session.cookies]\ncsrftoken = \"tok123\"\nsessionid = \"s1\"\n",
    );
    let fetcher = Arc::new(
        ApiFetcher::new(
            build_http_client(&config.http).unwrap(),
            &config.site.base_url,
            config.api.clone(),
            config.scraper.page_size,
        )
        .unwrap(),
    );
    let sink = Arc::new(MemorySink::new());
    let stats = scrape_with(&config, fetcher, sink.clone()).await;

    assert_eq!(sink.records_of(ContentType::Profile).len(), 1);
    let codes: Vec<String> = sink
        .records_of(ContentType::Post)
        .iter()
        .filter_map(|p| p.get("shortcode").and_then(|v| v.as_str()).map(str::to_string))
        .collect();
    assert_eq!(codes, vec!["C00", "C01", "C02", "C03"]);
    assert_eq!(stats.fetch_failures, 0);
}

#[tokio::test]
async fn test_api_rate_limit_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/web_profile_info/"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let config = test_config(
        &server.uri(),
        &["nasa"],
        "[scraper]\nstrategy = \"api\"\nmax-request-retries = 2\nretry-backoff-ms = 0\n",
    );
    let fetcher = Arc::new(
        ApiFetcher::new(
            build_http_client(&config.http).unwrap(),
            &config.site.base_url,
            config.api.clone(),
            config.scraper.page_size,
        )
        .unwrap(),
    );
    let sink = Arc::new(MemorySink::new());
    let stats = scrape_with(&config, fetcher, sink.clone()).await;

    assert!(sink.records().is_empty());
    assert_eq!(stats.retries, 2);
    assert_eq!(stats.fetch_failures, 1);
}

#[tokio::test]
async fn test_api_comments_stop_on_page_boundary() {
    let server = MockServer::start().await;
    let post = json!({"data": {"shortcode_media": {
        "shortcode": "ABC",
        "owner": {"username": "natgeo"},
        "edge_media_to_parent_comment": comment_edges(&["k1", "k2"], Some("c1")),
    }}});
    mount_graphql(&server, GraphQlPage::first(POST_HASH, 3), post, 1).await;
    mount_graphql(
        &server,
        GraphQlPage::after(COMMENTS_HASH, 3, "c1"),
        json!({"data": {"shortcode_media": {
            "edge_media_to_parent_comment": comment_edges(&["k3", "k4", "k5"], Some("c2")),
        }}}),
        1,
    )
    .await;
    mount_graphql(
        &server,
        GraphQlPage::after(COMMENTS_HASH, 3, "c2"),
        json!({"data": {"shortcode_media": {
            "edge_media_to_parent_comment": comment_edges(&["k6"], None),
        }}}),
        0,
    )
    .await;

    let config = test_config(
        &server.uri(),
        &[&format!("{}/p/ABC/", server.uri())],
        "[scraper]\nstrategy = \"api\"\nresults-type = \"comments\"\nresults-limit = 5\npage-size = 3\n",
    );
    let sink = Arc::new(MemorySink::new());
    let stats = scrape_with(&config, api_fetcher(&config), sink.clone()).await;

    assert_eq!(sink.records_of(ContentType::Post).len(), 1);
    let comments = sink.records_of(ContentType::Comment);
    let ids: Vec<&str> = comments
        .iter()
        .filter_map(|c| c.get("id").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(ids, vec!["k1", "k2", "k3", "k4", "k5"]);
    // The parent document and one comment page; nothing past the limit
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert!(comments
        .iter()
        .all(|c| c.get("postIdentifier").and_then(|v| v.as_str()) == Some("ABC")));
    assert_eq!(stats.fetch_failures, 0);
}

#[tokio::test]
async fn test_api_hashtag_media_pages() {
    let server = MockServer::start().await;
    let mut media = edges(&["1", "2"], Some("h1"));
    media["count"] = json!(900);
    mount_graphql(
        &server,
        GraphQlPage::first(HASHTAG_HASH, 2),
        json!({"data": {"hashtag": {"id": "17841", "name": "coffee", "edge_hashtag_to_media": media}}}),
        1,
    )
    .await;
    mount_graphql(
        &server,
        GraphQlPage::after(HASHTAG_HASH, 2, "h1"),
        json!({"data": {"hashtag": {"edge_hashtag_to_media": edges(&["3", "4"], Some("h2"))}}}),
        1,
    )
    .await;
    mount_graphql(
        &server,
        GraphQlPage::after(HASHTAG_HASH, 2, "h2"),
        json!({"data": {"hashtag": {"edge_hashtag_to_media": edges(&["5"], None)}}}),
        0,
    )
    .await;

    let config = test_config(
        &server.uri(),
        &[&format!("{}/explore/tags/coffee/", server.uri())],
        "[scraper]\nstrategy = \"api\"\nresults-limit = 4\npage-size = 2\n",
    );
    let sink = Arc::new(MemorySink::new());
    scrape_with(&config, api_fetcher(&config), sink.clone()).await;

    let hashtags = sink.records_of(ContentType::Hashtag);
    assert_eq!(hashtags.len(), 1);
    assert_eq!(hashtags[0].get("mediaCount").and_then(|v| v.as_i64()), Some(900));

    let posts = sink.records_of(ContentType::Post);
    let codes: Vec<&str> = posts
        .iter()
        .filter_map(|p| p.get("shortcode").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(codes, vec!["S1", "S2", "S3", "S4"]);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert!(posts
        .iter()
        .all(|p| p.get("hashtag").and_then(|v| v.as_str()) == Some("coffee")));
}

#[tokio::test]
async fn test_api_location_media_requests_only_what_is_left() {
    let server = MockServer::start().await;
    mount_graphql(
        &server,
        GraphQlPage::first(LOCATION_HASH, 2),
        json!({"data": {"location": {
            "id": "213385402",
            "name": "New York",
            "lat": 40.7142,
            "lng": -74.0064,
            "edge_location_to_media": edges(&["1", "2"], Some("l1")),
        }}}),
        1,
    )
    .await;
    // One record is still wanted, so the page asks for one item
    mount_graphql(
        &server,
        GraphQlPage::after(LOCATION_HASH, 1, "l1"),
        json!({"data": {"location": {"edge_location_to_media": edges(&["3"], None)}}}),
        1,
    )
    .await;

    let config = test_config(
        &server.uri(),
        &[&format!("{}/explore/locations/213385402/new-york/", server.uri())],
        "[scraper]\nstrategy = \"api\"\nresults-limit = 3\npage-size = 2\n",
    );
    let sink = Arc::new(MemorySink::new());
    scrape_with(&config, api_fetcher(&config), sink.clone()).await;

    let locations = sink.records_of(ContentType::Location);
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].get("name").and_then(|v| v.as_str()), Some("New York"));

    let posts = sink.records_of(ContentType::Post);
    assert_eq!(posts.len(), 3);
    assert!(posts
        .iter()
        .all(|p| p.get("locationId").and_then(|v| v.as_str()) == Some("213385402")));
}

#[tokio::test]
async fn test_api_reels_skip_images_across_pages() {
    let server = MockServer::start().await;
    let video = |id: &str| json!({"node": {"id": id, "shortcode": format!("V{}", id), "is_video": true}});
    let image = |id: &str| json!({"node": {"id": id, "shortcode": format!("I{}", id), "is_video": false}});
    let page = |items: Vec<Value>, next: Option<&str>| {
        json!({"edges": items, "page_info": {"has_next_page": next.is_some(), "end_cursor": next}})
    };

    Mock::given(method("GET"))
        .and(path("/api/v1/users/web_profile_info/"))
        .and(query_param("username", "nasa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"user": {
            "id": "528817151",
            "username": "nasa",
            "edge_owner_to_timeline_media": page(vec![video("1"), image("2")], Some("r1")),
        }}})))
        .expect(1)
        .mount(&server)
        .await;
    mount_graphql(
        &server,
        GraphQlPage::after(POSTS_HASH, 1, "r1"),
        json!({"data": {"user": {"edge_owner_to_timeline_media": page(vec![image("3")], Some("r2"))}}}),
        1,
    )
    .await;
    mount_graphql(
        &server,
        GraphQlPage::after(POSTS_HASH, 1, "r2"),
        json!({"data": {"user": {"edge_owner_to_timeline_media": page(vec![video("4")], Some("r3"))}}}),
        1,
    )
    .await;
    mount_graphql(
        &server,
        GraphQlPage::after(POSTS_HASH, 1, "r3"),
        json!({"data": {"user": {"edge_owner_to_timeline_media": page(vec![video("5")], None)}}}),
        0,
    )
    .await;

    let config = test_config(
        &server.uri(),
        &["nasa"],
        "[scraper]\nstrategy = \"api\"\nresults-type = \"reels\"\nresults-limit = 2\n",
    );
    let sink = Arc::new(MemorySink::new());
    scrape_with(&config, api_fetcher(&config), sink.clone()).await;

    let reels = sink.records_of(ContentType::Post);
    let codes: Vec<&str> = reels
        .iter()
        .filter_map(|p| p.get("shortcode").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(codes, vec!["V1", "V4"]);
}

#[tokio::test]
async fn test_search_hits_followed() {
    let server = MockServer::start().await;
    let data = json!({"nativeState": {"feed": {"search": {
        "users": [{"position": 0, "user": {"username": "nasa", "full_name": "NASA"}}],
        "hashtags": [{"position": 1, "hashtag": {"name": "space"}}],
        "places": [],
    }}}});
    Mock::given(method("GET"))
        .and(path("/explore/search/keyword/"))
        .and(query_param("q", "space"))
        .respond_with(html(page_with_app_data(&data)))
        .mount(&server)
        .await;
    mount_profile(&server, "nasa", 0).await;

    let config = parse_config(&format!(
        r#"
[input]
search = "space"
follow-search-results = true

[site]
base-url = "{}"
domains = ["127.0.0.1"]
"#,
        server.uri()
    ))
    .unwrap();

    let sink = Arc::new(MemorySink::new());
    let stats = scrape_with(&config, static_fetcher(&config), sink.clone()).await;

    let results = sink.records_of(ContentType::SearchResult);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].get("kind").and_then(|v| v.as_str()), Some("query"));
    assert_eq!(results[0].get("userCount").and_then(|v| v.as_i64()), Some(1));
    assert_eq!(results[1].get("identifier").and_then(|v| v.as_str()), Some("nasa"));

    // The followed profile succeeds, the unmocked hashtag page is a 404
    assert_eq!(sink.records_of(ContentType::Profile).len(), 1);
    assert_eq!(stats.requests, 3);
    assert_eq!(stats.fetch_failures, 1);
}

/// A loaded profile page with a fixed media grid
struct GridPage {
    tiles: Vec<Value>,
}

#[async_trait]
impl RenderedPage for GridPage {
    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<(), FetchFailure> {
        if selector == "header" {
            Ok(())
        } else {
            Err(FetchFailure::MissingElement(selector.to_string()))
        }
    }

    async fn text(&self, _selector: &str) -> Result<Option<String>, FetchFailure> {
        Ok(None)
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, FetchFailure> {
        let value = match (selector, name) {
            (s, "content") if s.contains("og:title") => Some("NASA (@nasa) photos and videos"),
            (s, "content") if s.contains("og:description") => {
                Some("96M Followers, 80 Following, 4,321 Posts - See photos and videos")
            }
            _ => None,
        };
        Ok(value.map(str::to_string))
    }

    async fn collect(
        &self,
        _item_selector: &str,
        _fields: &[FieldSelector],
    ) -> Result<Vec<Value>, FetchFailure> {
        Ok(self.tiles.clone())
    }

    async fn scroll_to_bottom(&self) -> Result<(), FetchFailure> {
        Ok(())
    }

    async fn content_height(&self) -> Result<u64, FetchFailure> {
        Ok(2400)
    }
}

struct GridDriver;

#[async_trait]
impl PageDriver for GridDriver {
    async fn open(&self, url: &str, _timeout: Duration) -> Result<Box<dyn RenderedPage>, FetchFailure> {
        assert_eq!(url, "https://www.instagram.com/nasa/");
        let tiles = ["AAA", "BBB", "CCC"]
            .iter()
            .map(|code| {
                json!({
                    "href": format!("/p/{}/", code),
                    "display_url": format!("https://cdn.example/{}.jpg", code),
                    "accessibility_caption": null,
                    "video_label": null,
                })
            })
            .collect();
        Ok(Box::new(GridPage { tiles }))
    }
}

#[tokio::test]
async fn test_rendered_profile_grid() {
    let config = parse_config(
        r#"
[input]
direct-urls = ["nasa"]

[scraper]
strategy = "rendered"

[browser]
scroll-settle-ms = 0
"#,
    )
    .unwrap();
    let fetcher = Arc::new(RenderedFetcher::new(
        Arc::new(GridDriver),
        config.site.base_url.clone(),
        config.browser.clone(),
        config.scraper.page_size,
    ));
    let sink = Arc::new(MemorySink::new());
    let stats = scrape_with(&config, fetcher, sink.clone()).await;

    let profiles = sink.records_of(ContentType::Profile);
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].get("name").and_then(|v| v.as_str()), Some("NASA"));
    assert_eq!(profiles[0].get("followers").and_then(|v| v.as_i64()), Some(96_000_000));
    assert_eq!(profiles[0].get("posts").and_then(|v| v.as_i64()), Some(4321));

    let posts = sink.records_of(ContentType::Post);
    assert_eq!(posts.len(), 3);
    assert_eq!(posts[2].get("shortcode").and_then(|v| v.as_str()), Some("CCC"));
    assert_eq!(stats.targets_scraped, 1);
}

#[tokio::test]
async fn test_run_scrape_writes_jsonl() {
    let server = MockServer::start().await;
    mount_profile(&server, "natgeo", 3).await;
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out").join("records.jsonl");

    let config = test_config(
        &server.uri(),
        &["natgeo"],
        &format!("[output]\nformat = \"jsonl\"\npath = \"{}\"\n", out.display()),
    );
    let stats = run_scrape(&config, "test-hash").await.unwrap();
    assert_eq!(stats.records_written, 4);

    let content = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["type"], "profile");
    assert!(lines[1..].iter().all(|l| l["type"] == "post"));
    assert!(lines.iter().all(|l| l["scrapedAt"].is_string()));
}

#[tokio::test]
async fn test_run_scrape_writes_sqlite() {
    let server = MockServer::start().await;
    mount_profile(&server, "natgeo", 2).await;
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("records.db");

    let config = test_config(
        &server.uri(),
        &["natgeo"],
        &format!("[output]\nformat = \"sqlite\"\npath = \"{}\"\n", db.display()),
    );
    let stats = run_scrape(&config, "abc123").await.unwrap();
    assert_eq!(stats.records_written, 3);

    let conn = rusqlite::Connection::open(&db).unwrap();
    let posts: i64 = conn
        .query_row("SELECT COUNT(*) FROM records WHERE type = 'post'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(posts, 2);

    let (hash, status): (String, String) = conn
        .query_row("SELECT config_hash, status FROM runs", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(hash, "abc123");
    assert_eq!(status, "completed");
}

#[cfg(not(feature = "browser"))]
#[tokio::test]
async fn test_rendered_strategy_needs_browser_feature() {
    let config = parse_config("[input]\ndirect-urls = [\"nasa\"]\n[scraper]\nstrategy = \"rendered\"\n")
        .unwrap();

    let result = run_scrape(&config, "hash").await;
    assert!(matches!(result, Err(gram_ripple::ScrapeError::Config(_))));
}

#[test]
fn test_http_config_defaults_are_browser_like() {
    let http = HttpConfig::default();
    assert!(http.user_agent.starts_with("Mozilla/5.0"));
    assert!(build_http_client(&http).is_ok());
}
