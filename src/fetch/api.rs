//! JSON API strategy
//!
//! Profiles come from the web profile endpoint, posts, hashtags and
//! locations from GraphQL queries, searches from the top-search endpoint.
//! Requests carry the app id header and, when the session has one, the
//! anti-forgery token from its cookie.

use super::http::get_text;
use super::{FetchFailure, Fetcher};
use crate::config::{ApiConfig, QueryHashes};
use crate::document::{Document, DocumentShape};
use crate::extract::{search_hits, text, ChildKind};
use crate::paginate::{ApiCursorSource, ChildSource, CursorPager, EdgeListSource};
use crate::session::Session;
use crate::url::{ContentType, ScrapeTarget};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::debug;
use url::Url;

const APP_ID_HEADER: &str = "x-ig-app-id";
const CSRF_HEADER: &str = "x-csrftoken";
const REQUESTED_WITH_HEADER: &str = "x-requested-with";

/// Session-derived values needed on every API request
#[derive(Debug, Clone, Default)]
struct Credentials {
    app_id: String,
    csrf_token: Option<String>,
    cookie_header: Option<String>,
}

impl Credentials {
    fn from_session(config: &ApiConfig, session: &dyn Session) -> Self {
        Self {
            app_id: config.app_id.clone(),
            csrf_token: session.cookie(&config.csrf_cookie),
            cookie_header: session.cookie_header(),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(v) = HeaderValue::from_str(&self.app_id) {
            headers.insert(APP_ID_HEADER, v);
        }
        headers.insert(REQUESTED_WITH_HEADER, HeaderValue::from_static("XMLHttpRequest"));
        if let Some(token) = &self.csrf_token {
            if let Ok(v) = HeaderValue::from_str(token) {
                headers.insert(CSRF_HEADER, v);
            }
        }
        if let Some(cookies) = &self.cookie_header {
            if let Ok(v) = HeaderValue::from_str(cookies) {
                headers.insert(COOKIE, v);
            }
        }
        headers
    }
}

async fn get_json(
    client: &Client,
    url: &Url,
    credentials: &Credentials,
) -> Result<Value, FetchFailure> {
    let body = get_text(client, url.as_str(), credentials.headers()).await?;
    serde_json::from_str(&body).map_err(|e| FetchFailure::MalformedPayload(e.to_string()))
}

fn graphql_url(base: &Url, query_hash: &str, variables: &Value) -> Result<Url, FetchFailure> {
    let mut url = base
        .join("graphql/query/")
        .map_err(|e| FetchFailure::MalformedPayload(e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("query_hash", query_hash)
        .append_pair("variables", &variables.to_string());
    Ok(url)
}

/// Calls the site's JSON endpoints
pub struct ApiFetcher {
    client: Client,
    base: Url,
    config: ApiConfig,
    page_size: usize,
}

impl ApiFetcher {
    pub fn new(
        client: Client,
        base_url: &str,
        config: ApiConfig,
        page_size: usize,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            base: Url::parse(base_url)?,
            config,
            page_size,
        })
    }

    fn hashes(&self) -> &QueryHashes {
        &self.config.query_hashes
    }

    /// Endpoint URL for the document of `target`
    fn endpoint(&self, target: &ScrapeTarget) -> Result<Url, FetchFailure> {
        let id = target.identifier();
        let first = self.page_size;
        match target.content_type() {
            ContentType::Profile => {
                let mut url = self
                    .base
                    .join("api/v1/users/web_profile_info/")
                    .map_err(|e| FetchFailure::MalformedPayload(e.to_string()))?;
                url.query_pairs_mut().append_pair("username", id);
                Ok(url)
            }
            ContentType::Post | ContentType::Comment => graphql_url(
                &self.base,
                &self.hashes().post,
                &json!({"shortcode": id, "first": first}),
            ),
            ContentType::Hashtag => graphql_url(
                &self.base,
                &self.hashes().hashtag_media,
                &json!({"tag_name": id, "first": first}),
            ),
            ContentType::Location => graphql_url(
                &self.base,
                &self.hashes().location_media,
                &json!({"id": id, "first": first}),
            ),
            ContentType::SearchResult => {
                let mut url = self
                    .base
                    .join("web/search/topsearch/")
                    .map_err(|e| FetchFailure::MalformedPayload(e.to_string()))?;
                url.query_pairs_mut()
                    .append_pair("context", "blended")
                    .append_pair("query", id);
                Ok(url)
            }
        }
    }

    /// Query hash and fixed variables for paging the children of `target`
    fn child_query(&self, target: &ScrapeTarget, document: &Document) -> Option<(String, Value)> {
        let id = target.identifier();
        match target.content_type() {
            ContentType::Profile => {
                let user_id = document
                    .root(ContentType::Profile)
                    .and_then(|user| text(user, "id"))?;
                Some((self.hashes().posts.clone(), json!({"id": user_id})))
            }
            ContentType::Post => Some((self.hashes().comments.clone(), json!({"shortcode": id}))),
            ContentType::Hashtag => {
                Some((self.hashes().hashtag_media.clone(), json!({"tag_name": id})))
            }
            ContentType::Location => {
                Some((self.hashes().location_media.clone(), json!({"id": id})))
            }
            ContentType::SearchResult | ContentType::Comment => None,
        }
    }
}

#[async_trait]
impl Fetcher for ApiFetcher {
    async fn fetch(
        &self,
        target: &ScrapeTarget,
        session: &dyn Session,
    ) -> Result<Document, FetchFailure> {
        let credentials = Credentials::from_session(&self.config, session);
        if credentials.csrf_token.is_none() {
            debug!("No {} cookie in session, sending request without token", self.config.csrf_cookie);
        }

        let url = self.endpoint(target)?;
        let payload = get_json(&self.client, &url, &credentials).await?;
        if !payload.is_object() {
            return Err(FetchFailure::MalformedPayload(
                "expected a JSON object".to_string(),
            ));
        }

        Ok(Document::new(DocumentShape::Api, payload))
    }

    fn child_source(
        &self,
        target: &ScrapeTarget,
        kind: ChildKind,
        document: &mut Document,
        session: &dyn Session,
    ) -> Option<Box<dyn ChildSource>> {
        let container = document.child_container(target.content_type())?;

        if kind == ChildKind::SearchHits {
            return Some(Box::new(EdgeListSource::new(
                search_hits(container),
                self.page_size,
            )));
        }

        let container = container.clone();
        match self.child_query(target, document) {
            Some((query_hash, variables)) => {
                let pager = GraphQlPager {
                    client: self.client.clone(),
                    base: self.base.clone(),
                    query_hash,
                    variables,
                    container_pointer: DocumentShape::Api
                        .child_pointer(target.content_type())
                        .unwrap_or_default()
                        .to_string(),
                    credentials: Credentials::from_session(&self.config, session),
                };
                Some(Box::new(ApiCursorSource::new(
                    &container,
                    Box::new(pager),
                    self.page_size,
                )))
            }
            None => Some(Box::new(EdgeListSource::from_container(
                &container,
                self.page_size,
            ))),
        }
    }
}

/// Requests further pages of a GraphQL edge collection
pub struct GraphQlPager {
    client: Client,
    base: Url,
    query_hash: String,
    variables: Value,
    container_pointer: String,
    credentials: Credentials,
}

#[async_trait]
impl CursorPager for GraphQlPager {
    async fn page(&self, first: usize, after: &str) -> Result<Value, FetchFailure> {
        let mut variables = match &self.variables {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        variables.insert("first".to_string(), json!(first));
        variables.insert("after".to_string(), json!(after));

        let url = graphql_url(&self.base, &self.query_hash, &Value::Object(variables))?;
        let payload = get_json(&self.client, &url, &self.credentials).await?;

        payload
            .pointer(&self.container_pointer)
            .filter(|v| v.is_object())
            .cloned()
            .ok_or_else(|| {
                FetchFailure::MalformedPayload(format!("no {} in page", self.container_pointer))
            })
    }
}
