//! Static-HTML strategy
//!
//! The site ships its initial application state as a JSON document inside
//! `<script type="application/json" id="__A_APP_DATA">`. This strategy fetches
//! the canonical page and reads that blob directly instead of the markup.

use super::http::get_text;
use super::{FetchFailure, Fetcher};
use crate::document::{Document, DocumentShape};
use crate::extract::{search_hits, ChildKind};
use crate::paginate::{ChildSource, EdgeListSource};
use crate::session::Session;
use crate::url::ScrapeTarget;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

const APP_DATA_SELECTOR: &str = r#"script[type="application/json"][id="__A_APP_DATA"]"#;

/// Extracts and parses the embedded application state
///
/// # Returns
///
/// * `Ok(Value)` - The parsed blob
/// * `Err(FetchFailure::NoEmbeddedData)` - The script element is absent
/// * `Err(FetchFailure::MalformedPayload)` - The element holds invalid JSON
pub fn extract_app_data(html: &str) -> Result<Value, FetchFailure> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(APP_DATA_SELECTOR)
        .map_err(|e| FetchFailure::MalformedPayload(format!("selector: {:?}", e)))?;

    let element = document
        .select(&selector)
        .next()
        .ok_or(FetchFailure::NoEmbeddedData)?;

    let json_text = element.text().collect::<String>();
    serde_json::from_str(json_text.trim())
        .map_err(|e| FetchFailure::MalformedPayload(e.to_string()))
}

/// Fetches server-rendered pages and reads their embedded state
pub struct StaticHtmlFetcher {
    client: Client,
    base_url: String,
    page_size: usize,
}

impl StaticHtmlFetcher {
    pub fn new(client: Client, base_url: impl Into<String>, page_size: usize) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            page_size,
        }
    }

    /// Canonical page URL with the embedded-data flags
    fn page_url(&self, target: &ScrapeTarget) -> Result<String, FetchFailure> {
        let mut url = target
            .canonical_url(&self.base_url)
            .map_err(|e| FetchFailure::MalformedPayload(format!("target URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("__a", "1")
            .append_pair("__w", "1");
        Ok(url.to_string())
    }
}

#[async_trait]
impl Fetcher for StaticHtmlFetcher {
    async fn fetch(
        &self,
        target: &ScrapeTarget,
        _session: &dyn Session,
    ) -> Result<Document, FetchFailure> {
        let url = self.page_url(target)?;
        let html = get_text(&self.client, &url, HeaderMap::new()).await?;
        let payload = extract_app_data(&html)?;

        debug!("Embedded data found for {}", target.identifier());
        Ok(Document::new(DocumentShape::EmbeddedFeed, payload))
    }

    fn child_source(
        &self,
        target: &ScrapeTarget,
        kind: ChildKind,
        document: &mut Document,
        _session: &dyn Session,
    ) -> Option<Box<dyn ChildSource>> {
        let container = document.child_container(target.content_type())?;

        let source = if kind == ChildKind::SearchHits {
            EdgeListSource::new(search_hits(container), self.page_size)
        } else {
            EdgeListSource::from_container(container, self.page_size)
        };
        Some(Box::new(source))
    }
}
