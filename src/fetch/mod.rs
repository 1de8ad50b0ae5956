//! Payload fetching
//!
//! A [`Fetcher`] retrieves the raw content for a [`ScrapeTarget`] and returns
//! it as a [`Document`]. Exactly one strategy is active per run:
//!
//! - [`StaticHtmlFetcher`] reads the JSON blob embedded in the server-rendered page
//! - [`ApiFetcher`] calls the site's JSON endpoints with session headers
//! - [`RenderedFetcher`] opens the page in a browser and reads the live DOM
//!
//! Fetchers also build the [`ChildSource`] for a parent's child collection,
//! since only they know where the next page comes from.

mod api;
#[cfg(feature = "browser")]
mod chromium;
mod http;
mod rendered;
mod static_html;

pub use api::{ApiFetcher, GraphQlPager};
#[cfg(feature = "browser")]
pub use chromium::ChromiumDriver;
pub use http::{build_http_client, get_text};
pub use rendered::{FieldSelector, PageDriver, RenderedFetcher, RenderedPage};
pub use static_html::{extract_app_data, StaticHtmlFetcher};

#[cfg(test)]
pub(crate) use rendered::testing;

use crate::document::Document;
use crate::extract::ChildKind;
use crate::paginate::ChildSource;
use crate::session::Session;
use crate::url::ScrapeTarget;
use async_trait::async_trait;
use thiserror::Error;

/// Per-target retrieval failure
///
/// Never fatal to a run: the router logs it and moves on, and the runner may
/// retry the transient kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("page has no embedded data")]
    NoEmbeddedData,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("element not found: {0}")]
    MissingElement(String),

    #[error("browser error: {0}")]
    Browser(String),
}

impl FetchFailure {
    /// Rate limiting, server errors, timeouts and connection problems
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status(code) => *code == 429 || (500..600).contains(code),
            Self::Timeout | Self::Network(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for FetchFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else if e.is_decode() {
            Self::MalformedPayload(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// One retrieval strategy
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieves the document for `target`
    async fn fetch(
        &self,
        target: &ScrapeTarget,
        session: &dyn Session,
    ) -> Result<Document, FetchFailure>;

    /// Builds the source for `target`'s child collection
    ///
    /// Returns `None` when the document holds no such collection.
    fn child_source(
        &self,
        target: &ScrapeTarget,
        kind: ChildKind,
        document: &mut Document,
        session: &dyn Session,
    ) -> Option<Box<dyn ChildSource>>;
}
