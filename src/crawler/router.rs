//! Dispatch router
//!
//! The router is the per-URL callback of the run: it classifies the URL,
//! fetches the target, runs the matching extractor, and pages through the
//! child collection the configured results type asks for. Every record goes
//! straight to the sink. No outcome is ever fatal to the run.

use crate::config::{Config, ResultsType};
use crate::extract::{ChildKind, Extraction, Extractor};
use crate::fetch::{FetchFailure, Fetcher};
use crate::output::RecordSink;
use crate::paginate::{ItemTransform, Paginator};
use crate::session::Session;
use crate::url::{classify, Classification, ContentType, ScrapeTarget};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of handling one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A record was emitted for the target, plus `children` child records
    Scraped {
        content_type: ContentType,
        child_type: Option<ContentType>,
        children: u64,
        /// URLs to hand back to the queue
        follow_ups: Vec<String>,
    },
    /// The classifier could not place the URL
    Skipped,
    FetchFailed(FetchFailure),
    /// The document lacked the root object for the target type
    ShapeMismatch,
}

/// Per-run routing settings
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub domains: Vec<String>,
    pub results_type: ResultsType,
    pub results_limit: usize,
    pub follow_search_results: bool,
}

impl RouterSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            domains: config.site.domains.clone(),
            results_type: config.scraper.results_type,
            results_limit: config.scraper.effective_limit(),
            follow_search_results: config.input.follow_search_results,
        }
    }
}

/// Routes URLs to the fetcher, the extractors and the paginator
pub struct DispatchRouter {
    fetcher: Arc<dyn Fetcher>,
    extractor: Extractor,
    sink: Arc<dyn RecordSink>,
    settings: RouterSettings,
}

impl DispatchRouter {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Extractor,
        sink: Arc<dyn RecordSink>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            sink,
            settings,
        }
    }

    /// Handles one URL with the caller's session
    pub async fn handle(&self, url: &str, session: &dyn Session) -> Outcome {
        let target = match classify(url, &self.settings.domains) {
            Classification::Target(target) => target,
            Classification::Unknown => {
                info!("Skipping unclassified URL {}", url);
                return Outcome::Skipped;
            }
        };
        debug!("Routing {} {}", target.content_type(), target.identifier());

        let mut document = match self.fetcher.fetch(&target, session).await {
            Ok(document) => document,
            Err(failure) => {
                warn!(
                    "Fetch failed for {} {}: {}",
                    target.content_type(),
                    target.identifier(),
                    failure
                );
                return Outcome::FetchFailed(failure);
            }
        };

        match self.extractor.extract(&document, &target) {
            Extraction::Match(record) => self.sink.append(record),
            Extraction::NoMatch => {
                warn!(
                    "No {} data in document for {}",
                    target.content_type(),
                    target.identifier()
                );
                return Outcome::ShapeMismatch;
            }
        }

        let kind = match ChildKind::for_parent(target.content_type(), self.settings.results_type) {
            Some(kind) => kind,
            None => {
                return Outcome::Scraped {
                    content_type: target.content_type(),
                    child_type: None,
                    children: 0,
                    follow_ups: Vec::new(),
                }
            }
        };

        let source = match self.fetcher.child_source(&target, kind, &mut document, session) {
            Some(source) => source,
            None => {
                debug!("No {:?} collection for {}", kind, target.identifier());
                return Outcome::Scraped {
                    content_type: target.content_type(),
                    child_type: Some(kind.child_type()),
                    children: 0,
                    follow_ups: Vec::new(),
                };
            }
        };

        let paginator = Paginator::new(
            target.identifier(),
            source,
            self.child_transform(&target, kind),
            self.settings.results_limit,
        );
        let (children, follow_ups) = self.drain_children(&target, kind, paginator).await;

        Outcome::Scraped {
            content_type: target.content_type(),
            child_type: Some(kind.child_type()),
            children,
            follow_ups,
        }
    }

    fn child_transform(&self, parent: &ScrapeTarget, kind: ChildKind) -> ItemTransform {
        let extractor = self.extractor.clone();
        let parent = parent.clone();
        Box::new(move |item| extractor.child(kind, &parent, item))
    }

    async fn drain_children(
        &self,
        parent: &ScrapeTarget,
        kind: ChildKind,
        mut paginator: Paginator,
    ) -> (u64, Vec<String>) {
        let follow = kind == ChildKind::SearchHits && self.settings.follow_search_results;
        let mut follow_ups = Vec::new();

        while let Some(record) = paginator.next().await {
            if follow {
                if let Some(url) = record.source_url() {
                    follow_ups.push(url.to_string());
                }
            }
            self.sink.append(record);
        }

        if paginator.skipped() > 0 {
            debug!(
                "Skipped {} unmappable items under {}",
                paginator.skipped(),
                parent.identifier()
            );
        }
        info!(
            "{} {}: {} child records in {} batches",
            parent.content_type(),
            parent.identifier(),
            paginator.emitted(),
            paginator.batches()
        );

        (paginator.emitted() as u64, follow_ups)
    }
}
