//! In-process collaborator
//!
//! Owns the request queue, drives the router under the concurrency bound,
//! retries transient fetch failures, and feeds follow-up URLs back into the
//! queue. The router itself never retries.

use super::queue::{Request, RequestQueue};
use super::router::{DispatchRouter, Outcome, RouterSettings};
use crate::config::{Config, Strategy};
use crate::extract::Extractor;
use crate::fetch::{build_http_client, ApiFetcher, Fetcher, StaticHtmlFetcher};
use crate::output::{open_sink, RecordSink, RunStatistics, RunStatus};
use crate::session::{CookieSession, Session};
use crate::url::{classify, normalize_input};
use crate::ScrapeError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use url::Url;

/// Longest wait before a retry
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(30);

/// Delay before retry number `attempt`: `base_ms`, doubling per attempt
///
/// Attempt 0 is the first try and never waits.
pub fn retry_backoff(base_ms: u64, attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    let factor = 1u64 << (attempt - 1).min(16);
    Duration::from_millis(base_ms.saturating_mul(factor)).min(MAX_RETRY_BACKOFF)
}

/// Queue key for a URL
///
/// Classified URLs key on the canonical page URL of their target, so a bare
/// username, its profile URL and a search hit linking to it collapse into one
/// request. Unclassified URLs key on themselves.
pub fn unique_key(url: &str, domains: &[String], base_url: &str) -> String {
    classify(url, domains)
        .target()
        .and_then(|target| target.canonical_url(base_url).ok())
        .map_or_else(|| url.to_string(), |canonical| canonical.to_string())
}

/// Runs requests through a router until the queue drains
pub struct Runner {
    router: Arc<DispatchRouter>,
    session: Arc<dyn Session>,
    queue: RequestQueue,
    domains: Vec<String>,
    base_url: String,
    concurrency: usize,
    max_retries: u32,
    retry_backoff_ms: u64,
    stats: RunStatistics,
}

impl Runner {
    pub fn new(router: DispatchRouter, session: Arc<dyn Session>, config: &Config) -> Self {
        let scraper = &config.scraper;
        Self {
            router: Arc::new(router),
            session,
            queue: RequestQueue::new(scraper.max_requests_per_crawl),
            domains: config.site.domains.clone(),
            base_url: config.site.base_url.clone(),
            concurrency: scraper.max_concurrency.max(1),
            max_retries: scraper.max_request_retries,
            retry_backoff_ms: scraper.retry_backoff_ms,
            stats: RunStatistics::new(),
        }
    }

    /// Queues a request; duplicates by unique key are dropped
    pub fn enqueue(&mut self, request: Request) -> bool {
        self.queue.enqueue(request)
    }

    /// Handles queued requests until none remain or the cap is reached
    pub async fn run(mut self) -> RunStatistics {
        let started = Instant::now();
        let mut in_flight = JoinSet::new();

        loop {
            while in_flight.len() < self.concurrency {
                let request = match self.queue.next() {
                    Some(request) => request,
                    None => break,
                };
                let router = self.router.clone();
                let session = self.session.clone();
                let backoff = retry_backoff(self.retry_backoff_ms, request.retry_count);
                in_flight.spawn(async move {
                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                    let outcome = router.handle(&request.url, session.as_ref()).await;
                    (request, outcome)
                });
            }

            match in_flight.join_next().await {
                Some(Ok((request, outcome))) => self.settle(request, outcome),
                Some(Err(e)) => {
                    tracing::error!("Request task failed: {}", e);
                }
                None => break,
            }

            let handled = self.stats.requests;
            if handled > 0 && handled % 10 == 0 {
                tracing::info!(
                    "Progress: {} requests handled, {} queued, {} records",
                    handled,
                    self.queue.len(),
                    self.stats.total_records()
                );
            }
        }

        if !self.queue.is_empty() {
            tracing::info!(
                "Request cap of {} reached, {} URLs left in queue",
                self.queue.started(),
                self.queue.len()
            );
        }

        self.stats.over_cap = self.queue.len() as u64;
        self.stats.duplicates = self.queue.duplicates();
        self.stats.duration = started.elapsed();
        self.stats
    }

    fn settle(&mut self, request: Request, outcome: Outcome) {
        self.stats.requests += 1;

        match outcome {
            Outcome::Scraped {
                content_type,
                child_type,
                children,
                follow_ups,
            } => {
                self.stats.targets_scraped += 1;
                self.stats.add_records(content_type, 1);
                if let Some(child_type) = child_type {
                    self.stats.add_records(child_type, children);
                }
                for url in follow_ups {
                    let key = unique_key(&url, &self.domains, &self.base_url);
                    self.queue.enqueue(Request::new(url).with_unique_key(key));
                }
            }
            Outcome::Skipped => self.stats.skipped += 1,
            Outcome::ShapeMismatch => self.stats.shape_mismatches += 1,
            Outcome::FetchFailed(failure) => {
                if failure.is_transient() && request.retry_count < self.max_retries {
                    tracing::debug!(
                        "Retrying {} (attempt {} of {}) in {:?}",
                        request.url,
                        request.retry_count + 1,
                        self.max_retries,
                        retry_backoff(self.retry_backoff_ms, request.retry_count + 1)
                    );
                    self.stats.retries += 1;
                    self.queue.retry(request);
                } else {
                    self.stats.fetch_failures += 1;
                }
            }
        }
    }
}

/// Search page URL for a query
pub fn search_url(base_url: &str, query: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base_url)?.join("explore/search/keyword/")?;
    url.query_pairs_mut().append_pair("q", query);
    Ok(url)
}

/// Initial requests for the configured inputs
///
/// Each request is keyed by [`unique_key`], so the same target listed twice,
/// in any spelling, is handled once. Inputs that cannot be turned into a URL
/// are dropped with a warning.
pub fn seed_requests(config: &Config) -> Vec<Request> {
    let base = &config.site.base_url;
    let domains = &config.site.domains;
    let mut requests = Vec::new();

    for raw in &config.input.direct_urls {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        match normalize_input(raw, base) {
            Ok(url) => {
                let key = unique_key(url.as_str(), domains, base);
                requests.push(Request::new(url.to_string()).with_unique_key(key));
            }
            Err(e) => tracing::warn!("Ignoring input '{}': {}", raw, e),
        }
    }

    if let Some(query) = config.input.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        match search_url(base, query) {
            Ok(url) => {
                let key = unique_key(url.as_str(), domains, base);
                requests.push(Request::new(url.to_string()).with_unique_key(key));
            }
            Err(e) => tracing::warn!("Ignoring search '{}': {}", query, e),
        }
    }

    requests
}

/// Builds the fetcher for the configured strategy
pub async fn build_fetcher(config: &Config) -> Result<Arc<dyn Fetcher>, ScrapeError> {
    let base = config.site.base_url.clone();
    let page_size = config.scraper.page_size;

    let fetcher: Arc<dyn Fetcher> = match config.scraper.strategy {
        Strategy::StaticHtml => Arc::new(StaticHtmlFetcher::new(
            build_http_client(&config.http)?,
            base,
            page_size,
        )),
        Strategy::Api => Arc::new(ApiFetcher::new(
            build_http_client(&config.http)?,
            &base,
            config.api.clone(),
            page_size,
        )?),
        Strategy::Rendered => rendered_fetcher(config).await?,
    };
    Ok(fetcher)
}

#[cfg(feature = "browser")]
async fn rendered_fetcher(config: &Config) -> Result<Arc<dyn Fetcher>, ScrapeError> {
    use crate::fetch::{ChromiumDriver, RenderedFetcher};

    let driver = ChromiumDriver::launch(&config.browser, &config.http).await?;
    Ok(Arc::new(RenderedFetcher::new(
        Arc::new(driver),
        config.site.base_url.clone(),
        config.browser.clone(),
        config.scraper.page_size,
    )))
}

#[cfg(not(feature = "browser"))]
async fn rendered_fetcher(_config: &Config) -> Result<Arc<dyn Fetcher>, ScrapeError> {
    Err(crate::ConfigError::Validation(
        "the rendered strategy requires building with the `browser` feature".to_string(),
    )
    .into())
}

/// Runs a scrape with an already built fetcher and sink
///
/// The sink is not finalized; the caller owns its lifetime.
pub async fn scrape_with(
    config: &Config,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn RecordSink>,
) -> RunStatistics {
    let router = DispatchRouter::new(
        fetcher,
        Extractor::new(config.fields.clone(), config.site.base_url.clone()),
        sink,
        RouterSettings::from_config(config),
    );
    let session: Arc<dyn Session> = Arc::new(CookieSession::new(config.session.cookies.clone()));

    let mut runner = Runner::new(router, session, config);
    for request in seed_requests(config) {
        runner.enqueue(request);
    }
    runner.run().await
}

/// Runs a complete scrape
///
/// This is the main entry point of the binary. It will:
/// 1. Open the configured sink
/// 2. Build the fetcher for the configured strategy
/// 3. Seed the queue with the direct inputs and the search query
/// 4. Handle requests until the queue drains
/// 5. Finalize the sink, as interrupted if Ctrl-C arrives first
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `config_hash` - Hash of the configuration file
///
/// # Returns
///
/// * `Ok(RunStatistics)` - The run finished; per-target failures are counted, not raised
/// * `Err(ScrapeError)` - The sink or fetcher could not be set up
///
/// # Example
///
/// ```no_run
/// use gram_ripple::config::load_config_with_hash;
/// use gram_ripple::crawler::run_scrape;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("scrape.toml"))?;
/// let stats = run_scrape(&config, &hash).await?;
/// println!("{} records", stats.total_records());
/// # Ok(())
/// # }
/// ```
pub async fn run_scrape(config: &Config, config_hash: &str) -> Result<RunStatistics, ScrapeError> {
    let fetcher = build_fetcher(config).await?;
    let sink = open_sink(&config.output, config_hash)?;

    tracing::info!(
        "Starting {:?} scrape, results type {:?}, limit {}",
        config.scraper.strategy,
        config.scraper.results_type,
        config.scraper.effective_limit()
    );

    let (mut stats, status) = tokio::select! {
        stats = scrape_with(config, fetcher, sink.clone()) => (stats, RunStatus::Completed),
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, keeping the records written so far");
            (RunStatistics::new(), RunStatus::Interrupted)
        }
    };
    stats.records_written = sink.finalize(status)?;

    tracing::info!(
        "Scrape {}: {} records in {:?}",
        status.to_db_string(),
        stats.records_written,
        stats.duration
    );
    Ok(stats)
}
