//! Crawler module for routing and running scrape requests
//!
//! This module contains the run loop, including:
//! - The FIFO request queue with de-duplication and a request cap
//! - The dispatch router that turns one URL into records
//! - The runner that drives the router and retries transient failures

mod queue;
mod router;
mod runner;

pub use queue::{Request, RequestQueue};
pub use router::{DispatchRouter, Outcome, RouterSettings};
pub use runner::{
    build_fetcher, retry_backoff, run_scrape, scrape_with, search_url, seed_requests, unique_key,
    Runner,
};
