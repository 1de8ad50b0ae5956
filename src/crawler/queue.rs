//! FIFO request queue
//!
//! This module handles:
//! - First-in first-out ordering of pending requests
//! - De-duplication by unique key
//! - The per-run request cap
//! - Re-queueing of retried requests outside the cap

use std::collections::{HashSet, VecDeque};

/// A URL waiting to be handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Absolute URL handed to the router
    pub url: String,

    /// De-duplication key; defaults to the URL
    pub unique_key: String,

    /// Attempts already made for this request
    pub retry_count: u32,
}

impl Request {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            unique_key: url.clone(),
            url,
            retry_count: 0,
        }
    }

    pub fn with_unique_key(mut self, key: impl Into<String>) -> Self {
        self.unique_key = key.into();
        self
    }
}

/// Pending requests of one run
#[derive(Debug)]
pub struct RequestQueue {
    pending: VecDeque<Request>,
    seen: HashSet<String>,
    started: usize,
    max_requests: usize,
    duplicates: u64,
}

impl RequestQueue {
    /// # Arguments
    ///
    /// * `max_requests` - Maximum number of distinct requests handed out
    pub fn new(max_requests: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            seen: HashSet::new(),
            started: 0,
            max_requests,
            duplicates: 0,
        }
    }

    /// Adds a request unless its unique key was seen before
    ///
    /// # Returns
    ///
    /// `true` if the request was queued
    pub fn enqueue(&mut self, request: Request) -> bool {
        if !self.seen.insert(request.unique_key.clone()) {
            self.duplicates += 1;
            return false;
        }
        self.pending.push_back(request);
        true
    }

    /// Puts a failed request back for another attempt
    ///
    /// Retries bypass de-duplication and do not count toward the cap.
    pub fn retry(&mut self, mut request: Request) {
        request.retry_count += 1;
        self.pending.push_back(request);
    }

    /// Takes the oldest pending request
    ///
    /// Once the cap is reached only retries are handed out. Returns `None`
    /// when nothing eligible is pending.
    pub fn next(&mut self) -> Option<Request> {
        if self.started < self.max_requests {
            let request = self.pending.pop_front()?;
            if request.retry_count == 0 {
                self.started += 1;
            }
            return Some(request);
        }

        let index = self.pending.iter().position(|r| r.retry_count > 0)?;
        self.pending.remove(index)
    }

    /// Requests still waiting
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Distinct requests handed out so far
    pub fn started(&self) -> usize {
        self.started
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }
}
