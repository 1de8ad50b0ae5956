//! Pagination of child collections
//!
//! A [`Paginator`] drives one [`ChildSource`] for one parent record and yields
//! mapped child records until the result limit is reached or the source runs
//! dry. The limit is checked before every pull, and each pull asks only for
//! what is still missing, so the source is never asked past the limit.
//!
//! Sources own their cursor. Nothing is shared across parents and a
//! paginator cannot be restarted.

mod api_cursor;
mod edge_list;
mod scroll;

pub use api_cursor::{ApiCursorSource, CursorPager};
pub use edge_list::EdgeListSource;
pub use scroll::{ScrollSource, TileMapper};

use crate::fetch::FetchFailure;
use crate::record::NormalizedRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Consecutive empty batches tolerated from a source that claims more items
const MAX_EMPTY_BATCHES: usize = 3;

/// Raw items returned by one pull
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub items: Vec<Value>,
    /// False once the source is exhausted
    pub has_more: bool,
}

impl Batch {
    pub fn new(items: Vec<Value>, has_more: bool) -> Self {
        Self { items, has_more }
    }

    /// An empty, final batch
    pub fn done() -> Self {
        Self::default()
    }
}

/// A lazily advancing source of raw child items
#[async_trait]
pub trait ChildSource: Send {
    /// Pulls the next batch
    ///
    /// `wanted` is the number of records still missing; sources may return
    /// fewer or more items.
    async fn next_batch(&mut self, wanted: usize) -> Result<Batch, FetchFailure>;
}

/// Maps one raw item into a record, or `None` to skip it
pub type ItemTransform = Box<dyn Fn(&Value) -> Option<NormalizedRecord> + Send + Sync>;

/// Bounded traversal of one child collection
pub struct Paginator {
    parent: String,
    source: Box<dyn ChildSource>,
    transform: ItemTransform,
    limit: usize,
    buffer: VecDeque<Value>,
    exhausted: bool,
    emitted: usize,
    skipped: usize,
    batches: usize,
    empty_batches: usize,
}

impl Paginator {
    /// # Arguments
    ///
    /// * `parent` - Identifier of the parent record, for logging
    /// * `source` - Where raw items come from
    /// * `transform` - Child-type mapping
    /// * `limit` - Maximum number of records to emit
    pub fn new(
        parent: impl Into<String>,
        source: Box<dyn ChildSource>,
        transform: ItemTransform,
        limit: usize,
    ) -> Self {
        Self {
            parent: parent.into(),
            source,
            transform,
            limit,
            buffer: VecDeque::new(),
            exhausted: false,
            emitted: 0,
            skipped: 0,
            batches: 0,
            empty_batches: 0,
        }
    }

    /// Returns the next record, or `None` at the limit or on exhaustion
    ///
    /// A failure while pulling ends the traversal with a warning; records
    /// already emitted stand.
    pub async fn next(&mut self) -> Option<NormalizedRecord> {
        loop {
            if self.emitted >= self.limit {
                return None;
            }

            if let Some(item) = self.buffer.pop_front() {
                match (self.transform)(&item) {
                    Some(record) => {
                        self.emitted += 1;
                        return Some(record);
                    }
                    None => {
                        self.skipped += 1;
                        continue;
                    }
                }
            }

            if self.exhausted {
                return None;
            }

            let wanted = self.limit - self.emitted;
            match self.source.next_batch(wanted).await {
                Ok(batch) => {
                    self.batches += 1;
                    debug!(
                        "Batch {} for {}: {} items, more: {}",
                        self.batches,
                        self.parent,
                        batch.items.len(),
                        batch.has_more
                    );

                    if batch.items.is_empty() {
                        self.empty_batches += 1;
                    } else {
                        self.empty_batches = 0;
                    }

                    if !batch.has_more || self.empty_batches >= MAX_EMPTY_BATCHES {
                        self.exhausted = true;
                    }
                    self.buffer.extend(batch.items);
                }
                Err(failure) => {
                    warn!(
                        "Pagination for {} stopped after {} records: {}",
                        self.parent, self.emitted, failure
                    );
                    self.exhausted = true;
                    self.buffer.clear();
                }
            }
        }
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn batches(&self) -> usize {
        self.batches
    }
}
