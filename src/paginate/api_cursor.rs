use super::{Batch, ChildSource};
use crate::extract::{flag, text};
use crate::fetch::FetchFailure;
use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

/// Fetches one page of a cursor-paged collection
#[async_trait]
pub trait CursorPager: Send + Sync {
    /// Returns the child container (`edges` + `page_info`) of the next page
    async fn page(&self, first: usize, after: &str) -> Result<Value, FetchFailure>;
}

/// Embedded edges first, then cursor pages
///
/// The first pull hands out the edges that came with the parent document.
/// Later pulls request `min(page_size, wanted)` items after the last
/// `end_cursor` until `has_next_page` turns false.
pub struct ApiCursorSource {
    embedded: Option<Vec<Value>>,
    has_next: bool,
    cursor: Option<String>,
    pager: Box<dyn CursorPager>,
    page_size: usize,
}

impl ApiCursorSource {
    pub fn new(container: &Value, pager: Box<dyn CursorPager>, page_size: usize) -> Self {
        let (edges, has_next, cursor) = read_container(container);
        Self {
            embedded: Some(edges),
            has_next,
            cursor,
            pager,
            page_size: page_size.max(1),
        }
    }

    fn has_more(&self) -> bool {
        self.has_next && self.cursor.is_some()
    }
}

fn read_container(container: &Value) -> (Vec<Value>, bool, Option<String>) {
    let edges = container
        .get("edges")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let has_next = flag(container, "page_info.has_next_page").unwrap_or(false);
    let cursor = text(container, "page_info.end_cursor").filter(|c| !c.is_empty());
    (edges, has_next, cursor)
}

#[async_trait]
impl ChildSource for ApiCursorSource {
    async fn next_batch(&mut self, wanted: usize) -> Result<Batch, FetchFailure> {
        if let Some(edges) = self.embedded.take() {
            return Ok(Batch::new(edges, self.has_more()));
        }

        let cursor = match (&self.cursor, self.has_next) {
            (Some(cursor), true) => cursor.clone(),
            _ => return Ok(Batch::done()),
        };

        let first = wanted.min(self.page_size).max(1);
        trace!("Requesting {} items after {}", first, cursor);
        let container = self.pager.page(first, &cursor).await?;

        let (edges, has_next, next_cursor) = read_container(&container);
        self.has_next = has_next;
        self.cursor = next_cursor;
        Ok(Batch::new(edges, self.has_more()))
    }
}
