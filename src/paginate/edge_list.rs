use super::{Batch, ChildSource};
use crate::fetch::FetchFailure;
use async_trait::async_trait;
use serde_json::Value;

/// Slices an edge list that is already in memory
///
/// The cursor is a plain index. Each pull returns at most
/// `min(wanted, page_size)` items.
#[derive(Debug)]
pub struct EdgeListSource {
    items: Vec<Value>,
    index: usize,
    page_size: usize,
}

impl EdgeListSource {
    pub fn new(items: Vec<Value>, page_size: usize) -> Self {
        Self {
            items,
            index: 0,
            page_size: page_size.max(1),
        }
    }

    /// Reads the `edges` array of a child container
    pub fn from_container(container: &Value, page_size: usize) -> Self {
        let items = container
            .get("edges")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Self::new(items, page_size)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl ChildSource for EdgeListSource {
    async fn next_batch(&mut self, wanted: usize) -> Result<Batch, FetchFailure> {
        let take = wanted.min(self.page_size).max(1);
        let end = (self.index + take).min(self.items.len());
        let items = self.items[self.index..end].to_vec();
        self.index = end;
        Ok(Batch::new(items, self.index < self.items.len()))
    }
}
