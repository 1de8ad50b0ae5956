use super::{Batch, ChildSource};
use crate::fetch::{FetchFailure, FieldSelector, RenderedPage};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::trace;

/// Turns one collected DOM tile into a raw child item, or drops it
pub type TileMapper = fn(Value) -> Option<Value>;

/// Infinite-scroll source over a live page
///
/// The first pull reads what is already rendered. Every later pull is one
/// cycle: scroll to the bottom, wait the settle delay, re-read the page
/// height and the tiles. Tiles seen before are not returned again. When the
/// height equals the previous reading the source is exhausted.
pub struct ScrollSource {
    page: Box<dyn RenderedPage>,
    item_selector: String,
    fields: Vec<FieldSelector>,
    mapper: TileMapper,
    settle: Duration,
    seen: HashSet<String>,
    last_height: Option<u64>,
}

impl ScrollSource {
    pub fn new(
        page: Box<dyn RenderedPage>,
        item_selector: impl Into<String>,
        fields: Vec<FieldSelector>,
        mapper: TileMapper,
        settle: Duration,
    ) -> Self {
        Self {
            page,
            item_selector: item_selector.into(),
            fields,
            mapper,
            settle,
            seen: HashSet::new(),
            last_height: None,
        }
    }

    async fn read_new(&mut self) -> Result<Vec<Value>, FetchFailure> {
        let tiles = self.page.collect(&self.item_selector, &self.fields).await?;
        let mut fresh = Vec::new();
        for tile in tiles {
            let item = match (self.mapper)(tile) {
                Some(item) => item,
                None => continue,
            };
            if self.seen.insert(tile_key(&item)) {
                fresh.push(item);
            }
        }
        Ok(fresh)
    }
}

fn tile_key(item: &Value) -> String {
    ["shortcode", "id", "href"]
        .iter()
        .find_map(|k| item.get(*k).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| item.to_string())
}

#[async_trait]
impl ChildSource for ScrollSource {
    async fn next_batch(&mut self, _wanted: usize) -> Result<Batch, FetchFailure> {
        if self.last_height.is_none() {
            self.last_height = Some(self.page.content_height().await?);
            let items = self.read_new().await?;
            return Ok(Batch::new(items, true));
        }

        self.page.scroll_to_bottom().await?;
        tokio::time::sleep(self.settle).await;
        let height = self.page.content_height().await?;
        let items = self.read_new().await?;

        let stalled = self.last_height == Some(height);
        trace!("Scrolled to height {}, {} new tiles", height, items.len());
        self.last_height = Some(height);

        Ok(Batch::new(items, !stalled))
    }
}
