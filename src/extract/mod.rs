//! Extractors
//!
//! One extractor per content type turns a [`Document`] into a
//! [`NormalizedRecord`]. Extraction is pure and synchronous. Redundant source
//! fields are resolved through the configured priority lists, so the same
//! code serves every fetch strategy.

mod comment;
mod fields;
mod hashtag;
mod location;
mod post;
mod profile;
mod search;

pub use fields::{
    count, first_count, first_media_type, first_text, flag, float, is_video, lookup,
    media_type_name, parse_count, text,
};
pub use search::search_hits;

use crate::config::{FieldPriorities, ResultsType};
use crate::document::Document;
use crate::record::NormalizedRecord;
use crate::url::{ContentType, ScrapeTarget};
use serde_json::Value;

/// Outcome of running an extractor
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Match(NormalizedRecord),
    /// The document lacks the root object the type requires
    NoMatch,
}

/// Child records a parent pages through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    /// Media of a profile, hashtag or location
    Posts,
    /// Video media only
    Reels,
    /// Comments of a post
    Comments,
    /// Hits of a search
    SearchHits,
}

impl ChildKind {
    /// Which collection, if any, `results_type` requests for a parent type
    pub fn for_parent(parent: ContentType, results_type: ResultsType) -> Option<Self> {
        match (parent, results_type) {
            (
                ContentType::SearchResult,
                ResultsType::Posts | ResultsType::Reels | ResultsType::Comments,
            ) => Some(Self::SearchHits),
            (
                ContentType::Profile | ContentType::Hashtag | ContentType::Location,
                ResultsType::Posts,
            ) => Some(Self::Posts),
            (
                ContentType::Profile | ContentType::Hashtag | ContentType::Location,
                ResultsType::Reels,
            ) => Some(Self::Reels),
            (ContentType::Post, ResultsType::Comments) => Some(Self::Comments),
            _ => None,
        }
    }

    pub fn child_type(self) -> ContentType {
        match self {
            Self::Posts | Self::Reels => ContentType::Post,
            Self::Comments => ContentType::Comment,
            Self::SearchHits => ContentType::SearchResult,
        }
    }
}

/// Runs extractors with a fixed set of priority lists
#[derive(Debug, Clone)]
pub struct Extractor {
    fields: FieldPriorities,
    base_url: String,
}

impl Extractor {
    /// # Arguments
    ///
    /// * `fields` - Priority lists for redundant source fields
    /// * `base_url` - Site base URL, used for child record URLs
    pub fn new(fields: FieldPriorities, base_url: impl Into<String>) -> Self {
        Self {
            fields,
            base_url: base_url.into(),
        }
    }

    pub fn fields(&self) -> &FieldPriorities {
        &self.fields
    }

    /// Extracts the record for `target` from `document`
    pub fn extract(&self, document: &Document, target: &ScrapeTarget) -> Extraction {
        let root = match document.root(target.content_type()) {
            Some(root) => root,
            None => return Extraction::NoMatch,
        };

        let record = match target.content_type() {
            ContentType::Profile => profile::extract(root, target, &self.fields),
            ContentType::Post => post::extract(root, target, &self.fields),
            ContentType::Hashtag => hashtag::extract(root, target),
            ContentType::Location => location::extract(root, target),
            ContentType::SearchResult => search::extract(root, target),
            ContentType::Comment => return Extraction::NoMatch,
        };

        Extraction::Match(record)
    }

    /// Maps one raw child item of `parent` into a record
    ///
    /// Returns `None` for items that cannot be mapped; those are skipped and
    /// never count toward a result limit.
    pub fn child(
        &self,
        kind: ChildKind,
        parent: &ScrapeTarget,
        item: &Value,
    ) -> Option<NormalizedRecord> {
        match kind {
            ChildKind::Posts => post::from_item(item, parent, &self.fields, &self.base_url),
            ChildKind::Reels => {
                let node = unwrap_node(item)?;
                if !is_video(node) {
                    return None;
                }
                post::from_item(item, parent, &self.fields, &self.base_url)
            }
            ChildKind::Comments => comment::from_item(item, parent, &self.fields),
            ChildKind::SearchHits => search::from_hit(item, parent, &self.base_url),
        }
    }
}

/// Returns the `node` of an edge, or the item itself when it is not an edge
///
/// An edge whose `node` is missing or not an object cannot be mapped.
pub(crate) fn unwrap_node(item: &Value) -> Option<&Value> {
    let object = item.as_object()?;
    match object.get("node") {
        Some(node) if node.is_object() => Some(node),
        Some(_) => None,
        None if object.is_empty() => None,
        None => Some(item),
    }
}
