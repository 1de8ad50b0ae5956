//! The normalized intermediate document
//!
//! Every fetch strategy produces a [`Document`]: a JSON payload tagged with the
//! layout it follows. The layout decides where each content type keeps its
//! root object and its child container, so extractors and pagination never
//! need to know which strategy ran.

use crate::fetch::RenderedPage;
use crate::url::ContentType;
use serde_json::Value;
use std::fmt;

/// Payload layout produced by a fetch strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    /// The application state blob embedded in server-rendered HTML
    EmbeddedFeed,
    /// Responses of the JSON endpoints
    Api,
    /// Snapshot assembled from a live DOM
    Rendered,
}

impl DocumentShape {
    /// JSON pointer of the root object for `content_type`
    pub fn root_pointer(self, content_type: ContentType) -> Option<&'static str> {
        use ContentType::*;
        let pointer = match (self, content_type) {
            (_, Comment) => return None,

            (Self::EmbeddedFeed, Profile) => "/nativeState/feed/user_detail/user",
            (Self::EmbeddedFeed, Post) => "/nativeState/feed/post/media",
            (Self::EmbeddedFeed, Hashtag) => "/nativeState/feed/hashtag",
            (Self::EmbeddedFeed, Location) => "/nativeState/feed/location",
            (Self::EmbeddedFeed, SearchResult) => "/nativeState/feed/search",

            (Self::Api, Profile) => "/data/user",
            (Self::Api, Post) => "/data/shortcode_media",
            (Self::Api, Hashtag) => "/data/hashtag",
            (Self::Api, Location) => "/data/location",
            (Self::Api, SearchResult) => "",

            (Self::Rendered, Profile) => "/user",
            (Self::Rendered, Post) => "/media",
            (Self::Rendered, Hashtag) => "/hashtag",
            (Self::Rendered, Location) => "/location",
            (Self::Rendered, SearchResult) => "/search",
        };
        Some(pointer)
    }

    /// JSON pointer of the child container (`edges` plus optional `page_info`)
    pub fn child_pointer(self, content_type: ContentType) -> Option<&'static str> {
        use ContentType::*;
        let pointer = match (self, content_type) {
            (_, Comment) => return None,

            (Self::EmbeddedFeed, Profile) => "/nativeState/feed/timeline",
            (Self::EmbeddedFeed, Post) => "/nativeState/feed/post/comments",
            (Self::EmbeddedFeed, Hashtag) => "/nativeState/feed/hashtag/edge_hashtag_to_media",
            (Self::EmbeddedFeed, Location) => "/nativeState/feed/location/edge_location_to_media",
            (Self::EmbeddedFeed, SearchResult) => "/nativeState/feed/search",

            (Self::Api, Profile) => "/data/user/edge_owner_to_timeline_media",
            (Self::Api, Post) => "/data/shortcode_media/edge_media_to_parent_comment",
            (Self::Api, Hashtag) => "/data/hashtag/edge_hashtag_to_media",
            (Self::Api, Location) => "/data/location/edge_location_to_media",
            (Self::Api, SearchResult) => "",

            (Self::Rendered, Profile) => "/user/timeline",
            (Self::Rendered, Post) => "/media/comments",
            (Self::Rendered, Hashtag) => "/hashtag/media",
            (Self::Rendered, Location) => "/location/media",
            (Self::Rendered, SearchResult) => "/search",
        };
        Some(pointer)
    }
}

/// Parsed payload for one target
pub struct Document {
    shape: DocumentShape,
    payload: Value,
    page: Option<Box<dyn RenderedPage>>,
}

impl Document {
    pub fn new(shape: DocumentShape, payload: Value) -> Self {
        Self {
            shape,
            payload,
            page: None,
        }
    }

    /// Attaches the live page the snapshot was read from
    pub fn with_page(mut self, page: Box<dyn RenderedPage>) -> Self {
        self.page = Some(page);
        self
    }

    pub fn shape(&self) -> DocumentShape {
        self.shape
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The root object for `content_type`, if the payload has one
    ///
    /// Null or non-object values count as absent.
    pub fn root(&self, content_type: ContentType) -> Option<&Value> {
        let pointer = self.shape.root_pointer(content_type)?;
        self.payload.pointer(pointer).filter(|v| v.is_object())
    }

    /// The child container for `content_type`, if the payload has one
    pub fn child_container(&self, content_type: ContentType) -> Option<&Value> {
        let pointer = self.shape.child_pointer(content_type)?;
        self.payload.pointer(pointer).filter(|v| v.is_object())
    }

    /// Takes the live page handle out of the document
    pub fn take_page(&mut self) -> Option<Box<dyn RenderedPage>> {
        self.page.take()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("shape", &self.shape)
            .field("payload", &self.payload)
            .field("live_page", &self.page.is_some())
            .finish()
    }
}
