//! Normalized records
//!
//! A [`NormalizedRecord`] is the unit handed to the record sink. Its field map
//! always carries every required key for its content type: the builder
//! pre-fills each one with its type default (empty string, zero, false) and
//! extractors override what the document actually holds.

use crate::url::ContentType;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A scalar field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(x) => write!(f, "{}", x),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Kind of a required field, which fixes its default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Bool,
}

impl FieldKind {
    pub fn default_value(self) -> FieldValue {
        match self {
            Self::Text => FieldValue::Text(String::new()),
            Self::Integer => FieldValue::Integer(0),
            Self::Float => FieldValue::Float(0.0),
            Self::Bool => FieldValue::Bool(false),
        }
    }
}

/// Required fields per content type
pub fn required_fields(content_type: ContentType) -> &'static [(&'static str, FieldKind)] {
    use FieldKind::*;
    match content_type {
        ContentType::Profile => &[
            ("username", Text),
            ("name", Text),
            ("bio", Text),
            ("followers", Integer),
            ("following", Integer),
            ("posts", Integer),
            ("isVerified", Bool),
            ("isPrivate", Bool),
        ],
        ContentType::Post => &[
            ("username", Text),
            ("caption", Text),
            ("likes", Integer),
            ("comments", Integer),
            ("timestamp", Integer),
            ("mediaType", Text),
        ],
        ContentType::Comment => &[
            ("postIdentifier", Text),
            ("username", Text),
            ("text", Text),
            ("likes", Integer),
            ("timestamp", Integer),
        ],
        ContentType::Hashtag => &[("name", Text)],
        ContentType::Location => &[
            ("name", Text),
            ("city", Text),
            ("latitude", Float),
            ("longitude", Float),
        ],
        ContentType::SearchResult => &[("query", Text), ("kind", Text), ("identifier", Text)],
    }
}

/// Media type recorded when the document carries none
pub const DEFAULT_MEDIA_TYPE: &str = "image";

/// A write-once normalized record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    #[serde(rename = "type")]
    content_type: ContentType,

    #[serde(rename = "url", skip_serializing_if = "Option::is_none")]
    source_url: Option<String>,

    #[serde(flatten)]
    fields: BTreeMap<String, FieldValue>,

    #[serde(rename = "scrapedAt")]
    scraped_at: DateTime<Utc>,
}

impl NormalizedRecord {
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn scraped_at(&self) -> DateTime<Utc> {
        self.scraped_at
    }

    /// True when every required key of the record's type is present
    pub fn has_required_fields(&self) -> bool {
        required_fields(self.content_type)
            .iter()
            .all(|(key, _)| self.fields.contains_key(*key))
    }

    /// Serializes the record as one JSON object
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Builder for [`NormalizedRecord`]
///
/// # Example
///
/// ```
/// use gram_ripple::record::RecordBuilder;
/// use gram_ripple::url::ContentType;
///
/// let record = RecordBuilder::new(ContentType::Hashtag)
///     .set("name", "food")
///     .set("mediaCount", 1200_i64)
///     .build();
/// assert!(record.has_required_fields());
/// ```
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    content_type: ContentType,
    source_url: Option<String>,
    fields: BTreeMap<String, FieldValue>,
}

impl RecordBuilder {
    pub fn new(content_type: ContentType) -> Self {
        let fields = required_fields(content_type)
            .iter()
            .map(|(key, kind)| (key.to_string(), kind.default_value()))
            .collect();

        Self {
            content_type,
            source_url: None,
            fields,
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn set(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Sets the field only when a value was resolved
    pub fn set_opt<V: Into<FieldValue>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    pub fn build(self) -> NormalizedRecord {
        NormalizedRecord {
            content_type: self.content_type,
            source_url: self.source_url,
            fields: self.fields,
            scraped_at: Utc::now(),
        }
    }
}
