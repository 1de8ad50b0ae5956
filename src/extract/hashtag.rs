use super::fields::{count, text};
use crate::record::{NormalizedRecord, RecordBuilder};
use crate::url::{ContentType, ScrapeTarget};
use serde_json::Value;

pub(super) fn extract(hashtag: &Value, target: &ScrapeTarget) -> NormalizedRecord {
    let name = text(hashtag, "name").unwrap_or_else(|| target.identifier().to_string());
    let media_count =
        count(hashtag, "edge_hashtag_to_media.count").or_else(|| count(hashtag, "media_count"));

    RecordBuilder::new(ContentType::Hashtag)
        .url(target.url().as_str())
        .set("name", name)
        .set_opt("mediaCount", media_count)
        .set_opt("id", text(hashtag, "id"))
        .set_opt("profilePicUrl", text(hashtag, "profile_pic_url"))
        .build()
}
