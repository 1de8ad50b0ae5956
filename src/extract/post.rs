use super::fields::{first_count, first_media_type, first_text, text};
use super::unwrap_node;
use crate::config::FieldPriorities;
use crate::record::{NormalizedRecord, RecordBuilder, DEFAULT_MEDIA_TYPE};
use crate::url::{ContentType, ScrapeTarget};
use serde_json::Value;

/// Builds the record for a post target from its media object
pub(super) fn extract(
    media: &Value,
    target: &ScrapeTarget,
    fields: &FieldPriorities,
) -> NormalizedRecord {
    let shortcode =
        first_text(media, &fields.shortcode).unwrap_or_else(|| target.identifier().to_string());

    build(media, fields, first_text(media, &fields.owner), shortcode)
        .url(target.url().as_str())
        .build()
}

/// Maps one media edge of a profile, hashtag or location
///
/// Items without both an id and a shortcode are skipped. Posts of a profile
/// without an owner take the profile's username.
pub(super) fn from_item(
    item: &Value,
    parent: &ScrapeTarget,
    fields: &FieldPriorities,
    base_url: &str,
) -> Option<NormalizedRecord> {
    let node = unwrap_node(item)?;
    let id = text(node, "id").or_else(|| text(node, "pk"));
    let shortcode = first_text(node, &fields.shortcode);
    if id.is_none() && shortcode.is_none() {
        return None;
    }

    let owner = first_text(node, &fields.owner).or_else(|| {
        (parent.content_type() == ContentType::Profile).then(|| parent.identifier().to_string())
    });

    let code = shortcode.clone().unwrap_or_default();
    let mut builder = build(node, fields, owner, code);
    if let Some(code) = shortcode {
        builder = builder.url(format!("{}/p/{}/", base_url.trim_end_matches('/'), code));
    }
    Some(builder.set(parent_key(parent.content_type()), parent.identifier()).build())
}

fn build(
    media: &Value,
    fields: &FieldPriorities,
    owner: Option<String>,
    shortcode: String,
) -> RecordBuilder {
    let media_type =
        first_media_type(media, &fields.media_type).unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());

    RecordBuilder::new(ContentType::Post)
        .set("shortcode", shortcode)
        .set_opt("username", owner)
        .set_opt("caption", first_text(media, &fields.caption))
        .set_opt("likes", first_count(media, &fields.likes))
        .set_opt("comments", first_count(media, &fields.comment_count))
        .set_opt("timestamp", first_count(media, &fields.timestamp))
        .set("mediaType", media_type)
        .set_opt("id", text(media, "id").or_else(|| text(media, "pk")))
        .set_opt("displayUrl", text(media, "display_url"))
}

fn parent_key(parent: ContentType) -> &'static str {
    match parent {
        ContentType::Hashtag => "hashtag",
        ContentType::Location => "locationId",
        _ => "ownerUsername",
    }
}
