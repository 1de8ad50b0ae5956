use super::fields::{first_count, first_text, text};
use super::unwrap_node;
use crate::config::FieldPriorities;
use crate::record::{NormalizedRecord, RecordBuilder};
use crate::url::{ContentType, ScrapeTarget};
use serde_json::Value;

/// Maps one comment edge of a post
pub(super) fn from_item(
    item: &Value,
    post: &ScrapeTarget,
    fields: &FieldPriorities,
) -> Option<NormalizedRecord> {
    let node = unwrap_node(item)?;

    let record = RecordBuilder::new(ContentType::Comment)
        .set("postIdentifier", post.identifier())
        .set_opt("username", first_text(node, &fields.owner))
        .set_opt("text", text(node, "text"))
        .set_opt("likes", first_count(node, &fields.comment_likes))
        .set_opt("timestamp", first_count(node, &fields.comment_timestamp))
        .set_opt("id", text(node, "id").or_else(|| text(node, "pk")))
        .build();

    Some(record)
}
