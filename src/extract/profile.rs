use super::fields::{first_count, flag, text};
use crate::config::FieldPriorities;
use crate::record::{NormalizedRecord, RecordBuilder};
use crate::url::{ContentType, ScrapeTarget};
use serde_json::Value;

/// Builds a profile record from the user object
pub(super) fn extract(
    user: &Value,
    target: &ScrapeTarget,
    fields: &FieldPriorities,
) -> NormalizedRecord {
    let username = text(user, "username").unwrap_or_else(|| target.identifier().to_string());

    RecordBuilder::new(ContentType::Profile)
        .url(target.url().as_str())
        .set("username", username)
        .set_opt("name", text(user, "full_name"))
        .set_opt("bio", text(user, "biography"))
        .set_opt("followers", first_count(user, &fields.followers))
        .set_opt("following", first_count(user, &fields.following))
        .set_opt("posts", first_count(user, &fields.post_count))
        .set_opt("isVerified", flag(user, "is_verified"))
        .set_opt("isPrivate", flag(user, "is_private"))
        .set_opt("id", text(user, "id").or_else(|| text(user, "pk")))
        .set_opt("externalUrl", text(user, "external_url"))
        .set_opt("profilePicUrl", text(user, "profile_pic_url"))
        .build()
}
