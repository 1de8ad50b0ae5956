use super::fields::{count, text};
use crate::record::{NormalizedRecord, RecordBuilder};
use crate::url::{ContentType, ScrapeTarget};
use serde_json::{json, Value};

/// Hit lists of a search payload and the key wrapping each entry, which is
/// also the recorded `kind`
const HIT_LISTS: [(&str, &str); 3] = [("users", "user"), ("hashtags", "hashtag"), ("places", "place")];

/// Builds the summary record of a search target
pub(super) fn extract(search: &Value, target: &ScrapeTarget) -> NormalizedRecord {
    let list_len = |key: &str| search.get(key).and_then(Value::as_array).map(|a| a.len() as i64);

    RecordBuilder::new(ContentType::SearchResult)
        .url(target.url().as_str())
        .set("query", target.identifier())
        .set("kind", "query")
        .set("identifier", target.identifier())
        .set("userCount", list_len("users").unwrap_or(0))
        .set("hashtagCount", list_len("hashtags").unwrap_or(0))
        .set("placeCount", list_len("places").unwrap_or(0))
        .build()
}

/// Flattens the hit lists of a search payload into tagged items
///
/// Every item becomes `{"kind": ..., "node": ...}`. Items carrying a
/// `position` are ordered by it; the sort is stable.
pub fn search_hits(search: &Value) -> Vec<Value> {
    let mut hits: Vec<(i64, Value)> = Vec::new();

    for (list, kind) in HIT_LISTS {
        let entries = match search.get(list).and_then(Value::as_array) {
            Some(entries) => entries,
            None => continue,
        };
        for entry in entries {
            let node = entry.get(kind).cloned().unwrap_or_else(|| entry.clone());
            let position = count(entry, "position").unwrap_or(i64::MAX);
            hits.push((position, json!({"kind": kind, "node": node})));
        }
    }

    hits.sort_by_key(|(position, _)| *position);
    hits.into_iter().map(|(_, hit)| hit).collect()
}

/// Maps one tagged search hit
pub(super) fn from_hit(
    item: &Value,
    search: &ScrapeTarget,
    base_url: &str,
) -> Option<NormalizedRecord> {
    let kind = text(item, "kind")?;
    let node = item.get("node").filter(|n| n.is_object())?;
    let base = base_url.trim_end_matches('/');

    let (identifier, name, url) = match kind.as_str() {
        "user" => {
            let username = text(node, "username")?;
            let url = format!("{}/{}/", base, username);
            (username, text(node, "full_name"), url)
        }
        "hashtag" => {
            let tag = text(node, "name")?;
            let url = format!("{}/explore/tags/{}/", base, tag);
            (tag.clone(), Some(tag), url)
        }
        "place" => {
            let id = text(node, "location.pk")
                .or_else(|| text(node, "location.id"))
                .or_else(|| text(node, "location.facebook_places_id"))?;
            let name = text(node, "title").or_else(|| text(node, "location.name"));
            let url = format!("{}/explore/locations/{}/", base, id);
            (id, name, url)
        }
        _ => return None,
    };

    Some(
        RecordBuilder::new(ContentType::SearchResult)
            .url(url)
            .set("query", search.identifier())
            .set("kind", kind)
            .set("identifier", identifier)
            .set_opt("name", name)
            .build(),
    )
}
