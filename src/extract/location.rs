use super::fields::{float, text};
use crate::record::{NormalizedRecord, RecordBuilder};
use crate::url::{ContentType, ScrapeTarget};
use serde_json::Value;

pub(super) fn extract(location: &Value, target: &ScrapeTarget) -> NormalizedRecord {
    RecordBuilder::new(ContentType::Location)
        .url(target.url().as_str())
        .set_opt("name", text(location, "name"))
        .set_opt("city", city(location))
        .set_opt("latitude", float(location, "lat").or_else(|| float(location, "latitude")))
        .set_opt("longitude", float(location, "lng").or_else(|| float(location, "longitude")))
        .set("id", text(location, "id").unwrap_or_else(|| target.identifier().to_string()))
        .set_opt("slug", text(location, "slug"))
        .build()
}

/// City from the flat field, the directory entry, or the address blob
///
/// The address arrives as a JSON document encoded in a string.
fn city(location: &Value) -> Option<String> {
    text(location, "city")
        .or_else(|| text(location, "directory.city.name"))
        .or_else(|| {
            let raw = text(location, "address_json")?;
            let address: Value = serde_json::from_str(&raw).ok()?;
            text(&address, "city_name")
        })
        .filter(|c| !c.is_empty())
}
