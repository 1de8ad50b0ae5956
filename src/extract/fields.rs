//! Field resolution over loosely shaped JSON
//!
//! Paths are dotted (`edge_media_to_caption.edges.0.node.text`); numeric
//! segments index arrays. A lookup that meets a missing key, a wrong type or
//! a null yields `None` instead of failing.

use serde_json::Value;

/// Resolves a dotted path, treating null as absent
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// First path resolving to text wins
///
/// A path that resolves to a non-text value (an object where a string was
/// expected) does not stop the search.
pub fn first_text(value: &Value, paths: &[String]) -> Option<String> {
    paths
        .iter()
        .find_map(|p| lookup(value, p).and_then(as_text))
}

/// First path resolving to a count wins
pub fn first_count(value: &Value, paths: &[String]) -> Option<i64> {
    paths
        .iter()
        .find_map(|p| lookup(value, p).and_then(as_count))
}

/// First path resolving to a media type wins
pub fn first_media_type(value: &Value, paths: &[String]) -> Option<String> {
    paths
        .iter()
        .find_map(|p| lookup(value, p).and_then(media_type_name))
}

pub fn text(value: &Value, path: &str) -> Option<String> {
    lookup(value, path).and_then(as_text)
}

pub fn count(value: &Value, path: &str) -> Option<i64> {
    lookup(value, path).and_then(as_count)
}

/// Finite float at `path`; `NaN` and infinities count as absent
pub fn float(value: &Value, path: &str) -> Option<f64> {
    let parsed = match lookup(value, path)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

pub fn flag(value: &Value, path: &str) -> Option<bool> {
    match lookup(value, path)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_count(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => parse_count(s),
        _ => None,
    }
}

/// Parses a displayed count such as `1,234`, `12.5K` or `1.2M`
///
/// # Examples
///
/// ```
/// use gram_ripple::extract::parse_count;
///
/// assert_eq!(parse_count("1,234"), Some(1234));
/// assert_eq!(parse_count("12.5K"), Some(12_500));
/// assert_eq!(parse_count("1.2M"), Some(1_200_000));
/// assert_eq!(parse_count("n/a"), None);
/// ```
pub fn parse_count(raw: &str) -> Option<i64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }

    let (number, multiplier) = match cleaned.chars().last()? {
        'k' | 'K' => (&cleaned[..cleaned.len() - 1], 1_000.0),
        'm' | 'M' => (&cleaned[..cleaned.len() - 1], 1_000_000.0),
        'b' | 'B' => (&cleaned[..cleaned.len() - 1], 1_000_000_000.0),
        _ => (cleaned.as_str(), 1.0),
    };

    let parsed: f64 = number.trim().parse().ok()?;
    if parsed < 0.0 {
        return None;
    }
    Some((parsed * multiplier).round() as i64)
}

/// Normalizes a media type value
///
/// Numeric codes of the flat API map onto the GraphQL type names.
pub fn media_type_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => match n.as_i64()? {
            1 => Some("GraphImage".to_string()),
            2 => Some("GraphVideo".to_string()),
            8 => Some("GraphSidecar".to_string()),
            _ => None,
        },
        _ => None,
    }
}

/// True for video items in either API generation
pub fn is_video(node: &Value) -> bool {
    flag(node, "is_video").unwrap_or(false)
        || text(node, "__typename").as_deref() == Some("GraphVideo")
        || count(node, "media_type") == Some(2)
        || text(node, "product_type").as_deref() == Some("clips")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lookup_nested_and_indexed() {
        let v = json!({"a": {"edges": [{"node": {"text": "hi"}}]}});
        assert_eq!(lookup(&v, "a.edges.0.node.text"), Some(&json!("hi")));
        assert_eq!(lookup(&v, "a.edges.1.node.text"), None);
        assert_eq!(lookup(&v, "a.missing.deeper"), None);
        assert_eq!(lookup(&v, "a.edges.x"), None);
    }

    #[test]
    fn test_null_is_absent() {
        let v = json!({"edge_liked_by": null, "like_count": 7});
        assert_eq!(
            first_count(&v, &paths(&["edge_liked_by.count", "like_count"])),
            Some(7)
        );
    }

    #[test]
    fn test_priority_order() {
        let v = json!({
            "edge_liked_by": {"count": 42},
            "edge_media_preview_like": {"count": 40}
        });
        let likes = paths(&["edge_liked_by.count", "edge_media_preview_like.count"]);
        assert_eq!(first_count(&v, &likes), Some(42));

        let reversed = paths(&["edge_media_preview_like.count", "edge_liked_by.count"]);
        assert_eq!(first_count(&v, &reversed), Some(40));
    }

    #[test]
    fn test_zero_wins_over_later_paths() {
        let v = json!({"edge_liked_by": {"count": 0}, "like_count": 9});
        assert_eq!(
            first_count(&v, &paths(&["edge_liked_by.count", "like_count"])),
            Some(0)
        );
    }

    #[test]
    fn test_first_text_skips_objects() {
        let v = json!({"caption": {"pk": 1}, "title": "fallback"});
        assert_eq!(
            first_text(&v, &paths(&["caption.text", "caption", "title"])),
            Some("fallback".to_string())
        );
    }

    #[test]
    fn test_count_from_string() {
        let v = json!({"follower_count": "1.5K"});
        assert_eq!(count(&v, "follower_count"), Some(1500));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("0"), Some(0));
        assert_eq!(parse_count(" 3B "), Some(3_000_000_000));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("-5"), None);
    }

    #[test]
    fn test_media_type_codes() {
        assert_eq!(media_type_name(&json!(1)).as_deref(), Some("GraphImage"));
        assert_eq!(media_type_name(&json!(2)).as_deref(), Some("GraphVideo"));
        assert_eq!(media_type_name(&json!(8)).as_deref(), Some("GraphSidecar"));
        assert_eq!(media_type_name(&json!(5)), None);
        assert_eq!(media_type_name(&json!("GraphImage")).as_deref(), Some("GraphImage"));
    }

    #[test]
    fn test_is_video() {
        assert!(is_video(&json!({"is_video": true})));
        assert!(is_video(&json!({"media_type": 2})));
        assert!(is_video(&json!({"product_type": "clips"})));
        assert!(!is_video(&json!({"__typename": "GraphImage"})));
    }

    #[test]
    fn test_float_rejects_non_finite() {
        let v = json!({"lat": "NaN", "lng": "inf", "alt": "-Infinity", "ok": "48.85"});
        assert_eq!(float(&v, "lat"), None);
        assert_eq!(float(&v, "lng"), None);
        assert_eq!(float(&v, "alt"), None);
        assert_eq!(float(&v, "ok"), Some(48.85));
    }

    #[test]
    fn test_flag_and_float() {
        let v = json!({"is_private": 1, "lat": "40.7", "lng": -73.9});
        assert_eq!(flag(&v, "is_private"), Some(true));
        assert_eq!(float(&v, "lat"), Some(40.7));
        assert_eq!(float(&v, "lng"), Some(-73.9));
    }
}
