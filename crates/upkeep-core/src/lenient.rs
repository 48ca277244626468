//! Lenient deserialization helpers for data read back from storage.
//!
//! Persisted shapes may have drifted between releases or been corrupted
//! outright. Every consumer treats sub-resource sequences as ordered lists
//! even when the stored value is missing, `null`, or not an array, so the
//! normalization lives here once instead of at every call site.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Deserialize a sequence field, normalizing anything malformed to empty.
///
/// Used with `#[serde(default, deserialize_with = "lenient::seq")]`.
pub fn seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => match serde_json::from_value(Value::Array(items)) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "malformed sequence elements, normalizing to empty");
                Vec::new()
            }
        },
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            warn!(found = json_kind(&other), "expected sequence, normalizing to empty");
            Vec::new()
        }
    })
}

/// Deserialize an optional timestamp, dropping unparseable values.
///
/// Reminder timestamps originate from datetime-local inputs and may lack a
/// timezone suffix; those are interpreted as UTC.
pub fn datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        Some(Value::String(raw)) => Ok(parse_datetime(&raw)),
        None | Some(Value::Null) => Ok(None),
        Some(other) => {
            warn!(found = json_kind(&other), "expected timestamp string, dropping");
            Ok(None)
        }
    }
}

/// Parse a timestamp from RFC 3339 or a zone-less datetime-local string.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    warn!(value = raw, "unparseable timestamp, dropping");
    None
}

/// Check whether a parsed JSON value has the same broad shape as a fallback.
///
/// A `null` fallback accepts anything; otherwise arrays must stay arrays,
/// objects must stay objects, and primitives must keep their type.
pub fn shape_matches(parsed: &Value, fallback: &Value) -> bool {
    match fallback {
        Value::Null => true,
        Value::Array(_) => parsed.is_array(),
        Value::Object(_) => parsed.is_object(),
        Value::Bool(_) => parsed.is_boolean(),
        Value::Number(_) => parsed.is_number(),
        Value::String(_) => parsed.is_string(),
    }
}

/// Human-readable JSON kind, for diagnostics.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "seq")]
        items: Vec<String>,
        #[serde(default, deserialize_with = "datetime")]
        when: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_seq_missing_is_empty() {
        let holder: Holder = serde_json::from_str("{}").unwrap();
        assert!(holder.items.is_empty());
    }

    #[test]
    fn test_seq_null_is_empty() {
        let holder: Holder = serde_json::from_str(r#"{"items": null}"#).unwrap();
        assert!(holder.items.is_empty());
    }

    #[test]
    fn test_seq_non_array_is_empty() {
        let holder: Holder = serde_json::from_str(r#"{"items": 42}"#).unwrap();
        assert!(holder.items.is_empty());

        let holder: Holder = serde_json::from_str(r#"{"items": {"a": 1}}"#).unwrap();
        assert!(holder.items.is_empty());
    }

    #[test]
    fn test_seq_bad_elements_is_empty() {
        let holder: Holder = serde_json::from_str(r#"{"items": [1, 2, 3]}"#).unwrap();
        assert!(holder.items.is_empty());
    }

    #[test]
    fn test_seq_valid_round_trip() {
        let holder: Holder = serde_json::from_str(r#"{"items": ["a", "b"]}"#).unwrap();
        assert_eq!(holder.items, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_datetime_rfc3339() {
        let holder: Holder =
            serde_json::from_str(r#"{"when": "2026-03-01T12:30:00.000Z"}"#).unwrap();
        assert!(holder.when.is_some());
    }

    #[test]
    fn test_datetime_local_without_zone() {
        let holder: Holder = serde_json::from_str(r#"{"when": "2026-03-01T12:30"}"#).unwrap();
        let when = holder.when.unwrap();
        assert_eq!(when.to_rfc3339(), "2026-03-01T12:30:00+00:00");
    }

    #[test]
    fn test_datetime_garbage_is_none() {
        let holder: Holder = serde_json::from_str(r#"{"when": "next tuesday"}"#).unwrap();
        assert!(holder.when.is_none());

        let holder: Holder = serde_json::from_str(r#"{"when": 17}"#).unwrap();
        assert!(holder.when.is_none());
    }

    #[test]
    fn test_shape_matches() {
        use serde_json::json;

        assert!(shape_matches(&json!([1]), &json!([])));
        assert!(!shape_matches(&json!({"a": 1}), &json!([])));
        assert!(shape_matches(&json!({"a": 1}), &json!({})));
        assert!(!shape_matches(&json!("s"), &json!({})));
        assert!(shape_matches(&json!(true), &json!(false)));
        assert!(!shape_matches(&json!(1), &json!(false)));
        assert!(shape_matches(&json!(null), &json!(null)));
        assert!(shape_matches(&json!({"x": 1}), &json!(null)));
    }

    #[test]
    fn test_json_kind() {
        use serde_json::json;

        assert_eq!(json_kind(&json!([])), "array");
        assert_eq!(json_kind(&json!({})), "object");
        assert_eq!(json_kind(&json!(null)), "null");
        assert_eq!(json_kind(&json!(1.5)), "number");
    }
}
