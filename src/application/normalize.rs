use serde_json::Value;

use crate::domain::entities::{AnchoredNote, GeneralNote, NormalizedItem};

/// Markers standing in for characters that do not round-trip safely
/// through the model prompt/response channel. No marker is a substring of
/// another's replacement, so decoding is idempotent and order-independent.
const SENTINELS: [(&str, &str); 3] = [("__LB__", "\n"), ("__DQ__", "\""), ("__SQ__", "'")];

pub fn decode_sentinels(text: &str) -> String {
    let mut out = text.to_string();
    for (marker, replacement) in SENTINELS {
        out = out.replace(marker, replacement);
    }
    out
}

/// A feedback item that failed validation. The raw payload rides along so
/// the fallback comment can surface it verbatim instead of dropping it.
#[derive(Debug, Clone)]
pub struct InvalidItem {
    pub reason: String,
    pub raw: Value,
}

/// Validates one parsed feedback item and classifies it as general or
/// line-anchored. Non-essential fields default to a placeholder; a missing
/// essential field fails the item.
pub fn normalize_item(value: &Value) -> Result<NormalizedItem, InvalidItem> {
    let invalid = |reason: &str| InvalidItem {
        reason: reason.to_string(),
        raw: value.clone(),
    };

    let map = match value.as_object() {
        Some(map) => map,
        None => return Err(invalid("item is not a JSON object")),
    };

    let change_id = match map.get("change_id").and_then(scalar_to_string) {
        Some(raw) => decode_sentinels(&raw),
        None => return Err(invalid("change_id is missing")),
    };

    if change_id == "-1" || change_id == "-2" {
        let comment = string_field(map, "comment").unwrap_or_else(|| placeholder("comment"));
        return Ok(NormalizedItem::General(GeneralNote { change_id, comment }));
    }

    let file_name = match string_field(map, "file_name") {
        Some(name) => normalize_file_name(&name),
        None => return Err(invalid("file_name is required for a line-anchored item")),
    };
    let start_line = match map.get("start_line").and_then(parse_line_number) {
        Some(line) => line,
        None => return Err(invalid("start_line is missing or not an integer")),
    };

    Ok(NormalizedItem::Anchored(AnchoredNote {
        change_id,
        file_name,
        start_line,
        summary: string_field(map, "summary").unwrap_or_else(|| placeholder("summary")),
        reason: string_field(map, "reason").unwrap_or_else(|| placeholder("reason")),
        proposed_code: string_field(map, "proposed_code")
            .unwrap_or_else(|| placeholder("proposed_code")),
        comment: string_field(map, "comment"),
    }))
}

/// Repository-relative path without a leading `./`.
fn normalize_file_name(name: &str) -> String {
    name.strip_prefix("./").unwrap_or(name).to_string()
}

fn placeholder(field: &str) -> String {
    format!("(no {field})")
}

fn string_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(decode_sentinels)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_line_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn encode_sentinels(text: &str) -> String {
        text.replace('\n', "__LB__")
            .replace('"', "__DQ__")
            .replace('\'', "__SQ__")
    }

    #[test]
    fn sentinel_round_trip() {
        let original = "line one\nline 'two' says \"hi\"\nend";
        assert_eq!(decode_sentinels(&encode_sentinels(original)), original);
    }

    #[test]
    fn decoding_is_idempotent() {
        let once = decode_sentinels("a__LB__b__DQ__c__SQ__d");
        assert_eq!(decode_sentinels(&once), once);
    }

    #[test]
    fn classifies_general_comment() {
        let item = json!({"change_id": "-1", "comment": "overall fine"});
        match normalize_item(&item).expect("valid item") {
            NormalizedItem::General(note) => {
                assert_eq!(note.change_id, "-1");
                assert_eq!(note.comment, "overall fine");
            }
            other => panic!("expected general, got {other:?}"),
        }
    }

    #[test]
    fn numeric_change_id_sentinel_is_general() {
        let item = json!({"change_id": -2});
        match normalize_item(&item).expect("valid item") {
            NormalizedItem::General(note) => assert_eq!(note.comment, "(no comment)"),
            other => panic!("expected general, got {other:?}"),
        }
    }

    #[test]
    fn strips_leading_dot_slash_and_parses_string_line() {
        let item = json!({
            "change_id": "7",
            "file_name": "./src/lib.rs",
            "start_line": "42",
        });
        match normalize_item(&item).expect("valid item") {
            NormalizedItem::Anchored(note) => {
                assert_eq!(note.file_name, "src/lib.rs");
                assert_eq!(note.start_line, 42);
                assert_eq!(note.summary, "(no summary)");
                assert_eq!(note.comment, None);
            }
            other => panic!("expected anchored, got {other:?}"),
        }
    }

    #[test]
    fn missing_change_id_fails_validation() {
        let item = json!({"file_name": "a.py", "start_line": 1});
        let err = normalize_item(&item).expect_err("invalid item");
        assert!(err.reason.contains("change_id"));
        assert_eq!(err.raw, item);
    }

    #[test]
    fn anchored_without_file_name_fails_validation() {
        let item = json!({"change_id": "3", "start_line": 5});
        let err = normalize_item(&item).expect_err("invalid item");
        assert!(err.reason.contains("file_name"));
    }

    #[test]
    fn non_integer_start_line_fails_validation() {
        let item = json!({"change_id": "3", "file_name": "a.py", "start_line": "around ten"});
        let err = normalize_item(&item).expect_err("invalid item");
        assert!(err.reason.contains("start_line"));
    }

    #[test]
    fn decodes_sentinels_in_fields() {
        let item = json!({
            "change_id": "5",
            "file_name": "a.py",
            "start_line": 10,
            "proposed_code": "x = __DQ__a__DQ____LB__y = 2",
        });
        match normalize_item(&item).expect("valid item") {
            NormalizedItem::Anchored(note) => {
                assert_eq!(note.proposed_code, "x = \"a\"\ny = 2");
            }
            other => panic!("expected anchored, got {other:?}"),
        }
    }
}
