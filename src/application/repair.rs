use serde_json::Value;

use crate::domain::errors::FeedbackError;

const CONTEXT_RADIUS: usize = 20;

/// Parses a JSON candidate, repairing truncation when strict parsing fails.
///
/// Model output is regularly cut off at the token limit, so the repair path
/// strips leftover markdown backticks and completes the outer array at the
/// last element that survived intact. A second parse failure is batch-fatal
/// and carries the parser's offset plus a window of surrounding text.
pub fn parse_or_repair(candidate: &str) -> Result<Vec<Value>, FeedbackError> {
    match serde_json::from_str::<Vec<Value>>(candidate) {
        Ok(items) => Ok(items),
        Err(first) => {
            let offset = parse_error_offset(candidate, &first);
            tracing::warn!(
                error = %first,
                context = %context_window(candidate, offset),
                "feedback JSON failed strict parsing, attempting repair"
            );

            let stripped = candidate.replace('`', "");
            let completed = complete_truncated(&stripped);
            serde_json::from_str::<Vec<Value>>(&completed).map_err(|second| {
                let offset = parse_error_offset(&completed, &second);
                FeedbackError::Unrepairable {
                    offset,
                    window: context_window(&completed, offset),
                }
            })
        }
    }
}

/// Completes a truncated JSON array by cutting back to one past the last
/// complete top-level element and re-closing the array.
///
/// Truncation at any depth inside a trailing element drops that whole
/// element: completion only ever appends closing structure and removes a
/// strictly-trailing incomplete fragment, so every element that was fully
/// emitted before the cutoff survives unchanged. Input that is already
/// structurally balanced, or that cannot be recognized as an array with at
/// least one complete element, is returned as-is for the parser to judge.
pub fn complete_truncated(input: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    // one past the end of the last complete element of the outer array
    let mut last_complete: Option<usize> = None;

    for (idx, ch) in input.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
                if in_outer_array(&stack) {
                    last_complete = Some(idx + 1);
                }
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' | '[' => stack.push(ch),
            '}' | ']' => {
                let matched = matches!(
                    (stack.last().copied(), ch),
                    (Some('{'), '}') | (Some('['), ']')
                );
                if !matched {
                    // mismatched closer, not a truncation problem
                    return input.to_string();
                }
                stack.pop();
                if in_outer_array(&stack) {
                    last_complete = Some(idx + 1);
                }
            }
            ',' => {
                // scalar elements (numbers, keywords) complete at the separator
                if in_outer_array(&stack) {
                    last_complete = Some(idx);
                }
            }
            _ => {}
        }
    }

    if stack.is_empty() && !in_string {
        return input.to_string();
    }
    if stack.first() != Some(&'[') {
        return input.to_string();
    }

    let Some(cut) = last_complete else {
        // nothing complete before the cutoff, unrepairable below array level
        return input.to_string();
    };

    let mut out = input[..cut].trim_end().to_string();
    if let Some(stripped) = out.strip_suffix(',') {
        out = stripped.trim_end().to_string();
    }
    out.push(']');
    out
}

fn in_outer_array(stack: &[char]) -> bool {
    stack.len() == 1 && stack[0] == '['
}

fn parse_error_offset(text: &str, err: &serde_json::Error) -> usize {
    let line = err.line();
    let mut offset = 0usize;
    for (idx, content) in text.split('\n').enumerate() {
        if idx + 1 == line {
            return offset + err.column().saturating_sub(1);
        }
        offset += content.len() + 1;
    }
    text.len()
}

fn context_window(text: &str, offset: usize) -> String {
    let mut start = offset.saturating_sub(CONTEXT_RADIUS);
    while start > 0 && !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (offset + CONTEXT_RADIUS).min(text.len());
    while end < text.len() && !text.is_char_boundary(end) {
        end += 1;
    }
    text[start..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_input_is_unchanged() {
        let input = r#"[{"change_id": "1"}, {"change_id": "2"}]"#;
        assert_eq!(complete_truncated(input), input);
    }

    #[test]
    fn drops_item_truncated_inside_string_value() {
        let input = concat!(
            r#"[{"change_id": "1", "summary": "a"},"#,
            r#" {"change_id": "2", "summary": "b"},"#,
            r#" {"change_id": "3", "summary": "c"},"#,
            r#" {"change_id": "4", "summary": "cut mid-wa"#,
        );
        let repaired = complete_truncated(input);
        let items: Vec<Value> = serde_json::from_str(&repaired).expect("repaired JSON parses");
        assert_eq!(items.len(), 3);
        assert!(!repaired.contains("cut mid-wa"));
    }

    #[test]
    fn drops_item_truncated_inside_nested_object() {
        let input = r#"[{"change_id": "1"}, {"change_id": "2", "extra": {"deep": ["x", {"y":"#;
        let repaired = complete_truncated(input);
        let items: Vec<Value> = serde_json::from_str(&repaired).expect("repaired JSON parses");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["change_id"], "1");
    }

    #[test]
    fn drops_item_truncated_after_dangling_key() {
        let input = r#"[{"change_id": "1"}, {"change_id":"#;
        let repaired = complete_truncated(input);
        let items: Vec<Value> = serde_json::from_str(&repaired).expect("repaired JSON parses");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn scalar_tail_is_cut_at_separator() {
        assert_eq!(complete_truncated("[1, 2, 34"), "[1, 2]");
    }

    #[test]
    fn parse_or_repair_accepts_strict_json() {
        let items = parse_or_repair(r#"[{"change_id": "1"}]"#).expect("valid JSON");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn parse_or_repair_strips_backticks_and_completes() {
        let input = "[{\"change_id\": \"1\"}, {\"change_id\": \"2\", \"summary\": \"```trunc";
        let items = parse_or_repair(input).expect("repairable JSON");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["change_id"], "1");
    }

    #[test]
    fn parse_or_repair_reports_offset_and_window() {
        let err = parse_or_repair("[{\"change_id\" \"missing colon\"}]")
            .expect_err("illegal token is unrepairable");
        match err {
            FeedbackError::Unrepairable { offset, window } => {
                assert!(offset > 0);
                assert!(window.contains("change_id"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn truncation_before_first_complete_element_is_unrepairable() {
        assert!(parse_or_repair("[{\"change_id\": ").is_err());
    }
}
