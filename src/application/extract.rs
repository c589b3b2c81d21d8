/// Finds the substring of a raw model response that is plausibly a JSON
/// array of feedback items. The response may interleave prose, markdown
/// fences and a single JSON payload.
pub fn extract_json_candidate(text: &str) -> Option<String> {
    let open_bracket = text.find('[');
    let close_bracket = text.rfind(']');
    let open_brace = text.find('{');
    let close_brace = text.rfind('}');

    if let (Some(ob), Some(cb), Some(oc), Some(cc)) =
        (open_bracket, close_bracket, open_brace, close_brace)
    {
        // [ { ... } ] — the array encloses the object pair
        if ob < oc && cb > cc {
            return Some(text[ob..=cb].to_string());
        }
    }

    if let (Some(oc), Some(cc)) = (open_brace, close_brace) {
        // bare object, the model forgot the array brackets
        if oc <= cc {
            return Some(format!("[{}]", &text[oc..=cc]));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_enclosed_array() {
        let text = "Here is my review:\n```json\n[ {\"change_id\": \"1\"} ]\n```\nDone.";
        assert_eq!(
            extract_json_candidate(text).as_deref(),
            Some("[ {\"change_id\": \"1\"} ]")
        );
    }

    #[test]
    fn wraps_bare_object_in_array() {
        let text = "prose {\"change_id\": \"1\"} trailing";
        assert_eq!(
            extract_json_candidate(text).as_deref(),
            Some("[{\"change_id\": \"1\"}]")
        );
    }

    #[test]
    fn no_brackets_yields_none() {
        assert_eq!(extract_json_candidate("I could not produce a review."), None);
    }

    #[test]
    fn object_containing_array_is_wrapped() {
        let text = "{\"items\": [1, 2]}";
        assert_eq!(
            extract_json_candidate(text).as_deref(),
            Some("[{\"items\": [1, 2]}]")
        );
    }
}
