//! Locate the first top-level JSON object in free text.
//!
//! Model replies wrap JSON in prose or markdown fences. Braces are matched
//! while skipping string literals (and escapes inside them), so braces in
//! string values never end the object early.

/// The first balanced `{ ... }` span of `text`, or `None` if there is none.
pub fn extract_first_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = matching_brace(bytes, start) {
            return Some(&text[start..=end]);
        }
        // This brace never closes; a later one still might.
        search_from = start + 1;
    }
    None
}

/// Index of the `}` closing the `{` at `start`.
fn matching_brace(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_object_in_prose() {
        let text = "Here is the client:\n{\"name\": \"Acme\", \"nested\": {\"a\": 1}}\nThanks!";
        assert_eq!(
            extract_first_json_object(text),
            Some("{\"name\": \"Acme\", \"nested\": {\"a\": 1}}")
        );
    }

    #[test]
    fn strips_markdown_fences() {
        let text = "```json\n{\"a\": [1, 2, {\"b\": 3}]}\n```";
        assert_eq!(extract_first_json_object(text), Some("{\"a\": [1, 2, {\"b\": 3}]}"));
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let text = r#"{"note": "use } and { freely", "esc": "quote \" then }"} trailing }"#;
        assert_eq!(
            extract_first_json_object(text),
            Some(r#"{"note": "use } and { freely", "esc": "quote \" then }"}"#)
        );
    }

    #[test]
    fn returns_first_of_several_objects() {
        let text = r#"{"first": 1} {"second": 2}"#;
        assert_eq!(extract_first_json_object(text), Some(r#"{"first": 1}"#));
    }

    #[test]
    fn none_when_no_object() {
        assert_eq!(extract_first_json_object("no json here"), None);
        assert_eq!(extract_first_json_object("{\"open\": true"), None);
        assert_eq!(extract_first_json_object(""), None);
    }

    #[test]
    fn handles_multibyte_text() {
        let text = "Résumé → {\"name\": \"Café Ünïcode\"} ✓";
        assert_eq!(extract_first_json_object(text), Some("{\"name\": \"Café Ünïcode\"}"));
    }
}
