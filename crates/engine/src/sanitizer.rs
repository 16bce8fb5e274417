//! Response sanitizer.
//!
//! Models asked for structured output sometimes wrap the payload in a
//! Markdown code fence anyway. `sanitize` strips exactly one fenced wrapper,
//! and only keeps the result when the unwrapped text actually parses as
//! JSON — anything else comes back untouched.

/// Strip an incidental code-fence wrapper from `text`.
///
/// Returns the (possibly unwrapped) text and whether the unwrap was applied.
pub fn sanitize(text: &str) -> (String, bool) {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return (text.to_string(), false);
    }

    match strip_fence(trimmed) {
        Some(inner) if serde_json::from_str::<serde_json::Value>(&inner).is_ok() => (inner, true),
        _ => (text.to_string(), false),
    }
}

/// Remove one leading and one trailing fence marker, plus an optional info
/// string ("json", "JSON", ...) on the opening fence's own line.
fn strip_fence(text: &str) -> Option<String> {
    let inner = text.strip_prefix("```")?.strip_suffix("```")?;

    // An info string occupies the opening fence's line by itself.
    let inner = match inner.split_once('\n') {
        Some((first_line, rest)) if is_info_string(first_line.trim_end()) => rest,
        _ => inner,
    };

    Some(inner.trim().to_string())
}

fn is_info_string(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfenced_text_is_unchanged() {
        let (out, structured) = sanitize("plain answer");
        assert_eq!(out, "plain answer");
        assert!(!structured);
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let (out, structured) = sanitize("```json\n{\"a\":1}\n```");
        assert_eq!(out, "{\"a\":1}");
        assert!(structured);
    }

    #[test]
    fn fence_without_info_string() {
        let (out, structured) = sanitize("```\n[1, 2, 3]\n```");
        assert_eq!(out, "[1, 2, 3]");
        assert!(structured);
    }

    #[test]
    fn fenced_non_json_is_returned_verbatim() {
        let original = "```not json```";
        let (out, structured) = sanitize(original);
        assert_eq!(out, original);
        assert!(!structured);
    }

    #[test]
    fn fenced_prose_is_returned_verbatim() {
        let original = "```python\nprint('hi')\n```";
        let (out, structured) = sanitize(original);
        assert_eq!(out, original);
        assert!(!structured);
    }

    #[test]
    fn surrounding_whitespace_does_not_defeat_the_fence_check() {
        let (out, structured) = sanitize("  ```json\n{\"a\":1}\n```  ");
        assert_eq!(out, "{\"a\":1}");
        assert!(structured);
    }

    #[test]
    fn only_one_wrapper_is_stripped() {
        // The inner fence survives; the doubly-wrapped text is not JSON, so
        // the transformation is discarded entirely.
        let original = "```\n```json\n{\"a\":1}\n```\n```";
        let (out, structured) = sanitize(original);
        assert_eq!(out, original);
        assert!(!structured);
    }

    #[test]
    fn json_already_bare_is_unchanged() {
        let (out, structured) = sanitize("{\"a\":1}");
        assert_eq!(out, "{\"a\":1}");
        assert!(!structured);
    }
}
