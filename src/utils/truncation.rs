const MAX_SNIPPET_CHARS: usize = 280;
const MAX_ERROR_LENGTH: usize = 500;

/// Truncate a snippet to a fixed number of characters, respecting char boundaries.
pub fn truncate_snippet(text: &str) -> String {
    truncate_chars(text.trim(), MAX_SNIPPET_CHARS)
}

pub fn truncate_error(error: &str) -> String {
    truncate_chars(error, MAX_ERROR_LENGTH)
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_snippet_untouched() {
        assert_eq!(truncate_snippet("  hello  "), "hello");
    }

    #[test]
    fn test_long_snippet_cut_on_char_boundary() {
        let text = "é".repeat(400);
        let out = truncate_snippet(&text);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 283);
    }
}
