//! Small text and clock helpers shared by the auth, remote and CLI layers.

/// Longest error body kept in a user-facing message.
const MAX_BODY_CHARS: usize = 180;

/// Trimmed text, or `None` when absent or blank.
pub fn non_blank<S: AsRef<str>>(value: Option<S>) -> Option<String> {
    value
        .as_ref()
        .map(|text| text.as_ref().trim())
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

/// `http` or `https` scheme (any case) followed by a non-empty host.
pub fn has_http_scheme(value: &str) -> bool {
    value.split_once("://").is_some_and(|(scheme, rest)| {
        (scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"))
            && !rest.is_empty()
            && !rest.starts_with('/')
    })
}

/// One-line digest of a response body: whitespace runs collapse to a single
/// space and long bodies are cut with an ellipsis.
pub fn summarize_body(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_BODY_CHARS {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(MAX_BODY_CHARS).collect();
    cut.push('…');
    cut
}

pub fn now_unix_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn now_unix_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn non_blank_trims_and_drops_empty_text() {
        assert_eq!(non_blank(None::<String>), None);
        assert_eq!(non_blank(Some(" \t ")), None);
        assert_eq!(non_blank(Some("  Sheet1 ".to_string())), Some("Sheet1".to_string()));
    }

    #[test]
    fn http_scheme_needs_a_host() {
        assert!(has_http_scheme("http://localhost:8080"));
        assert!(has_http_scheme("HTTPS://sheets.googleapis.com"));
        assert!(!has_http_scheme("https://"));
        assert!(!has_http_scheme("http:///path"));
        assert!(!has_http_scheme("ftp://example.com"));
        assert!(!has_http_scheme("localhost:8080"));
    }

    #[test]
    fn summarize_body_collapses_whitespace() {
        assert_eq!(
            summarize_body("  <html>\n  <body>Bad   Gateway</body>\n"),
            "<html> <body>Bad Gateway</body>"
        );
        assert_eq!(summarize_body(" \n "), "");
    }

    #[test]
    fn summarize_body_cuts_long_bodies() {
        let summary = summarize_body(&"word ".repeat(100));
        assert_eq!(summary.chars().count(), MAX_BODY_CHARS + 1);
        assert!(summary.ends_with('…'));
    }

    #[test]
    fn millis_and_secs_agree() {
        let secs = now_unix_secs();
        let millis = now_unix_millis();
        assert!((millis / 1000 - secs).abs() <= 1);
    }
}
