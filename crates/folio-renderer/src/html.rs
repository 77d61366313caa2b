//! HTML escaping helpers shared by rendering rules.

/// Escape text for HTML content and double-quoted attribute values.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    push_escaped(&mut out, s);
    out
}

/// Append `s` to `out`, escaped.
pub fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Neutralise URLs with script-capable schemes.
///
/// Documents are untrusted, so `javascript:`, `vbscript:`, `file:` and
/// non-image `data:` destinations are replaced by `#`.
#[must_use]
pub fn sanitize_url(url: &str) -> &str {
    let scheme: String = url
        .trim_start()
        .chars()
        .take_while(|c| *c != ':')
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    if !url.contains(':') {
        return url;
    }
    match scheme.as_str() {
        "javascript" | "vbscript" | "file" => "#",
        "data" => {
            let lower = url.trim_start().to_ascii_lowercase();
            let safe = ["data:image/png", "data:image/gif", "data:image/jpeg", "data:image/webp"]
                .iter()
                .any(|prefix| lower.starts_with(prefix));
            if safe { url } else { "#" }
        }
        _ => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#""quoted""#), "&quot;quoted&quot;");
        assert_eq!(escape_html("it's"), "it's");
    }

    #[test]
    fn test_sanitize_url_blocks_script_schemes() {
        assert_eq!(sanitize_url("javascript:alert(1)"), "#");
        assert_eq!(sanitize_url("  JavaScript:alert(1)"), "#");
        assert_eq!(sanitize_url("java\tscript:alert(1)"), "#");
        assert_eq!(sanitize_url("vbscript:x"), "#");
        assert_eq!(sanitize_url("data:text/html;base64,xx"), "#");
    }

    #[test]
    fn test_sanitize_url_keeps_safe_urls() {
        assert_eq!(sanitize_url("https://example.com"), "https://example.com");
        assert_eq!(sanitize_url("/docs/a.html#b"), "/docs/a.html#b");
        assert_eq!(
            sanitize_url("data:image/png;base64,xx"),
            "data:image/png;base64,xx"
        );
    }
}
