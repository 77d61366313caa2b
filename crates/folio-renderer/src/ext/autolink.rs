//! Bare URL autolinks (`https://…`, `ftp://…`, `www.…`).
//!
//! Produces ordinary [`InlineKind::Autolink`] nodes, which the `core`
//! extension renders.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Attributes, Inline, InlineKind};
use crate::error::ParseError;
use crate::extension::{Extension, ParseRule};
use crate::parser::{InlineContext, InlineParse, InlineRule, Trigger};

static BARE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:(?:https?|ftp)://[^\s<>]+|www\.[^\s<>]+)").unwrap());

/// The `autolink` extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutolinkExtension;

impl Extension for AutolinkExtension {
    fn name(&self) -> &str {
        "autolink"
    }

    fn parsing_rules(&self) -> Vec<ParseRule> {
        vec![ParseRule::inline(BareUrl)]
    }
}

struct BareUrl;

/// Drop trailing punctuation and any `)` without a matching `(`.
fn trim_url(url: &str) -> &str {
    let mut url = url;
    let opens = url.matches('(').count();
    let mut closes = url.matches(')').count();
    loop {
        let Some(last) = url.chars().next_back() else {
            return url;
        };
        let trim = match last {
            '?' | '!' | '.' | ',' | ':' | ';' | '*' | '_' | '~' | '\'' | '"' => true,
            ')' if closes > opens => {
                closes -= 1;
                true
            }
            _ => false,
        };
        if !trim {
            return url;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
}

impl InlineRule for BareUrl {
    fn name(&self) -> &'static str {
        "bare-url"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Chars(&['h', 'H', 'f', 'F', 'w', 'W'])
    }

    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError> {
        if cx.in_link() || !cx.at_word_start() {
            return Ok(None);
        }
        let Some(found) = BARE_URL_RE.find(cx.rest()) else {
            return Ok(None);
        };
        let url = trim_url(found.as_str());
        let host = url
            .split_once("://")
            .map_or_else(|| url.get(4..).unwrap_or(""), |(_, rest)| rest);
        if host.is_empty() || !host.chars().next().is_some_and(char::is_alphanumeric) {
            return Ok(None);
        }

        let href = if url.contains("://") {
            url.to_owned()
        } else {
            format!("http://{url}")
        };
        let node = Inline::leaf(InlineKind::Autolink, url)
            .with_attrs(Attributes::new().with("href", href));
        Ok(Some(InlineParse::Node { node, len: url.len() }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ext::CoreSyntax;
    use crate::pipeline::{Pipeline, PipelineOptions};
    use crate::registry::Registry;

    fn render(input: &str) -> String {
        let registry = Registry::builder()
            .with_extension(AutolinkExtension)
            .with_extension(CoreSyntax)
            .build()
            .unwrap();
        Pipeline::new(Arc::new(registry), PipelineOptions::default())
            .render_document(input)
            .unwrap()
            .html
    }

    #[test]
    fn test_trim_url() {
        assert_eq!(trim_url("https://a.com/x."), "https://a.com/x");
        assert_eq!(trim_url("https://a.com/x)."), "https://a.com/x");
        assert_eq!(
            trim_url("https://en.wikipedia.org/wiki/A_(b)"),
            "https://en.wikipedia.org/wiki/A_(b)"
        );
    }

    #[test]
    fn test_bare_urls() {
        assert_eq!(
            render("See https://example.com/path, then stop."),
            "<p>See <a href=\"https://example.com/path\">https://example.com/path</a>, \
             then stop.</p>\n"
        );
    }

    #[test]
    fn test_www_gets_scheme() {
        assert_eq!(
            render("(www.example.com)"),
            "<p>(<a href=\"http://www.example.com\">www.example.com</a>)</p>\n"
        );
    }

    #[test]
    fn test_not_inside_words_or_links() {
        assert_eq!(render("xhttp://a.com"), "<p>xhttp://a.com</p>\n");
        assert_eq!(
            render("[http://a.com](/b)"),
            "<p><a href=\"/b\">http://a.com</a></p>\n"
        );
    }

    #[test]
    fn test_bare_scheme_is_text() {
        assert_eq!(render("http:// nothing"), "<p>http:// nothing</p>\n");
        assert_eq!(render("www. nothing"), "<p>www. nothing</p>\n");
    }
}
