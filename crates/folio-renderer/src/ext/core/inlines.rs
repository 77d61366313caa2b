//! Baseline inline rules.

use std::sync::LazyLock;

use regex::Regex;

use super::blocks::{strip_delimiters, unescape};
use crate::ast::{Attributes, Inline, InlineKind};
use crate::error::ParseError;
use crate::parser::{DelimiterRun, InlineContext, InlineParse, InlineRule, Trigger};

static URI_AUTOLINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<([A-Za-z][A-Za-z0-9+.\-]{1,31}:[^\s<>]*)>").unwrap());

static EMAIL_AUTOLINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^<([a-zA-Z0-9.!#$%&'*+/=?^_`{|}~\-]+@",
        r"[a-zA-Z0-9](?:[a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?",
        r"(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?)*)>",
    ))
    .unwrap()
});

fn node(inline: Inline, len: usize) -> Option<InlineParse> {
    Some(InlineParse::Node { node: inline, len })
}

/// Backslash escapes and backslash hard breaks.
pub(crate) struct Escape;

impl InlineRule for Escape {
    fn name(&self) -> &'static str {
        "escape"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Chars(&['\\'])
    }

    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError> {
        let mut chars = cx.rest().chars().skip(1);
        Ok(match chars.next() {
            Some('\n') => node(Inline::leaf(InlineKind::HardBreak, ""), 2),
            Some(c) if c.is_ascii_punctuation() => node(Inline::text(c.to_string()), 2),
            _ => None,
        })
    }
}

/// Backtick code spans. An unmatched run is literal text.
pub(crate) struct CodeSpan;

impl InlineRule for CodeSpan {
    fn name(&self) -> &'static str {
        "code-span"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Chars(&['`'])
    }

    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError> {
        let rest = cx.rest();
        let ticks = rest.bytes().take_while(|b| *b == b'`').count();
        let body = &rest[ticks..];

        let mut search = 0;
        while let Some(found) = body[search..].find('`') {
            let at = search + found;
            let run = body[at..].bytes().take_while(|b| *b == b'`').count();
            if run == ticks {
                let code = normalize_code(&body[..at]);
                return Ok(node(Inline::leaf(InlineKind::Code, code), ticks + at + run));
            }
            search = at + run;
        }

        Ok(node(Inline::text(&rest[..ticks]), ticks))
    }
}

/// Line endings become spaces; one surrounding space is stripped when both
/// ends have one and the content is not all spaces.
fn normalize_code(raw: &str) -> String {
    let code = raw.replace('\n', " ");
    if code.len() >= 2 && code.starts_with(' ') && code.ends_with(' ') && code.trim() != "" {
        code[1..code.len() - 1].to_owned()
    } else {
        code
    }
}

/// `*` and `_` delimiter runs.
pub(crate) struct Emphasis;

fn pair_emphasis(opener: usize, closer: usize) -> (InlineKind, usize) {
    if opener >= 2 && closer >= 2 {
        (InlineKind::Strong, 2)
    } else {
        (InlineKind::Emphasis, 1)
    }
}

impl InlineRule for Emphasis {
    fn name(&self) -> &'static str {
        "emphasis"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Chars(&['*', '_'])
    }

    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError> {
        let Some(ch) = cx.rest().chars().next() else {
            return Ok(None);
        };
        Ok(DelimiterRun::scan(cx, ch, pair_emphasis).map(InlineParse::Delimiter))
    }
}

/// Inline and reference links and images.
pub(crate) struct Link;

struct Destination {
    url: String,
    title: Option<String>,
    len: usize,
}

/// Parse `(dest "title")` at the start of `text`.
fn inline_destination(text: &str) -> Option<Destination> {
    let inner = text.strip_prefix('(')?;
    let mut pos = inner.len() - inner.trim_start().len();

    let rest = &inner[pos..];
    let url_len = if rest.starts_with('<') {
        rest.find('>').filter(|end| !rest[..*end].contains('\n'))? + 1
    } else {
        let mut depth = 0usize;
        let mut end = rest.len();
        let mut escaped = false;
        for (idx, c) in rest.char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '(' => depth += 1,
                ')' if depth == 0 => {
                    end = idx;
                    break;
                }
                ')' => depth -= 1,
                c if c.is_whitespace() => {
                    end = idx;
                    break;
                }
                _ => {}
            }
        }
        end
    };
    let url = unescape(strip_delimiters(&rest[..url_len]));
    pos += url_len;

    let after_url = &inner[pos..];
    let gap = after_url.len() - after_url.trim_start().len();
    let mut title = None;
    let candidate = &after_url[gap..];
    if gap > 0
        && let Some(close) = match candidate.chars().next() {
            Some('"') => candidate[1..].find('"').map(|i| i + 2),
            Some('\'') => candidate[1..].find('\'').map(|i| i + 2),
            Some('(') => candidate[1..].find(')').map(|i| i + 2),
            _ => None,
        }
    {
        title = Some(unescape(strip_delimiters(&candidate[..close])));
        pos += gap + close;
    } else {
        pos += gap;
    }

    let tail = &inner[pos..];
    let trailing = tail.len() - tail.trim_start().len();
    pos += trailing;
    inner[pos..].starts_with(')').then(|| Destination {
        url,
        title,
        len: pos + 2,
    })
}

fn contains_link(inlines: &[Inline]) -> bool {
    inlines.iter().any(|inline| {
        matches!(inline.kind, InlineKind::Link | InlineKind::Autolink)
            || contains_link(&inline.children)
    })
}

impl InlineRule for Link {
    fn name(&self) -> &'static str {
        "link"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Chars(&['[', '!'])
    }

    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError> {
        let rest = cx.rest();
        let is_image = rest.starts_with("![");
        if !is_image && rest.starts_with('!') {
            return Ok(None);
        }
        let bracket = usize::from(is_image);
        let Some(close) = cx.closing_bracket(bracket) else {
            return Ok(None);
        };
        let text = &rest[bracket + 1..close];
        let after = &rest[close + 1..];
        let consumed = close + 1;

        let (url, title, len) = if let Some(dest) = inline_destination(after) {
            (dest.url, dest.title, consumed + dest.len)
        } else if let Some(label_close) = after.strip_prefix('[').and_then(|_| after.find(']')) {
            let label = &after[1..label_close];
            let label = if label.trim().is_empty() { text } else { label };
            let Some(target) = cx.references().link(label) else {
                return Ok(None);
            };
            (target.url.clone(), target.title.clone(), consumed + label_close + 1)
        } else {
            let Some(target) = cx.references().link(text) else {
                return Ok(None);
            };
            (target.url.clone(), target.title.clone(), consumed)
        };

        let children = cx.parse_nested(bracket + 1..close, !is_image)?;
        // Links may not contain links: the inner one wins.
        if !is_image && contains_link(&children) {
            return Ok(None);
        }
        let mut attrs = Attributes::new().with("href", url);
        if let Some(title) = title {
            attrs.insert("title", title);
        }
        let kind = if is_image { InlineKind::Image } else { InlineKind::Link };
        let inline = Inline::container(kind, children.to_vec()).with_attrs(attrs);
        Ok(node(inline, len))
    }
}

/// `<scheme:...>` and `<user@host>`.
pub(crate) struct AngleAutolink;

impl InlineRule for AngleAutolink {
    fn name(&self) -> &'static str {
        "angle-autolink"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Chars(&['<'])
    }

    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError> {
        let rest = cx.rest();
        if let Some(caps) = URI_AUTOLINK_RE.captures(rest) {
            let target = &caps[1];
            let inline = Inline::leaf(InlineKind::Autolink, target)
                .with_attrs(Attributes::new().with("href", target));
            return Ok(node(inline, caps[0].len()));
        }
        if let Some(caps) = EMAIL_AUTOLINK_RE.captures(rest) {
            let address = &caps[1];
            let inline = Inline::leaf(InlineKind::Autolink, address)
                .with_attrs(Attributes::new().with("href", format!("mailto:{address}")));
            return Ok(node(inline, caps[0].len()));
        }
        Ok(None)
    }
}

/// Soft breaks and two-space hard breaks.
pub(crate) struct LineBreak;

impl InlineRule for LineBreak {
    fn name(&self) -> &'static str {
        "line-break"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Chars(&[' ', '\n'])
    }

    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError> {
        let rest = cx.rest();
        let spaces = rest.bytes().take_while(|b| *b == b' ').count();
        if rest.as_bytes().get(spaces) != Some(&b'\n') {
            return Ok(None);
        }
        let kind = if spaces >= 2 {
            InlineKind::HardBreak
        } else {
            InlineKind::SoftBreak
        };
        Ok(node(Inline::leaf(kind, ""), spaces + 1))
    }
}
