//! Baseline block rules.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Attributes, Block, BlockContent, BlockKind, Span};
use crate::error::ParseError;
use crate::parser::{BlockContext, BlockRule, LineCursor, is_blank, leading_spaces, strip_indent};

static LINK_DEFINITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^ {0,3}\[([^\]]+)\]:[ \t]*(<[^<>\n]*>|\S+)",
        r#"(?:[ \t]+("(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|\((?:[^()\\]|\\.)*\)))?[ \t]*$"#,
    ))
    .unwrap()
});

/// Span covering the lines between two cursor positions.
fn span_between(start: usize, lines: &LineCursor<'_>) -> Span {
    let end = lines.offset();
    Span::new(start, end.max(start))
}

/// Fenced code: ``` or ~~~, closed by a fence at least as long; an
/// unterminated fence runs to the end of its container.
pub(crate) struct FencedCode;

struct Fence<'t> {
    ch: char,
    len: usize,
    indent: usize,
    info: &'t str,
}

fn open_fence(line: &str) -> Option<Fence<'_>> {
    let indent = leading_spaces(line);
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let ch = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = rest.chars().take_while(|c| *c == ch).count();
    if len < 3 {
        return None;
    }
    let info = rest[len..].trim();
    if ch == '`' && info.contains('`') {
        return None;
    }
    Some(Fence {
        ch,
        len,
        indent,
        info,
    })
}

fn closes_fence(line: &str, fence: &Fence<'_>) -> bool {
    let indent = leading_spaces(line);
    if indent > 3 {
        return false;
    }
    let rest = &line[indent..];
    let len = rest.chars().take_while(|c| *c == fence.ch).count();
    len >= fence.len && rest[len..].trim().is_empty()
}

impl BlockRule for FencedCode {
    fn name(&self) -> &'static str {
        "fenced-code"
    }

    fn can_start(&self, lines: &LineCursor<'_>) -> bool {
        lines.peek().is_some_and(|line| open_fence(line.text).is_some())
    }

    fn parse(
        &self,
        lines: &mut LineCursor<'_>,
        _cx: &BlockContext<'_>,
    ) -> Result<Block, ParseError> {
        let start = lines.offset();
        let Some(first) = lines.bump() else {
            return Ok(Block::new(
                BlockKind::CodeBlock,
                BlockContent::Empty,
                Span::new(start, start),
            ));
        };
        let Some(fence) = open_fence(first.text) else {
            return Ok(Block::new(
                BlockKind::Paragraph,
                BlockContent::Raw(first.text.trim().to_owned()),
                Span::new(start, first.end()),
            ));
        };

        let mut code = String::new();
        while let Some(line) = lines.bump() {
            if closes_fence(line.text, &fence) {
                break;
            }
            code.push_str(strip_indent(line.text, fence.indent));
            code.push('\n');
        }

        let mut attrs = Attributes::new();
        if !fence.info.is_empty() {
            attrs.insert("info", fence.info);
        }
        Ok(Block::new(
            BlockKind::CodeBlock,
            BlockContent::Literal(code),
            span_between(start, lines),
        )
        .with_attrs(attrs))
    }
}

/// `#` through `######` headings.
pub(crate) struct AtxHeading;

fn atx_heading(line: &str) -> Option<(usize, &str)> {
    let indent = leading_spaces(line);
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let level = rest.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let after = &rest[level..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }

    let mut content = after.trim();
    // Optional closing sequence: a run of `#` preceded by a space.
    let stripped = content.trim_end_matches('#');
    if stripped.is_empty() {
        content = "";
    } else if stripped.ends_with([' ', '\t']) {
        content = stripped.trim_end();
    }
    Some((level, content))
}

impl BlockRule for AtxHeading {
    fn name(&self) -> &'static str {
        "atx-heading"
    }

    fn can_start(&self, lines: &LineCursor<'_>) -> bool {
        lines.peek().is_some_and(|line| atx_heading(line.text).is_some())
    }

    fn parse(
        &self,
        lines: &mut LineCursor<'_>,
        _cx: &BlockContext<'_>,
    ) -> Result<Block, ParseError> {
        let start = lines.offset();
        let line = lines.bump();
        let (level, content) = line.and_then(|l| atx_heading(l.text)).unwrap_or((1, ""));
        Ok(Block::new(
            BlockKind::Heading,
            BlockContent::Raw(content.to_owned()),
            span_between(start, lines),
        )
        .with_attrs(Attributes::new().with("level", level.to_string())))
    }
}

/// `***`, `---` or `___`, optionally spaced.
pub(crate) struct ThematicBreak;

fn is_thematic_break(line: &str) -> bool {
    if leading_spaces(line) > 3 {
        return false;
    }
    let mut marker = None;
    let mut count = 0;
    for c in line.chars() {
        match c {
            ' ' | '\t' => {}
            '*' | '-' | '_' if marker.is_none_or(|m| m == c) => {
                marker = Some(c);
                count += 1;
            }
            _ => return false,
        }
    }
    count >= 3
}

impl BlockRule for ThematicBreak {
    fn name(&self) -> &'static str {
        "thematic-break"
    }

    fn can_start(&self, lines: &LineCursor<'_>) -> bool {
        lines.peek().is_some_and(|line| is_thematic_break(line.text))
    }

    fn parse(
        &self,
        lines: &mut LineCursor<'_>,
        _cx: &BlockContext<'_>,
    ) -> Result<Block, ParseError> {
        let start = lines.offset();
        lines.bump();
        Ok(Block::new(
            BlockKind::ThematicBreak,
            BlockContent::Empty,
            span_between(start, lines),
        ))
    }
}

/// `>` block quotes with lazy paragraph continuation.
pub(crate) struct BlockQuote;

/// Strip one `>` marker and the optional space after it.
fn strip_quote_marker(line: &str) -> Option<&str> {
    let indent = leading_spaces(line);
    if indent > 3 {
        return None;
    }
    let rest = line[indent..].strip_prefix('>')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// Number of consecutive quote markers opening a line (`>>>` or `> > >`).
fn quote_marker_run(mut line: &str) -> usize {
    let mut count = 0;
    while let Some(rest) = strip_quote_marker(line) {
        count += 1;
        line = rest;
    }
    count
}

impl BlockRule for BlockQuote {
    fn name(&self) -> &'static str {
        "block-quote"
    }

    fn can_start(&self, lines: &LineCursor<'_>) -> bool {
        lines.peek().is_some_and(|line| strip_quote_marker(line.text).is_some())
    }

    fn parse(
        &self,
        lines: &mut LineCursor<'_>,
        cx: &BlockContext<'_>,
    ) -> Result<Block, ParseError> {
        let start = lines.offset();
        if let Some(first) = lines.peek() {
            // Reject absurd marker runs before recursing into them.
            cx.ensure_depth(quote_marker_run(first.text), Span::new(start, first.end()))?;
        }

        let mut inner: Vec<&str> = Vec::new();
        let mut lazy_ok = false;
        while let Some(line) = lines.peek() {
            if let Some(content) = strip_quote_marker(line.text) {
                lines.bump();
                inner.push(content);
                lazy_ok = !is_blank(content) && open_fence(content).is_none();
            } else if lazy_ok && !line.is_blank() && !cx.interrupts_paragraph(lines) {
                lines.bump();
                inner.push(line.text);
            } else {
                break;
            }
        }

        let text = inner.join("\n");
        let nested = cx.parse_nested(&text, start)?;
        Ok(Block::new(
            BlockKind::BlockQuote,
            BlockContent::Blocks(nested.blocks),
            span_between(start, lines),
        ))
    }
}

/// Bullet (`-`, `*`, `+`) and ordered (`1.`, `1)`) lists.
pub(crate) struct List;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ListMarker {
    Bullet(char),
    Ordered { start: u32, delimiter: char },
}

impl ListMarker {
    fn same_list(self, other: Self) -> bool {
        match (self, other) {
            (Self::Bullet(a), Self::Bullet(b)) => a == b,
            (Self::Ordered { delimiter: a, .. }, Self::Ordered { delimiter: b, .. }) => a == b,
            _ => false,
        }
    }
}

struct ItemStart<'t> {
    marker: ListMarker,
    /// Column where item content starts.
    content_indent: usize,
    /// First line of content (may be empty).
    first: &'t str,
}

fn item_start(line: &str) -> Option<ItemStart<'_>> {
    let indent = leading_spaces(line);
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];

    let (marker, marker_len) = match rest.chars().next()? {
        c @ ('-' | '*' | '+') => (ListMarker::Bullet(c), 1),
        c if c.is_ascii_digit() => {
            let digits = rest.chars().take_while(char::is_ascii_digit).count();
            if digits > 9 {
                return None;
            }
            let delimiter = rest[digits..].chars().next().filter(|d| *d == '.' || *d == ')')?;
            let start = rest[..digits].parse().ok()?;
            (ListMarker::Ordered { start, delimiter }, digits + 1)
        }
        _ => return None,
    };

    let after = &rest[marker_len..];
    if after.trim().is_empty() {
        return Some(ItemStart {
            marker,
            content_indent: indent + marker_len + 1,
            first: "",
        });
    }
    let spaces = leading_spaces(after);
    if spaces == 0 {
        return None;
    }
    // Five or more spaces start indented code inside the item.
    let padding = if spaces > 4 { 1 } else { spaces };
    Some(ItemStart {
        marker,
        content_indent: indent + marker_len + padding,
        first: &after[padding..],
    })
}

impl BlockRule for List {
    fn name(&self) -> &'static str {
        "list"
    }

    fn can_start(&self, lines: &LineCursor<'_>) -> bool {
        lines
            .peek()
            .is_some_and(|line| !is_thematic_break(line.text) && item_start(line.text).is_some())
    }

    fn can_interrupt_paragraph(&self, lines: &LineCursor<'_>) -> bool {
        let Some(line) = lines.peek() else {
            return false;
        };
        if is_thematic_break(line.text) {
            return false;
        }
        item_start(line.text).is_some_and(|item| {
            !item.first.trim().is_empty()
                && matches!(
                    item.marker,
                    ListMarker::Bullet(_) | ListMarker::Ordered { start: 1, .. }
                )
        })
    }

    fn parse(
        &self,
        lines: &mut LineCursor<'_>,
        cx: &BlockContext<'_>,
    ) -> Result<Block, ParseError> {
        let start = lines.offset();
        let item_cx = cx.descend(Span::new(start, start))?;

        let mut list_marker = None;
        let mut items = Vec::new();
        let mut loose = false;
        let mut blank_before_item = false;

        while let Some(line) = lines.peek() {
            if is_thematic_break(line.text) {
                break;
            }
            let Some(item) = item_start(line.text) else {
                break;
            };
            match list_marker {
                None => list_marker = Some(item.marker),
                Some(marker) if !item.marker.same_list(marker) => break,
                Some(_) => {}
            }
            if blank_before_item {
                loose = true;
            }

            let item_offset = line.offset;
            lines.bump();
            let (content, trailing_blank) = collect_item(lines, &item, cx);
            let nested = item_cx.parse_nested(&content, item_offset)?;
            if nested.blank_between {
                loose = true;
            }
            items.push(Block::new(
                BlockKind::ListItem,
                BlockContent::Blocks(nested.blocks),
                span_between(item_offset, lines),
            ));

            blank_before_item = trailing_blank;
            if trailing_blank {
                // Blank lines belong to the list only if another item follows.
                let resume = lines.position();
                while lines.peek().is_some_and(|l| l.is_blank()) {
                    lines.bump();
                }
                let continues = lines.peek().is_some_and(|l| {
                    !is_thematic_break(l.text)
                        && item_start(l.text).is_some_and(|next| {
                            list_marker.is_some_and(|m| next.marker.same_list(m))
                        })
                });
                if !continues {
                    lines.reset(resume);
                    break;
                }
            }
        }

        let tight = if loose { "false" } else { "true" };
        for item in &mut items {
            item.attrs.insert("tight", tight);
        }

        let mut attrs = Attributes::new().with("tight", tight);
        let kind = match list_marker {
            Some(ListMarker::Ordered { start, .. }) => {
                attrs.insert("start", start.to_string());
                BlockKind::OrderedList
            }
            _ => BlockKind::BulletList,
        };
        Ok(Block::new(
            kind,
            BlockContent::Blocks(items),
            span_between(start, lines),
        )
        .with_attrs(attrs))
    }
}

/// Gather the lines of one list item, de-indented. Returns the content and
/// whether the item ended at a blank line (left unconsumed).
fn collect_item(
    lines: &mut LineCursor<'_>,
    item: &ItemStart<'_>,
    cx: &BlockContext<'_>) -> (String, bool,
) {
    let mut content: Vec<&str> = vec![item.first];
    let mut lazy_ok = !item.first.trim().is_empty();
    let mut trailing_blank = false;

    while let Some(line) = lines.peek() {
        if line.is_blank() {
            // An item that starts empty ends at the first blank line.
            if content.len() == 1 && item.first.trim().is_empty() {
                trailing_blank = true;
                break;
            }
            let run = lines.blank_run();
            let next_indented = lines
                .peek_nth(run)
                .is_some_and(|l| l.indent() >= item.content_indent);
            if !next_indented {
                trailing_blank = true;
                break;
            }
            lines.advance(run);
            content.extend(std::iter::repeat_n("", run));
            lazy_ok = false;
        } else if line.indent() >= item.content_indent {
            lines.bump();
            let text = &line.text[item.content_indent..];
            content.push(text);
            lazy_ok = open_fence(text).is_none();
        } else if is_thematic_break(line.text) || item_start(line.text).is_some() {
            break;
        } else if lazy_ok && !cx.interrupts_paragraph(lines) {
            lines.bump();
            content.push(line.text.trim_start());
        } else {
            break;
        }
    }

    while content.last().is_some_and(|l| l.is_empty()) && content.len() > 1 {
        content.pop();
    }
    (content.join("\n"), trailing_blank)
}

/// Four-space indented code. Cannot interrupt a paragraph.
pub(crate) struct IndentedCode;

impl BlockRule for IndentedCode {
    fn name(&self) -> &'static str {
        "indented-code"
    }

    fn can_start(&self, lines: &LineCursor<'_>) -> bool {
        lines.peek().is_some_and(|line| !line.is_blank() && line.indent() >= 4)
    }

    fn can_interrupt_paragraph(&self, _lines: &LineCursor<'_>) -> bool {
        false
    }

    fn parse(
        &self,
        lines: &mut LineCursor<'_>,
        _cx: &BlockContext<'_>,
    ) -> Result<Block, ParseError> {
        let start = lines.offset();
        let mut code: Vec<&str> = Vec::new();
        while let Some(line) = lines.peek() {
            if line.is_blank() {
                let run = lines.blank_run();
                if !lines.peek_nth(run).is_some_and(|l| l.indent() >= 4) {
                    break;
                }
                code.extend(lines.remaining()[..run].iter().map(|l| strip_indent(l.text, 4)));
                lines.advance(run);
            } else if line.indent() >= 4 {
                code.push(&line.text[4..]);
                lines.bump();
            } else {
                break;
            }
        }

        let mut literal = code.join("\n");
        literal.push('\n');
        Ok(Block::new(
            BlockKind::CodeBlock,
            BlockContent::Literal(literal),
            span_between(start, lines),
        ))
    }
}

/// `[label]: destination "title"` on a single line. Cannot interrupt a paragraph.
pub(crate) struct LinkDefinition;

/// Remove backslash escapes from a destination or title.
pub(crate) fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(&next) = chars.peek()
            && next.is_ascii_punctuation()
        {
            out.push(next);
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

/// Strip `<>` from a destination and `""`, `''` or `()` from a title.
pub(crate) fn strip_delimiters(s: &str) -> &str {
    let mut chars = s.chars();
    match (chars.next(), chars.next_back()) {
        (Some('<'), Some('>'))
        | (Some('"'), Some('"'))
        | (Some('\''), Some('\''))
        | (Some('('), Some(')')) => &s[1..s.len() - 1],
        _ => s,
    }
}

impl BlockRule for LinkDefinition {
    fn name(&self) -> &'static str {
        "link-definition"
    }

    fn can_start(&self, lines: &LineCursor<'_>) -> bool {
        lines.peek().is_some_and(|line| {
            LINK_DEFINITION_RE
                .captures(line.text)
                .is_some_and(|caps| !caps[1].trim().is_empty())
        })
    }

    fn can_interrupt_paragraph(&self, _lines: &LineCursor<'_>) -> bool {
        false
    }

    fn parse(
        &self,
        lines: &mut LineCursor<'_>,
        _cx: &BlockContext<'_>,
    ) -> Result<Block, ParseError> {
        let start = lines.offset();
        let Some(line) = lines.bump() else {
            return Ok(Block::new(
                BlockKind::LinkDefinition,
                BlockContent::Empty,
                Span::new(start, start),
            ));
        };
        let mut attrs = Attributes::new();
        if let Some(caps) = LINK_DEFINITION_RE.captures(line.text) {
            attrs.insert("label", caps[1].trim());
            attrs.insert("href", unescape(strip_delimiters(&caps[2])));
            if let Some(title) = caps.get(3) {
                attrs.insert("title", unescape(strip_delimiters(title.as_str())));
            }
        }
        Ok(Block::new(
            BlockKind::LinkDefinition,
            BlockContent::Empty,
            span_between(start, lines),
        )
        .with_attrs(attrs))
    }
}
