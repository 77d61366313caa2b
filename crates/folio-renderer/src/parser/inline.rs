//! Inline pass.
//!
//! Text is scanned left to right. At each position the rules whose trigger
//! matches the current character are tried in registration order; the first
//! that accepts either produces a finished node or a [`DelimiterRun`].
//! Unclaimed characters accumulate into text runs. Once the scan ends,
//! delimiter runs are paired innermost-first: a closer pairs with the nearest
//! compatible opener, the pairing function decides the node kind and how many
//! characters it consumes, and whatever is left of either run stays behind as
//! literal text on the outer side.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;
use std::sync::Arc;

use crate::ast::{Inline, InlineKind, Span};
use crate::error::ParseError;

use super::references::References;

/// Characters at which an inline rule is offered the scan position.
#[derive(Clone, Copy, Debug)]
pub enum Trigger {
    Chars(&'static [char]),
    /// Every position.
    Any,
}

impl Trigger {
    #[must_use]
    pub fn matches(self, ch: char) -> bool {
        match self {
            Self::Chars(chars) => chars.contains(&ch),
            Self::Any => true,
        }
    }
}

/// A span-level parsing rule.
pub trait InlineRule: Send + Sync {
    /// Name used in trace output.
    fn name(&self) -> &'static str;

    fn trigger(&self) -> Trigger;

    /// Try to claim the text at `cx.pos()`. `Ok(None)` declines.
    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError>;
}

/// What an accepting inline rule produced.
#[derive(Debug)]
pub enum InlineParse {
    /// A finished node covering `len` bytes.
    Node { node: Inline, len: usize },
    /// A delimiter run, paired after the scan.
    Delimiter(DelimiterRun),
}

/// Decides the node kind for a matched opener/closer pair from their remaining
/// lengths, and how many characters of each run it consumes.
pub type PairingFn = fn(opener: usize, closer: usize) -> (InlineKind, usize);

/// A run of identical delimiter characters.
#[derive(Clone, Copy, Debug)]
pub struct DelimiterRun {
    pub ch: char,
    pub len: usize,
    pub can_open: bool,
    pub can_close: bool,
    pub pairing: PairingFn,
}

impl DelimiterRun {
    /// Scan the run of `ch` at the current position and classify it with the
    /// left/right-flanking rules. `_` may not open or close inside a word.
    #[must_use]
    pub fn scan(cx: &InlineContext<'_>, ch: char, pairing: PairingFn) -> Option<Self> {
        let rest = cx.rest();
        let len = rest.chars().take_while(|&c| c == ch).count() * ch.len_utf8();
        if len == 0 {
            return None;
        }
        let before = cx.prev_char();
        let after = rest[len..].chars().next();

        let before_space = before.is_none_or(char::is_whitespace);
        let after_space = after.is_none_or(char::is_whitespace);
        let before_punct = before.is_some_and(is_punctuation);
        let after_punct = after.is_some_and(is_punctuation);

        let left_flanking = !after_space && (!after_punct || before_space || before_punct);
        let right_flanking = !before_space && (!before_punct || after_space || after_punct);

        let (can_open, can_close) = if ch == '_' {
            (
                left_flanking && (!right_flanking || before_punct),
                right_flanking && (!left_flanking || after_punct),
            )
        } else {
            (left_flanking, right_flanking)
        };

        Some(Self {
            ch,
            len: len / ch.len_utf8(),
            can_open,
            can_close,
            pairing,
        })
    }

    fn literal(&self) -> String {
        std::iter::repeat_n(self.ch, self.len).collect()
    }
}

/// Unicode-ish punctuation test used by the flanking rules.
#[must_use]
pub fn is_punctuation(ch: char) -> bool {
    ch.is_ascii_punctuation() || (!ch.is_alphanumeric() && !ch.is_whitespace() && !ch.is_control())
}

/// Shared, per-document inputs of the inline pass.
pub struct InlineEnv<'a> {
    pub rules: &'a [Arc<dyn InlineRule>],
    pub references: &'a References,
    pub max_depth: usize,
}

/// State shared by the scan of one leaf and every nested scan inside it.
///
/// Offsets are byte offsets into `text`.
struct Leaf<'a> {
    text: &'a str,
    /// Matching `]` for every unescaped `[`, `None` when unmatched.
    brackets: HashMap<usize, Option<usize>>,
    /// Finished nested scans by (start, end, in link), with the depth they ran at.
    nested: RefCell<HashMap<(usize, usize, bool), (usize, Rc<[Inline]>)>>,
}

impl<'a> Leaf<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            brackets: match_brackets(text),
            nested: RefCell::default(),
        }
    }
}

/// Pair square brackets the way a forward scan with a depth counter would,
/// skipping backslash-escaped characters.
fn match_brackets(text: &str) -> HashMap<usize, Option<usize>> {
    let mut matches = HashMap::new();
    let mut open = Vec::new();
    let mut escaped = false;
    for (idx, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' => {
                matches.insert(idx, None);
                open.push(idx);
            }
            ']' => {
                if let Some(start) = open.pop() {
                    matches.insert(start, Some(idx));
                }
            }
            _ => {}
        }
    }
    matches
}

/// View of the inline scan handed to a rule.
pub struct InlineContext<'a> {
    env: &'a InlineEnv<'a>,
    leaf: &'a Leaf<'a>,
    start: usize,
    end: usize,
    pos: usize,
    depth: usize,
    in_link: bool,
    span: Span,
}

impl<'a> InlineContext<'a> {
    /// Whole text being scanned: the leaf, or the part a nested scan covers.
    #[must_use]
    pub fn text(&self) -> &'a str {
        &self.leaf.text[self.start..self.end]
    }

    /// Current position within [`text`](Self::text).
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos - self.start
    }

    /// Text from the current position to the end.
    #[must_use]
    pub fn rest(&self) -> &'a str {
        &self.leaf.text[self.pos..self.end]
    }

    /// Character before the current position, `None` at the start.
    #[must_use]
    pub fn prev_char(&self) -> Option<char> {
        self.leaf.text[self.start..self.pos].chars().next_back()
    }

    /// Whether the previous character ends a word (or there is none).
    #[must_use]
    pub fn at_word_start(&self) -> bool {
        self.prev_char().is_none_or(|c| !c.is_alphanumeric() && c != '_')
    }

    #[must_use]
    pub fn references(&self) -> &'a References {
        self.env.references
    }

    /// Whether the scan is inside link text.
    #[must_use]
    pub fn in_link(&self) -> bool {
        self.in_link
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Offset in [`rest`](Self::rest) of the `]` closing the `[` at
    /// `rest()[at]`. Brackets nest and backslash escapes are skipped.
    #[must_use]
    pub fn closing_bracket(&self, at: usize) -> Option<usize> {
        let open = self.pos + at;
        self.leaf
            .brackets
            .get(&open)
            .copied()
            .flatten()
            .filter(|&close| close < self.end)
            .map(|close| close - self.pos)
    }

    /// Parse `rest()[range]` as the children of a node at the current
    /// position.
    ///
    /// A range is scanned once per leaf; asking again returns the earlier
    /// result.
    ///
    /// # Panics
    ///
    /// If `range` is out of bounds of [`rest`](Self::rest) or splits a
    /// character.
    pub fn parse_nested(
        &self,
        range: Range<usize>,
        in_link: bool,
    ) -> Result<Rc<[Inline]>, ParseError> {
        let depth = self.depth + 1;
        if depth > self.env.max_depth {
            return Err(ParseError::ExcessiveNestingDepth {
                limit: self.env.max_depth,
                span: self.span,
            });
        }
        let start = self.pos + range.start;
        let end = self.pos + range.end;
        assert!(end <= self.end, "nested range past the end of the scan");
        let in_link = in_link || self.in_link;

        let key = (start, end, in_link);
        let cached = self
            .leaf
            .nested
            .borrow()
            .get(&key)
            .map(|(at, children)| (*at, Rc::clone(children)));
        if let Some((at, children)) = cached
            && depth <= at
        {
            return Ok(children);
        }

        let children: Rc<[Inline]> =
            scan(self.env, self.leaf, start..end, depth, in_link, self.span)?.into();
        self.leaf
            .nested
            .borrow_mut()
            .insert(key, (depth, Rc::clone(&children)));
        Ok(children)
    }
}

enum Item {
    Node { inline: Inline, height: usize },
    Text(String),
    Delim(DelimiterRun),
}

/// Run the inline pass over one leaf's text.
///
/// `depth` is the nesting depth of the leaf; `span` is the leaf's source span,
/// reported if the depth cap is hit.
pub(crate) fn parse_inlines(
    text: &str,
    env: &InlineEnv<'_>,
    depth: usize,
    in_link: bool,
    span: Span,
) -> Result<Vec<Inline>, ParseError> {
    let leaf = Leaf::new(text);
    scan(env, &leaf, 0..text.len(), depth, in_link, span)
}

fn scan(
    env: &InlineEnv<'_>,
    leaf: &Leaf<'_>,
    range: Range<usize>,
    depth: usize,
    in_link: bool,
    span: Span,
) -> Result<Vec<Inline>, ParseError> {
    let mut items = Vec::new();
    let mut pending = String::new();
    let mut pos = range.start;

    while let Some(ch) = leaf.text[pos..range.end].chars().next() {
        let cx = InlineContext {
            env,
            leaf,
            start: range.start,
            end: range.end,
            pos,
            depth,
            in_link,
            span,
        };

        let mut claimed = None;
        for rule in env.rules {
            if !rule.trigger().matches(ch) {
                continue;
            }
            if let Some(parsed) = rule.parse(&cx)? {
                claimed = Some(parsed);
                break;
            }
        }

        match claimed {
            Some(InlineParse::Node { node, len }) if len > 0 && pos + len <= range.end => {
                flush_text(&mut pending, &mut items);
                let height = height(&node);
                items.push(Item::Node {
                    inline: node,
                    height,
                });
                pos += len;
            }
            Some(InlineParse::Delimiter(run)) if run.len > 0 => {
                flush_text(&mut pending, &mut items);
                pos += run.len * run.ch.len_utf8();
                items.push(Item::Delim(run));
            }
            _ => {
                pending.push(ch);
                pos += ch.len_utf8();
            }
        }
    }
    flush_text(&mut pending, &mut items);

    let items = resolve_delimiters(items, depth, env.max_depth, span)?;
    Ok(into_inlines(items))
}

fn flush_text(pending: &mut String, items: &mut Vec<Item>) {
    if !pending.is_empty() {
        items.push(Item::Text(std::mem::take(pending)));
    }
}

/// Nesting height of a node: 0 for leaves.
fn height(inline: &Inline) -> usize {
    inline
        .children
        .iter()
        .map(|child| height(child) + 1)
        .max()
        .unwrap_or(0)
}

fn item_height(item: &Item) -> usize {
    match item {
        Item::Node { height, .. } => *height,
        Item::Text(_) | Item::Delim(_) => 0,
    }
}

/// Lowest stack index still worth searching for an opener, per closer class:
/// (character, closer can open, closer length mod 3).
type OpenersBottom = HashMap<(char, bool, usize), usize>;

/// Pair delimiter runs.
///
/// Items move onto a stack in order. A closer pairs with the nearest
/// compatible opener on the stack, and everything above that opener
/// collapses into the new node.
fn resolve_delimiters(
    items: Vec<Item>,
    depth: usize,
    max_depth: usize,
    span: Span,
) -> Result<Vec<Item>, ParseError> {
    let mut stack: Vec<Item> = Vec::with_capacity(items.len());
    let mut bottom = OpenersBottom::new();

    for item in items {
        let Item::Delim(mut closer) = item else {
            stack.push(item);
            continue;
        };

        while closer.can_close && closer.len > 0 {
            let class = (closer.ch, closer.can_open, closer.len % 3);
            let floor = bottom.get(&class).copied().unwrap_or(0);
            let found = (floor..stack.len()).rev().find(|&idx| match &stack[idx] {
                Item::Delim(opener) => {
                    opener.ch == closer.ch
                        && opener.can_open
                        && !breaks_multiple_of_three(opener, &closer)
                }
                _ => false,
            });
            let Some(opener_idx) = found else {
                bottom.insert(class, stack.len());
                break;
            };
            let Item::Delim(opener) = &mut stack[opener_idx] else {
                break;
            };

            let (kind, used) = (opener.pairing)(opener.len, closer.len);
            let used = used.clamp(1, opener.len.min(closer.len));
            opener.len -= used;
            let opener_spent = opener.len == 0;
            closer.len -= used;

            let inner: Vec<Item> = stack.drain(opener_idx + 1..).collect();
            let inner_height = inner.iter().map(item_height).max().unwrap_or(0) + 1;
            if depth + inner_height > max_depth {
                return Err(ParseError::ExcessiveNestingDepth {
                    limit: max_depth,
                    span,
                });
            }
            if opener_spent {
                stack.pop();
            }
            // The opener changed length and everything above it is gone.
            for floor in bottom.values_mut() {
                *floor = (*floor).min(opener_idx);
            }
            stack.push(Item::Node {
                inline: Inline::container(kind, into_inlines(inner)),
                height: inner_height,
            });
        }

        if closer.len > 0 {
            stack.push(Item::Delim(closer));
        }
    }

    Ok(stack)
}

/// CommonMark "rule of three": a run that can both open and close may not pair
/// with one whose combined length is a multiple of three, unless both are.
fn breaks_multiple_of_three(opener: &DelimiterRun, closer: &DelimiterRun) -> bool {
    (opener.can_close || closer.can_open)
        && (opener.len + closer.len) % 3 == 0
        && !(opener.len % 3 == 0 && closer.len % 3 == 0)
}

/// Flatten items to inlines: leftover delimiters become text and adjacent
/// text runs merge.
fn into_inlines(items: Vec<Item>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(items.len());
    for item in items {
        let inline = match item {
            Item::Node { inline, .. } => inline,
            Item::Text(text) => Inline::text(text),
            Item::Delim(run) => Inline::text(run.literal()),
        };
        merge_push(&mut out, inline);
    }
    out
}

fn merge_push(out: &mut Vec<Inline>, inline: Inline) {
    if inline.kind == InlineKind::Text && inline.attrs.is_empty() {
        if inline.literal.is_empty() {
            return;
        }
        if let Some(last) = out.last_mut()
            && last.kind == InlineKind::Text
            && last.attrs.is_empty()
        {
            last.literal.push_str(&inline.literal);
            return;
        }
    }
    out.push(inline);
}
