//! Block pass: first-match-wins dispatch over block rules with an implicit
//! paragraph fallback.

use std::sync::Arc;

use crate::ast::{Attributes, Block, BlockContent, BlockKind, Span};
use crate::error::ParseError;

use super::lines::LineCursor;

/// A block-level parsing rule.
///
/// At each line start the parser offers the cursor to every registered rule in
/// registration order; the first whose [`can_start`](Self::can_start) accepts
/// owns the lines it consumes in [`parse`](Self::parse).
pub trait BlockRule: Send + Sync {
    /// Name used in trace output.
    fn name(&self) -> &'static str;

    /// Whether a block of this kind starts at the cursor's current line.
    /// Must not advance the cursor.
    fn can_start(&self, lines: &LineCursor<'_>) -> bool;

    /// Whether the current line ends an open paragraph and starts this block.
    fn can_interrupt_paragraph(&self, lines: &LineCursor<'_>) -> bool {
        self.can_start(lines)
    }

    /// Consume the block. Called only after `can_start` accepted, and must
    /// consume at least one line.
    fn parse(&self, lines: &mut LineCursor<'_>, cx: &BlockContext<'_>) -> Result<Block, ParseError>;
}

/// Blocks produced by one block-pass invocation.
#[derive(Debug, Default)]
pub struct Nested {
    pub blocks: Vec<Block>,
    /// A blank line separated two of the blocks.
    pub blank_between: bool,
}

/// State shared with block rules: the rule set and the nesting depth.
pub struct BlockContext<'r> {
    rules: &'r [Arc<dyn BlockRule>],
    depth: usize,
    max_depth: usize,
}

impl<'r> BlockContext<'r> {
    pub(crate) fn new(rules: &'r [Arc<dyn BlockRule>], max_depth: usize) -> Self {
        Self {
            rules,
            depth: 0,
            max_depth,
        }
    }

    /// Container depth of the blocks being parsed (top level is 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Fail if `extra` more levels of nesting would exceed the cap.
    pub fn ensure_depth(&self, extra: usize, span: Span) -> Result<(), ParseError> {
        if self.depth.saturating_add(extra) > self.max_depth {
            return Err(ParseError::ExcessiveNestingDepth {
                limit: self.max_depth,
                span,
            });
        }
        Ok(())
    }

    /// Context one level deeper, for containers whose children are built by
    /// the rule itself (list items inside a list).
    pub fn descend(&self, span: Span) -> Result<BlockContext<'r>, ParseError> {
        self.ensure_depth(1, span)?;
        Ok(BlockContext {
            rules: self.rules,
            depth: self.depth + 1,
            max_depth: self.max_depth,
        })
    }

    /// Parse container contents one level deeper.
    ///
    /// `base` is the document offset of `text`, used for spans.
    pub fn parse_nested(&self, text: &str, base: usize) -> Result<Nested, ParseError> {
        let inner = self.descend(Span::new(base, base + text.len()))?;
        parse_blocks(text, base, &inner)
    }

    /// Whether any rule starts a block at the current line.
    #[must_use]
    pub fn starts_block(&self, lines: &LineCursor<'_>) -> bool {
        self.rules.iter().any(|rule| rule.can_start(lines))
    }

    /// Whether the current line would end an open paragraph.
    #[must_use]
    pub fn interrupts_paragraph(&self, lines: &LineCursor<'_>) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.can_interrupt_paragraph(lines))
    }
}

/// Run the block pass over `text`.
pub(crate) fn parse_blocks(
    text: &str,
    base: usize,
    cx: &BlockContext<'_>,
) -> Result<Nested, ParseError> {
    let mut lines = LineCursor::new(text, base);
    let mut nested = Nested::default();
    let mut pending_blank = false;

    while let Some(line) = lines.peek() {
        if line.is_blank() {
            lines.bump();
            pending_blank = true;
            continue;
        }
        if pending_blank && !nested.blocks.is_empty() {
            nested.blank_between = true;
        }
        pending_blank = false;

        let start = lines.position();
        let claimed = cx.rules.iter().find(|rule| rule.can_start(&lines));
        let block = match claimed {
            Some(rule) => {
                let block = rule.parse(&mut lines, cx)?;
                if lines.position() == start {
                    // A rule that consumes nothing would loop forever.
                    tracing::warn!(rule = rule.name(), "Block rule consumed no input");
                    parse_paragraph(&mut lines, cx)
                } else {
                    block
                }
            }
            None => parse_paragraph(&mut lines, cx),
        };
        nested.blocks.push(block);
    }

    Ok(nested)
}

/// Setext underline level for a line following paragraph text.
fn setext_level(line: &str) -> Option<u8> {
    if super::lines::leading_spaces(line) > 3 {
        return None;
    }
    let trimmed = line.trim();
    let first = trimmed.chars().next()?;
    if (first == '=' || first == '-') && trimmed.chars().all(|c| c == first) {
        Some(if first == '=' { 1 } else { 2 })
    } else {
        None
    }
}

/// The implicit paragraph: absorbs lines until a blank line or an
/// interrupting block start. A setext underline turns it into a heading.
fn parse_paragraph(lines: &mut LineCursor<'_>, cx: &BlockContext<'_>) -> Block {
    let mut text_lines = Vec::new();
    let start = lines.offset();
    let mut end = start;

    if let Some(first) = lines.bump() {
        text_lines.push(first.text.trim_start());
        end = first.end();
    }

    while let Some(next) = lines.peek() {
        if next.is_blank() {
            break;
        }
        if let Some(level) = setext_level(next.text) {
            lines.bump();
            let content = text_lines.join("\n").trim_end().to_owned();
            return Block::new(
                BlockKind::Heading,
                BlockContent::Raw(content),
                Span::new(start, next.end()),
            )
            .with_attrs(Attributes::new().with("level", level.to_string()));
        }
        if cx.interrupts_paragraph(lines) {
            break;
        }
        lines.bump();
        text_lines.push(next.text.trim_start());
        end = next.end();
    }

    let content = text_lines.join("\n").trim_end().to_owned();
    Block::new(
        BlockKind::Paragraph,
        BlockContent::Raw(content),
        Span::new(start, end),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_plain(text: &str) -> Nested {
        let rules: Vec<Arc<dyn BlockRule>> = Vec::new();
        let cx = BlockContext::new(&rules, 10);
        parse_blocks(text, 0, &cx).unwrap()
    }

    fn raw(block: &Block) -> &str {
        match &block.content {
            BlockContent::Raw(text) => text,
            other => panic!("expected raw content, got {other:?}"),
        }
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let nested = parse_plain("one\ntwo\n\nthree\n");
        assert_eq!(nested.blocks.len(), 2);
        assert_eq!(raw(&nested.blocks[0]), "one\ntwo");
        assert_eq!(raw(&nested.blocks[1]), "three");
        assert!(nested.blank_between);
    }

    #[test]
    fn test_setext_heading() {
        let nested = parse_plain("Title\n=====\nbody");
        assert_eq!(nested.blocks[0].kind, BlockKind::Heading);
        assert_eq!(nested.blocks[0].attrs.get("level"), Some("1"));
        assert_eq!(raw(&nested.blocks[0]), "Title");
        assert_eq!(nested.blocks[1].kind, BlockKind::Paragraph);
    }

    #[test]
    fn test_paragraph_span() {
        let nested = parse_plain("\nab\ncd");
        assert_eq!(nested.blocks[0].span, Span::new(1, 6));
        assert!(!nested.blank_between);
    }

    #[test]
    fn test_depth_cap() {
        let rules: Vec<Arc<dyn BlockRule>> = Vec::new();
        let cx = BlockContext::new(&rules, 0);
        let err = cx.parse_nested("x", 3).unwrap_err();
        assert_eq!(
            err,
            ParseError::ExcessiveNestingDepth {
                limit: 0,
                span: Span::new(3, 4)
            }
        );
    }
}
