//! Footnotes.
//!
//! `[^label]: text` defines a footnote (continuation lines indented four
//! spaces); `[^label]` references it. After the inline pass, references are
//! numbered in the order they are first seen, definitions move into a single
//! trailing [`BlockKind::FootnoteSection`] in that order, and definitions that
//! nothing references are dropped. References inside footnotes are numbered
//! after every reference in the body.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{
    Attributes, Block, BlockContent, BlockKind, Document, Inline, InlineKind, Span, walk_blocks_mut,
    walk_inlines_mut,
};
use crate::error::{ParseError, RenderError};
use crate::extension::{DocumentTransform, Extension, ParseRule, RenderRule, TransformPhase};
use crate::html::escape_html;
use crate::parser::{
    BlockContext, BlockRule, InlineContext, InlineParse, InlineRule, LineCursor, Trigger,
    normalize_label, strip_indent,
};
use crate::renderer::RenderContext;

static DEFINITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}\[\^([^\]\s]+)\]:[ \t]?(.*)$").unwrap());

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[\^([^\]\s]+)\]").unwrap());

/// The `footnote` extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct FootnoteExtension;

impl Extension for FootnoteExtension {
    fn name(&self) -> &str {
        "footnote"
    }

    fn parsing_rules(&self) -> Vec<ParseRule> {
        vec![
            ParseRule::block(FootnoteDefinition),
            ParseRule::inline(FootnoteReference),
            ParseRule::transform(CollectFootnotes),
        ]
    }

    fn rendering_rules(&self) -> Vec<RenderRule> {
        vec![
            RenderRule::block(BlockKind::FootnoteDefinition, render_definition),
            RenderRule::block(BlockKind::FootnoteSection, render_section),
            RenderRule::inline(InlineKind::FootnoteReference, render_reference),
        ]
    }
}

struct FootnoteDefinition;

impl BlockRule for FootnoteDefinition {
    fn name(&self) -> &'static str {
        "footnote-definition"
    }

    fn can_start(&self, lines: &LineCursor<'_>) -> bool {
        lines
            .peek()
            .is_some_and(|line| DEFINITION_RE.is_match(line.text))
    }

    fn can_interrupt_paragraph(&self, _lines: &LineCursor<'_>) -> bool {
        false
    }

    fn parse(
        &self,
        lines: &mut LineCursor<'_>,
        cx: &BlockContext<'_>,
    ) -> Result<Block, ParseError> {
        let start = lines.offset();
        let Some((first, caps)) = lines
            .bump()
            .and_then(|line| DEFINITION_RE.captures(line.text).map(|caps| (line, caps)))
        else {
            return Ok(Block::new(
                BlockKind::FootnoteDefinition,
                BlockContent::Blocks(Vec::new()),
                Span::new(start, start),
            ));
        };
        let label = caps[1].to_owned();
        let first_text = caps.get(2).map_or("", |m| m.as_str());

        let mut content = vec![first_text];
        let mut lazy_ok = !first_text.trim().is_empty();
        while let Some(line) = lines.peek() {
            if line.is_blank() {
                let run = lines.blank_run();
                if !lines.peek_nth(run).is_some_and(|l| l.indent() >= 4) {
                    break;
                }
                lines.advance(run);
                content.extend(std::iter::repeat_n("", run));
                lazy_ok = false;
            } else if line.indent() >= 4 {
                lines.bump();
                content.push(strip_indent(line.text, 4));
                lazy_ok = true;
            } else if lazy_ok
                && !DEFINITION_RE.is_match(line.text)
                && !cx.interrupts_paragraph(lines)
            {
                lines.bump();
                content.push(line.text.trim_start());
            } else {
                break;
            }
        }

        let nested = cx.parse_nested(&content.join("\n"), first.offset)?;
        Ok(Block::new(
            BlockKind::FootnoteDefinition,
            BlockContent::Blocks(nested.blocks),
            Span::new(start, lines.offset()),
        )
        .with_attrs(Attributes::new().with("label", label)))
    }
}

struct FootnoteReference;

impl InlineRule for FootnoteReference {
    fn name(&self) -> &'static str {
        "footnote-reference"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Chars(&['['])
    }

    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError> {
        let Some(caps) = REFERENCE_RE.captures(cx.rest()) else {
            return Ok(None);
        };
        let label = &caps[1];
        if !cx.references().has_footnote(label) {
            return Ok(None);
        }
        let node = Inline::leaf(InlineKind::FootnoteReference, "")
            .with_attrs(Attributes::new().with("label", label));
        Ok(Some(InlineParse::Node {
            node,
            len: caps[0].len(),
        }))
    }
}

/// Numbering state: ordinal per normalised label, in first-reference order.
#[derive(Default)]
struct Numbering {
    ordinals: HashMap<String, usize>,
    order: Vec<String>,
    ref_counts: HashMap<String, usize>,
}

impl Numbering {
    fn visit(&mut self, inline: &mut Inline, defined: &HashSet<String>) {
        if inline.kind != InlineKind::FootnoteReference {
            return;
        }
        let raw_label = inline.attrs.get("label").unwrap_or("").to_owned();
        let label = normalize_label(&raw_label);
        if !defined.contains(&label) {
            *inline = Inline::text(format!("[^{raw_label}]"));
            return;
        }

        let ordinal = if let Some(&ordinal) = self.ordinals.get(&label) {
            ordinal
        } else {
            self.order.push(label.clone());
            let ordinal = self.order.len();
            self.ordinals.insert(label.clone(), ordinal);
            ordinal
        };
        let count = self.ref_counts.entry(label).or_insert(0);
        *count += 1;
        let id = if *count == 1 {
            format!("fnref-{ordinal}")
        } else {
            format!("fnref-{ordinal}-{count}")
        };
        inline.attrs.insert("ordinal", ordinal.to_string());
        inline.attrs.insert("id", id);
    }

    fn number(&mut self, blocks: &mut [Block], defined: &HashSet<String>) {
        walk_blocks_mut(blocks, &mut |block| {
            if let BlockContent::Inlines(inlines) = &mut block.content {
                walk_inlines_mut(inlines, &mut |inline| self.visit(inline, defined));
            }
        });
    }
}

/// Remove every footnote definition from the tree, in document order.
fn extract_definitions(blocks: &mut Vec<Block>, found: &mut Vec<Block>) {
    let mut idx = 0;
    while idx < blocks.len() {
        if blocks[idx].kind == BlockKind::FootnoteDefinition {
            let mut definition = blocks.remove(idx);
            let mut nested = Vec::new();
            if let Some(children) = definition.children_mut() {
                extract_definitions(children, &mut nested);
            }
            found.push(definition);
            found.extend(nested);
        } else {
            if let Some(children) = blocks[idx].children_mut() {
                extract_definitions(children, found);
            }
            idx += 1;
        }
    }
}

struct CollectFootnotes;

impl DocumentTransform for CollectFootnotes {
    fn phase(&self) -> TransformPhase {
        TransformPhase::AfterInline
    }

    fn apply(&self, document: &mut Document) {
        let mut found = Vec::new();
        extract_definitions(&mut document.blocks, &mut found);

        let mut definitions: HashMap<String, Block> = HashMap::new();
        for definition in found {
            let label = normalize_label(definition.attrs.get("label").unwrap_or(""));
            definitions.entry(label).or_insert(definition);
        }
        let defined: HashSet<String> = definitions.keys().cloned().collect();

        let mut numbering = Numbering::default();
        numbering.number(&mut document.blocks, &defined);

        let mut section = Vec::new();
        let mut idx = 0;
        while idx < numbering.order.len() {
            let label = numbering.order[idx].clone();
            if let Some(mut definition) = definitions.remove(&label) {
                if let Some(children) = definition.children_mut() {
                    numbering.number(children, &defined);
                }
                definition.attrs.insert("ordinal", (idx + 1).to_string());
                section.push(definition);
            }
            idx += 1;
        }

        tracing::debug!(
            referenced = section.len(),
            dropped = definitions.len(),
            "Collected footnotes"
        );
        if !section.is_empty() {
            let end = document.blocks.last().map_or(0, |block| block.span.end);
            document.blocks.push(Block::new(
                BlockKind::FootnoteSection,
                BlockContent::Blocks(section),
                Span::new(end, end),
            ));
        }
    }
}

fn render_reference(inline: &Inline, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    let ordinal = escape_html(inline.attrs.get("ordinal").unwrap_or(""));
    let id = escape_html(inline.attrs.get("id").unwrap_or(""));
    cx.push_str(&format!(
        "<sup id=\"{id}\"><a class=\"footnote-ref\" href=\"#fn-{ordinal}\">{ordinal}</a></sup>"
    ));
    Ok(())
}

fn render_section(block: &Block, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    cx.push_str("<div class=\"footnotes\">\n<hr />\n<ol>\n");
    // Definitions keep the depth they were parsed at.
    cx.render_blocks(block.children())?;
    cx.push_str("</ol>\n</div>\n");
    Ok(())
}

/// One footnote. The back-reference goes at the end of a trailing
/// paragraph, or in a paragraph of its own.
fn render_definition(block: &Block, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    let ordinal = escape_html(block.attrs.get("ordinal").unwrap_or(""));
    let backref = format!("<a class=\"footnote-backref\" href=\"#fnref-{ordinal}\">&#8617;</a>");
    let children = block.children();

    cx.push_str(&format!("<li id=\"fn-{ordinal}\">\n"));
    cx.descend(|cx| match children.split_last() {
        Some((last, rest)) if last.kind == BlockKind::Paragraph => {
            cx.render_blocks(rest)?;
            cx.push_str("<p>");
            cx.render_inlines(last.inlines())?;
            cx.push_str(" ");
            cx.push_str(&backref);
            cx.push_str("</p>\n");
            Ok(())
        }
        _ => {
            cx.render_blocks(children)?;
            cx.push_str(&format!("<p>{backref}</p>\n"));
            Ok(())
        }
    })?;
    cx.push_str("</li>\n");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ext::CoreSyntax;
    use crate::pipeline::{Pipeline, PipelineOptions};
    use crate::registry::Registry;

    fn pipeline() -> Pipeline {
        let registry = Registry::builder()
            .with_extension(FootnoteExtension)
            .with_extension(CoreSyntax)
            .build()
            .unwrap();
        Pipeline::new(Arc::new(registry), PipelineOptions::default())
    }

    fn render(input: &str) -> String {
        pipeline().render_document(input).unwrap().html
    }

    #[test]
    fn test_long_blank_run_inside_definition() {
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024 * 1024)
            .spawn(|| {
                let blanks = "\n".repeat(100_000);
                render(&format!("x[^1]\n\n[^1]: a\n{blanks}    b\n"))
            })
            .unwrap();
        let html = handle.join().unwrap();
        assert!(html.contains("<li id=\"fn-1\">\n<p>a</p>\n<p>b "));
    }

    #[test]
    fn test_single_footnote() {
        assert_eq!(
            render("Text[^1].\n\n[^1]: Note."),
            "<p>Text<sup id=\"fnref-1\"><a class=\"footnote-ref\" href=\"#fn-1\">1</a></sup>.</p>\n\
             <div class=\"footnotes\">\n<hr />\n<ol>\n\
             <li id=\"fn-1\">\n\
             <p>Note. <a class=\"footnote-backref\" href=\"#fnref-1\">&#8617;</a></p>\n</li>\n\
             </ol>\n</div>\n"
        );
    }

    #[test]
    fn test_numbered_in_reference_order() {
        let doc = pipeline()
            .parse("A[^b] B[^a]\n\n[^a]: first\n\n[^b]: second")
            .unwrap();
        let section = doc.blocks.last().unwrap();
        assert_eq!(section.kind, BlockKind::FootnoteSection);
        let labels: Vec<_> = section
            .children()
            .iter()
            .map(|def| (def.attrs.get("label").unwrap(), def.attrs.get("ordinal").unwrap()))
            .collect();
        assert_eq!(labels, [("b", "1"), ("a", "2")]);
    }

    #[test]
    fn test_unreferenced_definitions_are_dropped() {
        assert_eq!(render("[^x]: unused\n\ntext"), "<p>text</p>\n");
    }

    #[test]
    fn test_undefined_reference_is_literal() {
        assert_eq!(render("see [^nope]"), "<p>see [^nope]</p>\n");
    }

    #[test]
    fn test_repeated_reference_gets_distinct_id() {
        let html = render("a[^1] b[^1]\n\n[^1]: n");
        assert!(html.contains("<sup id=\"fnref-1\">"));
        assert!(html.contains("<sup id=\"fnref-1-2\">"));
        assert_eq!(html.matches("<li id=").count(), 1);
    }

    #[test]
    fn test_reference_inside_footnote_numbered_last() {
        let html = render("x[^1] y[^3]\n\n[^1]: see[^2]\n\n[^2]: deep\n\n[^3]: other");
        let first = html.find("<li id=\"fn-1\">").unwrap();
        let second = html.find("<li id=\"fn-2\">").unwrap();
        let third = html.find("<li id=\"fn-3\">").unwrap();
        assert!(first < second && second < third);
        assert!(html.contains("<li id=\"fn-3\">\n<p>deep"));
    }

    #[test]
    fn test_multi_paragraph_definition() {
        assert_eq!(
            render("x[^n]\n\n[^n]: one\n\n    two"),
            "<p>x<sup id=\"fnref-1\"><a class=\"footnote-ref\" href=\"#fn-1\">1</a></sup></p>\n\
             <div class=\"footnotes\">\n<hr />\n<ol>\n\
             <li id=\"fn-1\">\n<p>one</p>\n\
             <p>two <a class=\"footnote-backref\" href=\"#fnref-1\">&#8617;</a></p>\n</li>\n\
             </ol>\n</div>\n"
        );
    }

    #[test]
    fn test_first_definition_wins() {
        let html = render("x[^a]\n\n[^a]: first\n\n[^a]: second");
        assert!(html.contains("first"));
        assert!(!html.contains("second"));
    }
}
