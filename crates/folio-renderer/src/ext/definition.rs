//! Definition lists.
//!
//! ```text
//! Apple
//! : A fruit.
//! : A company.
//! ```
//!
//! A term is a single line directly followed by a `: ` line. Details continue
//! on lines indented by at least two spaces, or after a blank line by at
//! least four. A blank line before a `: ` line makes that entry loose.

use crate::ast::{Attributes, Block, BlockContent, BlockKind, Span};
use crate::error::{ParseError, RenderError};
use crate::extension::{Extension, ParseRule, RenderRule};
use crate::parser::{BlockContext, BlockRule, LineCursor, leading_spaces, strip_indent};
use crate::renderer::RenderContext;

use super::core::render::list_item_body;

/// The `definition` extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefinitionExtension;

impl Extension for DefinitionExtension {
    fn name(&self) -> &str {
        "definition"
    }

    fn parsing_rules(&self) -> Vec<ParseRule> {
        vec![ParseRule::block(DefinitionList)]
    }

    fn rendering_rules(&self) -> Vec<RenderRule> {
        vec![
            RenderRule::block(BlockKind::DefinitionList, render_list),
            RenderRule::block(BlockKind::DefinitionTerm, render_term),
            RenderRule::block(BlockKind::DefinitionDetails, render_details),
        ]
    }
}

struct DefinitionList;

/// Content after a `: ` details marker.
fn details_marker(line: &str) -> Option<&str> {
    let indent = leading_spaces(line);
    if indent > 3 {
        return None;
    }
    let rest = line[indent..].strip_prefix(':')?;
    rest.starts_with([' ', '\t']).then(|| &rest[1..])
}

fn is_term(line: &str) -> bool {
    !line.trim().is_empty() && leading_spaces(line) < 4 && details_marker(line).is_none()
}

/// Whether a term followed by details starts `n` lines ahead.
fn starts_entry(lines: &LineCursor<'_>, n: usize) -> bool {
    lines.peek_nth(n).is_some_and(|line| is_term(line.text))
        && lines
            .peek_nth(n + 1)
            .is_some_and(|line| details_marker(line.text).is_some())
}

/// Number of blank lines from the cursor on.
/// Collect the lines of one details entry after its marker line.
fn collect_details<'t>(lines: &mut LineCursor<'t>, first: &'t str) -> Vec<&'t str> {
    let mut content = vec![first];
    while let Some(line) = lines.peek() {
        if line.is_blank() {
            let blanks = lines.blank_run();
            if !lines.peek_nth(blanks).is_some_and(|next| next.indent() >= 4) {
                break;
            }
            lines.advance(blanks);
            content.push("");
        } else if line.indent() >= 2 && details_marker(line.text).is_none() {
            lines.bump();
            content.push(strip_indent(line.text, 4));
        } else {
            break;
        }
    }
    content
}

impl BlockRule for DefinitionList {
    fn name(&self) -> &'static str {
        "definition-list"
    }

    fn can_start(&self, lines: &LineCursor<'_>) -> bool {
        starts_entry(lines, 0)
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
        let item_cx = cx.descend(Span::new(start, start))?;
        let mut children = Vec::new();

        while let Some(term) = lines.bump() {
            children.push(Block::new(
                BlockKind::DefinitionTerm,
                BlockContent::Raw(term.text.trim().to_owned()),
                Span::new(term.offset, term.end()),
            ));

            loop {
                let blanks = lines.blank_run();
                let Some(first) = lines
                    .peek_nth(blanks)
                    .and_then(|line| details_marker(line.text))
                else {
                    break;
                };
                lines.advance(blanks);
                let details_start = lines.offset();
                lines.bump();

                let text = collect_details(lines, first).join("\n");
                let nested = item_cx.parse_nested(&text, details_start)?;
                let tight = blanks == 0 && !nested.blank_between;
                children.push(
                    Block::new(
                        BlockKind::DefinitionDetails,
                        BlockContent::Blocks(nested.blocks),
                        Span::new(details_start, lines.offset()),
                    )
                    .with_attrs(Attributes::new().with("tight", tight.to_string())),
                );
            }

            let blanks = lines.blank_run();
            if !starts_entry(lines, blanks) {
                break;
            }
            lines.advance(blanks);
        }

        Ok(Block::new(
            BlockKind::DefinitionList,
            BlockContent::Blocks(children),
            Span::new(start, lines.offset()),
        ))
    }
}

fn render_list(block: &Block, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    cx.push_str("<dl>\n");
    cx.render_children(block)?;
    cx.push_str("</dl>\n");
    Ok(())
}

fn render_term(block: &Block, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    cx.push_str("<dt>");
    cx.render_children(block)?;
    cx.push_str("</dt>\n");
    Ok(())
}

fn render_details(block: &Block, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    cx.push_str("<dd>");
    list_item_body(block, cx)?;
    cx.push_str("</dd>\n");
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

    fn render(input: &str) -> String {
        let registry = Registry::builder()
            .with_extension(DefinitionExtension)
            .with_extension(CoreSyntax)
            .build()
            .unwrap();
        Pipeline::new(Arc::new(registry), PipelineOptions::default())
            .render_document(input)
            .unwrap()
            .html
    }

    #[test]
    fn test_term_with_two_definitions() {
        assert_eq!(
            render("Apple\n: A fruit.\n: A *company*."),
            "<dl>\n<dt>Apple</dt>\n<dd>A fruit.</dd>\n<dd>A <em>company</em>.</dd>\n</dl>\n"
        );
    }

    #[test]
    fn test_several_entries() {
        assert_eq!(
            render("A\n: one\n\nB\n: two"),
            "<dl>\n<dt>A</dt>\n<dd>one</dd>\n<dt>B</dt>\n<dd>two</dd>\n</dl>\n"
        );
    }

    #[test]
    fn test_blank_line_makes_details_loose() {
        assert_eq!(
            render("Term\n: a\n\n: b"),
            "<dl>\n<dt>Term</dt>\n<dd>a</dd>\n<dd>\n<p>b</p>\n</dd>\n</dl>\n"
        );
    }

    #[test]
    fn test_indented_continuation() {
        assert_eq!(
            render("T\n: first\n  second\n\n    third"),
            "<dl>\n<dt>T</dt>\n<dd>\n<p>first\nsecond</p>\n<p>third</p>\n</dd>\n</dl>\n"
        );
    }

    #[test]
    fn test_does_not_interrupt_paragraph() {
        assert_eq!(render("a\nb\n: c"), "<p>a\nb\n: c</p>\n");
    }

    #[test]
    fn test_list_ends_before_following_paragraph() {
        assert_eq!(
            render("T\n: d\n\nafter"),
            "<dl>\n<dt>T</dt>\n<dd>d</dd>\n</dl>\n<p>after</p>\n"
        );
    }
}
