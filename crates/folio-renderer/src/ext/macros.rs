//! Text macros.
//!
//! ```text
//! >>>signature
//! Regards, *the team*
//! <<<
//!
//! Thanks. <<<signature>>>
//! ```
//!
//! A definition renders nothing. A reference renders the definition's
//! content in place: a single paragraph is inlined, anything else renders as
//! blocks. A macro referenced from its own expansion renders literally.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Attributes, Block, BlockContent, BlockKind, Inline, InlineKind, Span};
use crate::error::{ParseError, RenderError};
use crate::extension::{Extension, ParseRule, RenderRule};
use crate::parser::{
    BlockContext, BlockRule, InlineContext, InlineParse, InlineRule, LineCursor, Trigger,
};
use crate::renderer::RenderContext;

static OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^>>>([A-Za-z0-9_\-]+)\s*$").unwrap());

static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<<<([A-Za-z0-9_\-]+)>>>").unwrap());

const CLOSE: &str = "<<<";

/// The `macros` extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct MacrosExtension;

impl Extension for MacrosExtension {
    fn name(&self) -> &str {
        "macros"
    }

    fn parsing_rules(&self) -> Vec<ParseRule> {
        vec![
            ParseRule::block(MacroDefinition),
            ParseRule::inline(MacroReference),
        ]
    }

    fn rendering_rules(&self) -> Vec<RenderRule> {
        vec![
            RenderRule::block(BlockKind::MacroDefinition, render_definition),
            RenderRule::inline(InlineKind::MacroReference, render_reference),
        ]
    }
}

struct MacroDefinition;

impl BlockRule for MacroDefinition {
    fn name(&self) -> &'static str {
        "macro-definition"
    }

    /// Only a `>>>name` line with a closing `<<<` somewhere below it.
    fn can_start(&self, lines: &LineCursor<'_>) -> bool {
        lines.peek().is_some_and(|line| OPEN_RE.is_match(line.text))
            && lines.has_marker_below(CLOSE)
    }

    fn parse(
        &self,
        lines: &mut LineCursor<'_>,
        cx: &BlockContext<'_>,
    ) -> Result<Block, ParseError> {
        let start = lines.offset();
        let name = lines
            .bump()
            .and_then(|line| OPEN_RE.captures(line.text))
            .map(|caps| caps[1].to_owned())
            .unwrap_or_default();

        let body_start = lines.offset();
        let mut body = Vec::new();
        while let Some(line) = lines.bump() {
            if line.text.trim() == CLOSE {
                break;
            }
            body.push(line.text);
        }

        let nested = cx.parse_nested(&body.join("\n"), body_start)?;
        Ok(Block::new(
            BlockKind::MacroDefinition,
            BlockContent::Blocks(nested.blocks),
            Span::new(start, lines.offset()),
        )
        .with_attrs(Attributes::new().with("name", name)))
    }
}

struct MacroReference;

impl InlineRule for MacroReference {
    fn name(&self) -> &'static str {
        "macro-reference"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Chars(&['<'])
    }

    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError> {
        let Some(caps) = REFERENCE_RE.captures(cx.rest()) else {
            return Ok(None);
        };
        let name = &caps[1];
        if !cx.references().has_macro(name) {
            return Ok(None);
        }
        Ok(Some(InlineParse::Node {
            node: Inline::leaf(InlineKind::MacroReference, name)
                .with_attrs(Attributes::new().with("name", name)),
            len: caps[0].len(),
        }))
    }
}

fn find_definition<'d>(blocks: &'d [Block], name: &str) -> Option<&'d Block> {
    blocks.iter().find_map(|block| {
        if block.kind == BlockKind::MacroDefinition && block.attrs.get("name") == Some(name) {
            Some(block)
        } else {
            find_definition(block.children(), name)
        }
    })
}

fn render_definition(_block: &Block, _cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    Ok(())
}

fn render_reference(inline: &Inline, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    let name = inline.attrs.get("name").unwrap_or(inline.literal.as_str());
    let definition = find_definition(&cx.document().blocks, name);
    let Some(definition) = definition.filter(|_| !cx.is_expanding(name)) else {
        cx.push_escaped(&format!("<<<{name}>>>"));
        return Ok(());
    };

    cx.expanding(name, |cx| {
        cx.descend(|cx| match definition.children() {
            [single] if single.kind == BlockKind::Paragraph => cx.render_inlines(single.inlines()),
            blocks => cx.render_blocks(blocks),
        })
    })
}
