//! Baseline CommonMark syntax as an ordinary extension.
//!
//! Registered last in the standard registry, so every other extension's
//! triggers are tried first. Raw HTML is not recognised and renders escaped;
//! entities are not decoded.

mod blocks;
mod inlines;
pub(crate) mod render;

use crate::ast::{BlockKind, InlineKind};
use crate::extension::{Extension, ParseRule, RenderRule};

/// The `core` extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoreSyntax;

impl Extension for CoreSyntax {
    fn name(&self) -> &str {
        "core"
    }

    fn parsing_rules(&self) -> Vec<ParseRule> {
        vec![
            ParseRule::block(blocks::FencedCode),
            ParseRule::block(blocks::AtxHeading),
            ParseRule::block(blocks::ThematicBreak),
            ParseRule::block(blocks::BlockQuote),
            ParseRule::block(blocks::List),
            ParseRule::block(blocks::IndentedCode),
            ParseRule::block(blocks::LinkDefinition),
            ParseRule::inline(inlines::Escape),
            ParseRule::inline(inlines::CodeSpan),
            ParseRule::inline(inlines::AngleAutolink),
            ParseRule::inline(inlines::Link),
            ParseRule::inline(inlines::Emphasis),
            ParseRule::inline(inlines::LineBreak),
        ]
    }

    fn rendering_rules(&self) -> Vec<RenderRule> {
        vec![
            RenderRule::block(BlockKind::Paragraph, render::paragraph),
            RenderRule::block(BlockKind::Heading, render::heading),
            RenderRule::block(BlockKind::ThematicBreak, render::thematic_break),
            RenderRule::block(BlockKind::CodeBlock, render::code_block),
            RenderRule::block(BlockKind::BlockQuote, render::block_quote),
            RenderRule::block(BlockKind::BulletList, render::bullet_list),
            RenderRule::block(BlockKind::OrderedList, render::ordered_list),
            RenderRule::block(BlockKind::ListItem, render::list_item),
            RenderRule::block(BlockKind::LinkDefinition, render::nothing),
            RenderRule::inline(InlineKind::Text, render::text),
            RenderRule::inline(InlineKind::SoftBreak, render::soft_break),
            RenderRule::inline(InlineKind::HardBreak, render::hard_break),
            RenderRule::inline(InlineKind::Code, render::code),
            RenderRule::inline(InlineKind::Emphasis, render::emphasis),
            RenderRule::inline(InlineKind::Strong, render::strong),
            RenderRule::inline(InlineKind::Link, render::link),
            RenderRule::inline(InlineKind::Image, render::image),
            RenderRule::inline(InlineKind::Autolink, render::autolink),
        ]
    }
}
