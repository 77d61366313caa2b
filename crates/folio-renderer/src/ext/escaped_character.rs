//! Backslash escapes as their own node kind, so consumers of the AST can tell
//! `\*` from a literal `*`.

use crate::ast::{Inline, InlineKind};
use crate::error::{ParseError, RenderError};
use crate::extension::{Extension, ParseRule, RenderRule};
use crate::parser::{InlineContext, InlineParse, InlineRule, Trigger};
use crate::renderer::RenderContext;

/// The `escaped-character` extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct EscapedCharacterExtension;

impl Extension for EscapedCharacterExtension {
    fn name(&self) -> &str {
        "escaped-character"
    }

    fn parsing_rules(&self) -> Vec<ParseRule> {
        vec![ParseRule::inline(EscapedChar)]
    }

    fn rendering_rules(&self) -> Vec<RenderRule> {
        vec![RenderRule::inline(InlineKind::EscapedChar, render_escaped)]
    }
}

struct EscapedChar;

impl InlineRule for EscapedChar {
    fn name(&self) -> &'static str {
        "escaped-char"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Chars(&['\\'])
    }

    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError> {
        Ok(cx
            .rest()
            .chars()
            .nth(1)
            .filter(char::is_ascii_punctuation)
            .map(|ch| InlineParse::Node {
                node: Inline::leaf(InlineKind::EscapedChar, ch.to_string()),
                len: 2,
            }))
    }
}

fn render_escaped(inline: &Inline, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    cx.push_escaped(&inline.literal);
    Ok(())
}
