//! `~~strikethrough~~` and `~subscript~`, paired by the same delimiter
//! algorithm as emphasis.

use crate::ast::{Inline, InlineKind};
use crate::error::{ParseError, RenderError};
use crate::extension::{Extension, ParseRule, RenderRule};
use crate::parser::{DelimiterRun, InlineContext, InlineParse, InlineRule, Trigger};
use crate::renderer::RenderContext;

/// The `strikethrough` extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct StrikethroughExtension;

impl Extension for StrikethroughExtension {
    fn name(&self) -> &str {
        "strikethrough"
    }

    fn parsing_rules(&self) -> Vec<ParseRule> {
        vec![ParseRule::inline(Tilde)]
    }

    fn rendering_rules(&self) -> Vec<RenderRule> {
        vec![
            RenderRule::inline(InlineKind::Strikethrough, render_strikethrough),
            RenderRule::inline(InlineKind::Subscript, render_subscript),
        ]
    }
}

struct Tilde;

fn pair_tilde(opener: usize, closer: usize) -> (InlineKind, usize) {
    if opener >= 2 && closer >= 2 {
        (InlineKind::Strikethrough, 2)
    } else {
        (InlineKind::Subscript, 1)
    }
}

impl InlineRule for Tilde {
    fn name(&self) -> &'static str {
        "tilde"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Chars(&['~'])
    }

    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError> {
        Ok(DelimiterRun::scan(cx, '~', pair_tilde).map(InlineParse::Delimiter))
    }
}

fn wrap(tag: &str, inline: &Inline, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    cx.push_str(&format!("<{tag}>"));
    cx.render_inline_children(inline)?;
    cx.push_str(&format!("</{tag}>"));
    Ok(())
}

fn render_strikethrough(inline: &Inline, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    wrap("del", inline, cx)
}

fn render_subscript(inline: &Inline, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    wrap("sub", inline, cx)
}
