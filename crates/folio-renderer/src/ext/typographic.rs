//! SmartyPants-style typography: curly quotes, en and em dashes, ellipses and
//! guillemets, emitted as HTML entities.

use crate::ast::{Attributes, Inline, InlineKind};
use crate::error::{ParseError, RenderError};
use crate::extension::{Extension, ParseRule, RenderRule};
use crate::parser::{InlineContext, InlineParse, InlineRule, Trigger};
use crate::renderer::RenderContext;

/// The `typographic` extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct TypographicExtension;

impl Extension for TypographicExtension {
    fn name(&self) -> &str {
        "typographic"
    }

    fn parsing_rules(&self) -> Vec<ParseRule> {
        vec![ParseRule::inline(Smartypants)]
    }

    fn rendering_rules(&self) -> Vec<RenderRule> {
        vec![RenderRule::inline(InlineKind::Typographic, render_entity)]
    }
}

struct Smartypants;

const SEQUENCES: &[(&str, &str)] = &[
    ("---", "&mdash;"),
    ("--", "&ndash;"),
    ("...", "&hellip;"),
    ("<<", "&laquo;"),
    (">>", "&raquo;"),
];

/// Whether a quote after `prev` opens rather than closes.
fn opens_quote(prev: Option<char>) -> bool {
    prev.is_none_or(|c| c.is_whitespace() || matches!(c, '(' | '[' | '{' | '-' | '\u{2014}'))
}

fn node(source: &str, entity: &str) -> Option<InlineParse> {
    Some(InlineParse::Node {
        node: Inline::leaf(InlineKind::Typographic, source)
            .with_attrs(Attributes::new().with("entity", entity)),
        len: source.len(),
    })
}

impl InlineRule for Smartypants {
    fn name(&self) -> &'static str {
        "typographic"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Chars(&['"', '\'', '-', '.', '<', '>'])
    }

    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError> {
        let rest = cx.rest();
        if let Some((source, entity)) = SEQUENCES
            .iter()
            .find(|(source, _)| rest.starts_with(source))
        {
            return Ok(node(source, entity));
        }
        let opening = opens_quote(cx.prev_char());
        Ok(match rest.chars().next() {
            Some('"') if opening => node("\"", "&ldquo;"),
            Some('"') => node("\"", "&rdquo;"),
            Some('\'') if opening => node("'", "&lsquo;"),
            Some('\'') => node("'", "&rsquo;"),
            _ => None,
        })
    }
}

fn render_entity(inline: &Inline, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    match inline.attrs.get("entity") {
        Some(entity) if entity.starts_with('&') && entity.ends_with(';') => cx.push_str(entity),
        _ => cx.push_escaped(&inline.literal),
    }
    Ok(())
}
