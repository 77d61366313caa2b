//! Abbreviations: `*[HTML]: Hyper Text Markup Language` defines one, and
//! every whole-word occurrence of `HTML` in the document is wrapped in
//! `<abbr>`.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Attributes, Block, BlockContent, BlockKind, Inline, InlineKind, Span};
use crate::error::{ParseError, RenderError};
use crate::extension::{Extension, ParseRule, RenderRule};
use crate::html::escape_html;
use crate::parser::{
    BlockContext, BlockRule, InlineContext, InlineParse, InlineRule, LineCursor, Trigger,
};
use crate::renderer::RenderContext;

static DEFINITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}\*\[([^\]]+)\]:[ \t]*(.*?)\s*$").unwrap());

/// The `abbreviation` extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct AbbreviationExtension;

impl Extension for AbbreviationExtension {
    fn name(&self) -> &str {
        "abbreviation"
    }

    fn parsing_rules(&self) -> Vec<ParseRule> {
        vec![
            ParseRule::block(AbbreviationDefinition),
            ParseRule::inline(AbbreviationUse),
        ]
    }

    fn rendering_rules(&self) -> Vec<RenderRule> {
        vec![
            RenderRule::block(BlockKind::AbbreviationDefinition, render_definition),
            RenderRule::inline(InlineKind::Abbreviation, render_abbreviation),
        ]
    }
}

struct AbbreviationDefinition;

impl BlockRule for AbbreviationDefinition {
    fn name(&self) -> &'static str {
        "abbreviation-definition"
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
        _cx: &BlockContext<'_>,
    ) -> Result<Block, ParseError> {
        let start = lines.offset();
        let line = lines.bump();
        let mut attrs = Attributes::new();
        if let Some(caps) = line.and_then(|line| DEFINITION_RE.captures(line.text)) {
            attrs.insert("abbr", caps[1].trim());
            attrs.insert("title", &caps[2]);
        }
        let span = Span::new(start, line.map_or(start, |line| line.end()));
        Ok(
            Block::new(BlockKind::AbbreviationDefinition, BlockContent::Empty, span)
                .with_attrs(attrs),
        )
    }
}

struct AbbreviationUse;

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

impl InlineRule for AbbreviationUse {
    fn name(&self) -> &'static str {
        "abbreviation"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Any
    }

    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError> {
        if !cx.at_word_start() {
            return Ok(None);
        }
        let rest = cx.rest();
        for (abbr, title) in cx.references().abbreviations() {
            let Some(after) = rest.strip_prefix(abbr).filter(|_| !abbr.is_empty()) else {
                continue;
            };
            if after.chars().next().is_some_and(is_word_char) {
                continue;
            }
            let node = Inline::leaf(InlineKind::Abbreviation, abbr)
                .with_attrs(Attributes::new().with("title", title));
            return Ok(Some(InlineParse::Node {
                node,
                len: abbr.len(),
            }));
        }
        Ok(None)
    }
}

fn render_definition(_block: &Block, _cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    Ok(())
}

fn render_abbreviation(inline: &Inline, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    let title = escape_html(inline.attrs.get("title").unwrap_or(""));
    cx.push_str(&format!("<abbr title=\"{title}\">"));
    cx.push_escaped(&inline.literal);
    cx.push_str("</abbr>");
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
            .with_extension(AbbreviationExtension)
            .with_extension(CoreSyntax)
            .build()
            .unwrap();
        Pipeline::new(Arc::new(registry), PipelineOptions::default())
            .render_document(input)
            .unwrap()
            .html
    }

    #[test]
    fn test_whole_word_matches() {
        assert_eq!(
            render("HTML and XHTML and HTMLish.\n\n*[HTML]: Hyper Text Markup Language"),
            "<p><abbr title=\"Hyper Text Markup Language\">HTML</abbr> and XHTML and HTMLish.</p>\n"
        );
    }

    #[test]
    fn test_definition_before_use() {
        assert_eq!(
            render("*[W3C]: World Wide Web Consortium\n\nThe W3C, again W3C."),
            "<p>The <abbr title=\"World Wide Web Consortium\">W3C</abbr>, \
             again <abbr title=\"World Wide Web Consortium\">W3C</abbr>.</p>\n"
        );
    }

    #[test]
    fn test_longest_abbreviation_wins() {
        assert_eq!(
            render("HTML5 HTML\n\n*[HTML]: markup\n*[HTML5]: markup five"),
            "<p><abbr title=\"markup five\">HTML5</abbr> <abbr title=\"markup\">HTML</abbr></p>\n"
        );
    }

    #[test]
    fn test_title_is_escaped() {
        assert_eq!(
            render("*[A]: \"quoted\" <b>\n\nA"),
            "<p><abbr title=\"&quot;quoted&quot; &lt;b&gt;\">A</abbr></p>\n"
        );
    }

    #[test]
    fn test_not_inside_code() {
        assert_eq!(
            render("`API`\n\n*[API]: interface"),
            "<p><code>API</code></p>\n"
        );
    }
}
