//! Heading anchors.
//!
//! After the inline pass every heading gets a leading [`InlineKind::Anchor`]
//! whose `id` is a slug of the heading text, unique within the document.

use crate::ast::{Attributes, BlockContent, BlockKind, Document, Inline, InlineKind, plain_text};
use crate::error::RenderError;
use crate::extension::{DocumentTransform, Extension, ParseRule, RenderRule, TransformPhase};
use crate::html::escape_html;
use crate::renderer::RenderContext;
use crate::util::SlugSet;

use super::AnchorOptions;

/// The `anchor-link` extension.
#[derive(Clone, Debug, Default)]
pub struct AnchorLinkExtension {
    options: AnchorOptions,
}

impl AnchorLinkExtension {
    #[must_use]
    pub fn new(options: AnchorOptions) -> Self {
        Self { options }
    }
}

impl Extension for AnchorLinkExtension {
    fn name(&self) -> &str {
        "anchor-link"
    }

    fn parsing_rules(&self) -> Vec<ParseRule> {
        vec![ParseRule::transform(HeadingAnchors {
            options: self.options.clone(),
        })]
    }

    fn rendering_rules(&self) -> Vec<RenderRule> {
        vec![RenderRule::inline(InlineKind::Anchor, render_anchor)]
    }
}

struct HeadingAnchors {
    options: AnchorOptions,
}

impl DocumentTransform for HeadingAnchors {
    fn phase(&self) -> TransformPhase {
        TransformPhase::AfterInline
    }

    fn apply(&self, document: &mut Document) {
        let mut slugs = SlugSet::new();
        document.walk_blocks_mut(&mut |block| {
            if block.kind != BlockKind::Heading {
                return;
            }
            let BlockContent::Inlines(inlines) = &mut block.content else {
                return;
            };
            let id = slugs.unique(&plain_text(inlines));
            let anchor = Inline::leaf(InlineKind::Anchor, self.options.text.as_str()).with_attrs(
                Attributes::new()
                    .with("id", id)
                    .with("class", self.options.class.as_str()),
            );
            inlines.insert(0, anchor);
        });
    }
}

fn render_anchor(inline: &Inline, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    let id = escape_html(inline.attrs.get("id").unwrap_or(""));
    let class = escape_html(inline.attrs.get("class").unwrap_or(""));
    cx.push_str(&format!("<a href=\"#{id}\" id=\"{id}\" class=\"{class}\">"));
    cx.push_escaped(&inline.literal);
    cx.push_str("</a>");
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

    fn render_with(options: AnchorOptions, input: &str) -> String {
        let registry = Registry::builder()
            .with_extension(AnchorLinkExtension::new(options))
            .with_extension(CoreSyntax)
            .build()
            .unwrap();
        Pipeline::new(Arc::new(registry), PipelineOptions::default())
            .render_document(input)
            .unwrap()
            .html
    }

    #[test]
    fn test_heading_gets_anchor() {
        assert_eq!(
            render_with(AnchorOptions::default(), "# Hello *World*"),
            "<h1><a href=\"#hello-world\" id=\"hello-world\" class=\"anchor\"></a>\
             Hello <em>World</em></h1>\n"
        );
    }

    #[test]
    fn test_repeated_headings_get_unique_ids() {
        let html = render_with(AnchorOptions::default(), "## Setup\n\n## Setup\n\n## Setup");
        assert!(html.contains("id=\"setup\""));
        assert!(html.contains("id=\"setup-1\""));
        assert!(html.contains("id=\"setup-2\""));
    }

    #[test]
    fn test_configured_class_and_text() {
        let options = AnchorOptions {
            class: "permalink".to_owned(),
            text: "#".to_owned(),
        };
        assert_eq!(
            render_with(options, "Title\n====="),
            "<h1><a href=\"#title\" id=\"title\" class=\"permalink\">#</a>Title</h1>\n"
        );
    }

    #[test]
    fn test_paragraphs_untouched() {
        assert_eq!(
            render_with(AnchorOptions::default(), "text"),
            "<p>text</p>\n"
        );
    }
}
