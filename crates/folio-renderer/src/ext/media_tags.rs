//! Media tags: `!A[title](src)` audio, `!V[…](…)` video, `!P[…](…)` picture
//! and `!E[…](…)` embed. Several sources are separated with `|`.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Attributes, Inline, InlineKind};
use crate::error::{ParseError, RenderError};
use crate::extension::{Extension, ParseRule, RenderRule};
use crate::html::{escape_html, sanitize_url};
use crate::parser::{InlineContext, InlineParse, InlineRule, Trigger};
use crate::renderer::RenderContext;

static MEDIA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!([AVPE])\[([^\]\n]*)\]\(([^)\s]+)\)").unwrap());

/// The `media-tags` extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct MediaTagsExtension;

impl Extension for MediaTagsExtension {
    fn name(&self) -> &str {
        "media-tags"
    }

    fn parsing_rules(&self) -> Vec<ParseRule> {
        vec![ParseRule::inline(MediaTag)]
    }

    fn rendering_rules(&self) -> Vec<RenderRule> {
        vec![RenderRule::inline(InlineKind::MediaTag, render_media)]
    }
}

struct MediaTag;

impl InlineRule for MediaTag {
    fn name(&self) -> &'static str {
        "media-tag"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Chars(&['!'])
    }

    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError> {
        let Some(caps) = MEDIA_RE.captures(cx.rest()) else {
            return Ok(None);
        };
        let media = match &caps[1] {
            "A" => "audio",
            "V" => "video",
            "P" => "picture",
            _ => "embed",
        };
        let attrs = Attributes::new()
            .with("media", media)
            .with("title", &caps[2])
            .with("src", &caps[3]);
        Ok(Some(InlineParse::Node {
            node: Inline::leaf(InlineKind::MediaTag, "").with_attrs(attrs),
            len: caps[0].len(),
        }))
    }
}

fn render_media(inline: &Inline, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    let title = escape_html(inline.attrs.get("title").unwrap_or(""));
    let sources: Vec<String> = inline
        .attrs
        .get("src")
        .unwrap_or("")
        .split('|')
        .filter(|src| !src.is_empty())
        .map(|src| escape_html(sanitize_url(src)))
        .collect();
    let first = sources.first().map_or("", String::as_str);

    let mut html = String::new();
    match inline.attrs.get("media") {
        Some(media @ ("audio" | "video")) => {
            let _ = write!(html, "<{media} controls=\"controls\" title=\"{title}\">");
            for src in &sources {
                let _ = write!(html, "<source src=\"{src}\" />");
            }
            let _ = write!(html, "</{media}>");
        }
        Some("picture") => {
            html.push_str("<picture>");
            if let Some((last, rest)) = sources.split_last() {
                for src in rest {
                    let _ = write!(html, "<source srcset=\"{src}\" />");
                }
                let _ = write!(html, "<img src=\"{last}\" alt=\"{title}\" />");
            }
            html.push_str("</picture>");
        }
        _ => {
            let _ = write!(html, "<embed src=\"{first}\" title=\"{title}\" />");
        }
    }
    cx.push_str(&html);
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
            .with_extension(MediaTagsExtension)
            .with_extension(CoreSyntax)
            .build()
            .unwrap();
        Pipeline::new(Arc::new(registry), PipelineOptions::default())
            .render_document(input)
            .unwrap()
            .html
    }

    #[test]
    fn test_audio_with_sources() {
        assert_eq!(
            render("!A[Theme](/a.ogg|/a.mp3)"),
            "<p><audio controls=\"controls\" title=\"Theme\">\
             <source src=\"/a.ogg\" /><source src=\"/a.mp3\" /></audio></p>\n"
        );
    }

    #[test]
    fn test_video() {
        assert_eq!(
            render("!V[Clip](/c.webm)"),
            "<p><video controls=\"controls\" title=\"Clip\">\
             <source src=\"/c.webm\" /></video></p>\n"
        );
    }

    #[test]
    fn test_picture_falls_back_to_last_source() {
        assert_eq!(
            render("!P[Cat](/cat.avif|/cat.jpg)"),
            "<p><picture><source srcset=\"/cat.avif\" />\
             <img src=\"/cat.jpg\" alt=\"Cat\" /></picture></p>\n"
        );
    }

    #[test]
    fn test_embed_sanitises_source() {
        assert_eq!(
            render("!E[x](javascript:alert)"),
            "<p><embed src=\"#\" title=\"x\" /></p>\n"
        );
    }

    #[test]
    fn test_plain_image_untouched() {
        assert_eq!(
            render("![a](/b.png)"),
            "<p><img src=\"/b.png\" alt=\"a\" /></p>\n"
        );
        assert_eq!(render("!X[a](/b)"), "<p>!X<a href=\"/b\">a</a></p>\n");
    }
}
