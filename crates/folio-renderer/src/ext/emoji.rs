//! `:shortcode:` emoji.
//!
//! Only shortcodes in the built-in table are recognised; anything else stays
//! literal text. Depending on [`EmojiMode`] a match renders as the Unicode
//! glyph or as an `<img>` under the configured image root.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Attributes, Inline, InlineKind};
use crate::error::{ParseError, RenderError};
use crate::extension::{Extension, ParseRule, RenderRule};
use crate::html::{escape_html, sanitize_url};
use crate::parser::{InlineContext, InlineParse, InlineRule, Trigger};
use crate::renderer::RenderContext;

use super::{EmojiMode, EmojiOptions};

static SHORTCODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^:([a-z0-9_+\-]+):").unwrap());

const EMOJI: &[(&str, &str)] = &[
    ("+1", "\u{1F44D}"),
    ("-1", "\u{1F44E}"),
    ("100", "\u{1F4AF}"),
    ("bug", "\u{1F41B}"),
    ("bulb", "\u{1F4A1}"),
    ("check", "\u{2714}\u{FE0F}"),
    ("clap", "\u{1F44F}"),
    ("coffee", "\u{2615}"),
    ("confused", "\u{1F615}"),
    ("cry", "\u{1F622}"),
    ("eyes", "\u{1F440}"),
    ("fire", "\u{1F525}"),
    ("frowning", "\u{1F626}"),
    ("grin", "\u{1F601}"),
    ("heart", "\u{2764}\u{FE0F}"),
    ("heavy_check_mark", "\u{2714}\u{FE0F}"),
    ("hourglass", "\u{231B}"),
    ("info", "\u{2139}\u{FE0F}"),
    ("joy", "\u{1F602}"),
    ("laughing", "\u{1F606}"),
    ("lock", "\u{1F512}"),
    ("memo", "\u{1F4DD}"),
    ("ok_hand", "\u{1F44C}"),
    ("pencil", "\u{270F}\u{FE0F}"),
    ("point_right", "\u{1F449}"),
    ("question", "\u{2753}"),
    ("rocket", "\u{1F680}"),
    ("sad", "\u{1F61E}"),
    ("smile", "\u{1F604}"),
    ("smiley", "\u{1F603}"),
    ("sparkles", "\u{2728}"),
    ("star", "\u{2B50}"),
    ("sunglasses", "\u{1F60E}"),
    ("tada", "\u{1F389}"),
    ("thinking", "\u{1F914}"),
    ("thumbsdown", "\u{1F44E}"),
    ("thumbsup", "\u{1F44D}"),
    ("warning", "\u{26A0}\u{FE0F}"),
    ("wave", "\u{1F44B}"),
    ("wink", "\u{1F609}"),
    ("x", "\u{274C}"),
    ("zap", "\u{26A1}"),
];

/// Unicode glyph for a known shortcode (without the colons).
#[must_use]
pub fn lookup_emoji(shortcode: &str) -> Option<&'static str> {
    EMOJI
        .binary_search_by(|(code, _)| (*code).cmp(shortcode))
        .ok()
        .map(|idx| EMOJI[idx].1)
}

/// The `emoji` extension.
#[derive(Clone, Debug, Default)]
pub struct EmojiExtension {
    options: EmojiOptions,
}

impl EmojiExtension {
    #[must_use]
    pub fn new(options: EmojiOptions) -> Self {
        Self { options }
    }
}

impl Extension for EmojiExtension {
    fn name(&self) -> &str {
        "emoji"
    }

    fn parsing_rules(&self) -> Vec<ParseRule> {
        vec![ParseRule::inline(Shortcode {
            options: self.options.clone(),
        })]
    }

    fn rendering_rules(&self) -> Vec<RenderRule> {
        vec![RenderRule::inline(InlineKind::Emoji, render_emoji)]
    }
}

struct Shortcode {
    options: EmojiOptions,
}

impl InlineRule for Shortcode {
    fn name(&self) -> &'static str {
        "emoji"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Chars(&[':'])
    }

    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError> {
        let Some(caps) = SHORTCODE_RE.captures(cx.rest()) else {
            return Ok(None);
        };
        let shortcode = &caps[1];
        let Some(glyph) = lookup_emoji(shortcode) else {
            return Ok(None);
        };

        let mut attrs = Attributes::new().with("shortcode", shortcode);
        if self.options.mode == EmojiMode::Image {
            attrs.insert("src", format!("{}{shortcode}.png", self.options.image_root));
            attrs.insert("size", self.options.image_size.to_string());
        }
        let node = Inline::leaf(InlineKind::Emoji, glyph).with_attrs(attrs);
        Ok(Some(InlineParse::Node {
            node,
            len: caps[0].len(),
        }))
    }
}

fn render_emoji(inline: &Inline, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    let Some(src) = inline.attrs.get("src") else {
        cx.push_escaped(&inline.literal);
        return Ok(());
    };
    let shortcode = escape_html(inline.attrs.get("shortcode").unwrap_or(""));
    let size = escape_html(inline.attrs.get("size").unwrap_or("20"));
    cx.push_str(&format!(
        "<img class=\"emoji\" src=\"{}\" alt=\"{}\" title=\":{shortcode}:\" \
         width=\"{size}\" height=\"{size}\" />",
        escape_html(sanitize_url(src)),
        escape_html(&inline.literal),
    ));
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

    fn render_with(options: EmojiOptions, input: &str) -> String {
        let registry = Registry::builder()
            .with_extension(EmojiExtension::new(options))
            .with_extension(CoreSyntax)
            .build()
            .unwrap();
        Pipeline::new(Arc::new(registry), PipelineOptions::default())
            .render_document(input)
            .unwrap()
            .html
    }

    #[test]
    fn test_table_is_sorted() {
        assert!(EMOJI.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup_emoji("smile"), Some("\u{1F604}"));
        assert_eq!(lookup_emoji("+1"), Some("\u{1F44D}"));
        assert_eq!(lookup_emoji("unknown"), None);
    }

    #[test]
    fn test_unicode_mode() {
        assert_eq!(
            render_with(EmojiOptions::default(), "Ship it :rocket:!"),
            "<p>Ship it \u{1F680}!</p>\n"
        );
    }

    #[test]
    fn test_unknown_shortcode_is_literal() {
        assert_eq!(
            render_with(EmojiOptions::default(), "time 10:30: :nope:"),
            "<p>time 10:30: :nope:</p>\n"
        );
    }

    #[test]
    fn test_image_mode() {
        let options = EmojiOptions {
            mode: EmojiMode::Image,
            image_root: "/static/emoji/".to_owned(),
            image_size: 16,
        };
        assert_eq!(
            render_with(options, ":tada:"),
            "<p><img class=\"emoji\" src=\"/static/emoji/tada.png\" alt=\"\u{1F389}\" \
             title=\":tada:\" width=\"16\" height=\"16\" /></p>\n"
        );
    }
}
