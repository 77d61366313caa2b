//! Baseline HTML rendering, in the shape of the CommonMark reference renderer.

use std::fmt::Write;

use crate::ast::{Block, BlockKind, Inline, plain_text};
use crate::error::RenderError;
use crate::html::{escape_html, sanitize_url};
use crate::renderer::RenderContext;

type RenderResult = Result<(), RenderError>;

pub(crate) fn paragraph(block: &Block, cx: &mut RenderContext<'_>) -> RenderResult {
    cx.push_str("<p>");
    cx.render_children(block)?;
    cx.push_str("</p>\n");
    Ok(())
}

pub(crate) fn heading(block: &Block, cx: &mut RenderContext<'_>) -> RenderResult {
    let level = block
        .attrs
        .get("level")
        .and_then(|l| l.parse::<u8>().ok())
        .unwrap_or(1)
        .clamp(1, 6);
    let mut open = String::new();
    let _ = write!(open, "<h{level}");
    if let Some(id) = block.attrs.get("id") {
        let _ = write!(open, " id=\"{}\"", escape_html(id));
    }
    open.push('>');
    cx.push_str(&open);
    cx.render_children(block)?;
    cx.push_str(&format!("</h{level}>\n"));
    Ok(())
}

pub(crate) fn thematic_break(_block: &Block, cx: &mut RenderContext<'_>) -> RenderResult {
    cx.push_str("<hr />\n");
    Ok(())
}

pub(crate) fn code_block(block: &Block, cx: &mut RenderContext<'_>) -> RenderResult {
    let language = block
        .attrs
        .get("info")
        .and_then(|info| info.split_whitespace().next());
    match language {
        Some(lang) => cx.push_str(&format!("<pre><code class=\"language-{}\">", escape_html(lang))),
        None => cx.push_str("<pre><code>"),
    }
    cx.render_children(block)?;
    cx.push_str("</code></pre>\n");
    Ok(())
}

pub(crate) fn block_quote(block: &Block, cx: &mut RenderContext<'_>) -> RenderResult {
    cx.push_str("<blockquote>\n");
    cx.render_children(block)?;
    cx.push_str("</blockquote>\n");
    Ok(())
}

pub(crate) fn bullet_list(block: &Block, cx: &mut RenderContext<'_>) -> RenderResult {
    cx.push_str("<ul>\n");
    cx.render_children(block)?;
    cx.push_str("</ul>\n");
    Ok(())
}

pub(crate) fn ordered_list(block: &Block, cx: &mut RenderContext<'_>) -> RenderResult {
    match block.attrs.get("start") {
        Some(start) if start != "1" => {
            cx.push_str(&format!("<ol start=\"{}\">\n", escape_html(start)));
        }
        _ => cx.push_str("<ol>\n"),
    }
    cx.render_children(block)?;
    cx.push_str("</ol>\n");
    Ok(())
}

pub(crate) fn list_item(block: &Block, cx: &mut RenderContext<'_>) -> RenderResult {
    cx.push_str("<li>");
    list_item_body(block, cx)?;
    cx.push_str("</li>\n");
    Ok(())
}

/// Item content. In tight lists paragraphs render without `<p>`.
pub(crate) fn list_item_body(block: &Block, cx: &mut RenderContext<'_>) -> RenderResult {
    let tight = block.attrs.flag("tight");
    let children = block.children();
    cx.descend(|cx| {
        for child in children {
            if tight && child.kind == BlockKind::Paragraph {
                cx.render_inlines(child.inlines())?;
            } else {
                if !cx.out().ends_with('\n') {
                    cx.push_str("\n");
                }
                cx.render_block(child)?;
            }
        }
        Ok(())
    })
}

pub(crate) fn nothing(_block: &Block, _cx: &mut RenderContext<'_>) -> RenderResult {
    Ok(())
}

pub(crate) fn text(inline: &Inline, cx: &mut RenderContext<'_>) -> RenderResult {
    cx.push_escaped(&inline.literal);
    Ok(())
}

pub(crate) fn soft_break(_inline: &Inline, cx: &mut RenderContext<'_>) -> RenderResult {
    cx.push_str("\n");
    Ok(())
}

pub(crate) fn hard_break(_inline: &Inline, cx: &mut RenderContext<'_>) -> RenderResult {
    cx.push_str("<br />\n");
    Ok(())
}

pub(crate) fn code(inline: &Inline, cx: &mut RenderContext<'_>) -> RenderResult {
    cx.push_str("<code>");
    cx.push_escaped(&inline.literal);
    cx.push_str("</code>");
    Ok(())
}

pub(crate) fn emphasis(inline: &Inline, cx: &mut RenderContext<'_>) -> RenderResult {
    cx.push_str("<em>");
    cx.render_inline_children(inline)?;
    cx.push_str("</em>");
    Ok(())
}

pub(crate) fn strong(inline: &Inline, cx: &mut RenderContext<'_>) -> RenderResult {
    cx.push_str("<strong>");
    cx.render_inline_children(inline)?;
    cx.push_str("</strong>");
    Ok(())
}

fn href(inline: &Inline) -> String {
    escape_html(sanitize_url(inline.attrs.get("href").unwrap_or("")))
}

fn title_attr(inline: &Inline) -> String {
    inline
        .attrs
        .get("title")
        .map(|title| format!(" title=\"{}\"", escape_html(title)))
        .unwrap_or_default()
}

pub(crate) fn link(inline: &Inline, cx: &mut RenderContext<'_>) -> RenderResult {
    cx.push_str(&format!("<a href=\"{}\"{}>", href(inline), title_attr(inline)));
    cx.render_inline_children(inline)?;
    cx.push_str("</a>");
    Ok(())
}

pub(crate) fn image(inline: &Inline, cx: &mut RenderContext<'_>) -> RenderResult {
    cx.push_str(&format!(
        "<img src=\"{}\" alt=\"{}\"{} />",
        href(inline),
        escape_html(&plain_text(&inline.children)),
        title_attr(inline)
    ));
    Ok(())
}

pub(crate) fn autolink(inline: &Inline, cx: &mut RenderContext<'_>) -> RenderResult {
    cx.push_str(&format!("<a href=\"{}\">", href(inline)));
    cx.push_escaped(&inline.literal);
    cx.push_str("</a>");
    Ok(())
}
