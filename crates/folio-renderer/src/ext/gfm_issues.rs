//! GitHub-style issue references: `#123` links to `{root}123`.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Attributes, Inline, InlineKind};
use crate::error::{ParseError, RenderError};
use crate::extension::{Extension, ParseRule, RenderRule};
use crate::html::{escape_html, sanitize_url};
use crate::parser::{InlineContext, InlineParse, InlineRule, Trigger};
use crate::renderer::RenderContext;

use super::IssueOptions;

static ISSUE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#([0-9]+)\b").unwrap());

/// The `gfm-issues` extension.
#[derive(Clone, Debug, Default)]
pub struct GfmIssuesExtension {
    options: IssueOptions,
}

impl GfmIssuesExtension {
    #[must_use]
    pub fn new(options: IssueOptions) -> Self {
        Self { options }
    }
}

impl Extension for GfmIssuesExtension {
    fn name(&self) -> &str {
        "gfm-issues"
    }

    fn parsing_rules(&self) -> Vec<ParseRule> {
        vec![ParseRule::inline(IssueReference {
            options: self.options.clone(),
        })]
    }

    fn rendering_rules(&self) -> Vec<RenderRule> {
        vec![RenderRule::inline(InlineKind::IssueReference, render_issue)]
    }
}

struct IssueReference {
    options: IssueOptions,
}

impl InlineRule for IssueReference {
    fn name(&self) -> &'static str {
        "issue-reference"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Chars(&['#'])
    }

    fn parse(&self, cx: &InlineContext<'_>) -> Result<Option<InlineParse>, ParseError> {
        if cx.in_link() || !cx.at_word_start() {
            return Ok(None);
        }
        let Some(caps) = ISSUE_RE.captures(cx.rest()) else {
            return Ok(None);
        };
        let matched = &caps[0];
        let number = &caps[1];
        let attrs = Attributes::new()
            .with("number", number)
            .with("href", format!("{}{number}", self.options.root))
            .with("class", self.options.class.as_str());
        Ok(Some(InlineParse::Node {
            node: Inline::leaf(InlineKind::IssueReference, matched).with_attrs(attrs),
            len: matched.len(),
        }))
    }
}

fn render_issue(inline: &Inline, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    let href = escape_html(sanitize_url(inline.attrs.get("href").unwrap_or("")));
    let class = escape_html(inline.attrs.get("class").unwrap_or(""));
    cx.push_str(&format!("<a href=\"{href}\" class=\"{class}\">"));
    cx.push_escaped(&inline.literal);
    cx.push_str("</a>");
    Ok(())
}
