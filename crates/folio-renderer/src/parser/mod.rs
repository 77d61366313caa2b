//! Parser: raw text to [`Document`].
//!
//! A parse runs in fixed phases over one registry's rules:
//!
//! 1. line endings and leading tabs are normalised;
//! 2. the front-matter rule, if any, gets one look at offset zero;
//! 3. the block pass splits the body into blocks, leaves holding raw inline source;
//! 4. `BeforeInline` transforms run;
//! 5. link, abbreviation, footnote and macro definitions are collected;
//! 6. the inline pass replaces every raw leaf with inline nodes;
//! 7. `AfterInline` transforms run.
//!
//! Malformed markup never fails a parse. The only error is the nesting cap.

mod block;
mod inline;
mod lines;
mod references;

pub use block::{BlockContext, BlockRule, Nested};
pub use inline::{
    DelimiterRun, InlineContext, InlineEnv, InlineParse, InlineRule, PairingFn, Trigger,
    is_punctuation,
};
pub use lines::{Line, LineCursor, is_blank, leading_spaces, normalize, strip_indent};
pub use references::{LinkTarget, References, normalize_label};

use crate::ast::{Block, BlockContent, Document};
use crate::error::ParseError;
use crate::extension::TransformPhase;
use crate::metadata::Metadata;
use crate::registry::{ParsingRules, Registry};

/// Nesting cap applied when none is configured.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 1000;

/// Per-parse options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum container/span nesting depth.
    pub max_nesting_depth: usize,
    /// Whether to look for front matter at offset zero.
    pub front_matter: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            front_matter: true,
        }
    }
}

/// Parser bound to a registry's parsing rules.
pub struct Parser<'r> {
    rules: &'r ParsingRules,
    options: ParseOptions,
}

impl<'r> Parser<'r> {
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            rules: registry.parsing_rules(),
            options: ParseOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Parse one document.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::ExcessiveNestingDepth`] if the document nests
    /// deeper than the configured cap.
    pub fn parse(&self, text: &str) -> Result<Document, ParseError> {
        let text = normalize(text);
        let max_depth = self.options.max_nesting_depth;

        let (metadata, body_offset) = self
            .options
            .front_matter
            .then(|| self.rules.front_matter())
            .flatten()
            .and_then(|rule| rule.extract(&text))
            .map_or((Metadata::new(), 0), |fm| (fm.metadata, fm.body_offset));
        let body_offset = body_offset.min(text.len());

        let cx = BlockContext::new(self.rules.blocks(), max_depth);
        let nested = block::parse_blocks(&text[body_offset..], body_offset, &cx)?;
        let mut document = Document {
            blocks: nested.blocks,
            metadata,
        };

        for transform in self.rules.transforms(TransformPhase::BeforeInline) {
            transform.apply(&mut document);
        }

        let references = References::collect(&document.blocks);
        let env = InlineEnv {
            rules: self.rules.inlines(),
            references: &references,
            max_depth,
        };
        inline_pass(&mut document.blocks, &env, 0)?;

        for transform in self.rules.transforms(TransformPhase::AfterInline) {
            transform.apply(&mut document);
        }

        tracing::debug!(
            blocks = document.blocks.len(),
            metadata = document.metadata.len(),
            "Parsed document"
        );
        Ok(document)
    }
}

fn inline_pass(blocks: &mut [Block], env: &InlineEnv<'_>, depth: usize) -> Result<(), ParseError> {
    for block in blocks {
        match &mut block.content {
            BlockContent::Raw(text) => {
                let inlines = inline::parse_inlines(text, env, depth, false, block.span)?;
                block.content = BlockContent::Inlines(inlines);
            }
            BlockContent::Blocks(children) => inline_pass(children, env, depth + 1)?,
            BlockContent::Inlines(_) | BlockContent::Literal(_) | BlockContent::Empty => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BlockKind, InlineKind, plain_text};
    use crate::ext::{CoreSyntax, FrontMatterExtension};

    fn core() -> Registry {
        Registry::builder().with_extension(CoreSyntax).build().unwrap()
    }

    #[test]
    fn test_no_raw_content_survives() {
        let registry = core();
        let doc = Parser::new(&registry)
            .parse("# Title\n\n> quote *x*\n\n- a\n- b\n")
            .unwrap();
        let mut raw = 0;
        crate::ast::walk_blocks(&doc.blocks, &mut |block| {
            if matches!(block.content, BlockContent::Raw(_)) {
                raw += 1;
            }
        });
        assert_eq!(raw, 0);
    }

    #[test]
    fn test_front_matter_round_trip() {
        let registry = Registry::builder()
            .with_extension(FrontMatterExtension)
            .with_extension(CoreSyntax)
            .build()
            .unwrap();
        let doc = Parser::new(&registry)
            .parse("---\ntitle: Hello\n---\n# Body")
            .unwrap();
        assert_eq!(
            doc.metadata.get("title").and_then(|v| v.as_str()),
            Some("Hello")
        );
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].kind, BlockKind::Heading);
        assert_eq!(plain_text(doc.blocks[0].inlines()), "Body");
    }

    #[test]
    fn test_front_matter_can_be_disabled() {
        let registry = Registry::builder()
            .with_extension(FrontMatterExtension)
            .with_extension(CoreSyntax)
            .build()
            .unwrap();
        let doc = Parser::new(&registry)
            .with_options(ParseOptions {
                front_matter: false,
                ..ParseOptions::default()
            })
            .parse("---\ntitle: Hello\n---\n# Body")
            .unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.blocks[0].kind, BlockKind::ThematicBreak);
    }

    #[test]
    fn test_front_matter_only_at_offset_zero() {
        let registry = Registry::builder()
            .with_extension(FrontMatterExtension)
            .with_extension(CoreSyntax)
            .build()
            .unwrap();
        let doc = Parser::new(&registry)
            .parse("intro\n\n---\ntitle: Hello\n---\n")
            .unwrap();
        assert!(doc.metadata.is_empty());
    }

    #[test]
    fn test_crlf_input() {
        let registry = core();
        let doc = Parser::new(&registry).parse("a\r\nb\r\n").unwrap();
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].inlines()[1].kind, InlineKind::SoftBreak);
    }
}
