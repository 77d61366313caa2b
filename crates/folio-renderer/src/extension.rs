//! Extension contract.
//!
//! An [`Extension`] is a named bundle of parsing rules and rendering rules for
//! one markup feature. Extensions are composed by a
//! [`RegistryBuilder`](crate::RegistryBuilder); the order in which they are
//! registered decides parsing precedence (first match wins), while rendering
//! rules are looked up by node kind (last registration wins).
//!
//! # Example
//!
//! ```
//! use folio_renderer::{
//!     Block, BlockKind, Extension, Registry, RenderContext, RenderError, RenderRule,
//! };
//!
//! fn loud_paragraph(block: &Block, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
//!     cx.push_str("<p class=\"loud\">");
//!     cx.render_children(block)?;
//!     cx.push_str("</p>\n");
//!     Ok(())
//! }
//!
//! struct LoudParagraphs;
//!
//! impl Extension for LoudParagraphs {
//!     fn name(&self) -> &str { "loud" }
//!
//!     fn rendering_rules(&self) -> Vec<RenderRule> {
//!         vec![RenderRule::block(BlockKind::Paragraph, loud_paragraph)]
//!     }
//! }
//!
//! let registry = Registry::builder()
//!     .with_extension(folio_renderer::ext::CoreSyntax)
//!     .with_extension(LoudParagraphs)
//!     .build()
//!     .unwrap();
//! assert_eq!(registry.extension_names().collect::<Vec<_>>(), ["core", "loud"]);
//! ```

use std::sync::Arc;

use crate::ast::{BlockKind, Document, InlineKind};
use crate::metadata::Metadata;
use crate::parser::{BlockRule, InlineRule};
use crate::renderer::{BlockRenderer, InlineRenderer};

/// A self-contained markup feature.
pub trait Extension: Send + Sync {
    /// Stable identifying name, unique within a registry.
    fn name(&self) -> &str;

    /// Parsing rules contributed by this extension, in precedence order.
    fn parsing_rules(&self) -> Vec<ParseRule> {
        Vec::new()
    }

    /// Rendering rules contributed by this extension.
    fn rendering_rules(&self) -> Vec<RenderRule> {
        Vec::new()
    }
}

/// A parsing-rule registration.
#[derive(Clone)]
pub enum ParseRule {
    /// Metadata block at offset zero.
    FrontMatter(Arc<dyn FrontMatterRule>),
    /// Block-start rule, offered each line start.
    Block(Arc<dyn BlockRule>),
    /// Inline rule, offered each position whose character matches its trigger.
    Inline(Arc<dyn InlineRule>),
    /// Whole-document rewrite run between or after the passes.
    Transform(Arc<dyn DocumentTransform>),
}

impl ParseRule {
    pub fn block(rule: impl BlockRule + 'static) -> Self {
        Self::Block(Arc::new(rule))
    }

    pub fn inline(rule: impl InlineRule + 'static) -> Self {
        Self::Inline(Arc::new(rule))
    }

    pub fn front_matter(rule: impl FrontMatterRule + 'static) -> Self {
        Self::FrontMatter(Arc::new(rule))
    }

    pub fn transform(transform: impl DocumentTransform + 'static) -> Self {
        Self::Transform(Arc::new(transform))
    }
}

/// A rendering-rule registration, bound to the node kind it renders.
#[derive(Clone)]
pub enum RenderRule {
    Block(BlockKind, Arc<dyn BlockRenderer>),
    Inline(InlineKind, Arc<dyn InlineRenderer>),
}

impl RenderRule {
    pub fn block(kind: BlockKind, renderer: impl BlockRenderer + 'static) -> Self {
        Self::Block(kind, Arc::new(renderer))
    }

    pub fn inline(kind: InlineKind, renderer: impl InlineRenderer + 'static) -> Self {
        Self::Inline(kind, Arc::new(renderer))
    }
}

/// Result of a successful front-matter extraction.
#[derive(Clone, Debug, PartialEq)]
pub struct FrontMatter {
    /// Parsed metadata.
    pub metadata: Metadata,
    /// Byte offset where the body starts (just past the closing marker line).
    pub body_offset: usize,
}

/// Splits a metadata block from the head of a document.
pub trait FrontMatterRule: Send + Sync {
    /// Inspect the document head. Called exactly once per parse, at offset zero.
    fn extract(&self, text: &str) -> Option<FrontMatter>;
}

/// When a [`DocumentTransform`] runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformPhase {
    /// After the block pass; leaf content is still raw inline source.
    BeforeInline,
    /// After the inline pass.
    AfterInline,
}

/// Rewrites a parsed document in place.
pub trait DocumentTransform: Send + Sync {
    fn phase(&self) -> TransformPhase;

    fn apply(&self, document: &mut Document);
}
