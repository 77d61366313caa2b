//! Renderer: [`Document`] to HTML.
//!
//! Rendering rules are looked up by exact node kind in a [`RenderTable`]
//! built once per registry. A rule writes its own wrapping markup into the
//! [`RenderContext`] and calls back into it for children. A node kind with no
//! rule fails the render instead of being skipped.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::{Block, BlockContent, BlockKind, Document, Inline, InlineKind};
use crate::error::RenderError;
use crate::extension::RenderRule;
use crate::html::push_escaped;
use crate::parser::DEFAULT_MAX_NESTING_DEPTH;
use crate::registry::Registry;

/// Renders one block kind.
pub trait BlockRenderer: Send + Sync {
    fn render(&self, block: &Block, cx: &mut RenderContext<'_>) -> Result<(), RenderError>;
}

impl<F> BlockRenderer for F
where
    F: Fn(&Block, &mut RenderContext<'_>) -> Result<(), RenderError> + Send + Sync,
{
    fn render(&self, block: &Block, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
        self(block, cx)
    }
}

/// Renders one inline kind.
pub trait InlineRenderer: Send + Sync {
    fn render(&self, inline: &Inline, cx: &mut RenderContext<'_>) -> Result<(), RenderError>;
}

impl<F> InlineRenderer for F
where
    F: Fn(&Inline, &mut RenderContext<'_>) -> Result<(), RenderError> + Send + Sync,
{
    fn render(&self, inline: &Inline, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
        self(inline, cx)
    }
}

/// Kind-keyed rendering rules.
#[derive(Clone, Default)]
pub struct RenderTable {
    blocks: HashMap<BlockKind, Arc<dyn BlockRenderer>>,
    inlines: HashMap<InlineKind, Arc<dyn InlineRenderer>>,
}

impl RenderTable {
    /// Build from rules in registration order; a later rule for the same
    /// kind replaces an earlier one.
    pub fn from_rules<'a>(rules: impl IntoIterator<Item = &'a RenderRule>) -> Self {
        let mut table = Self::default();
        for rule in rules {
            match rule {
                RenderRule::Block(kind, renderer) => {
                    table.blocks.insert(*kind, Arc::clone(renderer));
                }
                RenderRule::Inline(kind, renderer) => {
                    table.inlines.insert(*kind, Arc::clone(renderer));
                }
            }
        }
        table
    }

    #[must_use]
    pub fn has_block(&self, kind: BlockKind) -> bool {
        self.blocks.contains_key(&kind)
    }

    #[must_use]
    pub fn has_inline(&self, kind: InlineKind) -> bool {
        self.inlines.contains_key(&kind)
    }
}

/// Renderer bound to a registry's rendering table.
pub struct Renderer<'r> {
    table: &'r RenderTable,
    max_depth: usize,
}

impl<'r> Renderer<'r> {
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            table: registry.render_table(),
            max_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Render a document to an HTML fragment.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnrenderableNodeKind`] for a node kind with no
    /// rendering rule, and [`RenderError::ExcessiveNestingDepth`] if the tree
    /// is deeper than the cap.
    pub fn render(&self, document: &Document) -> Result<String, RenderError> {
        let mut cx = RenderContext {
            table: self.table,
            document,
            out: String::new(),
            depth: 0,
            max_depth: self.max_depth,
            macro_stack: Vec::new(),
        };
        cx.render_blocks(&document.blocks)?;
        tracing::debug!(bytes = cx.out.len(), "Rendered document");
        Ok(cx.out)
    }
}

/// Output buffer and recursion handle passed to rendering rules.
pub struct RenderContext<'a> {
    table: &'a RenderTable,
    document: &'a Document,
    out: String,
    depth: usize,
    max_depth: usize,
    macro_stack: Vec<String>,
}

impl<'a> RenderContext<'a> {
    pub fn push_str(&mut self, s: &str) {
        self.out.push_str(s);
    }

    /// Append `s`, HTML-escaped.
    pub fn push_escaped(&mut self, s: &str) {
        push_escaped(&mut self.out, s);
    }

    /// Output so far.
    #[must_use]
    pub fn out(&self) -> &str {
        &self.out
    }

    /// The document being rendered.
    #[must_use]
    pub fn document(&self) -> &'a Document {
        self.document
    }

    pub fn render_blocks(&mut self, blocks: &[Block]) -> Result<(), RenderError> {
        for block in blocks {
            self.render_block(block)?;
        }
        Ok(())
    }

    pub fn render_block(&mut self, block: &Block) -> Result<(), RenderError> {
        let table = self.table;
        let renderer = table
            .blocks
            .get(&block.kind)
            .ok_or(RenderError::UnrenderableNodeKind {
                kind: block.kind.into(),
            })?;
        renderer.render(block, self)
    }

    pub fn render_inlines(&mut self, inlines: &[Inline]) -> Result<(), RenderError> {
        for inline in inlines {
            self.render_inline(inline)?;
        }
        Ok(())
    }

    pub fn render_inline(&mut self, inline: &Inline) -> Result<(), RenderError> {
        let table = self.table;
        let renderer = table
            .inlines
            .get(&inline.kind)
            .ok_or(RenderError::UnrenderableNodeKind {
                kind: inline.kind.into(),
            })?;
        renderer.render(inline, self)
    }

    /// Render a block's content: child blocks one level deeper, inline
    /// content in place, literal text escaped.
    pub fn render_children(&mut self, block: &Block) -> Result<(), RenderError> {
        match &block.content {
            BlockContent::Blocks(children) => self.descend(|cx| cx.render_blocks(children)),
            BlockContent::Inlines(inlines) => self.render_inlines(inlines),
            BlockContent::Literal(text) | BlockContent::Raw(text) => {
                self.push_escaped(text);
                Ok(())
            }
            BlockContent::Empty => Ok(()),
        }
    }

    /// Render an inline's children one level deeper.
    pub fn render_inline_children(&mut self, inline: &Inline) -> Result<(), RenderError> {
        if inline.children.is_empty() {
            return Ok(());
        }
        self.descend(|cx| cx.render_inlines(&inline.children))
    }

    /// Run `f` one nesting level deeper.
    pub fn descend(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<(), RenderError>,
    ) -> Result<(), RenderError> {
        if self.depth + 1 > self.max_depth {
            return Err(RenderError::ExcessiveNestingDepth {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Whether a macro of this name is currently being expanded.
    #[must_use]
    pub fn is_expanding(&self, name: &str) -> bool {
        self.macro_stack.iter().any(|active| active == name)
    }

    /// Run `f` with `name` marked as being expanded.
    pub fn expanding(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut Self) -> Result<(), RenderError>,
    ) -> Result<(), RenderError> {
        self.macro_stack.push(name.to_owned());
        let result = f(self);
        self.macro_stack.pop();
        result
    }
}
