//! Document model produced by the parser and consumed by the renderer.
//!
//! Node kinds are closed, fieldless enums. Payload that varies per kind
//! (heading level, link target, emoji shortcode, ...) lives in an ordered
//! [`Attributes`] map so that every kind shares one node shape and the
//! renderer can key its rule table on the kind alone.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::metadata::Metadata;

/// Byte range in the source text. Diagnostics only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Structural node kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Heading,
    ThematicBreak,
    CodeBlock,
    BlockQuote,
    BulletList,
    OrderedList,
    ListItem,
    TaskItem,
    LinkDefinition,
    AbbreviationDefinition,
    DefinitionList,
    DefinitionTerm,
    DefinitionDetails,
    FootnoteDefinition,
    FootnoteSection,
    MacroDefinition,
}

impl BlockKind {
    /// Stable lowercase name used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::ThematicBreak => "thematic_break",
            Self::CodeBlock => "code_block",
            Self::BlockQuote => "block_quote",
            Self::BulletList => "bullet_list",
            Self::OrderedList => "ordered_list",
            Self::ListItem => "list_item",
            Self::TaskItem => "task_item",
            Self::LinkDefinition => "link_definition",
            Self::AbbreviationDefinition => "abbreviation_definition",
            Self::DefinitionList => "definition_list",
            Self::DefinitionTerm => "definition_term",
            Self::DefinitionDetails => "definition_details",
            Self::FootnoteDefinition => "footnote_definition",
            Self::FootnoteSection => "footnote_section",
            Self::MacroDefinition => "macro_definition",
        }
    }

    /// Whether blocks of this kind may hold other blocks.
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(
            self,
            Self::BlockQuote
                | Self::BulletList
                | Self::OrderedList
                | Self::ListItem
                | Self::TaskItem
                | Self::DefinitionList
                | Self::DefinitionDetails
                | Self::FootnoteDefinition
                | Self::FootnoteSection
                | Self::MacroDefinition
        )
    }
}

/// Span-level node kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineKind {
    Text,
    SoftBreak,
    HardBreak,
    Code,
    Emphasis,
    Strong,
    Strikethrough,
    Subscript,
    Link,
    Image,
    Autolink,
    EscapedChar,
    Emoji,
    Abbreviation,
    FootnoteReference,
    IssueReference,
    MacroReference,
    MediaTag,
    Typographic,
    Anchor,
}

impl InlineKind {
    /// Stable lowercase name used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::SoftBreak => "soft_break",
            Self::HardBreak => "hard_break",
            Self::Code => "code",
            Self::Emphasis => "emphasis",
            Self::Strong => "strong",
            Self::Strikethrough => "strikethrough",
            Self::Subscript => "subscript",
            Self::Link => "link",
            Self::Image => "image",
            Self::Autolink => "autolink",
            Self::EscapedChar => "escaped_char",
            Self::Emoji => "emoji",
            Self::Abbreviation => "abbreviation",
            Self::FootnoteReference => "footnote_reference",
            Self::IssueReference => "issue_reference",
            Self::MacroReference => "macro_reference",
            Self::MediaTag => "media_tag",
            Self::Typographic => "typographic",
            Self::Anchor => "anchor",
        }
    }
}

/// Either kind of node, used as the render table key and in errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NodeKind {
    Block(BlockKind),
    Inline(InlineKind),
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block(kind) => write!(f, "block `{}`", kind.name()),
            Self::Inline(kind) => write!(f, "inline `{}`", kind.name()),
        }
    }
}

impl From<BlockKind> for NodeKind {
    fn from(kind: BlockKind) -> Self {
        Self::Block(kind)
    }
}

impl From<InlineKind> for NodeKind {
    fn from(kind: InlineKind) -> Self {
        Self::Inline(kind)
    }
}

/// Ordered string attributes attached to a node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_owned(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Attribute parsed as a boolean flag (`"true"`).
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Content held by a [`Block`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum BlockContent {
    /// Child blocks (containers).
    Blocks(Vec<Block>),
    /// Parsed inline content (leaves).
    Inlines(Vec<Inline>),
    /// Verbatim text that is never inline-parsed (code blocks).
    Literal(String),
    /// Inline source awaiting the inline pass. Never present in a parsed [`Document`].
    Raw(String),
    /// No content.
    Empty,
}

/// A structural node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Block {
    pub kind: BlockKind,
    #[serde(skip_serializing_if = "Attributes::is_empty")]
    pub attrs: Attributes,
    pub content: BlockContent,
    pub span: Span,
}

impl Block {
    #[must_use]
    pub fn new(kind: BlockKind, content: BlockContent, span: Span) -> Self {
        Self {
            kind,
            attrs: Attributes::new(),
            content,
            span,
        }
    }

    #[must_use]
    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    /// Child blocks, empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Block] {
        match &self.content {
            BlockContent::Blocks(blocks) => blocks,
            _ => &[],
        }
    }

    /// Mutable child blocks, `None` for leaves.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Block>> {
        match &mut self.content {
            BlockContent::Blocks(blocks) => Some(blocks),
            _ => None,
        }
    }

    /// Parsed inline content, empty for containers.
    #[must_use]
    pub fn inlines(&self) -> &[Inline] {
        match &self.content {
            BlockContent::Inlines(inlines) => inlines,
            _ => &[],
        }
    }
}

/// A span-level node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Inline {
    pub kind: InlineKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub literal: String,
    #[serde(skip_serializing_if = "Attributes::is_empty")]
    pub attrs: Attributes,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Inline>,
}

impl Inline {
    /// Leaf node carrying literal text.
    #[must_use]
    pub fn leaf(kind: InlineKind, literal: impl Into<String>) -> Self {
        Self {
            kind,
            literal: literal.into(),
            attrs: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Plain text run.
    #[must_use]
    pub fn text(literal: impl Into<String>) -> Self {
        Self::leaf(InlineKind::Text, literal)
    }

    /// Node wrapping child inlines.
    #[must_use]
    pub fn container(kind: InlineKind, children: Vec<Inline>) -> Self {
        Self {
            kind,
            literal: String::new(),
            attrs: Attributes::new(),
            children,
        }
    }

    #[must_use]
    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    /// Concatenated text of this node and its descendants.
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self.kind {
            InlineKind::SoftBreak | InlineKind::HardBreak => out.push(' '),
            _ => out.push_str(&self.literal),
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

/// Plain text of a sequence of inlines.
#[must_use]
pub fn plain_text(inlines: &[Inline]) -> String {
    inlines.iter().map(Inline::plain_text).collect()
}

/// Root of the AST.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Document {
    pub blocks: Vec<Block>,
    pub metadata: Metadata,
}

impl Document {
    /// Visit every block depth-first, pre-order.
    pub fn walk_blocks_mut(&mut self, visit: &mut impl FnMut(&mut Block)) {
        walk_blocks_mut(&mut self.blocks, visit);
    }
}

/// Visit every block in `blocks` depth-first, pre-order.
pub fn walk_blocks_mut(blocks: &mut [Block], visit: &mut impl FnMut(&mut Block)) {
    for block in blocks {
        visit(block);
        if let BlockContent::Blocks(children) = &mut block.content {
            walk_blocks_mut(children, visit);
        }
    }
}

/// Visit every block in `blocks` depth-first, pre-order.
pub fn walk_blocks(blocks: &[Block], visit: &mut impl FnMut(&Block)) {
    for block in blocks {
        visit(block);
        walk_blocks(block.children(), visit);
    }
}

/// Visit every inline in `inlines` depth-first, pre-order.
pub fn walk_inlines_mut(inlines: &mut [Inline], visit: &mut impl FnMut(&mut Inline)) {
    for inline in inlines {
        visit(inline);
        walk_inlines_mut(&mut inline.children, visit);
    }
}
