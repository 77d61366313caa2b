//! Extension-composable markdown parser and HTML renderer.
//!
//! Every piece of syntax, including the CommonMark baseline, is contributed by
//! an [`Extension`]. Extensions are assembled once into an immutable
//! [`Registry`]; the same registry drives both the [`Parser`] (first matching
//! rule wins, in registration order) and the [`Renderer`] (rules looked up by
//! node kind, last registration wins), so the two sides cannot drift apart.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use folio_renderer::ext::{StandardOptions, standard_registry};
//! use folio_renderer::{Pipeline, PipelineOptions};
//!
//! let registry = standard_registry(None, &StandardOptions::default()).unwrap();
//! let pipeline = Pipeline::new(Arc::new(registry), PipelineOptions::default());
//!
//! let rendered = pipeline
//!     .render_document("---\ntitle: Hello\n---\nSome **bold** text")
//!     .unwrap();
//! assert_eq!(rendered.html, "<p>Some <strong>bold</strong> text</p>\n");
//! assert_eq!(rendered.metadata.get("title").and_then(|v| v.as_str()), Some("Hello"));
//! ```

mod ast;
mod error;
pub mod ext;
mod extension;
mod html;
mod metadata;
pub mod parser;
mod pipeline;
mod registry;
mod renderer;
mod util;

pub use ast::{
    Attributes, Block, BlockContent, BlockKind, Document, Inline, InlineKind, NodeKind, Span,
    plain_text, walk_blocks, walk_blocks_mut, walk_inlines_mut,
};
pub use error::{ParseError, PipelineError, RegistryError, RenderError};
pub use extension::{
    DocumentTransform, Extension, FrontMatter, FrontMatterRule, ParseRule, RenderRule,
    TransformPhase,
};
pub use html::{escape_html, push_escaped, sanitize_url};
pub use metadata::{MetaValue, Metadata, Scalar, UNPARSED_KEY};
pub use parser::{DEFAULT_MAX_NESTING_DEPTH, ParseOptions, Parser};
pub use pipeline::{Pipeline, PipelineOptions, RenderedDocument};
pub use registry::{ExtensionSummary, ParsingRules, Registry, RegistryBuilder};
pub use renderer::{BlockRenderer, InlineRenderer, RenderContext, RenderTable, Renderer};
pub use util::{SlugSet, slugify};
