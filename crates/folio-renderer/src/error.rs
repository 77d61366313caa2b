//! Error types for registry assembly, parsing and rendering.
//!
//! Malformed markup is not an error: the parser always degrades it to a
//! literal text run or an implicit paragraph.

use crate::ast::{NodeKind, Span};

/// Error raised while assembling a [`Registry`](crate::Registry).
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Two extensions share a name.
    #[error("duplicate extension name: {0}")]
    DuplicateExtensionName(String),
}

/// Error that aborts parsing of one document.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Container or span nesting went past the configured cap.
    #[error("nesting depth exceeds limit of {limit} (at bytes {}..{})", .span.start, .span.end)]
    ExcessiveNestingDepth {
        /// Configured cap.
        limit: usize,
        /// Where the offending construct starts.
        span: Span,
    },
}

/// Error that aborts rendering of one document.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// A node kind reached the renderer with no rendering rule registered for it.
    #[error("no rendering rule registered for {kind}")]
    UnrenderableNodeKind {
        /// The offending kind.
        kind: NodeKind,
    },
    /// Render recursion went past the configured cap.
    #[error("render nesting depth exceeds limit of {limit}")]
    ExcessiveNestingDepth {
        /// Configured cap.
        limit: usize,
    },
}

/// Error returned by [`Pipeline::render_document`](crate::Pipeline::render_document).
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Render(#[from] RenderError),
}

impl PipelineError {
    /// Whether the failure was a nesting cap, on either side of the pipeline.
    #[must_use]
    pub fn is_excessive_nesting(&self) -> bool {
        matches!(
            self,
            Self::Parse(ParseError::ExcessiveNestingDepth { .. })
                | Self::Render(RenderError::ExcessiveNestingDepth { .. })
        )
    }
}
