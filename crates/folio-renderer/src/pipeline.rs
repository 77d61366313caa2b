//! One-call entry point: text in, HTML plus metadata out.

use std::sync::Arc;

use serde::Serialize;

use crate::ast::Document;
use crate::error::{ParseError, PipelineError, RenderError};
use crate::metadata::Metadata;
use crate::parser::{DEFAULT_MAX_NESTING_DEPTH, ParseOptions, Parser};
use crate::registry::Registry;
use crate::renderer::Renderer;

/// Options shared by the parse and render halves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineOptions {
    pub max_nesting_depth: usize,
    pub front_matter: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            front_matter: true,
        }
    }
}

impl PipelineOptions {
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    #[must_use]
    pub fn with_front_matter(mut self, enabled: bool) -> Self {
        self.front_matter = enabled;
        self
    }
}

/// Output handed to the templating collaborator.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedDocument {
    pub html: String,
    pub metadata: Metadata,
}

/// Parser and renderer over one shared registry.
///
/// Cheap to clone; every call owns its own document, so one pipeline can
/// serve any number of threads.
#[derive(Clone)]
pub struct Pipeline {
    registry: Arc<Registry>,
    options: PipelineOptions,
}

impl Pipeline {
    #[must_use]
    pub fn new(registry: Arc<Registry>, options: PipelineOptions) -> Self {
        Self { registry, options }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Parse only.
    ///
    /// # Errors
    ///
    /// Fails only when the nesting cap is exceeded.
    pub fn parse(&self, text: &str) -> Result<Document, ParseError> {
        Parser::new(&self.registry)
            .with_options(ParseOptions {
                max_nesting_depth: self.options.max_nesting_depth,
                front_matter: self.options.front_matter,
            })
            .parse(text)
    }

    /// Render an already parsed document.
    ///
    /// # Errors
    ///
    /// Fails on an unrenderable node kind or the nesting cap.
    pub fn render(&self, document: &Document) -> Result<String, RenderError> {
        Renderer::new(&self.registry)
            .with_max_depth(self.options.max_nesting_depth)
            .render(document)
    }

    /// Parse, render, and hand back the HTML with the document's metadata.
    ///
    /// # Errors
    ///
    /// Returns the parse or render failure for this document.
    pub fn render_document(&self, text: &str) -> Result<RenderedDocument, PipelineError> {
        let document = self.parse(text)?;
        let html = self.render(&document)?;
        Ok(RenderedDocument {
            html,
            metadata: document.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    static_assertions::assert_impl_all!(super::Pipeline: Send, Sync, Clone);
    static_assertions::assert_impl_all!(super::Registry: Send, Sync);

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::{Block, BlockContent, BlockKind, Span};
    use crate::ext::{CoreSyntax, StandardOptions, standard_registry};
    use crate::extension::{Extension, ParseRule};
    use crate::parser::{BlockContext, BlockRule, LineCursor};

    fn standard() -> Pipeline {
        let registry = standard_registry(None, &StandardOptions::default()).unwrap();
        Pipeline::new(Arc::new(registry), PipelineOptions::default())
    }

    fn core_only() -> Pipeline {
        let registry = Registry::builder().with_extension(CoreSyntax).build().unwrap();
        Pipeline::new(Arc::new(registry), PipelineOptions::default())
    }

    #[test]
    fn test_front_matter_round_trip() {
        let rendered = standard()
            .render_document("---\ntitle: Hello\n---\n# Body")
            .unwrap();
        assert_eq!(
            rendered.metadata.get("title").and_then(|v| v.as_str()),
            Some("Hello")
        );
        assert!(rendered.html.contains(">Body</h1>"));
        assert!(!rendered.html.contains("---"));
        assert!(!rendered.html.contains("title"));
    }

    #[test]
    fn test_no_front_matter_gives_empty_metadata() {
        let rendered = standard().render_document("plain").unwrap();
        assert!(rendered.metadata.is_empty());
        assert_eq!(rendered.html, "<p>plain</p>\n");
    }

    #[test]
    fn test_extensions_are_additive() {
        let inputs = [
            "Some *emphasis* and **strong** text.\n",
            "- one\n- two\n\n1. first\n2. second\n",
            "> quoted\n> text\n\n```rust\nfn main() {}\n```\n",
            "A [link](http://example.com \"t\") and `code`.\n\n---\n",
            "para\n\n    indented code\n",
            "line one  \nline two\\\nline three\n",
            "[ref]: /url\n\nSee [ref] and ![img](/i.png).\n",
        ];
        let standard = standard();
        let core = core_only();
        for input in inputs {
            let with_extensions = standard.render_document(input).unwrap().html;
            let baseline = core.render_document(input).unwrap().html;
            assert_eq!(with_extensions, baseline, "input: {input:?}");
        }
    }

    #[test]
    fn test_unterminated_emphasis_is_literal() {
        assert_eq!(
            standard().render_document("*word").unwrap().html,
            "<p>*word</p>\n"
        );
    }

    #[test]
    fn test_asymmetric_emphasis() {
        assert_eq!(
            standard().render_document("***word**").unwrap().html,
            "<p>*<strong>word</strong></p>\n"
        );
    }

    struct Claims {
        name: &'static str,
        kind: BlockKind,
    }

    struct ClaimRule(BlockKind);

    impl BlockRule for ClaimRule {
        fn name(&self) -> &'static str {
            "claim"
        }

        fn can_start(&self, lines: &LineCursor<'_>) -> bool {
            lines.peek().is_some_and(|line| line.text.starts_with("%%"))
        }

        fn parse(
            &self,
            lines: &mut LineCursor<'_>,
            _cx: &BlockContext<'_>,
        ) -> Result<Block, ParseError> {
            let line = lines.bump().map_or_else(String::new, |l| l.text.to_owned());
            Ok(Block::new(self.0, BlockContent::Literal(line), Span::default()))
        }
    }

    impl Extension for Claims {
        fn name(&self) -> &str {
            self.name
        }

        fn parsing_rules(&self) -> Vec<ParseRule> {
            vec![ParseRule::block(ClaimRule(self.kind))]
        }
    }

    #[test]
    fn test_registration_order_decides_block_kind() {
        for _ in 0..10 {
            let registry = Registry::builder()
                .with_extension(Claims {
                    name: "a",
                    kind: BlockKind::CodeBlock,
                })
                .with_extension(Claims {
                    name: "b",
                    kind: BlockKind::ThematicBreak,
                })
                .with_extension(CoreSyntax)
                .build()
                .unwrap();
            let pipeline = Pipeline::new(Arc::new(registry), PipelineOptions::default());
            let doc = pipeline.parse("%% claimed").unwrap();
            assert_eq!(doc.blocks[0].kind, BlockKind::CodeBlock);
        }
    }

    #[test]
    fn test_parse_rule_without_renderer_fails_closed() {
        let registry = Registry::builder()
            .with_extension(Claims {
                name: "orphan",
                kind: BlockKind::MacroDefinition,
            })
            .with_extension(CoreSyntax)
            .build()
            .unwrap();
        let pipeline = Pipeline::new(Arc::new(registry), PipelineOptions::default());
        let err = pipeline.render_document("before\n\n%% x\n").unwrap_err();
        assert_eq!(
            err,
            PipelineError::Render(RenderError::UnrenderableNodeKind {
                kind: BlockKind::MacroDefinition.into()
            })
        );
    }

    #[test]
    fn test_nesting_cap_on_deep_block_quotes() {
        // Run on a big stack so a regression fails the assertion instead of
        // overflowing the test thread.
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024 * 1024)
            .spawn(|| {
                let pipeline = standard();
                let input = format!("{} deep\n", ">".repeat(2000));
                let err = pipeline.render_document(&input).unwrap_err();
                assert!(err.is_excessive_nesting());

                let spaced = format!("{}deep\n", "> ".repeat(2000));
                let err = pipeline.render_document(&spaced).unwrap_err();
                assert!(err.is_excessive_nesting());

                let ok = format!("{} shallow\n", ">".repeat(50));
                assert!(pipeline.render_document(&ok).is_ok());
            })
            .unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_nesting_cap_on_deep_lists() {
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024 * 1024)
            .spawn(|| {
                let registry = Registry::builder().with_extension(CoreSyntax).build().unwrap();
                let pipeline = Pipeline::new(
                    Arc::new(registry),
                    PipelineOptions::default().with_max_nesting_depth(20),
                );
                let input: String = (0..40)
                    .map(|level| format!("{}- item\n", "  ".repeat(level)))
                    .collect();
                let err = pipeline.render_document(&input).unwrap_err();
                assert!(err.is_excessive_nesting());
            })
            .unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_pipeline_is_shareable() {
        let pipeline = standard();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let pipeline = pipeline.clone();
                std::thread::spawn(move || pipeline.render_document(&format!("# T{i}")).unwrap())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().html.starts_with("<h1"));
        }
    }
}
