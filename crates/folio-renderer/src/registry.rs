//! Ordered, immutable collection of extensions.
//!
//! A [`Registry`] is assembled once at startup and then shared read-only
//! (typically behind an `Arc`) by every parse and render call. Both the
//! parsing rule set and the rendering table are derived from the same
//! extension list, so they cannot diverge.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::extension::{
    DocumentTransform, Extension, FrontMatterRule, ParseRule, RenderRule, TransformPhase,
};
use crate::parser::{BlockRule, InlineRule};
use crate::renderer::RenderTable;

/// Parsing rules of every registered extension, concatenated in registration order.
#[derive(Clone, Default)]
pub struct ParsingRules {
    front_matter: Vec<Arc<dyn FrontMatterRule>>,
    blocks: Vec<Arc<dyn BlockRule>>,
    inlines: Vec<Arc<dyn InlineRule>>,
    transforms: Vec<Arc<dyn DocumentTransform>>,
}

impl ParsingRules {
    fn push(&mut self, rule: ParseRule) {
        match rule {
            ParseRule::FrontMatter(rule) => self.front_matter.push(rule),
            ParseRule::Block(rule) => self.blocks.push(rule),
            ParseRule::Inline(rule) => self.inlines.push(rule),
            ParseRule::Transform(transform) => self.transforms.push(transform),
        }
    }

    /// The front-matter rule in effect: the first one registered.
    pub fn front_matter(&self) -> Option<&dyn FrontMatterRule> {
        self.front_matter.first().map(AsRef::as_ref)
    }

    pub fn blocks(&self) -> &[Arc<dyn BlockRule>] {
        &self.blocks
    }

    pub fn inlines(&self) -> &[Arc<dyn InlineRule>] {
        &self.inlines
    }

    /// Transforms for one phase, in registration order.
    pub fn transforms(
        &self,
        phase: TransformPhase,
    ) -> impl Iterator<Item = &dyn DocumentTransform> {
        self.transforms
            .iter()
            .filter(move |t| t.phase() == phase)
            .map(AsRef::as_ref)
    }
}

struct Registered {
    name: String,
    parse_rules: Vec<ParseRule>,
    render_rules: Vec<RenderRule>,
}

/// Summary of one registered extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionSummary {
    pub name: String,
    pub parse_rules: usize,
    pub render_rules: usize,
}

/// Immutable, ordered extension set.
pub struct Registry {
    extensions: Vec<Registered>,
    parsing: ParsingRules,
    render_table: RenderTable,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field(
                "extensions",
                &self.extensions.iter().map(|e| &e.name).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Start assembling a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Union of parsing rules, in registration order.
    pub fn parsing_rules(&self) -> &ParsingRules {
        &self.parsing
    }

    /// Concatenation of rendering rules, in registration order.
    pub fn rendering_rules(&self) -> impl Iterator<Item = &RenderRule> {
        self.extensions.iter().flat_map(|e| e.render_rules.iter())
    }

    /// Kind-keyed rendering table (last registration per kind wins).
    pub fn render_table(&self) -> &RenderTable {
        &self.render_table
    }

    /// Extension names, in registration order.
    pub fn extension_names(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(|e| e.name.as_str())
    }

    pub fn summaries(&self) -> Vec<ExtensionSummary> {
        self.extensions
            .iter()
            .map(|e| ExtensionSummary {
                name: e.name.clone(),
                parse_rules: e.parse_rules.len(),
                render_rules: e.render_rules.len(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

/// Builder for [`Registry`].
///
/// Registration order is significant: earlier extensions win parsing ties.
#[derive(Default)]
pub struct RegistryBuilder {
    extensions: Vec<Box<dyn Extension>>,
}

impl RegistryBuilder {
    /// Append an extension.
    #[must_use]
    pub fn with_extension<E: Extension + 'static>(mut self, extension: E) -> Self {
        self.extensions.push(Box::new(extension));
        self
    }

    /// Append an already boxed extension.
    pub fn register(&mut self, extension: Box<dyn Extension>) -> &mut Self {
        self.extensions.push(extension);
        self
    }

    /// Freeze the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateExtensionName`] if two extensions share a name.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut seen = HashSet::new();
        let mut extensions = Vec::with_capacity(self.extensions.len());
        let mut parsing = ParsingRules::default();

        for extension in self.extensions {
            let name = extension.name().to_owned();
            if !seen.insert(name.clone()) {
                return Err(RegistryError::DuplicateExtensionName(name));
            }

            let parse_rules = extension.parsing_rules();
            let render_rules = extension.rendering_rules();
            for rule in &parse_rules {
                parsing.push(rule.clone());
            }

            extensions.push(Registered {
                name,
                parse_rules,
                render_rules,
            });
        }

        let render_table =
            RenderTable::from_rules(extensions.iter().flat_map(|e| e.render_rules.iter()));

        tracing::debug!(
            extensions = extensions.len(),
            block_rules = parsing.blocks.len(),
            inline_rules = parsing.inlines.len(),
            "Registry assembled"
        );

        Ok(Registry {
            extensions,
            parsing,
            render_table,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BlockKind, InlineKind};
    use crate::ext::CoreSyntax;

    struct Named(&'static str);

    impl Extension for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_duplicate_extension_name_rejected() {
        let result = Registry::builder()
            .with_extension(Named("a"))
            .with_extension(Named("b"))
            .with_extension(Named("a"))
            .build();
        assert_eq!(
            result.err(),
            Some(RegistryError::DuplicateExtensionName("a".to_owned()))
        );
    }

    #[test]
    fn test_names_keep_registration_order() {
        let registry = Registry::builder()
            .with_extension(Named("z"))
            .with_extension(Named("a"))
            .build()
            .unwrap();
        assert_eq!(registry.extension_names().collect::<Vec<_>>(), ["z", "a"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_core_rules_populate_table() {
        let registry = Registry::builder().with_extension(CoreSyntax).build().unwrap();
        assert!(registry.render_table().has_block(BlockKind::Paragraph));
        assert!(registry.render_table().has_inline(InlineKind::Strong));
        assert!(!registry.render_table().has_block(BlockKind::FootnoteDefinition));
        assert!(!registry.parsing_rules().blocks().is_empty());
        assert!(registry.parsing_rules().front_matter().is_none());
    }

    #[test]
    fn test_rendering_rules_concatenate() {
        let registry = Registry::builder().with_extension(CoreSyntax).build().unwrap();
        let summary = &registry.summaries()[0];
        assert_eq!(summary.name, "core");
        assert_eq!(summary.render_rules, registry.rendering_rules().count());
    }
}
