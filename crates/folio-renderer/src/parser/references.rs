//! Document-wide definitions gathered between the block and inline passes.

use std::collections::{HashMap, HashSet};

use crate::ast::{Block, BlockKind, walk_blocks};

/// Longest link label, in bytes, that can match a definition.
pub const MAX_LABEL_LEN: usize = 999;

/// Destination of a link reference definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkTarget {
    pub url: String,
    pub title: Option<String>,
}

/// Labels defined anywhere in the document.
///
/// The first definition of a normalised label wins; later duplicates are
/// ignored.
#[derive(Clone, Debug, Default)]
pub struct References {
    links: HashMap<String, LinkTarget>,
    abbreviations: Vec<(String, String)>,
    footnotes: HashSet<String>,
    macros: HashSet<String>,
}

impl References {
    /// Collect definitions from a block tree.
    #[must_use]
    pub fn collect(blocks: &[Block]) -> Self {
        let mut refs = Self::default();
        walk_blocks(blocks, &mut |block| {
            let attrs = &block.attrs;
            match block.kind {
                BlockKind::LinkDefinition => {
                    if let (Some(label), Some(url)) = (attrs.get("label"), attrs.get("href")) {
                        refs.insert_link(
                            label,
                            LinkTarget {
                                url: url.to_owned(),
                                title: attrs.get("title").map(str::to_owned),
                            },
                        );
                    }
                }
                BlockKind::AbbreviationDefinition => {
                    if let (Some(abbr), Some(expansion)) = (attrs.get("abbr"), attrs.get("title")) {
                        refs.insert_abbreviation(abbr, expansion);
                    }
                }
                BlockKind::FootnoteDefinition => {
                    if let Some(label) = attrs.get("label") {
                        refs.footnotes.insert(normalize_label(label));
                    }
                }
                BlockKind::MacroDefinition => {
                    if let Some(name) = attrs.get("name") {
                        refs.macros.insert(name.to_owned());
                    }
                }
                _ => {}
            }
        });
        refs
    }

    pub fn insert_link(&mut self, label: &str, target: LinkTarget) {
        self.links.entry(normalize_label(label)).or_insert(target);
    }

    pub fn insert_abbreviation(&mut self, abbr: &str, expansion: &str) {
        if self.abbreviations.iter().all(|(a, _)| a != abbr) {
            self.abbreviations
                .push((abbr.to_owned(), expansion.to_owned()));
            // Longest first so "HTML5" wins over "HTML".
            self.abbreviations
                .sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        }
    }

    /// Target of `label`. Labels longer than [`MAX_LABEL_LEN`] never match.
    #[must_use]
    pub fn link(&self, label: &str) -> Option<&LinkTarget> {
        if label.len() > MAX_LABEL_LEN {
            return None;
        }
        self.links.get(&normalize_label(label))
    }

    /// Defined abbreviations, longest first.
    pub fn abbreviations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.abbreviations
            .iter()
            .map(|(abbr, title)| (abbr.as_str(), title.as_str()))
    }

    #[must_use]
    pub fn has_footnote(&self, label: &str) -> bool {
        self.footnotes.contains(&normalize_label(label))
    }

    #[must_use]
    pub fn has_macro(&self, name: &str) -> bool {
        self.macros.contains(name)
    }
}

/// Case-fold a label and collapse internal whitespace.
#[must_use]
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
