//! Built-in extensions and the standard registry.
//!
//! Every built-in is an ordinary [`Extension`]; none has privileged access to
//! the parser. [`standard_registry`] composes them in [`STANDARD_EXTENSIONS`]
//! order with [`CoreSyntax`] last, so extension triggers are tried before the
//! baseline ones.

mod abbreviation;
mod anchor_link;
mod autolink;
mod core;
mod definition;
mod emoji;
mod escaped_character;
mod footnote;
mod front_matter;
mod gfm_issues;
mod macros;
mod media_tags;
mod strikethrough;
mod task_list;
mod typographic;

pub use self::core::CoreSyntax;
pub use abbreviation::AbbreviationExtension;
pub use anchor_link::AnchorLinkExtension;
pub use autolink::AutolinkExtension;
pub use definition::DefinitionExtension;
pub use emoji::{EmojiExtension, lookup_emoji};
pub use escaped_character::EscapedCharacterExtension;
pub use footnote::FootnoteExtension;
pub use front_matter::FrontMatterExtension;
pub use gfm_issues::GfmIssuesExtension;
pub use macros::MacrosExtension;
pub use media_tags::MediaTagsExtension;
pub use strikethrough::StrikethroughExtension;
pub use task_list::TaskListExtension;
pub use typographic::TypographicExtension;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::extension::Extension;
use crate::registry::Registry;

/// Names of the built-in extensions in standard registration order.
/// `core` is not listed: it is always registered, last.
pub const STANDARD_EXTENSIONS: &[&str] = &[
    "front-matter",
    "abbreviation",
    "anchor-link",
    "autolink",
    "definition",
    "emoji",
    "escaped-character",
    "footnote",
    "gfm-issues",
    "macros",
    "media-tags",
    "strikethrough",
    "task-list",
    "typographic",
];

/// How emoji shortcodes render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmojiMode {
    /// The Unicode glyph.
    #[default]
    Unicode,
    /// An `<img>` pointing at `{image_root}{shortcode}.png`.
    Image,
}

/// Options for the `emoji` extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmojiOptions {
    pub mode: EmojiMode,
    pub image_root: String,
    pub image_size: u32,
}

impl Default for EmojiOptions {
    fn default() -> Self {
        Self {
            mode: EmojiMode::Unicode,
            image_root: "/img/".to_owned(),
            image_size: 20,
        }
    }
}

/// Options for the `gfm-issues` extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueOptions {
    /// Prefix joined with the issue number to form the link target.
    pub root: String,
    pub class: String,
}

impl Default for IssueOptions {
    fn default() -> Self {
        Self {
            root: "issues/".to_owned(),
            class: "gfm-issue".to_owned(),
        }
    }
}

/// Options for the `anchor-link` extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorOptions {
    pub class: String,
    /// Anchor text; empty by default so the anchor is styled by CSS alone.
    pub text: String,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            class: "anchor".to_owned(),
            text: String::new(),
        }
    }
}

/// Options for all configurable built-in extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardOptions {
    pub emoji: EmojiOptions,
    pub issues: IssueOptions,
    pub anchor_links: AnchorOptions,
}

/// Construct a built-in extension by name.
#[must_use]
pub fn standard_extension(name: &str, options: &StandardOptions) -> Option<Box<dyn Extension>> {
    let extension: Box<dyn Extension> = match name {
        "front-matter" => Box::new(FrontMatterExtension),
        "abbreviation" => Box::new(AbbreviationExtension),
        "anchor-link" => Box::new(AnchorLinkExtension::new(options.anchor_links.clone())),
        "autolink" => Box::new(AutolinkExtension),
        "definition" => Box::new(DefinitionExtension),
        "emoji" => Box::new(EmojiExtension::new(options.emoji.clone())),
        "escaped-character" => Box::new(EscapedCharacterExtension),
        "footnote" => Box::new(FootnoteExtension),
        "gfm-issues" => Box::new(GfmIssuesExtension::new(options.issues.clone())),
        "macros" => Box::new(MacrosExtension),
        "media-tags" => Box::new(MediaTagsExtension),
        "strikethrough" => Box::new(StrikethroughExtension),
        "task-list" => Box::new(TaskListExtension),
        "typographic" => Box::new(TypographicExtension),
        "core" => Box::new(CoreSyntax),
        _ => return None,
    };
    Some(extension)
}

/// Build a registry from built-in extensions.
///
/// `names` selects and orders the extensions; `None` means all of
/// [`STANDARD_EXTENSIONS`]. Unknown names are skipped with a warning. `core`
/// is appended unless the list already places it.
///
/// # Errors
///
/// Returns [`RegistryError::DuplicateExtensionName`] if `names` repeats a name.
pub fn standard_registry(
    names: Option<&[String]>,
    options: &StandardOptions,
) -> Result<Registry, RegistryError> {
    let names: Vec<&str> = match names {
        Some(names) => names.iter().map(String::as_str).collect(),
        None => STANDARD_EXTENSIONS.to_vec(),
    };

    let mut builder = Registry::builder();
    for name in &names {
        match standard_extension(name, options) {
            Some(extension) => {
                builder.register(extension);
            }
            None => tracing::warn!(extension = %name, "Unknown extension, skipping"),
        }
    }
    if !names.contains(&"core") {
        builder.register(Box::new(CoreSyntax));
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_order() {
        let registry = standard_registry(None, &StandardOptions::default()).unwrap();
        let names: Vec<_> = registry.extension_names().collect();
        let mut expected = STANDARD_EXTENSIONS.to_vec();
        expected.push("core");
        assert_eq!(names, expected);
    }

    #[test]
    fn test_subset_keeps_given_order() {
        let names = vec!["typographic".to_owned(), "emoji".to_owned()];
        let registry = standard_registry(Some(&names), &StandardOptions::default()).unwrap();
        assert_eq!(
            registry.extension_names().collect::<Vec<_>>(),
            ["typographic", "emoji", "core"]
        );
    }

    #[test]
    fn test_unknown_names_are_skipped() {
        let names = vec!["nope".to_owned(), "emoji".to_owned()];
        let registry = standard_registry(Some(&names), &StandardOptions::default()).unwrap();
        assert_eq!(
            registry.extension_names().collect::<Vec<_>>(),
            ["emoji", "core"]
        );
    }

    #[test]
    fn test_explicit_core_position_is_kept() {
        let names = vec!["core".to_owned(), "emoji".to_owned()];
        let registry = standard_registry(Some(&names), &StandardOptions::default()).unwrap();
        assert_eq!(
            registry.extension_names().collect::<Vec<_>>(),
            ["core", "emoji"]
        );
    }

    #[test]
    fn test_duplicate_names_fail() {
        let names = vec!["emoji".to_owned(), "emoji".to_owned()];
        let err = standard_registry(Some(&names), &StandardOptions::default()).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateExtensionName("emoji".to_owned())
        );
    }

    #[test]
    fn test_every_standard_name_constructs() {
        let options = StandardOptions::default();
        for name in STANDARD_EXTENSIONS {
            let extension = standard_extension(name, &options).unwrap();
            assert_eq!(extension.name(), *name);
        }
    }
}
