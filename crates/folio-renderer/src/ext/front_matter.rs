//! Jekyll-style front matter.
//!
//! ```text
//! ---
//! title: Page
//! tags: [a, b]
//! ---
//! ```
//!
//! The opening `---` must be the first line of the document. The block is
//! closed by `---` or `...`; without a closing line there is no front matter
//! and the text is parsed as ordinary markdown.

use crate::extension::{Extension, FrontMatter, FrontMatterRule, ParseRule};
use crate::metadata::Metadata;

/// The `front-matter` extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrontMatterExtension;

impl Extension for FrontMatterExtension {
    fn name(&self) -> &str {
        "front-matter"
    }

    fn parsing_rules(&self) -> Vec<ParseRule> {
        vec![ParseRule::front_matter(YamlFrontMatter)]
    }
}

struct YamlFrontMatter;

fn is_marker(line: &str, markers: &[&str]) -> bool {
    let line = line.trim_end();
    markers.contains(&line)
}

impl FrontMatterRule for YamlFrontMatter {
    fn extract(&self, text: &str) -> Option<FrontMatter> {
        let (first, mut rest) = text.split_once('\n')?;
        if !is_marker(first, &["---"]) {
            return None;
        }
        let body_start = first.len() + 1;
        let mut offset = body_start;

        loop {
            let (line, next) = match rest.split_once('\n') {
                Some((line, next)) => (line, Some(next)),
                None => (rest, None),
            };
            if is_marker(line, &["---", "..."]) {
                let body = &text[body_start..offset];
                let body_offset = (offset + line.len() + 1).min(text.len());
                return Some(FrontMatter {
                    metadata: Metadata::from_front_matter(body),
                    body_offset,
                });
            }
            offset += line.len() + 1;
            rest = next?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_metadata_and_offset() {
        let text = "---\ntitle: Hello\n---\n# Body\n";
        let fm = YamlFrontMatter.extract(text).unwrap();
        assert_eq!(
            fm.metadata.get("title").and_then(|v| v.as_str()),
            Some("Hello")
        );
        assert_eq!(&text[fm.body_offset..], "# Body\n");
    }

    #[test]
    fn test_dots_close_the_block() {
        let text = "---\na: 1\n...\nrest";
        let fm = YamlFrontMatter.extract(text).unwrap();
        assert_eq!(&text[fm.body_offset..], "rest");
    }

    #[test]
    fn test_closing_marker_at_end_of_input() {
        let text = "---\na: 1\n---";
        let fm = YamlFrontMatter.extract(text).unwrap();
        assert_eq!(fm.body_offset, text.len());
        assert_eq!(fm.metadata.len(), 1);
    }

    #[test]
    fn test_empty_block() {
        let fm = YamlFrontMatter.extract("---\n---\nbody").unwrap();
        assert!(fm.metadata.is_empty());
        assert_eq!(fm.body_offset, 8);
    }

    #[test]
    fn test_unclosed_block_is_not_front_matter() {
        assert!(YamlFrontMatter.extract("---\ntitle: x\nno end").is_none());
    }

    #[test]
    fn test_must_open_on_first_line() {
        assert!(YamlFrontMatter.extract("\n---\na: 1\n---\n").is_none());
        assert!(YamlFrontMatter.extract("----\na: 1\n---\n").is_none());
    }
}
