//! Shared helpers for extensions.

use std::collections::{HashMap, HashSet};

/// Convert heading text to a URL-safe slug.
///
/// Lowercases, keeps alphanumerics (Unicode included), turns runs of
/// whitespace, `-` and `_` into a single dash and drops everything else.
///
/// # Examples
///
/// ```
/// use folio_renderer::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("What's New?"), "whats-new");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Hands out slugs unique within one document: repeats get `-1`, `-2`, ...
#[derive(Debug, Default)]
pub struct SlugSet {
    counters: HashMap<String, usize>,
    used: HashSet<String>,
}

impl SlugSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unique slug for `text`. Empty slugs become `section`.
    pub fn unique(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base = "section".to_owned();
        }

        let mut count = self.counters.get(&base).copied().unwrap_or(0);
        let mut candidate = if count == 0 {
            base.clone()
        } else {
            format!("{base}-{count}")
        };
        while self.used.contains(&candidate) {
            count += 1;
            candidate = format!("{base}-{count}");
        }

        self.counters.insert(base, count + 1);
        self.used.insert(candidate.clone());
        candidate
    }
}
