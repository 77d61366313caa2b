//! Document metadata extracted from front matter.
//!
//! The front-matter body is read with a line grammar: top-level `key: value`
//! pairs, and `key:` followed by indented lines (usually a `- item` list).
//! Each value is decoded with `serde_yaml` so quoting, numbers, booleans and
//! flow sequences behave like YAML. Anything the grammar cannot attribute to
//! a key is kept verbatim in [`Metadata::unparsed`] and serialized under
//! [`UNPARSED_KEY`]; values that decode to nested structure are kept verbatim
//! as [`MetaValue::Opaque`].

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static KEY_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\s:#\-][^:]*?)\s*:(?:\s+(.*?))?\s*$").unwrap());

/// Serialized key holding [`Metadata::unparsed`], omitted when there are no
/// such lines. Front-matter keys never start with `#`.
pub const UNPARSED_KEY: &str = "#unparsed";

/// A scalar metadata value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// String form of the value, `None` for null.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Integer(n) => Some(n.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(s.clone()),
        }
    }
}

/// A metadata value: a scalar, a sequence of scalars, or text the grammar
/// could not interpret.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Scalar(Scalar),
    Sequence(Vec<Scalar>),
    Opaque(String),
}

impl MetaValue {
    /// Shorthand for a string scalar.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::String(value.into()))
    }

    /// Borrow the value as a string if it is a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }
}

/// Key/value metadata attached to a document.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Metadata {
    /// Recognised entries, ordered by key.
    #[serde(flatten)]
    pub entries: BTreeMap<String, MetaValue>,
    /// Lines that could not be attributed to any key.
    #[serde(rename = "#unparsed", skip_serializing_if = "Vec::is_empty")]
    pub unparsed: Vec<String>,
}

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) {
        self.entries.insert(key.into(), value);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.unparsed.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Parse the text between the front-matter markers.
    ///
    /// Never fails: unrecognised structure is preserved rather than rejected.
    #[must_use]
    pub fn from_front_matter(body: &str) -> Self {
        let mut metadata = Self::new();
        let lines: Vec<&str> = body.lines().collect();
        let mut idx = 0;

        while idx < lines.len() {
            let line = lines[idx];
            idx += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some(caps) = KEY_LINE_RE.captures(line) else {
                tracing::warn!(line = %line, "Unrecognized front matter line preserved");
                metadata.unparsed.push(line.to_owned());
                continue;
            };

            let key = caps[1].to_owned();
            let value = caps.get(2).map_or("", |m| m.as_str());

            // Indented lines (and blank lines between them) belong to this key.
            let body_start = idx;
            while idx < lines.len() {
                let next = lines[idx];
                if next.starts_with(' ') || next.starts_with('\t') {
                    idx += 1;
                } else if next.trim().is_empty()
                    && lines[idx + 1..]
                        .iter()
                        .find(|l| !l.trim().is_empty())
                        .is_some_and(|l| l.starts_with(' ') || l.starts_with('\t'))
                {
                    idx += 1;
                } else {
                    break;
                }
            }

            metadata
                .entries
                .insert(key, decode_value(value, &lines[body_start..idx]));
        }

        metadata
    }
}

/// Decode one entry's value from its inline part and indented continuation.
fn decode_value(value: &str, body: &[&str]) -> MetaValue {
    let raw = if body.is_empty() {
        value.to_owned()
    } else if value.is_empty() {
        body.join("\n")
    } else {
        format!("{value}\n{}", body.join("\n"))
    };

    let snippet = if body.is_empty() {
        format!("v: {value}")
    } else {
        format!("v: {value}\n{}", body.join("\n"))
    };

    let decoded = serde_yaml::from_str::<serde_yaml::Mapping>(&snippet)
        .ok()
        .and_then(|mut map| map.remove("v"));

    match decoded {
        Some(yaml) => from_yaml(yaml).unwrap_or(MetaValue::Opaque(raw)),
        None if body.is_empty() => MetaValue::string(value),
        None => MetaValue::Opaque(raw),
    }
}

fn from_yaml(value: serde_yaml::Value) -> Option<MetaValue> {
    match value {
        serde_yaml::Value::Sequence(items) => items
            .into_iter()
            .map(scalar_from_yaml)
            .collect::<Option<Vec<_>>>()
            .map(MetaValue::Sequence),
        other => scalar_from_yaml(other).map(MetaValue::Scalar),
    }
}

fn scalar_from_yaml(value: serde_yaml::Value) -> Option<Scalar> {
    match value {
        serde_yaml::Value::Null => Some(Scalar::Null),
        serde_yaml::Value::Bool(b) => Some(Scalar::Bool(b)),
        serde_yaml::Value::Number(n) => n
            .as_i64()
            .map(Scalar::Integer)
            .or_else(|| n.as_f64().map(Scalar::Float)),
        serde_yaml::Value::String(s) => Some(Scalar::String(s)),
        serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_)
        | serde_yaml::Value::Tagged(_) => None,
    }
}
