use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::Serialize;

use super::ElementId;

/// An `AttributeName` represents the name of an attribute in a document.
pub type AttributeName = String;

/// The value bound to a document attribute.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A plain string value.
    String(String),
    /// A flag. `false` means it is unset.
    Bool(bool),
    /// The raw, rich value of an attribute entry.
    Elements(Vec<ElementId>),
}

impl AttributeValue {
    /// Whether the value counts as "set" for `ifdef`/`ifndef`.
    #[must_use]
    pub fn is_set(&self) -> bool {
        !matches!(self, AttributeValue::Bool(false))
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

/// Attributes seeded into a build before any file is read.
pub type DocumentAttributes = FxHashMap<AttributeName, AttributeValue>;

/// A block attribute list, e.g. `[source,rust,cols="1,2"]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct AttributeList {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positional: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub named: BTreeMap<AttributeName, String>,
}

impl AttributeList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_positional(mut self, value: impl Into<String>) -> Self {
        self.positional.push(value.into());
        self
    }

    #[must_use]
    pub fn with_named(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    /// The block style: the first positional attribute.
    #[must_use]
    pub fn style(&self) -> Option<&str> {
        self.positional.first().map(String::as_str)
    }

    /// Whether `opts`/`options` lists `option`.
    #[must_use]
    pub fn has_option(&self, option: &str) -> bool {
        ["opts", "options"]
            .iter()
            .filter_map(|key| self.get(key))
            .flat_map(|value| value.split(','))
            .any(|value| value.trim() == option)
    }

    /// Fold `other` into this list. Positional values of `other` come first,
    /// named values of `other` win.
    pub fn merge(&mut self, other: AttributeList) {
        if !other.positional.is_empty() {
            let mut positional = other.positional;
            positional.append(&mut self.positional);
            self.positional = positional;
        }
        self.named.extend(other.named);
    }
}
