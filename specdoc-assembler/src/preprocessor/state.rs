use std::path::PathBuf;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::{
    model::{AttributeName, AttributeValue, DocumentAttributes, ElementId, ResolvedSection},
    overlay::OverlayMap,
    preprocessor::counter::Counters,
};

/// The attribute bindings of a build. One store is shared by every file, so
/// an attribute set inside an include is still set after it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttributeStore {
    values: FxHashMap<AttributeName, AttributeValue>,
}

impl AttributeStore {
    pub(crate) fn new(seed: DocumentAttributes) -> Self {
        Self { values: seed }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name)
    }

    /// Whether `name` is bound to anything but `false`.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(AttributeValue::is_set)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub(crate) fn set(&mut self, name: AttributeName, value: AttributeValue) {
        tracing::trace!(%name, ?value, "attribute set");
        self.values.insert(name, value);
    }

    pub(crate) fn unset(&mut self, name: &str) {
        tracing::trace!(name, "attribute unset");
        self.values.remove(name);
    }

    /// Resolve `{name}` references in `text`. Rich values are flattened with
    /// `render`; references to unset attributes are left as written.
    pub(crate) fn substitute(&self, text: &str, render: impl Fn(&[ElementId]) -> String) -> String {
        let mut result = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find('{') {
            let (before, from_brace) = rest.split_at(start);
            result.push_str(before);
            let Some(end) = from_brace.find('}') else {
                rest = from_brace;
                break;
            };
            let (reference, after) = from_brace.split_at(end + 1);
            let name = reference
                .strip_prefix('{')
                .and_then(|name| name.strip_suffix('}'))
                .unwrap_or_default();
            match self.get(name) {
                Some(AttributeValue::String(value)) => result.push_str(value),
                Some(AttributeValue::Elements(elements)) => result.push_str(&render(elements)),
                Some(AttributeValue::Bool(true)) => {}
                Some(AttributeValue::Bool(false)) | None => result.push_str(reference),
            }
            rest = after;
        }
        result.push_str(rest);
        result
    }
}

/// One include edge of the build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct Inclusion {
    pub including: ElementId,
    pub included: ElementId,
    pub path: PathBuf,
}

/// Everything a build shares across files.
#[derive(Debug, Default)]
pub(crate) struct BuildState {
    pub(crate) attributes: AttributeStore,
    pub(crate) counters: Counters,
    pub(crate) overlay: OverlayMap,
    pub(crate) sections: FxHashMap<ElementId, ResolvedSection>,
    pub(crate) inclusions: Vec<Inclusion>,
}

impl BuildState {
    pub(crate) fn new(attributes: DocumentAttributes) -> Self {
        Self {
            attributes: AttributeStore::new(attributes),
            ..Self::default()
        }
    }
}
