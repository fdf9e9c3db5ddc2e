use serde::Serialize;

use super::{AttributeList, ElementId};

/// A `SectionLevel` represents a section depth in a document.
pub type SectionLevel = u8;

/// A `Section` as parsed: its raw heading level, title and body.
///
/// `children` is the body nested by raw level inside one file. The final,
/// cross-file nesting lives in the overlay and is read through
/// [`crate::Reader::children`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[non_exhaustive]
pub struct Section {
    pub level: SectionLevel,
    #[serde(skip_serializing_if = "AttributeList::is_empty")]
    pub attributes: AttributeList,
    pub title: Vec<ElementId>,
    pub children: Vec<ElementId>,
}

/// Display name and offset-adjusted level computed for a section during preparse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct ResolvedSection {
    pub name: String,
    pub level: SectionLevel,
}

impl ResolvedSection {
    #[must_use]
    pub fn new(name: String, level: SectionLevel) -> Self {
        Self { name, level }
    }
}
