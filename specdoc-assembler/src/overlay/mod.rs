//! The overlay: edits to a built tree, kept beside it instead of in it.
//!
//! Preprocessing never touches an element. Everything it decides is written
//! to an [`OverlayMap`] keyed by [`ElementId`], and read back through a
//! [`Reader`]. Records only grow: bits are added, lists are appended to, and
//! no record is ever dropped.
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::model::ElementId;

mod action;
mod reader;

pub use action::Action;
pub use reader::{Iter, Reader};

/// What the overlay holds for one element.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Record {
    action: Action,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    replacement: Vec<ElementId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<ElementId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<ElementId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    appended: Vec<ElementId>,
}

impl Record {
    #[must_use]
    pub fn action(&self) -> Action {
        self.action
    }

    #[must_use]
    pub fn replacement(&self) -> &[ElementId] {
        &self.replacement
    }

    #[must_use]
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    #[must_use]
    pub fn appended(&self) -> &[ElementId] {
        &self.appended
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OverlayMap {
    records: FxHashMap<ElementId, Record>,
}

impl OverlayMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&Record> {
        self.records.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Record)> {
        self.records.iter().map(|(id, record)| (*id, record))
    }

    fn record(&mut self, id: ElementId, action: Action) -> &mut Record {
        let record = self.records.entry(id).or_default();
        record.action.insert(action);
        tracing::trace!(%id, action = ?record.action, "overlay record");
        record
    }

    /// Drop `id` from every list it is read from.
    pub fn remove(&mut self, id: ElementId) {
        self.record(id, Action::REMOVE);
    }

    /// Read `replacement` wherever `id` would be read. A later call replaces
    /// the earlier list.
    pub fn replace(&mut self, id: ElementId, replacement: Vec<ElementId>) {
        self.record(id, Action::REPLACE).replacement = replacement;
    }

    pub fn override_parent(&mut self, id: ElementId, parent: ElementId) {
        self.record(id, Action::OVERRIDE_PARENT).parent = Some(parent);
    }

    pub fn override_children(&mut self, id: ElementId, children: Vec<ElementId>) {
        self.record(id, Action::OVERRIDE_CHILDREN).children = children;
    }

    /// Add `elements` after the children of `id`, after anything appended before.
    pub fn append(&mut self, id: ElementId, elements: impl IntoIterator<Item = ElementId>) {
        self.record(id, Action::APPEND_ELEMENTS)
            .appended
            .extend(elements);
    }
}
