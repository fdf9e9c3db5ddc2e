use std::slice;

use crate::{
    model::{Arena, Element, ElementId, ElementKind},
    overlay::{Action, OverlayMap},
};

/// A read-only view of the arena with the overlay applied.
///
/// Once preprocessing is done, this is the only way the tree should be read.
#[derive(Clone, Copy, Debug)]
pub struct Reader<'a> {
    arena: &'a Arena,
    overlay: &'a OverlayMap,
}

impl<'a> Reader<'a> {
    #[must_use]
    pub fn new(arena: &'a Arena, overlay: &'a OverlayMap) -> Self {
        Self { arena, overlay }
    }

    #[must_use]
    pub fn arena(&self) -> &'a Arena {
        self.arena
    }

    #[must_use]
    pub fn overlay(&self) -> &'a OverlayMap {
        self.overlay
    }

    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&'a Element> {
        self.arena.get(id)
    }

    #[must_use]
    pub fn kind(&self, id: ElementId) -> Option<&'a ElementKind> {
        self.arena.get(id).map(|element| &element.kind)
    }

    #[must_use]
    pub fn is_removed(&self, id: ElementId) -> bool {
        self.overlay
            .get(id)
            .is_some_and(|record| record.action().contains(Action::REMOVE))
    }

    /// Walk `elements` with the overlay applied, followed by whatever was
    /// appended to `parent`.
    #[must_use]
    pub fn iterate(&self, parent: Option<ElementId>, elements: &'a [ElementId]) -> Iter<'a> {
        let appended = parent
            .and_then(|parent| self.overlay.get(parent))
            .filter(|record| record.action().contains(Action::APPEND_ELEMENTS))
            .map_or(&[][..], |record| record.appended());
        Iter {
            overlay: self.overlay,
            stack: vec![elements.iter()],
            appended: appended.iter(),
        }
    }

    /// The children of `parent`: overridden ones if any, native ones otherwise.
    #[must_use]
    pub fn children(&self, parent: ElementId) -> Iter<'a> {
        let elements = match self.overlay.get(parent) {
            Some(record) if record.action().contains(Action::OVERRIDE_CHILDREN) => {
                record.children()
            }
            Some(_) | None => self.arena.children(parent),
        };
        self.iterate(Some(parent), elements)
    }

    /// The parent of `child`: the overridden one if any, the native one otherwise.
    #[must_use]
    pub fn parent(&self, child: ElementId) -> Option<ElementId> {
        match self.overlay.get(child) {
            Some(record) if record.action().contains(Action::OVERRIDE_PARENT) => record.parent(),
            Some(_) | None => self.arena.get(child).and_then(Element::parent),
        }
    }
}

/// Lazily resolves a list through the overlay.
///
/// Replacement lists are walked in place, so replacements that are themselves
/// replaced resolve too, and stopping early never walks the rest.
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    overlay: &'a OverlayMap,
    stack: Vec<slice::Iter<'a, ElementId>>,
    appended: slice::Iter<'a, ElementId>,
}

impl Iterator for Iter<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        while let Some(top) = self.stack.last_mut() {
            let Some(&id) = top.next() else {
                self.stack.pop();
                continue;
            };
            match self.overlay.get(id) {
                None => return Some(id),
                Some(record) if record.action().contains(Action::REMOVE) => {}
                Some(record) if record.action().contains(Action::REPLACE) => {
                    self.stack.push(record.replacement().iter());
                }
                Some(_) => return Some(id),
            }
        }
        self.appended.next().copied()
    }
}
