//! The element model.
//!
//! Every parsed node lives in one append-only [`Arena`] per build and is
//! addressed by an [`ElementId`]. The id is the element's identity: the
//! overlay keys its records by it. Once a document has been built, none of
//! its elements change again, except the parent link of an included
//! [`Document`], which is set once when it is included.
use std::fmt;

use serde::Serialize;

use crate::Error;

mod attributes;
mod blocks;
mod directives;
mod document;
mod inlines;
mod location;
mod section;
mod tables;

pub use attributes::*;
pub use blocks::*;
pub use directives::*;
pub use document::*;
pub use inlines::*;
pub use location::*;
pub use section::*;
pub use tables::*;

/// Handle of an element inside an [`Arena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId(u32);

impl ElementId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[non_exhaustive]
pub struct Element {
    pub kind: ElementKind,
    pub location: Location,
    #[serde(skip)]
    parent: Option<ElementId>,
}

impl Element {
    /// The parent this element was attached to when its document was built.
    #[must_use]
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ElementKind {
    Document(Document),
    Section(Section),
    Paragraph(Paragraph),
    Delimited(DelimitedBlock),
    Table(Table),
    TableRow(TableRow),
    TableCell(TableCell),
    Text(Text),
    NewLine,
    LineBreak,
    CharacterReplacement(CharacterReplacement),
    Formatted(Formatted),
    EmptyLine,
    AttributeEntry(AttributeEntry),
    AttributeReset(AttributeReset),
    AttributeReference(AttributeReference),
    Counter(CounterReference),
    Conditional(Conditional),
    EndIf(EndIf),
    InlineConditional(InlineConditional),
    FileInclude(FileInclude),
}

impl ElementKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Document(_) => "document",
            ElementKind::Section(_) => "section",
            ElementKind::Paragraph(_) => "paragraph",
            ElementKind::Delimited(_) => "delimited block",
            ElementKind::Table(_) => "table",
            ElementKind::TableRow(_) => "table row",
            ElementKind::TableCell(_) => "table cell",
            ElementKind::Text(_) => "text",
            ElementKind::NewLine => "new line",
            ElementKind::LineBreak => "line break",
            ElementKind::CharacterReplacement(_) => "character replacement",
            ElementKind::Formatted(_) => "formatted text",
            ElementKind::EmptyLine => "empty line",
            ElementKind::AttributeEntry(_) => "attribute entry",
            ElementKind::AttributeReset(_) => "attribute reset",
            ElementKind::AttributeReference(_) => "attribute reference",
            ElementKind::Counter(_) => "counter",
            ElementKind::Conditional(_) => "conditional",
            ElementKind::EndIf(_) => "endif",
            ElementKind::InlineConditional(_) => "inline conditional",
            ElementKind::FileInclude(_) => "file include",
        }
    }

    /// The element's native child list. Section titles, attribute entry values
    /// and include paths are not children.
    #[must_use]
    pub fn children(&self) -> &[ElementId] {
        match self {
            ElementKind::Document(Document { children, .. })
            | ElementKind::Section(Section { children, .. })
            | ElementKind::Paragraph(Paragraph { children, .. })
            | ElementKind::Delimited(DelimitedBlock { children, .. })
            | ElementKind::TableRow(TableRow { children })
            | ElementKind::TableCell(TableCell { children, .. })
            | ElementKind::Formatted(Formatted { children, .. })
            | ElementKind::InlineConditional(InlineConditional { children, .. }) => children,
            ElementKind::Table(Table { rows, .. }) => rows,
            ElementKind::Text(_)
            | ElementKind::NewLine
            | ElementKind::LineBreak
            | ElementKind::CharacterReplacement(_)
            | ElementKind::EmptyLine
            | ElementKind::AttributeEntry(_)
            | ElementKind::AttributeReset(_)
            | ElementKind::AttributeReference(_)
            | ElementKind::Counter(_)
            | ElementKind::Conditional(_)
            | ElementKind::EndIf(_)
            | ElementKind::FileInclude(_) => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<ElementId>> {
        match self {
            ElementKind::Document(Document { children, .. })
            | ElementKind::Section(Section { children, .. })
            | ElementKind::Paragraph(Paragraph { children, .. })
            | ElementKind::Delimited(DelimitedBlock { children, .. })
            | ElementKind::TableRow(TableRow { children })
            | ElementKind::TableCell(TableCell { children, .. })
            | ElementKind::Formatted(Formatted { children, .. })
            | ElementKind::InlineConditional(InlineConditional { children, .. }) => Some(children),
            ElementKind::Table(Table { rows, .. }) => Some(rows),
            ElementKind::Text(_)
            | ElementKind::NewLine
            | ElementKind::LineBreak
            | ElementKind::CharacterReplacement(_)
            | ElementKind::EmptyLine
            | ElementKind::AttributeEntry(_)
            | ElementKind::AttributeReset(_)
            | ElementKind::AttributeReference(_)
            | ElementKind::Counter(_)
            | ElementKind::Conditional(_)
            | ElementKind::EndIf(_)
            | ElementKind::FileInclude(_) => None,
        }
    }

    /// Whether the element is block-level (it starts on its own line and ends a run of inline content).
    #[must_use]
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            ElementKind::Document(_)
                | ElementKind::Section(_)
                | ElementKind::Paragraph(_)
                | ElementKind::Delimited(_)
                | ElementKind::Table(_)
                | ElementKind::TableRow(_)
                | ElementKind::TableCell(_)
                | ElementKind::EmptyLine
                | ElementKind::AttributeEntry(_)
                | ElementKind::AttributeReset(_)
                | ElementKind::Conditional(_)
                | ElementKind::EndIf(_)
                | ElementKind::FileInclude(_)
        )
    }
}

/// Typed access to one variant of [`ElementKind`], used by the search helpers.
pub trait Kind {
    fn from_kind(kind: &ElementKind) -> Option<&Self>;
}

macro_rules! impl_kind {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl Kind for $ty {
                fn from_kind(kind: &ElementKind) -> Option<&Self> {
                    if let ElementKind::$variant(inner) = kind {
                        Some(inner)
                    } else {
                        None
                    }
                }
            }
        )*
    };
}

impl_kind! {
    Document => Document,
    Section => Section,
    Paragraph => Paragraph,
    Delimited => DelimitedBlock,
    Table => Table,
    TableRow => TableRow,
    TableCell => TableCell,
    Text => Text,
    CharacterReplacement => CharacterReplacement,
    Formatted => Formatted,
    AttributeEntry => AttributeEntry,
    AttributeReset => AttributeReset,
    AttributeReference => AttributeReference,
    Counter => CounterReference,
    Conditional => Conditional,
    EndIf => EndIf,
    InlineConditional => InlineConditional,
    FileInclude => FileInclude,
}

/// Append-only storage for every element of a build, across all files.
#[derive(Debug, Default)]
pub struct Arena {
    elements: Vec<Element>,
}

impl Arena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Store a new element and return its identity.
    pub fn alloc(&mut self, kind: ElementKind, location: Location) -> ElementId {
        // More than u32::MAX elements is not a document anyone can build.
        #[allow(clippy::cast_possible_truncation)]
        let id = ElementId(self.elements.len() as u32);
        self.elements.push(Element {
            kind,
            location,
            parent: None,
        });
        id
    }

    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.index())
    }

    /// Like [`Arena::get`], for callers that treat a dangling id as an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownElement`] if `id` was not allocated by this arena.
    pub fn element(&self, id: ElementId) -> Result<&Element, Error> {
        self.get(id).ok_or(Error::UnknownElement(id))
    }

    /// # Errors
    ///
    /// Returns [`Error::UnknownElement`] if `id` was not allocated by this arena.
    pub fn kind(&self, id: ElementId) -> Result<&ElementKind, Error> {
        self.element(id).map(|element| &element.kind)
    }

    /// # Errors
    ///
    /// Returns [`Error::UnknownElement`] if `id` is dangling, or
    /// [`Error::NotADocument`] if it is not a document.
    pub fn document(&self, id: ElementId) -> Result<&Document, Error> {
        let kind = self.kind(id)?;
        if let ElementKind::Document(document) = kind {
            Ok(document)
        } else {
            Err(Error::NotADocument(kind.name()))
        }
    }

    /// Native children of `id`; empty for leaves and dangling ids.
    #[must_use]
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.get(id).map_or(&[], |element| element.kind.children())
    }

    pub(crate) fn get_mut(&mut self, id: ElementId) -> Result<&mut Element, Error> {
        self.elements
            .get_mut(id.index())
            .ok_or(Error::UnknownElement(id))
    }

    /// Append `child` to the native children of `parent`. Only used while a
    /// document is being built.
    pub(crate) fn attach(&mut self, parent: ElementId, child: ElementId) -> Result<(), Error> {
        let element = self.get_mut(parent)?;
        let kind = element.kind.name();
        let Some(children) = element.kind.children_mut() else {
            tracing::error!(%parent, kind, "element cannot hold children");
            return Err(Error::UnknownElement(parent));
        };
        children.push(child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Record `parent` as the native parent of `children` that were stored on
    /// `parent` at allocation time.
    pub(crate) fn adopt(&mut self, parent: ElementId, children: &[ElementId]) -> Result<(), Error> {
        for child in children {
            self.get_mut(*child)?.parent = Some(parent);
        }
        Ok(())
    }

    /// Link an included document to the document that included it. The link
    /// is set once; later calls keep the first parent.
    ///
    /// # Errors
    ///
    /// Returns an error if `child` is not a document.
    pub fn set_document_parent(&mut self, child: ElementId, parent: ElementId) -> Result<(), Error> {
        let element = self.get_mut(child)?;
        let kind = element.kind.name();
        let ElementKind::Document(document) = &mut element.kind else {
            return Err(Error::NotADocument(kind));
        };
        match document.parent {
            None => {
                document.parent = Some(parent);
                element.parent = Some(parent);
            }
            Some(existing) if existing == parent => {}
            Some(existing) => {
                tracing::warn!(%child, %existing, %parent, "document already has a parent, keeping the first");
            }
        }
        Ok(())
    }
}
