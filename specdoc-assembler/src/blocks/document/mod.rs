use std::path::PathBuf;

use tracing::instrument;

use crate::{
    Error,
    blocks::coalesce::coalesce,
    error::SourceLocation,
    fragment::{Fragment, FragmentKind},
    model::{
        Arena, AttributeEntry, AttributeReference, AttributeReset, CharacterReplacement,
        Conditional, CounterReference, DelimitedBlock, DelimitedKind, Document, ElementId,
        ElementKind, EndIf, FileInclude, Formatted, InlineConditional, Location, Paragraph,
        Section, Text,
    },
};

mod tree_builder;

pub(crate) use tree_builder::{SectionNester, SectionSink};
use tree_builder::ArenaSink;

/// Lowers one file's fragments into a document tree inside an [`Arena`].
///
/// Adjacent text is merged, pending block attributes are attached, tables are
/// laid out on their grid and sections are nested by their raw level. The
/// result is the file's native tree; preprocessing never changes it.
#[derive(Debug)]
pub struct DocumentBuilder<'a> {
    pub(crate) arena: &'a mut Arena,
    path: PathBuf,
}

impl<'a> DocumentBuilder<'a> {
    #[must_use]
    pub fn new(arena: &'a mut Arena, path: impl Into<PathBuf>) -> Self {
        Self {
            arena,
            path: path.into(),
        }
    }

    /// Build the document and return its root.
    ///
    /// # Errors
    ///
    /// Fails if a table cannot be laid out.
    #[instrument(level = "debug", skip(self, fragments), fields(path = %self.path.display()))]
    pub fn build(mut self, fragments: Vec<Fragment>) -> Result<ElementId, Error> {
        let location = fragments
            .iter()
            .map(|fragment| fragment.location)
            .reduce(|mut location, next| {
                location.extend(&next);
                location
            })
            .unwrap_or_default();
        let document = self.arena.alloc(
            ElementKind::Document(Document::new(self.path.clone())),
            location,
        );
        self.nest_into(document, coalesce(fragments))?;
        tracing::debug!(%document, elements = self.arena.len(), "document built");
        Ok(document)
    }

    pub(crate) fn source_location(&self, location: Location) -> Box<SourceLocation> {
        SourceLocation::boxed(Some(self.path.clone()), location)
    }

    /// Lower already coalesced `fragments` and nest them by section level under `container`.
    pub(crate) fn nest_into(
        &mut self,
        container: ElementId,
        fragments: Vec<Fragment>,
    ) -> Result<(), Error> {
        let mut nester = SectionNester::new(container);
        for fragment in fragments {
            let level = if let FragmentKind::Section { level, .. } = &fragment.kind {
                Some(*level)
            } else {
                None
            };
            let element = self.lower(fragment)?;
            nester.push(
                &mut ArenaSink {
                    arena: &mut *self.arena,
                },
                element,
                level,
            )?;
        }
        Ok(())
    }

    fn lower_all(&mut self, fragments: Vec<Fragment>) -> Result<Vec<ElementId>, Error> {
        fragments
            .into_iter()
            .map(|fragment| self.lower(fragment))
            .collect()
    }

    /// Allocate `kind` and point the parent link of `owned` at it.
    pub(crate) fn alloc_owning(
        &mut self,
        kind: ElementKind,
        location: Location,
        owned: &[ElementId],
    ) -> Result<ElementId, Error> {
        let id = self.arena.alloc(kind, location);
        self.arena.adopt(id, owned)?;
        Ok(id)
    }

    pub(crate) fn lower(&mut self, fragment: Fragment) -> Result<ElementId, Error> {
        let Fragment { kind, location } = fragment;
        let id = match kind {
            FragmentKind::Text(content) => self
                .arena
                .alloc(ElementKind::Text(Text::new(content)), location),
            FragmentKind::NewLine => self.arena.alloc(ElementKind::NewLine, location),
            FragmentKind::LineBreak => self.arena.alloc(ElementKind::LineBreak, location),
            FragmentKind::EmptyLine => self.arena.alloc(ElementKind::EmptyLine, location),
            FragmentKind::CharacterReplacement {
                source,
                replacement,
            } => self.arena.alloc(
                ElementKind::CharacterReplacement(CharacterReplacement {
                    source,
                    replacement,
                }),
                location,
            ),
            FragmentKind::Formatted { style, content } => {
                let children = self.lower_all(content)?;
                self.alloc_owning(
                    ElementKind::Formatted(Formatted {
                        style,
                        children: children.clone(),
                    }),
                    location,
                    &children,
                )?
            }
            // Markers are folded into the next block by the coalescer. One that
            // reaches here had nothing to attach to.
            FragmentKind::BlockAttributes(attributes) => self.arena.alloc(
                ElementKind::Paragraph(Paragraph {
                    attributes,
                    children: Vec::new(),
                }),
                location,
            ),
            FragmentKind::Admonition(variant) => self.arena.alloc(
                ElementKind::Paragraph(Paragraph {
                    attributes: crate::model::AttributeList::new()
                        .with_positional(variant.to_string()),
                    children: Vec::new(),
                }),
                location,
            ),
            FragmentKind::Section {
                level,
                attributes,
                title,
            } => {
                let title = self.lower_all(title)?;
                self.alloc_owning(
                    ElementKind::Section(Section {
                        level,
                        attributes,
                        title: title.clone(),
                        children: Vec::new(),
                    }),
                    location,
                    &title,
                )?
            }
            FragmentKind::Paragraph {
                attributes,
                content,
            } => {
                let children = self.lower_all(content)?;
                self.alloc_owning(
                    ElementKind::Paragraph(Paragraph {
                        attributes,
                        children: children.clone(),
                    }),
                    location,
                    &children,
                )?
            }
            FragmentKind::Delimited {
                kind,
                attributes,
                content,
            } => {
                let block = self.arena.alloc(
                    ElementKind::Delimited(DelimitedBlock {
                        kind,
                        attributes,
                        children: Vec::new(),
                    }),
                    location,
                );
                match kind {
                    DelimitedKind::Example
                    | DelimitedKind::Sidebar
                    | DelimitedKind::Open
                    | DelimitedKind::Quote => self.nest_into(block, content)?,
                    DelimitedKind::Listing | DelimitedKind::Literal => {
                        for fragment in content {
                            let child = self.lower(fragment)?;
                            self.arena.attach(block, child)?;
                        }
                    }
                }
                block
            }
            FragmentKind::Table(table) => self.build_table(table, location)?,
            FragmentKind::AttributeEntry { name, value } => {
                let value = self.lower_all(value)?;
                self.alloc_owning(
                    ElementKind::AttributeEntry(AttributeEntry {
                        name,
                        value: value.clone(),
                    }),
                    location,
                    &value,
                )?
            }
            FragmentKind::AttributeReset(name) => self
                .arena
                .alloc(ElementKind::AttributeReset(AttributeReset { name }), location),
            FragmentKind::AttributeReference(name) => self.arena.alloc(
                ElementKind::AttributeReference(AttributeReference { name }),
                location,
            ),
            FragmentKind::Counter { name, seed, hidden } => self.arena.alloc(
                ElementKind::Counter(CounterReference { name, seed, hidden }),
                location,
            ),
            FragmentKind::Conditional(condition) => self
                .arena
                .alloc(ElementKind::Conditional(Conditional { condition }), location),
            FragmentKind::EndIf(attributes) => self
                .arena
                .alloc(ElementKind::EndIf(EndIf { attributes }), location),
            FragmentKind::InlineConditional { condition, content } => {
                let children = self.lower_all(content)?;
                self.alloc_owning(
                    ElementKind::InlineConditional(InlineConditional {
                        condition,
                        children: children.clone(),
                    }),
                    location,
                    &children,
                )?
            }
            FragmentKind::FileInclude { path, attributes } => {
                let path = self.lower_all(path)?;
                self.alloc_owning(
                    ElementKind::FileInclude(FileInclude {
                        path: path.clone(),
                        attributes,
                    }),
                    location,
                    &path,
                )?
            }
        };
        Ok(id)
    }
}
