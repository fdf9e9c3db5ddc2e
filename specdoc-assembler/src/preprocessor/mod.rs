//! The preparse: a depth-first walk over each file's built tree that
//! interprets directives and records every decision in the overlay.
//!
//! Files are walked in document order. An include is walked when its
//! directive is reached, with its own conditional stack and level offset but
//! the build's shared attribute store, counters and overlay.
use std::path::PathBuf;

use crate::{
    Error, Options, Reader,
    error::SourceLocation,
    host::Host,
    model::{
        Arena, AttributeName, AttributeReference, AttributeValue, Condition, Conditional,
        CounterReference, ElementId, ElementKind, EndIf, InlineConditional, Location,
        ResolvedSection, Section, SectionLevel, Text,
    },
    text::plain_text,
};

mod attribute;
mod conditional;
pub(crate) mod counter;
mod include;
pub(crate) mod state;

use state::BuildState;

/// Sections deeper than this cannot be rendered as headings.
const MAX_SECTION_LEVEL: SectionLevel = 5;

/// An open conditional.
#[derive(Debug)]
struct Frame {
    suppressed_before: bool,
    origin: Location,
    /// Names an `endif::name[]` may use to close this frame.
    attributes: Vec<AttributeName>,
}

/// Where the walk is inside a table.
#[derive(Clone, Copy, Debug, Default)]
struct TableCursor {
    row: Option<ElementId>,
    last_cell: Option<ElementId>,
    /// Content read at row level goes into `last_cell` instead of the row.
    cell_append: bool,
}

/// The state of one file's walk.
#[derive(Debug)]
struct FileState {
    document: ElementId,
    path: PathBuf,
    base_dir: PathBuf,
    suppress: bool,
    frames: Vec<Frame>,
    level_offset: isize,
    table: TableCursor,
    depth: usize,
}

impl FileState {
    fn source_location(&self, location: Location) -> Box<SourceLocation> {
        SourceLocation::boxed(Some(self.path.clone()), location)
    }

    /// Whether `parent` is the current table row and a cell has been seen in it.
    fn in_row(&self, parent: ElementId) -> Option<ElementId> {
        self.table
            .last_cell
            .filter(|_| self.table.row == Some(parent))
    }

    /// The cell that content under `parent` folds into, if cell-append mode is on.
    fn append_target(&self, parent: ElementId) -> Option<ElementId> {
        self.in_row(parent).filter(|_| self.table.cell_append)
    }
}

pub(crate) struct Preprocessor<'a, H: Host + ?Sized> {
    host: &'a mut H,
    arena: &'a mut Arena,
    state: &'a mut BuildState,
    options: &'a Options,
    /// Directory of the root document, the boundary for confined includes.
    root_dir: PathBuf,
}

impl<'a, H: Host + ?Sized> Preprocessor<'a, H> {
    pub(crate) fn new(
        host: &'a mut H,
        arena: &'a mut Arena,
        state: &'a mut BuildState,
        options: &'a Options,
        root_dir: PathBuf,
    ) -> Self {
        Self {
            host,
            arena,
            state,
            options,
            root_dir,
        }
    }

    fn reader(&self) -> Reader<'_> {
        Reader::new(self.arena, &self.state.overlay)
    }

    /// Walk the root document.
    ///
    /// # Errors
    ///
    /// Returns the first directive, include or section error in document order.
    pub(crate) fn run(&mut self, root: ElementId) -> Result<(), Error> {
        self.preparse_document(root, 0, 0)
    }

    #[tracing::instrument(level = "trace", skip(self))]
    fn preparse_document(
        &mut self,
        document: ElementId,
        level_offset: isize,
        depth: usize,
    ) -> Result<(), Error> {
        let (path, base_dir, children) = {
            let inner = self.arena.document(document)?;
            (
                inner.path.clone(),
                inner.base_dir().to_path_buf(),
                inner.children.clone(),
            )
        };
        let mut file = FileState {
            document,
            path,
            base_dir,
            suppress: false,
            frames: Vec::new(),
            level_offset,
            table: TableCursor::default(),
            depth,
        };
        self.preparse_list(&mut file, document, &children)?;

        if let Some(frame) = file.frames.last() {
            tracing::error!(path = %file.path.display(), "conditional left open at end of file");
            return Err(Error::UnterminatedConditional(
                file.source_location(frame.origin),
            ));
        }
        Ok(())
    }

    fn preparse_list(
        &mut self,
        file: &mut FileState,
        parent: ElementId,
        elements: &[ElementId],
    ) -> Result<(), Error> {
        for id in elements {
            self.preparse(file, parent, *id)?;
        }
        Ok(())
    }

    fn preparse(
        &mut self,
        file: &mut FileState,
        parent: ElementId,
        id: ElementId,
    ) -> Result<(), Error> {
        let element = self.arena.element(id)?;
        let location = element.location;
        let kind = element.kind.clone();
        match &kind {
            ElementKind::Section(section) => self.preparse_section(file, id, section, location),
            ElementKind::AttributeEntry(entry) => {
                if !file.suppress {
                    self.preparse_list(file, id, &entry.value)?;
                    self.apply_attribute_entry(file, id, &entry.name, &entry.value, location)?;
                }
                self.state.overlay.remove(id);
                Ok(())
            }
            ElementKind::AttributeReset(reset) => {
                if !file.suppress {
                    if reset.name == "leveloffset" {
                        file.level_offset = 0;
                    }
                    self.state.attributes.unset(&reset.name);
                }
                self.state.overlay.remove(id);
                Ok(())
            }
            ElementKind::AttributeReference(reference) => {
                self.preparse_reference(file, parent, id, reference, location)
            }
            ElementKind::Counter(counter) => {
                self.preparse_counter(file, parent, id, counter, location)
            }
            ElementKind::Conditional(conditional) => {
                self.open_conditional(file, id, conditional, location)
            }
            ElementKind::EndIf(endif) => self.close_conditional(file, parent, id, endif, location),
            ElementKind::InlineConditional(inline) => {
                self.preparse_inline_conditional(file, parent, id, inline, location)
            }
            ElementKind::FileInclude(include) => {
                self.preparse_include(file, parent, id, include, location)
            }
            ElementKind::Table(table) => {
                if file.suppress {
                    self.state.overlay.remove(id);
                }
                let saved = std::mem::take(&mut file.table);
                let result = self.preparse_list(file, id, &table.rows);
                file.table = saved;
                result
            }
            ElementKind::TableRow(row) => {
                file.table = TableCursor {
                    row: Some(id),
                    last_cell: None,
                    cell_append: false,
                };
                if file.suppress {
                    self.state.overlay.remove(id);
                }
                self.preparse_list(file, id, &row.children)
            }
            ElementKind::TableCell(cell) => {
                file.table.cell_append = false;
                if file.suppress {
                    self.state.overlay.remove(id);
                } else {
                    file.table.last_cell = Some(id);
                }
                // Nested content has its own rows.
                let saved = file.table;
                let result = self.preparse_list(file, id, &cell.children);
                file.table = saved;
                result
            }
            ElementKind::Document(_)
            | ElementKind::Paragraph(_)
            | ElementKind::Delimited(_)
            | ElementKind::Text(_)
            | ElementKind::NewLine
            | ElementKind::LineBreak
            | ElementKind::CharacterReplacement(_)
            | ElementKind::Formatted(_)
            | ElementKind::EmptyLine => {
                if file.suppress {
                    self.state.overlay.remove(id);
                } else if let Some(cell) = file.append_target(parent) {
                    self.state.overlay.append(cell, [id]);
                    self.state.overlay.remove(id);
                }
                self.preparse_list(file, id, kind.children())
            }
        }
    }

    fn preparse_section(
        &mut self,
        file: &mut FileState,
        id: ElementId,
        section: &Section,
        location: Location,
    ) -> Result<(), Error> {
        if file.suppress {
            // Local nesting already moved everything up to the next heading into
            // this section, including content past the closing endif. Replacing
            // keeps that content while the heading goes.
            self.state.overlay.replace(id, section.children.clone());
            return self.preparse_list(file, id, &section.children);
        }
        self.preparse_list(file, id, &section.title)?;

        let offset = file.level_offset;
        let level = isize::from(section.level)
            .checked_add(offset)
            .and_then(|level| SectionLevel::try_from(level).ok())
            .filter(|level| *level <= MAX_SECTION_LEVEL)
            .ok_or_else(|| {
                tracing::error!(raw_level = section.level, offset, "section level out of range");
                Error::SectionLevelOutOfRange {
                    level: section.level,
                    offset,
                    location: file.source_location(location),
                }
            })?;
        let name = self.host.section_name(&self.reader(), id)?;
        tracing::trace!(%id, %name, resolved = level, "section resolved");
        self.state
            .sections
            .insert(id, ResolvedSection::new(name, level));

        self.preparse_list(file, id, &section.children)
    }

    fn apply_attribute_entry(
        &mut self,
        file: &mut FileState,
        id: ElementId,
        name: &str,
        value: &[ElementId],
        location: Location,
    ) -> Result<(), Error> {
        if name == "leveloffset" {
            let raw = plain_text(&self.reader(), id, value);
            file.level_offset = attribute::parse_level_offset(&raw, file.level_offset)
                .map_err(|reason| {
                    tracing::error!(%reason, "invalid leveloffset entry");
                    Error::InvalidLevelOffset {
                        value: raw.clone(),
                        location: file.source_location(location),
                    }
                })?;
        }
        let value = attribute::entry_value(&self.reader(), id, value);
        self.state.attributes.set(name.to_string(), value);
        Ok(())
    }

    fn preparse_reference(
        &mut self,
        file: &FileState,
        parent: ElementId,
        id: ElementId,
        reference: &AttributeReference,
        location: Location,
    ) -> Result<(), Error> {
        if file.suppress {
            self.state.overlay.remove(id);
            return Ok(());
        }
        match self.state.attributes.get(&reference.name).cloned() {
            Some(AttributeValue::String(value)) => {
                let text = self.arena.alloc(ElementKind::Text(Text::new(value)), location);
                self.substitute(file, parent, id, vec![text]);
            }
            Some(AttributeValue::Elements(elements)) => self.substitute(file, parent, id, elements),
            Some(AttributeValue::Bool(true)) => {
                tracing::error!(name = %reference.name, "flag attribute referenced as text");
                return Err(Error::UnsupportedAttributeValue {
                    name: reference.name.clone(),
                    location: file.source_location(location),
                });
            }
            Some(AttributeValue::Bool(false)) | None => {
                tracing::trace!(name = %reference.name, "attribute reference left unresolved");
                if let Some(cell) = file.append_target(parent) {
                    self.state.overlay.append(cell, [id]);
                    self.state.overlay.remove(id);
                }
            }
        }
        Ok(())
    }

    fn preparse_counter(
        &mut self,
        file: &FileState,
        parent: ElementId,
        id: ElementId,
        counter: &CounterReference,
        location: Location,
    ) -> Result<(), Error> {
        if file.suppress {
            self.state.overlay.remove(id);
            return Ok(());
        }
        let value = self
            .state
            .counters
            .next(&counter.name, counter.seed.as_deref())
            .map_err(|reason| {
                tracing::error!(%reason, name = %counter.name, "counter cannot advance");
                Error::InvalidCounterSeed {
                    name: counter.name.clone(),
                    seed: counter.seed.clone().unwrap_or_default(),
                    location: file.source_location(location),
                }
            })?;
        self.state
            .attributes
            .set(counter.name.clone(), AttributeValue::String(value.clone()));
        if counter.hidden {
            self.state.overlay.remove(id);
        } else {
            let text = self.arena.alloc(ElementKind::Text(Text::new(value)), location);
            self.substitute(file, parent, id, vec![text]);
        }
        Ok(())
    }

    /// Read `replacement` in place of `id`, or fold it into the last cell.
    fn substitute(
        &mut self,
        file: &FileState,
        parent: ElementId,
        id: ElementId,
        replacement: Vec<ElementId>,
    ) {
        if let Some(cell) = file.append_target(parent) {
            self.state.overlay.append(cell, replacement);
            self.state.overlay.remove(id);
        } else {
            self.state.overlay.replace(id, replacement);
        }
    }

    fn evaluate(
        &self,
        file: &FileState,
        id: ElementId,
        condition: &Condition,
        location: Location,
    ) -> Result<bool, Error> {
        let reader = self.reader();
        let render = |elements: &[ElementId]| plain_text(&reader, id, elements);
        conditional::evaluate(
            condition,
            &self.state.attributes,
            &render,
            &file.path,
            location,
        )
    }

    fn open_conditional(
        &mut self,
        file: &mut FileState,
        id: ElementId,
        conditional: &Conditional,
        location: Location,
    ) -> Result<(), Error> {
        // Inside a suppressed branch nothing is evaluated and nothing turns back on.
        let result = file.suppress || self.evaluate(file, id, &conditional.condition, location)?;
        file.frames.push(Frame {
            suppressed_before: file.suppress,
            origin: location,
            attributes: conditional.condition.attributes().to_vec(),
        });
        file.suppress = file.suppress || !result;
        tracing::trace!(%id, result, suppress = file.suppress, "conditional opened");
        self.state.overlay.remove(id);
        Ok(())
    }

    fn close_conditional(
        &mut self,
        file: &mut FileState,
        parent: ElementId,
        id: ElementId,
        endif: &EndIf,
        location: Location,
    ) -> Result<(), Error> {
        let Some(frame) = file.frames.pop() else {
            tracing::error!(%id, "endif without an open conditional");
            return Err(Error::UnmatchedEndif(file.source_location(location)));
        };
        if let Some(name) = endif
            .attributes
            .iter()
            .find(|name| !frame.attributes.contains(name))
        {
            tracing::error!(%id, %name, "endif names an attribute its conditional does not");
            return Err(Error::MismatchedEndif {
                name: name.clone(),
                location: file.source_location(location),
            });
        }
        file.suppress = frame.suppressed_before;
        file.table.cell_append = file.in_row(parent).is_some();
        self.state.overlay.remove(id);
        Ok(())
    }

    fn preparse_inline_conditional(
        &mut self,
        file: &mut FileState,
        parent: ElementId,
        id: ElementId,
        inline: &InlineConditional,
        location: Location,
    ) -> Result<(), Error> {
        if file.suppress {
            self.state.overlay.remove(id);
            return Ok(());
        }
        if self.evaluate(file, id, &inline.condition, location)? {
            self.preparse_list(file, id, &inline.children)?;
            if let Some(cell) = file.in_row(parent) {
                let body: Vec<_> = self.reader().iterate(Some(id), &inline.children).collect();
                self.state.overlay.append(cell, body);
                self.state.overlay.remove(id);
            } else {
                self.state.overlay.replace(id, inline.children.clone());
            }
        } else {
            self.state.overlay.remove(id);
        }
        if file.in_row(parent).is_some() {
            file.table.cell_append = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::{
        Assembly, AttributeList, CellFragment, Condition, Error, Fragment, FragmentKind,
        MemoryHost, Options, SafeMode, TableCell, TableLine, Text, assemble, find_all,
    };

    fn cells(texts: &[&str]) -> TableLine {
        TableLine::Cells(texts.iter().map(|text| CellFragment::text(text)).collect())
    }

    fn two_columns(lines: Vec<TableLine>) -> Fragment {
        Fragment::table(AttributeList::new().with_named("cols", "2"), lines)
    }

    /// The text of every cell, in reading order.
    fn cell_texts(assembly: &Assembly) -> Vec<Vec<String>> {
        let reader = assembly.reader();
        find_all::<TableCell>(&reader, assembly.root())
            .into_iter()
            .map(|(id, _)| {
                find_all::<Text>(&reader, id)
                    .into_iter()
                    .map(|(_, text)| text.content.clone())
                    .collect()
            })
            .collect()
    }

    fn texts(assembly: &Assembly) -> Vec<String> {
        find_all::<Text>(&assembly.reader(), assembly.root())
            .into_iter()
            .map(|(_, text)| text.content.clone())
            .collect()
    }

    fn build(fragments: Vec<Fragment>, options: &Options) -> Result<Assembly, Error> {
        let mut host = MemoryHost::new().with_file("main.adoc", fragments);
        assemble(&mut host, "main.adoc", options)
    }

    #[rstest]
    #[case::set(true, vec![vec!["a"], vec!["b"], vec!["c"], vec!["d"]])]
    #[case::unset(false, vec![vec!["a"], vec!["c"], vec!["d"]])]
    fn test_conditional_between_cells(
        #[case] x: bool,
        #[case] expected: Vec<Vec<&str>>,
    ) -> Result<(), Error> {
        let options = Options::builder().with_attribute("x", x).build();
        let assembly = build(
            vec![two_columns(vec![
                cells(&["a"]),
                TableLine::Other(Fragment::ifdef("x")),
                cells(&["b"]),
                TableLine::Other(Fragment::endif()),
                cells(&["c", "d"]),
            ])],
            &options,
        )?;
        assert_eq!(cell_texts(&assembly), expected);
        Ok(())
    }

    #[test]
    fn test_content_after_endif_folds_into_the_last_cell() -> Result<(), Error> {
        let options = Options::builder().with_attribute("x", true).build();
        let assembly = build(
            vec![
                Fragment::attribute_entry("product", "Widget"),
                two_columns(vec![
                    cells(&["a"]),
                    TableLine::Other(Fragment::ifdef("x")),
                    TableLine::Other(Fragment::endif()),
                    TableLine::Other(Fragment::attribute_reference("product")),
                    cells(&["b"]),
                ]),
            ],
            &options,
        )?;
        assert_eq!(cell_texts(&assembly), vec![vec!["a", "Widget"], vec!["b"]]);
        Ok(())
    }

    #[rstest]
    #[case::true_body(true, vec![vec!["a", "yes"], vec!["b"]])]
    #[case::false_body(false, vec![vec!["a"], vec!["b"]])]
    fn test_inline_conditional_between_cells(
        #[case] x: bool,
        #[case] expected: Vec<Vec<&str>>,
    ) -> Result<(), Error> {
        let options = Options::builder().with_attribute("x", x).build();
        let assembly = build(
            vec![two_columns(vec![
                cells(&["a"]),
                TableLine::Other(Fragment::inline_conditional(
                    Condition::ifdef("x"),
                    vec![Fragment::text("yes")],
                )),
                cells(&["b"]),
            ])],
            &options,
        )?;
        assert_eq!(cell_texts(&assembly), expected);
        Ok(())
    }

    #[test]
    fn test_include_after_endif_lands_in_the_last_cell() -> Result<(), Error> {
        let mut host = MemoryHost::new()
            .with_file(
                "main.adoc",
                vec![two_columns(vec![
                    cells(&["a"]),
                    TableLine::Other(Fragment::ifndef("x")),
                    TableLine::Other(Fragment::endif()),
                    TableLine::Other(Fragment::include("cell.adoc")),
                    cells(&["b"]),
                ])],
            )
            .with_file("cell.adoc", vec![Fragment::text("included")]);
        let assembly = assemble(&mut host, "main.adoc", &Options::default())?;
        assert_eq!(
            cell_texts(&assembly),
            vec![vec!["a", "included"], vec!["b"]]
        );
        assert_eq!(assembly.inclusions().len(), 1);
        Ok(())
    }

    #[test]
    fn test_suppressed_section_keeps_content_after_endif() -> Result<(), Error> {
        let assembly = build(
            vec![
                Fragment::ifdef("x"),
                Fragment::section(1, "Hidden"),
                Fragment::paragraph(vec![Fragment::text("body")]),
                Fragment::endif(),
                Fragment::paragraph(vec![Fragment::text("after")]),
            ],
            &Options::default(),
        )?;
        assert_eq!(texts(&assembly), vec!["after"]);
        let reader = assembly.reader();
        assert!(
            reader
                .children(assembly.root())
                .all(|id| assembly.section(id).is_none())
        );
        Ok(())
    }

    #[test]
    fn test_named_endif_must_match() {
        let result = build(
            vec![
                Fragment::ifdef("x"),
                Fragment::new(FragmentKind::EndIf(vec!["y".to_string()])),
            ],
            &Options::default(),
        );
        assert!(matches!(result, Err(Error::MismatchedEndif { ref name, .. }) if name == "y"));
    }

    #[test]
    fn test_section_level_out_of_range() {
        let result = build(
            vec![
                Fragment::attribute_entry("leveloffset", "+2"),
                Fragment::section(4, "Too deep"),
            ],
            &Options::default(),
        );
        assert!(matches!(
            result,
            Err(Error::SectionLevelOutOfRange {
                level: 4,
                offset: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_flag_reference_is_rejected() {
        let options = Options::builder().with_attribute("flag", true).build();
        let result = build(
            vec![Fragment::paragraph(vec![Fragment::attribute_reference(
                "flag",
            )])],
            &options,
        );
        assert!(matches!(
            result,
            Err(Error::UnsupportedAttributeValue { ref name, .. }) if name == "flag"
        ));
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_secure_mode_logs_vetoed_include() -> Result<(), Error> {
        let mut host = MemoryHost::new()
            .with_file(
                "main.adoc",
                vec![
                    Fragment::include("part.adoc"),
                    Fragment::paragraph(vec![Fragment::text("main")]),
                ],
            )
            .with_file("part.adoc", vec![Fragment::text("part")]);
        let options = Options::builder().with_safe_mode(SafeMode::Secure).build();
        let assembly = assemble(&mut host, "main.adoc", &options)?;
        assert_eq!(texts(&assembly), vec!["main"]);
        assert!(logs_contain("include vetoed, dropping directive"));
        Ok(())
    }
}
