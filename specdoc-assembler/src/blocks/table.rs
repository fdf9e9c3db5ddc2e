//! Table layout: from a flat run of cells to a grid of fixed width.
use tracing::instrument;

use crate::{
    Error,
    blocks::{coalesce::coalesce, document::DocumentBuilder},
    fragment::{CellFragment, Fragment, FragmentKind, TableFragment, TableLine},
    grammar::{parse_cell_format, parse_column_formats},
    model::{
        AttributeList, CellFormat, ColumnFormat, ColumnStyle, ElementId, ElementKind, Location,
        Table, TableCell, TableRow, Text,
    },
};

/// One position in a row as laid out, before any element is allocated.
#[derive(Debug)]
enum Slot {
    Cell { cell: CellFragment, column: usize },
    Filler { column: usize, location: Location },
    Other(Fragment),
}

#[derive(Debug, Default)]
struct RowDraft {
    slots: Vec<Slot>,
    filled: usize,
}

/// Places cells on a grid of `column_count` columns.
#[derive(Debug)]
struct Grid {
    column_count: usize,
    rows: Vec<RowDraft>,
    current: Option<RowDraft>,
    /// Rows still covered by a rowspan, per column.
    outstanding: Vec<usize>,
    /// Non-cell lines seen while the current row was full or absent.
    pending: Vec<Fragment>,
}

impl Grid {
    fn new(column_count: usize) -> Self {
        Self {
            column_count,
            rows: Vec::new(),
            current: None,
            outstanding: vec![0; column_count],
            pending: Vec::new(),
        }
    }

    /// The current row, starting a new one if it is full or absent.
    fn open_row(&mut self) -> &mut RowDraft {
        let column_count = self.column_count;
        if let Some(row) = self.current.take_if(|row| row.filled >= column_count) {
            self.rows.push(row);
        }
        let pending = &mut self.pending;
        self.current.get_or_insert_with(|| RowDraft {
            slots: pending.drain(..).map(Slot::Other).collect(),
            filled: 0,
        })
    }

    fn other(&mut self, fragment: Fragment) {
        match &mut self.current {
            Some(row) if row.filled < self.column_count => row.slots.push(Slot::Other(fragment)),
            Some(_) | None => self.pending.push(fragment),
        }
    }

    fn place(&mut self, cell: CellFragment) {
        let location = cell.location;
        // Fill positions still covered by a rowspan from an earlier row.
        let column = loop {
            let column = self.open_row().filled;
            let Some(rows) = self.outstanding.get_mut(column).filter(|rows| **rows > 0) else {
                break column;
            };
            *rows -= 1;
            let row = self.open_row();
            row.slots.push(Slot::Filler { column, location });
            row.filled += 1;
        };

        let col_span = cell.format.col_span.clamp(1, self.column_count - column);
        let row_span = cell.format.row_span;
        let row = self.open_row();
        row.slots.push(Slot::Cell { cell, column });
        for spanned in column + 1..column + col_span {
            row.slots.push(Slot::Filler {
                column: spanned,
                location,
            });
        }
        row.filled += col_span;
        if row_span > 1 {
            for rows in self.outstanding.iter_mut().skip(column).take(col_span) {
                *rows = row_span - 1;
            }
        }
    }

    fn finish(mut self) -> Vec<RowDraft> {
        let Some(mut row) = self.current.take() else {
            if !self.pending.is_empty() {
                tracing::warn!(count = self.pending.len(), "table content with no row to hold it");
            }
            return self.rows;
        };
        let location = row
            .slots
            .iter()
            .rev()
            .find_map(|slot| match slot {
                Slot::Cell { cell, .. } => Some(cell.location),
                Slot::Filler { location, .. } => Some(*location),
                Slot::Other(_) => None,
            })
            .unwrap_or_default();
        for column in row.filled..self.column_count {
            row.slots.push(Slot::Filler { column, location });
        }
        row.filled = row.filled.max(self.column_count);
        row.slots.extend(self.pending.drain(..).map(Slot::Other));
        self.rows.push(row);
        self.rows
    }
}

fn span_width(cell: &CellFragment) -> usize {
    cell.format.col_span.saturating_mul(cell.format.duplicate)
}

/// Work out how many columns a table without a usable `cols` attribute has.
fn discover_column_count(lines: &[TableLine]) -> Option<usize> {
    // The first cell run up to a blank line.
    let mut width = 0;
    let mut seen_cells = false;
    for line in lines {
        match line {
            TableLine::Cells(cells) => {
                seen_cells = true;
                width = cells
                    .iter()
                    .map(span_width)
                    .fold(width, usize::saturating_add);
            }
            TableLine::Blank if seen_cells => return (width > 0).then_some(width),
            TableLine::Blank | TableLine::Other(_) => {}
        }
    }

    // No blank line: the first source line of cells.
    let mut width: usize = 0;
    for cell in lines.iter().flat_map(|line| match line {
        TableLine::Cells(cells) => cells.as_slice(),
        TableLine::Blank | TableLine::Other(_) => &[],
    }) {
        width = width.saturating_add(span_width(cell));
        if cell.ends_line() {
            break;
        }
    }
    (width > 0).then_some(width)
}

/// Whether the first row is a header: the `header` option says so, or the
/// first line is a cell run followed directly by a blank line.
fn has_header(attributes: &AttributeList, lines: &[TableLine]) -> bool {
    if attributes.has_option("noheader") {
        return false;
    }
    attributes.has_option("header")
        || matches!(
            lines,
            [TableLine::Cells(_), TableLine::Blank, ..]
        )
}

/// Drop the line terminator the tokenizer leaves at the end of a cell.
fn trim_line_end(mut content: Vec<Fragment>) -> Vec<Fragment> {
    while matches!(
        content.last().map(|fragment| &fragment.kind),
        Some(FragmentKind::NewLine | FragmentKind::EmptyLine)
    ) {
        content.pop();
    }
    content
}

/// The raw source text of `fragments`, for literal cells.
fn raw_text(fragments: &[Fragment], out: &mut String) {
    for fragment in fragments {
        match &fragment.kind {
            FragmentKind::Text(text) => out.push_str(text),
            FragmentKind::NewLine | FragmentKind::EmptyLine => out.push('\n'),
            FragmentKind::LineBreak => out.push_str(" +\n"),
            FragmentKind::CharacterReplacement { source, .. } => out.push_str(source),
            FragmentKind::AttributeReference(name) => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
            FragmentKind::Formatted { content, .. }
            | FragmentKind::Paragraph { content, .. }
            | FragmentKind::Delimited { content, .. }
            | FragmentKind::InlineConditional { content, .. } => raw_text(content, out),
            FragmentKind::Counter { .. }
            | FragmentKind::BlockAttributes(_)
            | FragmentKind::Admonition(_)
            | FragmentKind::Section { .. }
            | FragmentKind::Table(_)
            | FragmentKind::AttributeEntry { .. }
            | FragmentKind::AttributeReset(_)
            | FragmentKind::Conditional(_)
            | FragmentKind::EndIf(_)
            | FragmentKind::FileInclude { .. } => {}
        }
    }
}

impl DocumentBuilder<'_> {
    /// Lay a table out on its grid and lower it.
    #[instrument(level = "trace", skip(self, table))]
    pub(crate) fn build_table(
        &mut self,
        table: TableFragment,
        location: Location,
    ) -> Result<ElementId, Error> {
        let TableFragment { attributes, lines } = table;

        let columns: Vec<ColumnFormat> = match attributes.get("cols") {
            Some(value) => {
                parse_column_formats(value).map_err(|error| {
                    tracing::error!(value, %error, "invalid cols attribute");
                    Error::InvalidAttributeCast {
                        name: "cols".to_string(),
                        value: value.to_string(),
                        location: self.source_location(location),
                    }
                })?
            }
            None => Vec::new(),
        };
        let column_count = if columns.is_empty() {
            discover_column_count(&lines).ok_or_else(|| {
                tracing::error!(%location, "table has no cell run to count columns from");
                Error::UndiscoverableColumnCount(self.source_location(location))
            })?
        } else {
            columns.len()
        };
        let header = has_header(&attributes, &lines);

        let mut grid = Grid::new(column_count);
        for line in lines {
            match line {
                TableLine::Cells(cells) => {
                    for cell in cells {
                        for _ in 1..cell.format.duplicate {
                            grid.place(cell.clone());
                        }
                        grid.place(cell);
                    }
                }
                TableLine::Blank => {}
                TableLine::Other(fragment) => grid.other(fragment),
            }
        }
        let drafts = grid.finish();
        tracing::trace!(column_count, rows = drafts.len(), header, "table laid out");

        let table = self.arena.alloc(
            ElementKind::Table(Table {
                attributes,
                column_count,
                columns,
                header,
                rows: Vec::new(),
            }),
            location,
        );
        for draft in drafts {
            let row = self
                .arena
                .alloc(ElementKind::TableRow(TableRow::default()), location);
            self.arena.attach(table, row)?;
            for slot in draft.slots {
                let child = match slot {
                    Slot::Cell { cell, column } => {
                        let style = cell.format.style.unwrap_or_else(|| {
                            self.table_column_style(table, column)
                        });
                        self.build_cell(cell, column, style)?
                    }
                    Slot::Filler { column, location } => self.arena.alloc(
                        ElementKind::TableCell(TableCell {
                            format: CellFormat::default(),
                            column,
                            blank: true,
                            children: Vec::new(),
                        }),
                        location,
                    ),
                    Slot::Other(fragment) => self.lower(fragment)?,
                };
                self.arena.attach(row, child)?;
            }
        }
        Ok(table)
    }

    fn table_column_style(&self, table: ElementId, column: usize) -> ColumnStyle {
        match self.arena.get(table).map(|element| &element.kind) {
            Some(ElementKind::Table(table)) => table.column_style(column),
            Some(_) | None => ColumnStyle::default(),
        }
    }

    /// Reinterpret a cell's raw content according to its style and lower it.
    fn build_cell(
        &mut self,
        cell: CellFragment,
        column: usize,
        style: ColumnStyle,
    ) -> Result<ElementId, Error> {
        let CellFragment {
            format,
            content,
            location,
        } = cell;
        let id = self.arena.alloc(
            ElementKind::TableCell(TableCell {
                format,
                column,
                blank: false,
                children: Vec::new(),
            }),
            location,
        );
        let content = trim_line_end(content);
        match style {
            ColumnStyle::Literal => {
                let mut text = String::new();
                raw_text(&content, &mut text);
                if !text.is_empty() {
                    let child = self
                        .arena
                        .alloc(ElementKind::Text(Text::new(text)), location);
                    self.arena.attach(id, child)?;
                }
            }
            ColumnStyle::AsciiDoc => self.nest_into(id, coalesce(content))?,
            ColumnStyle::Default
            | ColumnStyle::Emphasis
            | ColumnStyle::Header
            | ColumnStyle::Monospace
            | ColumnStyle::Strong => {
                for fragment in coalesce(content) {
                    if !(fragment.kind.is_inline()
                        || matches!(fragment.kind, FragmentKind::EmptyLine))
                    {
                        tracing::error!(kind = fragment.kind.name(), style = style.name(), "block content in an inline cell");
                        return Err(Error::UnexpectedCellElement {
                            kind: fragment.kind.name(),
                            style: style.name(),
                            location: self.source_location(fragment.location),
                        });
                    }
                    let child = self.lower(fragment)?;
                    self.arena.attach(id, child)?;
                }
            }
        }
        Ok(id)
    }
}

/// Parse a cell specifier such as `2.3+^.>a`.
///
/// # Errors
///
/// Returns [`Error::InvalidAttributeCast`] if the specifier is malformed.
pub fn cell_format(spec: &str, location: Location) -> Result<CellFormat, Error> {
    parse_cell_format(spec).map_err(|error| {
        tracing::error!(spec, %error, "invalid cell specifier");
        Error::InvalidAttributeCast {
            name: "cell".to_string(),
            value: spec.to_string(),
            location: crate::error::SourceLocation::boxed(None, location),
        }
    })
}
