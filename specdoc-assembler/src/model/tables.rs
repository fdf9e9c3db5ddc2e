//! Table types.

use serde::Serialize;

use super::{AttributeList, ElementId};

/// Horizontal alignment for table cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical alignment for table cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlignment {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Column width specification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ColumnWidth {
    /// Proportional width (e.g., 1, 2, 3 - relative to other columns)
    Proportional(u32),
    /// Percentage width (e.g., 15%, 30%, 55%)
    Percentage(u32),
    /// Auto-width - content determines width (~)
    Auto,
}

impl Default for ColumnWidth {
    fn default() -> Self {
        ColumnWidth::Proportional(1)
    }
}

/// How the raw text of a cell is reinterpreted once the grid is known.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ColumnStyle {
    /// Nested block content (a)
    #[serde(rename = "asciidoc")]
    AsciiDoc,
    /// Default paragraph-level markup (d)
    #[default]
    Default,
    /// Emphasis/italic (e)
    Emphasis,
    /// Header styling (h)
    Header,
    /// Literal block text (l)
    Literal,
    /// Monospace font (m)
    Monospace,
    /// Strong/bold (s)
    Strong,
}

impl ColumnStyle {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ColumnStyle::AsciiDoc => "asciidoc",
            ColumnStyle::Default => "default",
            ColumnStyle::Emphasis => "emphasis",
            ColumnStyle::Header => "header",
            ColumnStyle::Literal => "literal",
            ColumnStyle::Monospace => "monospace",
            ColumnStyle::Strong => "strong",
        }
    }
}

/// Column format specification for table formatting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct ColumnFormat {
    pub halign: HorizontalAlignment,
    pub valign: VerticalAlignment,
    pub width: ColumnWidth,
    pub style: ColumnStyle,
}

impl ColumnFormat {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_halign(mut self, halign: HorizontalAlignment) -> Self {
        self.halign = halign;
        self
    }

    #[must_use]
    pub fn with_valign(mut self, valign: VerticalAlignment) -> Self {
        self.valign = valign;
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: ColumnWidth) -> Self {
        self.width = width;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: ColumnStyle) -> Self {
        self.style = style;
        self
    }
}

/// Per-cell specifier, e.g. `2.3+^.>a|`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct CellFormat {
    pub col_span: usize,
    pub row_span: usize,
    /// How many times the cell is repeated (`3*|`).
    pub duplicate: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halign: Option<HorizontalAlignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valign: Option<VerticalAlignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ColumnStyle>,
}

impl Default for CellFormat {
    fn default() -> Self {
        Self {
            col_span: 1,
            row_span: 1,
            duplicate: 1,
            halign: None,
            valign: None,
            style: None,
        }
    }
}

impl CellFormat {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_col_span(mut self, col_span: usize) -> Self {
        self.col_span = col_span.max(1);
        self
    }

    #[must_use]
    pub fn with_row_span(mut self, row_span: usize) -> Self {
        self.row_span = row_span.max(1);
        self
    }

    #[must_use]
    pub fn with_duplicate(mut self, duplicate: usize) -> Self {
        self.duplicate = duplicate.max(1);
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: ColumnStyle) -> Self {
        self.style = Some(style);
        self
    }
}

/// A `Table` holds rows of exactly `column_count` cells each.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[non_exhaustive]
pub struct Table {
    #[serde(skip_serializing_if = "AttributeList::is_empty")]
    pub attributes: AttributeList,
    pub column_count: usize,
    /// Column formats, one per column. Empty when the table has no `cols`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnFormat>,
    /// Whether the first row is a header row.
    pub header: bool,
    pub rows: Vec<ElementId>,
}

impl Table {
    /// The style that applies to cells of column `index` unless the cell overrides it.
    #[must_use]
    pub fn column_style(&self, index: usize) -> ColumnStyle {
        self.columns
            .get(index)
            .map(|column| column.style)
            .unwrap_or_default()
    }
}

/// A `TableRow` holds cells, plus any directives the source put between them.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[non_exhaustive]
pub struct TableRow {
    pub children: Vec<ElementId>,
}

/// A `TableCell` is one grid position. Blank cells are fillers synthesized for spans.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[non_exhaustive]
pub struct TableCell {
    pub format: CellFormat,
    /// Column index the cell was placed at.
    pub column: usize,
    pub blank: bool,
    pub children: Vec<ElementId>,
}
