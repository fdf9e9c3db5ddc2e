//! The tokenizer boundary.
//!
//! A tokenizer hands one file over as a flat sequence of [`Fragment`]s:
//! sections are bare headings carrying a level and a title, tables are runs
//! of cells and blank lines, and text may be split across many adjacent
//! pieces. [`crate::DocumentBuilder`] turns such a sequence into a document
//! tree inside an [`crate::Arena`].

use crate::model::{
    AdmonitionVariant, AttributeList, AttributeName, CellFormat, Condition, DelimitedKind,
    FormatStyle, Location, SectionLevel,
};

#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct Fragment {
    pub kind: FragmentKind,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum FragmentKind {
    Text(String),
    NewLine,
    LineBreak,
    CharacterReplacement {
        source: String,
        replacement: String,
    },
    Formatted {
        style: FormatStyle,
        content: Vec<Fragment>,
    },
    EmptyLine,
    /// `[style,name=value]` on its own line, applying to the next block.
    BlockAttributes(AttributeList),
    /// `NOTE:` at the start of a paragraph.
    Admonition(AdmonitionVariant),
    Section {
        level: SectionLevel,
        attributes: AttributeList,
        title: Vec<Fragment>,
    },
    Paragraph {
        attributes: AttributeList,
        content: Vec<Fragment>,
    },
    Delimited {
        kind: DelimitedKind,
        attributes: AttributeList,
        content: Vec<Fragment>,
    },
    Table(TableFragment),
    AttributeEntry {
        name: AttributeName,
        value: Vec<Fragment>,
    },
    AttributeReset(AttributeName),
    AttributeReference(AttributeName),
    Counter {
        name: AttributeName,
        seed: Option<String>,
        hidden: bool,
    },
    Conditional(Condition),
    EndIf(Vec<AttributeName>),
    InlineConditional {
        condition: Condition,
        content: Vec<Fragment>,
    },
    FileInclude {
        path: Vec<Fragment>,
        attributes: AttributeList,
    },
}

impl FragmentKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            FragmentKind::Text(_) => "text",
            FragmentKind::NewLine => "new line",
            FragmentKind::LineBreak => "line break",
            FragmentKind::CharacterReplacement { .. } => "character replacement",
            FragmentKind::Formatted { .. } => "formatted text",
            FragmentKind::EmptyLine => "empty line",
            FragmentKind::BlockAttributes(_) => "block attributes",
            FragmentKind::Admonition(_) => "admonition",
            FragmentKind::Section { .. } => "section",
            FragmentKind::Paragraph { .. } => "paragraph",
            FragmentKind::Delimited { .. } => "delimited block",
            FragmentKind::Table(_) => "table",
            FragmentKind::AttributeEntry { .. } => "attribute entry",
            FragmentKind::AttributeReset(_) => "attribute reset",
            FragmentKind::AttributeReference(_) => "attribute reference",
            FragmentKind::Counter { .. } => "counter",
            FragmentKind::Conditional(_) => "conditional",
            FragmentKind::EndIf(_) => "endif",
            FragmentKind::InlineConditional { .. } => "inline conditional",
            FragmentKind::FileInclude { .. } => "file include",
        }
    }

    /// Inline fragments make up paragraph content; everything else is a block.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            FragmentKind::Text(_)
                | FragmentKind::NewLine
                | FragmentKind::LineBreak
                | FragmentKind::CharacterReplacement { .. }
                | FragmentKind::Formatted { .. }
                | FragmentKind::AttributeReference(_)
                | FragmentKind::Counter { .. }
                | FragmentKind::InlineConditional { .. }
        )
    }
}

/// A table as the tokenizer sees it: attributes plus a flat list of lines.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct TableFragment {
    pub attributes: AttributeList,
    pub lines: Vec<TableLine>,
}

#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum TableLine {
    /// A run of adjacent cells.
    Cells(Vec<CellFragment>),
    /// A blank line between cell runs.
    Blank,
    /// Anything between cells that is not a cell, such as a directive.
    Other(Fragment),
}

/// One cell with its raw, not yet reinterpreted content.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct CellFragment {
    pub format: CellFormat,
    pub content: Vec<Fragment>,
    pub location: Location,
}

impl CellFragment {
    #[must_use]
    pub fn new(content: Vec<Fragment>) -> Self {
        Self {
            format: CellFormat::default(),
            content,
            location: Location::default(),
        }
    }

    /// A cell holding plain `text`.
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self::new(vec![Fragment::text(text)])
    }

    #[must_use]
    pub fn with_format(mut self, format: CellFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Whether the cell's raw content ends with a line break, i.e. it was the
    /// last cell on its source line.
    #[must_use]
    pub fn ends_line(&self) -> bool {
        matches!(
            self.content.last().map(|fragment| &fragment.kind),
            Some(FragmentKind::NewLine | FragmentKind::LineBreak)
        )
    }
}

impl Fragment {
    #[must_use]
    pub fn new(kind: FragmentKind) -> Self {
        Self {
            kind,
            location: Location::default(),
        }
    }

    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn text(text: &str) -> Self {
        Self::new(FragmentKind::Text(text.to_string()))
    }

    #[must_use]
    pub fn new_line() -> Self {
        Self::new(FragmentKind::NewLine)
    }

    #[must_use]
    pub fn empty_line() -> Self {
        Self::new(FragmentKind::EmptyLine)
    }

    #[must_use]
    pub fn section(level: SectionLevel, title: &str) -> Self {
        Self::new(FragmentKind::Section {
            level,
            attributes: AttributeList::default(),
            title: vec![Fragment::text(title)],
        })
    }

    #[must_use]
    pub fn paragraph(content: Vec<Fragment>) -> Self {
        Self::new(FragmentKind::Paragraph {
            attributes: AttributeList::default(),
            content,
        })
    }

    #[must_use]
    pub fn attribute_entry(name: &str, value: &str) -> Self {
        let value = if value.is_empty() {
            Vec::new()
        } else {
            vec![Fragment::text(value)]
        };
        Self::new(FragmentKind::AttributeEntry {
            name: name.to_string(),
            value,
        })
    }

    #[must_use]
    pub fn attribute_reset(name: &str) -> Self {
        Self::new(FragmentKind::AttributeReset(name.to_string()))
    }

    #[must_use]
    pub fn attribute_reference(name: &str) -> Self {
        Self::new(FragmentKind::AttributeReference(name.to_string()))
    }

    #[must_use]
    pub fn conditional(condition: Condition) -> Self {
        Self::new(FragmentKind::Conditional(condition))
    }

    #[must_use]
    pub fn ifdef(attribute: &str) -> Self {
        Self::conditional(Condition::ifdef(attribute))
    }

    #[must_use]
    pub fn ifndef(attribute: &str) -> Self {
        Self::conditional(Condition::ifndef(attribute))
    }

    #[must_use]
    pub fn endif() -> Self {
        Self::new(FragmentKind::EndIf(Vec::new()))
    }

    #[must_use]
    pub fn inline_conditional(condition: Condition, content: Vec<Fragment>) -> Self {
        Self::new(FragmentKind::InlineConditional { condition, content })
    }

    #[must_use]
    pub fn include(path: &str) -> Self {
        Self::include_with(path, AttributeList::default())
    }

    #[must_use]
    pub fn include_with(path: &str, attributes: AttributeList) -> Self {
        Self::new(FragmentKind::FileInclude {
            path: vec![Fragment::text(path)],
            attributes,
        })
    }

    #[must_use]
    pub fn table(attributes: AttributeList, lines: Vec<TableLine>) -> Self {
        Self::new(FragmentKind::Table(TableFragment { attributes, lines }))
    }
}
