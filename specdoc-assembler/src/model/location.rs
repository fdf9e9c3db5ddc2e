use std::fmt;

use serde::{
    Serialize,
    ser::{SerializeSeq, Serializer},
};

/// A `Location` represents a location in a source file.
#[derive(Debug, Default, Clone, Copy, Hash, Eq, PartialEq)]
#[non_exhaustive]
pub struct Location {
    /// The start position of the location.
    pub start: Position,
    /// The end position of the location.
    pub end: Position,
}

impl Location {
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A location covering a single line, from `column` to the end of `width`.
    #[must_use]
    pub fn line(line: usize, column: usize, width: usize) -> Self {
        Self {
            start: Position::new(line, column),
            end: Position::new(line, column + width.saturating_sub(1)),
        }
    }

    /// Grow this location so that it also covers `other`.
    pub fn extend(&mut self, other: &Location) {
        if *self == Location::default() {
            *self = *other;
            return;
        }
        if *other == Location::default() {
            return;
        }
        if other.start < self.start {
            self.start = other.start;
        }
        if other.end > self.end {
            self.end = other.end;
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Location {
            start:
                Position {
                    line: start_line,
                    column: start_column,
                },
            end:
                Position {
                    line: end_line,
                    column: end_column,
                },
        } = self;

        write!(
            f,
            "start(line: {start_line}, column: {start_column}), end(line: {end_line}, column: {end_column})",
        )
    }
}

// Serialized as a two element sequence, start and end.
impl Serialize for Location {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_seq(Some(2))?;
        state.serialize_element(&self.start)?;
        state.serialize_element(&self.end)?;
        state.end()
    }
}

/// A `Position` represents a line and column in a source file.
#[derive(Debug, Default, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize)]
#[non_exhaustive]
pub struct Position {
    /// The line number of the position.
    pub line: usize,
    /// The column number of the position.
    #[serde(rename = "col")]
    pub column: usize,
}

impl Position {
    #[must_use]
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}
