use std::{fmt, path::PathBuf};

use crate::model::{ElementId, Location, SectionLevel};

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unknown element: {0}")]
    UnknownElement(ElementId),

    #[error("unable to discover column count for table, position: {0}")]
    UndiscoverableColumnCount(Box<SourceLocation>),

    #[error("invalid value for attribute '{name}': {value}, position: {location}")]
    InvalidAttributeCast {
        name: String,
        value: String,
        location: Box<SourceLocation>,
    },

    #[error("unexpected {kind} in {style} table cell, position: {location}")]
    UnexpectedCellElement {
        kind: &'static str,
        style: &'static str,
        location: Box<SourceLocation>,
    },

    #[error("unexpected {kind} in simple text, position: {location}")]
    IllegalSimpleTextElement {
        kind: &'static str,
        location: Box<SourceLocation>,
    },

    #[error("invalid ifeval directive: {reason}, position: {location}")]
    InvalidIfEval {
        reason: String,
        location: Box<SourceLocation>,
    },

    #[error("ifeval compares values of different types, position: {0}")]
    InvalidIfEvalDirectiveMismatchedTypes(Box<SourceLocation>),

    #[error("invalid level offset: {value}, position: {location}")]
    InvalidLevelOffset {
        value: String,
        location: Box<SourceLocation>,
    },

    #[error("section level {level} shifted by {offset} is out of range, position: {location}")]
    SectionLevelOutOfRange {
        level: SectionLevel,
        offset: isize,
        location: Box<SourceLocation>,
    },

    #[error("endif without matching conditional, position: {0}")]
    UnmatchedEndif(Box<SourceLocation>),

    #[error("endif::{name}[] does not close the open conditional, position: {location}")]
    MismatchedEndif {
        name: String,
        location: Box<SourceLocation>,
    },

    #[error("conditional is never closed, position: {0}")]
    UnterminatedConditional(Box<SourceLocation>),

    #[error("attribute '{name}' holds a value that cannot be substituted, position: {location}")]
    UnsupportedAttributeValue {
        name: String,
        location: Box<SourceLocation>,
    },

    #[error("invalid counter seed for '{name}': {seed}, position: {location}")]
    InvalidCounterSeed {
        name: String,
        seed: String,
        location: Box<SourceLocation>,
    },

    #[error("invalid include path: {raw}, position: {location}")]
    InvalidIncludePath {
        raw: String,
        location: Box<SourceLocation>,
    },

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to include {path}")]
    Include {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("maximum include depth of {max} exceeded by {path}")]
    IncludeDepthExceeded { path: PathBuf, max: usize },

    #[error("expected a document element, found {0}")]
    NotADocument(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Extract location information from this error if available.
    #[must_use]
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::UndiscoverableColumnCount(location)
            | Self::InvalidIfEvalDirectiveMismatchedTypes(location)
            | Self::UnmatchedEndif(location)
            | Self::UnterminatedConditional(location)
            | Self::InvalidAttributeCast { location, .. }
            | Self::UnexpectedCellElement { location, .. }
            | Self::IllegalSimpleTextElement { location, .. }
            | Self::InvalidIfEval { location, .. }
            | Self::InvalidLevelOffset { location, .. }
            | Self::SectionLevelOutOfRange { location, .. }
            | Self::MismatchedEndif { location, .. }
            | Self::UnsupportedAttributeValue { location, .. }
            | Self::InvalidCounterSeed { location, .. }
            | Self::InvalidIncludePath { location, .. } => Some(location),
            Self::Include { source, .. } => source.location(),
            Self::UnknownElement(_)
            | Self::FileNotFound(_)
            | Self::IncludeDepthExceeded { .. }
            | Self::NotADocument(_)
            | Self::Io(_)
            | Self::Json(_) => None,
        }
    }

    /// Get advice for this error if available.
    #[must_use]
    pub fn advice(&self) -> Option<&'static str> {
        match self {
            Self::UndiscoverableColumnCount(..) => Some(
                "Set the cols attribute (e.g. [cols=\"1,2\"]) or put the cells of the first row on one line",
            ),
            Self::InvalidIfEvalDirectiveMismatchedTypes(..) => Some(
                "ifeval expressions must compare values of the same type (both numbers or both strings)",
            ),
            Self::InvalidLevelOffset { .. } => {
                Some("leveloffset takes an absolute level (2) or a relative one (+1, -1)")
            }
            Self::UnmatchedEndif(..) => {
                Some("Every endif::[] must close an earlier ifdef, ifndef or ifeval in the same file")
            }
            Self::UnterminatedConditional(..) => {
                Some("Close every ifdef, ifndef and ifeval with endif::[] before the end of the file")
            }
            Self::Include { source, .. } => source.advice(),
            Self::UnknownElement(_)
            | Self::InvalidAttributeCast { .. }
            | Self::UnexpectedCellElement { .. }
            | Self::IllegalSimpleTextElement { .. }
            | Self::InvalidIfEval { .. }
            | Self::SectionLevelOutOfRange { .. }
            | Self::MismatchedEndif { .. }
            | Self::UnsupportedAttributeValue { .. }
            | Self::InvalidCounterSeed { .. }
            | Self::InvalidIncludePath { .. }
            | Self::FileNotFound(_)
            | Self::IncludeDepthExceeded { .. }
            | Self::NotADocument(_)
            | Self::Io(_)
            | Self::Json(_) => None,
        }
    }
}

/// Where in which file a directive failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: Option<PathBuf>,
    pub location: Location,
}

impl SourceLocation {
    pub(crate) fn boxed(file: Option<PathBuf>, location: Location) -> Box<Self> {
        Box::new(Self { file, location })
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}", file.display(), self.location),
            None => write!(f, "{}", self.location),
        }
    }
}
