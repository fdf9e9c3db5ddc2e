use serde::Serialize;

use super::ElementId;

/// Plain text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct Text {
    pub content: String,
}

impl Text {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// A typographic replacement such as `(C)` or `--`, holding the character it stands for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct CharacterReplacement {
    pub source: String,
    pub replacement: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatStyle {
    Bold,
    Italic,
    Monospace,
    Highlight,
}

/// Constrained or unconstrained formatted text.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[non_exhaustive]
pub struct Formatted {
    pub style: FormatStyle,
    pub children: Vec<ElementId>,
}
