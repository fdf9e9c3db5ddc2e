use std::{fmt, str::FromStr};

use serde::Serialize;

use super::{AttributeList, ElementId};

/// A paragraph: a run of inline content, optionally carrying block attributes.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[non_exhaustive]
pub struct Paragraph {
    #[serde(skip_serializing_if = "AttributeList::is_empty")]
    pub attributes: AttributeList,
    pub children: Vec<ElementId>,
}

impl Paragraph {
    /// The admonition this paragraph was marked with, if any.
    #[must_use]
    pub fn admonition(&self) -> Option<AdmonitionVariant> {
        self.attributes.style().and_then(|style| style.parse().ok())
    }
}

/// The delimiter family of a delimited block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum DelimitedKind {
    Example,
    Sidebar,
    Open,
    Quote,
    Listing,
    Literal,
}

/// A delimited block (`====`, `****`, `--`, `____`, `----`, `....`).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[non_exhaustive]
pub struct DelimitedBlock {
    pub kind: DelimitedKind,
    #[serde(skip_serializing_if = "AttributeList::is_empty")]
    pub attributes: AttributeList,
    pub children: Vec<ElementId>,
}

/// The variant of an admonition marker (`NOTE:` or `[NOTE]`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmonitionVariant {
    Note,
    Tip,
    Important,
    Caution,
    Warning,
}

impl fmt::Display for AdmonitionVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdmonitionVariant::Note => "NOTE",
            AdmonitionVariant::Tip => "TIP",
            AdmonitionVariant::Important => "IMPORTANT",
            AdmonitionVariant::Caution => "CAUTION",
            AdmonitionVariant::Warning => "WARNING",
        };
        write!(f, "{name}")
    }
}

impl FromStr for AdmonitionVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOTE" => Ok(AdmonitionVariant::Note),
            "TIP" => Ok(AdmonitionVariant::Tip),
            "IMPORTANT" => Ok(AdmonitionVariant::Important),
            "CAUTION" => Ok(AdmonitionVariant::Caution),
            "WARNING" => Ok(AdmonitionVariant::Warning),
            _ => Err(format!("unknown admonition variant: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admonition_from_style() {
        let paragraph = Paragraph {
            attributes: AttributeList::new().with_positional("WARNING"),
            children: Vec::new(),
        };
        assert_eq!(paragraph.admonition(), Some(AdmonitionVariant::Warning));
        assert_eq!(Paragraph::default().admonition(), None);
    }
}
