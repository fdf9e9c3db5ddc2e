use std::path::{Path, PathBuf};

use serde::Serialize;

use super::ElementId;

/// A `Document` is the root of one file's tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[non_exhaustive]
pub struct Document {
    pub path: PathBuf,
    pub children: Vec<ElementId>,
    /// The including document. Set once, when this document is included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) parent: Option<ElementId>,
}

impl Document {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            children: Vec::new(),
            parent: None,
        }
    }

    #[must_use]
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    /// Directory include paths in this document are relative to.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}
