//! Assemble multi-file documents into one tree.
//!
//! Each file is handed over by a tokenizer as a flat run of [`Fragment`]s and
//! built into a native tree inside a shared [`Arena`]. The preparse then walks
//! the trees in document order, evaluating attributes, counters, conditionals
//! and includes, and records what it decides in an [`OverlayMap`] instead of
//! editing the trees. A last pass nests sections across file boundaries by
//! their resolved levels. The result is read through a [`Reader`].
//!
//! # Example
//!
//! ```
//! use specdoc_assembler::{Fragment, MemoryHost, Options, assemble};
//!
//! let mut host = MemoryHost::new()
//!     .with_file(
//!         "main.adoc",
//!         vec![
//!             Fragment::section(1, "Intro"),
//!             Fragment::include("part.adoc"),
//!         ],
//!     )
//!     .with_file("part.adoc", vec![Fragment::section(2, "Details")]);
//!
//! let assembly = assemble(&mut host, "main.adoc", &Options::default())?;
//! let reader = assembly.reader();
//! let intro = reader.children(assembly.root()).next();
//! assert_eq!(intro.and_then(|id| assembly.section(id)).map(|s| s.name.as_str()), Some("Intro"));
//! # Ok::<(), specdoc_assembler::Error>(())
//! ```
use std::path::Path;

use serde_json::{Map, Value};

mod blocks;
mod error;
mod fragment;
mod grammar;
mod host;
mod model;
mod options;
mod overlay;
mod placement;
mod preprocessor;
mod safe_mode;
mod search;
mod text;

#[cfg(test)]
mod proptests;

pub use blocks::{document::DocumentBuilder, table::cell_format};
pub use error::{Error, SourceLocation};
pub use fragment::{CellFragment, Fragment, FragmentKind, TableFragment, TableLine};
pub use host::{Host, IncludePolicy, MemoryHost, normalize};
pub use model::*;
pub use options::{DEFAULT_MAX_INCLUDE_DEPTH, Options, OptionsBuilder};
pub use overlay::{Action, Iter, OverlayMap, Reader, Record};
pub use preprocessor::state::{AttributeStore, Inclusion};
pub use safe_mode::SafeMode;
pub use search::{SearchShould, find_all, search, skim, skim_func, skim_list, traverse};

use preprocessor::{Preprocessor, state::BuildState};

/// Build the document at `root` and everything it includes.
///
/// `root` is loaded through [`Host::include_file`] like any include. The
/// first error in document order aborts the build.
///
/// # Errors
///
/// Returns an error if a file cannot be loaded or built, or if a directive
/// in any of them is malformed.
#[tracing::instrument(skip(host, root, options), fields(root = %root.as_ref().display()))]
pub fn assemble<H: Host + ?Sized>(
    host: &mut H,
    root: impl AsRef<Path>,
    options: &Options,
) -> Result<Assembly, Error> {
    let path = normalize(root.as_ref());
    let mut arena = Arena::new();
    let document = host.include_file(&mut arena, &path, None)?;
    let root_dir = arena.document(document)?.base_dir().to_path_buf();

    let mut state = BuildState::new(options.document_attributes.clone());
    Preprocessor::new(host, &mut arena, &mut state, options, root_dir).run(document)?;
    placement::place(&arena, &mut state, document)?;

    tracing::debug!(
        elements = arena.len(),
        records = state.overlay.len(),
        files = state.inclusions.len() + 1,
        "document assembled"
    );
    Ok(Assembly {
        arena,
        state,
        root: document,
    })
}

/// A finished build: the native trees, the overlay over them, and what the
/// preparse learned along the way.
#[derive(Debug)]
pub struct Assembly {
    arena: Arena,
    state: BuildState,
    root: ElementId,
}

impl Assembly {
    /// The root document.
    #[must_use]
    pub fn root(&self) -> ElementId {
        self.root
    }

    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    #[must_use]
    pub fn overlay(&self) -> &OverlayMap {
        &self.state.overlay
    }

    /// The only sanctioned way to read the assembled tree.
    #[must_use]
    pub fn reader(&self) -> Reader<'_> {
        Reader::new(&self.arena, &self.state.overlay)
    }

    /// Attribute bindings as they stood at the end of the build.
    #[must_use]
    pub fn attributes(&self) -> &AttributeStore {
        &self.state.attributes
    }

    /// The resolved name and level of a section that survived the preparse.
    #[must_use]
    pub fn section(&self, id: ElementId) -> Option<&ResolvedSection> {
        self.state.sections.get(&id)
    }

    /// Every include that was expanded, in the order it was reached.
    #[must_use]
    pub fn inclusions(&self) -> &[Inclusion] {
        &self.state.inclusions
    }

    /// The assembled tree as JSON, read through the overlay.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        let value = self.resolved_node(&self.reader(), self.root)?;
        Ok(serde_json::to_string_pretty(&value)?)
    }

    fn resolved_node(&self, reader: &Reader<'_>, id: ElementId) -> Result<Value, Error> {
        let element = self.arena.element(id)?;
        let mut node = Map::new();
        node.insert("kind".to_string(), element.kind.name().into());

        // Scalar fields of the element; id lists are resolved below.
        if let Value::Object(variant) = serde_json::to_value(&element.kind)? {
            for fields in variant.into_values() {
                if let Value::Object(fields) = fields {
                    node.extend(fields.into_iter().filter(|(name, _)| {
                        !matches!(name.as_str(), "children" | "rows" | "title" | "value")
                    }));
                }
            }
        }

        if let ElementKind::Section(section) = &element.kind {
            if let Some(resolved) = self.section(id) {
                node.insert("name".to_string(), resolved.name.clone().into());
                node.insert("level".to_string(), resolved.level.into());
            }
            let title = reader
                .iterate(Some(id), &section.title)
                .map(|child| self.resolved_node(reader, child))
                .collect::<Result<Vec<_>, _>>()?;
            node.insert("title".to_string(), Value::Array(title));
        }

        let children = reader
            .children(id)
            .map(|child| self.resolved_node(reader, child))
            .collect::<Result<Vec<_>, _>>()?;
        if !children.is_empty() {
            node.insert("children".to_string(), Value::Array(children));
        }
        node.insert(
            "location".to_string(),
            serde_json::to_value(element.location)?,
        );
        Ok(Value::Object(node))
    }
}
