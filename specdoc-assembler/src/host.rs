//! What the assembler needs from its environment: path resolution, loading
//! included files, and section naming.
use std::path::{Component, Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::{
    DocumentBuilder, Error, Reader, SafeMode,
    fragment::Fragment,
    model::{Arena, ElementId, ElementKind},
    text::plain_text,
};

/// The capabilities a build runs against.
///
/// Only [`Host::include_file`] is required. The others default to lexical path
/// handling, accepting every file, and naming sections by their title text.
pub trait Host {
    /// Resolve an include target written in a file living in `base_dir`.
    ///
    /// # Errors
    ///
    /// Implementations may reject targets they cannot resolve.
    fn resolve_path(&self, base_dir: &Path, raw: &str) -> Result<PathBuf, Error> {
        Ok(normalize(&base_dir.join(raw)))
    }

    /// Veto hook consulted after the build's own [`IncludePolicy`].
    fn should_include_file(&self, _path: &Path) -> bool {
        true
    }

    /// Load `path` and build it into `arena`, returning its document root.
    /// `parent` is the including document, `None` for the root.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or built.
    fn include_file(
        &mut self,
        arena: &mut Arena,
        path: &Path,
        parent: Option<ElementId>,
    ) -> Result<ElementId, Error>;

    /// The display name of `section`, read after its title has been preprocessed.
    ///
    /// # Errors
    ///
    /// The default never fails.
    fn section_name(&self, reader: &Reader<'_>, section: ElementId) -> Result<String, Error> {
        Ok(match reader.kind(section) {
            Some(ElementKind::Section(inner)) => {
                plain_text(reader, section, &inner.title).trim().to_string()
            }
            Some(_) | None => String::new(),
        })
    }

    /// Link `child` to the document that included it.
    ///
    /// # Errors
    ///
    /// Returns an error if `child` is not a document.
    fn set_parent(
        &mut self,
        arena: &mut Arena,
        parent: ElementId,
        child: ElementId,
    ) -> Result<(), Error> {
        arena.set_document_parent(child, parent)
    }
}

/// Resolve `.` and `..` without touching the file system. Leading `..` that
/// cannot be folded are kept.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) {
                    normalized.pop();
                } else if !matches!(
                    normalized.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_))
                ) {
                    normalized.push("..");
                }
            }
            Component::Normal(_) | Component::RootDir | Component::Prefix(_) => {
                normalized.push(component);
            }
        }
    }
    normalized
}

/// The build's own include veto: safe-mode rules plus a deny-list.
#[derive(Clone, Debug, Default)]
pub struct IncludePolicy {
    denied: Vec<PathBuf>,
}

impl IncludePolicy {
    #[must_use]
    pub fn new(denied: Vec<PathBuf>) -> Self {
        Self { denied }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.denied.is_empty()
    }

    pub fn deny(&mut self, path: impl Into<PathBuf>) {
        self.denied.push(path.into());
    }

    /// Whether `path` may be included in a build whose root lives in `root_dir`.
    #[must_use]
    pub fn allows(&self, safe_mode: SafeMode, root_dir: &Path, path: &Path) -> bool {
        if !safe_mode.allows_includes() {
            return false;
        }
        if safe_mode.confines_includes()
            && (!path.starts_with(root_dir)
                || path
                    .components()
                    .any(|component| component == Component::ParentDir))
        {
            return false;
        }
        !self
            .denied
            .iter()
            .any(|denied| path == denied || path.ends_with(denied))
    }
}

/// A [`Host`] serving pre-tokenized files from memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryHost {
    files: FxHashMap<PathBuf, Vec<Fragment>>,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, fragments: Vec<Fragment>) -> Self {
        self.insert(path, fragments);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, fragments: Vec<Fragment>) {
        self.files.insert(normalize(&path.into()), fragments);
    }
}

impl Host for MemoryHost {
    fn include_file(
        &mut self,
        arena: &mut Arena,
        path: &Path,
        _parent: Option<ElementId>,
    ) -> Result<ElementId, Error> {
        let path = normalize(path);
        let fragments = self
            .files
            .get(&path)
            .cloned()
            .ok_or_else(|| Error::FileNotFound(path.clone()))?;
        DocumentBuilder::new(arena, path).build(fragments)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("docs/./a.adoc", "docs/a.adoc")]
    #[case("docs/parts/../a.adoc", "docs/a.adoc")]
    #[case("../a.adoc", "../a.adoc")]
    #[case("/a/../../b.adoc", "/b.adoc")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(Path::new(input)), PathBuf::from(expected));
    }

    #[test]
    fn test_default_resolve_is_relative_to_base() -> Result<(), Error> {
        let host = MemoryHost::new();
        assert_eq!(
            host.resolve_path(Path::new("docs/chapters"), "../shared/x.adoc")?,
            PathBuf::from("docs/shared/x.adoc")
        );
        Ok(())
    }

    #[rstest]
    #[case::unsafe_any(SafeMode::Unsafe, "../outside.adoc", true)]
    #[case::safe_inside(SafeMode::Safe, "docs/inside.adoc", true)]
    #[case::safe_outside(SafeMode::Safe, "other/outside.adoc", false)]
    #[case::secure_nothing(SafeMode::Secure, "docs/inside.adoc", false)]
    #[case::denied(SafeMode::Unsafe, "docs/secret.adoc", false)]
    fn test_policy(#[case] mode: SafeMode, #[case] path: &str, #[case] allowed: bool) {
        let policy = IncludePolicy::new(vec![PathBuf::from("secret.adoc")]);
        assert_eq!(
            policy.allows(mode, Path::new("docs"), Path::new(path)),
            allowed
        );
    }

    #[test]
    fn test_memory_host_missing_file() {
        let mut host = MemoryHost::new();
        let mut arena = Arena::new();
        assert!(matches!(
            host.include_file(&mut arena, Path::new("nope.adoc"), None),
            Err(Error::FileNotFound(_))
        ));
    }
}
