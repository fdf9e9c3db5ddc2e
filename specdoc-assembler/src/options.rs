use std::path::PathBuf;

use crate::{AttributeValue, DocumentAttributes, IncludePolicy, SafeMode};

/// Includes nested deeper than this fail the build unless configured otherwise.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 64;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Options {
    pub safe_mode: SafeMode,
    /// Attributes seeded into the build before the root document is read.
    pub document_attributes: DocumentAttributes,
    pub max_include_depth: usize,
    pub include_policy: IncludePolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            safe_mode: SafeMode::default(),
            document_attributes: DocumentAttributes::default(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            include_policy: IncludePolicy::default(),
        }
    }
}

impl Options {
    /// Create a new `OptionsBuilder` for fluent configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use specdoc_assembler::{Options, SafeMode};
    ///
    /// let options = Options::builder()
    ///     .with_safe_mode(SafeMode::Safe)
    ///     .with_attribute("draft", true)
    ///     .with_attribute("version", "1.2")
    ///     .build();
    /// assert_eq!(options.document_attributes.len(), 2);
    /// ```
    #[must_use]
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    /// Equivalent to `Options::default()`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_attributes(document_attributes: DocumentAttributes) -> Self {
        Self {
            document_attributes,
            ..Default::default()
        }
    }
}

/// Builder for `Options`.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct OptionsBuilder {
    safe_mode: SafeMode,
    document_attributes: DocumentAttributes,
    max_include_depth: usize,
    denied_includes: Vec<PathBuf>,
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self {
            safe_mode: SafeMode::default(),
            document_attributes: DocumentAttributes::default(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            denied_includes: Vec::new(),
        }
    }
}

impl OptionsBuilder {
    #[must_use]
    pub fn with_safe_mode(mut self, safe_mode: SafeMode) -> Self {
        self.safe_mode = safe_mode;
        self
    }

    /// Seed an attribute. `false` seeds it as explicitly unset.
    #[must_use]
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.document_attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Veto includes of `path`. A bare file name matches that file in any directory.
    #[must_use]
    pub fn with_denied_include(mut self, path: impl Into<PathBuf>) -> Self {
        self.denied_includes.push(path.into());
        self
    }

    #[must_use]
    pub fn build(self) -> Options {
        Options {
            safe_mode: self.safe_mode,
            document_attributes: self.document_attributes,
            max_include_depth: self.max_include_depth,
            include_policy: IncludePolicy::new(self.denied_includes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let options = Options::builder()
            .with_safe_mode(SafeMode::Server)
            .with_attribute("draft", true)
            .with_max_include_depth(3)
            .with_denied_include("secret.adoc")
            .build();
        assert_eq!(options.safe_mode, SafeMode::Server);
        assert_eq!(
            options.document_attributes.get("draft"),
            Some(&AttributeValue::Bool(true))
        );
        assert_eq!(options.max_include_depth, 3);
        assert!(!options.include_policy.is_empty());
    }

    #[test]
    fn test_default_depth() {
        assert_eq!(Options::new().max_include_depth, DEFAULT_MAX_INCLUDE_DEPTH);
    }
}
