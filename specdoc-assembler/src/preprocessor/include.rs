use std::path::{Path, PathBuf};

use crate::{
    Error,
    host::Host,
    model::{ElementId, FileInclude, Location},
    preprocessor::{FileState, Preprocessor, attribute::parse_level_offset, state::Inclusion},
    text::simple_text,
};

impl<H: Host + ?Sized> Preprocessor<'_, H> {
    /// Expand `include::path[]`: load the target, splice its content in place
    /// of the directive (or into the last table cell), then walk it.
    #[tracing::instrument(level = "trace", skip(self, file, include), fields(path = %file.path.display()))]
    pub(super) fn preparse_include(
        &mut self,
        file: &mut FileState,
        parent: ElementId,
        id: ElementId,
        include: &FileInclude,
        location: Location,
    ) -> Result<(), Error> {
        if file.suppress {
            self.state.overlay.remove(id);
            return Ok(());
        }
        self.preparse_list(file, id, &include.path)?;
        let raw = simple_text(&self.reader(), id, &include.path, &file.path)?;
        let raw = raw.trim();
        if raw.is_empty() {
            tracing::error!(%id, "include directive without a target");
            return Err(Error::InvalidIncludePath {
                raw: raw.to_string(),
                location: file.source_location(location),
            });
        }
        let path = self
            .host
            .resolve_path(&file.base_dir, raw)
            .map_err(|error| {
                tracing::error!(raw, %error, "failed to resolve include path");
                Error::Include {
                    path: PathBuf::from(raw),
                    source: Box::new(error),
                }
            })?;

        // An include-local leveloffset seeds the included file only.
        let level_offset = match include.attributes.get("leveloffset") {
            Some(value) => parse_level_offset(value, file.level_offset).map_err(|reason| {
                tracing::error!(%reason, "invalid leveloffset on include");
                Error::InvalidLevelOffset {
                    value: value.to_string(),
                    location: file.source_location(location),
                }
            })?,
            None => file.level_offset,
        };

        if !self.allows(&path) {
            tracing::warn!(path = %path.display(), "include vetoed, dropping directive");
            self.state.overlay.remove(id);
            return Ok(());
        }

        let depth = file.depth + 1;
        if depth > self.options.max_include_depth {
            tracing::error!(path = %path.display(), depth, "include nested too deeply");
            return Err(Error::IncludeDepthExceeded {
                path,
                max: self.options.max_include_depth,
            });
        }

        tracing::debug!(path = %path.display(), level_offset, "including file");
        let included = match self.host.include_file(self.arena, &path, Some(file.document)) {
            Ok(included) => included,
            Err(error) if include.attributes.has_option("optional") => {
                tracing::warn!(path = %path.display(), %error, "optional include failed, dropping directive");
                self.state.overlay.remove(id);
                return Ok(());
            }
            Err(error) => {
                tracing::error!(path = %path.display(), %error, "include failed");
                return Err(Error::Include {
                    path,
                    source: Box::new(error),
                });
            }
        };
        self.host.set_parent(self.arena, file.document, included)?;
        self.state.inclusions.push(Inclusion {
            including: file.document,
            included,
            path: path.clone(),
        });

        if let Some(cell) = file.append_target(parent) {
            self.preparse_document(included, level_offset, depth)?;
            let content: Vec<_> = self.reader().children(included).collect();
            self.state.overlay.append(cell, content);
            self.state.overlay.remove(id);
        } else {
            let children = self.arena.children(included).to_vec();
            self.state.overlay.replace(id, children);
            self.preparse_document(included, level_offset, depth)?;
        }
        if file.in_row(parent).is_some() {
            file.table.cell_append = true;
        }
        Ok(())
    }

    /// The build's own policy first, then the host's veto.
    fn allows(&self, path: &Path) -> bool {
        self.options
            .include_policy
            .allows(self.options.safe_mode, &self.root_dir, path)
            && self.host.should_include_file(path)
    }
}
