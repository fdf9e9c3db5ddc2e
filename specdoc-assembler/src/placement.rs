//! Section placement: the cross-file pass that decides the final section tree.
//!
//! Local nesting only ever sees one file, with raw levels. Once every file has
//! been preparsed, the root document is read back through the overlay (with
//! includes already spliced in), its section spine is flattened, and the spine
//! is nested again with the resolved levels. The result is written as
//! children/parent overrides, so the native trees stay as they were built.
use rustc_hash::FxHashMap;

use crate::{
    Error, Reader,
    blocks::document::{SectionNester, SectionSink},
    model::{Arena, ElementId, ElementKind, ResolvedSection, SectionLevel},
    preprocessor::state::BuildState,
};

/// Collects the placement instead of attaching anything.
#[derive(Debug, Default)]
struct PlacementSink {
    children: FxHashMap<ElementId, Vec<ElementId>>,
    parents: Vec<(ElementId, ElementId)>,
}

impl SectionSink for PlacementSink {
    fn attach(&mut self, parent: ElementId, child: ElementId) -> Result<(), Error> {
        self.children.entry(parent).or_default().push(child);
        self.parents.push((child, parent));
        Ok(())
    }
}

/// Every element of the spine in reading order, sections with their resolved level.
fn flatten(
    reader: &Reader<'_>,
    sections: &FxHashMap<ElementId, ResolvedSection>,
    parent: ElementId,
    spine: &mut Vec<(ElementId, Option<SectionLevel>)>,
) {
    for id in reader.children(parent) {
        match reader.kind(id) {
            Some(ElementKind::Section(section)) => {
                let level = sections
                    .get(&id)
                    .map_or(section.level, |resolved| resolved.level);
                spine.push((id, Some(level)));
                flatten(reader, sections, id, spine);
            }
            Some(_) | None => spine.push((id, None)),
        }
    }
}

/// Re-nest the sections under `root` across file boundaries.
#[tracing::instrument(level = "trace", skip(arena, state))]
pub(crate) fn place(arena: &Arena, state: &mut BuildState, root: ElementId) -> Result<(), Error> {
    let mut spine = Vec::new();
    flatten(
        &Reader::new(arena, &state.overlay),
        &state.sections,
        root,
        &mut spine,
    );

    let mut sink = PlacementSink::default();
    let mut nester = SectionNester::new(root);
    for (id, level) in &spine {
        nester.push(&mut sink, *id, *level)?;
    }

    // Only what the placement actually changes is recorded.
    let reader = Reader::new(arena, &state.overlay);
    let mut children = Vec::new();
    for id in std::iter::once(root).chain(
        spine
            .iter()
            .filter(|(_, level)| level.is_some())
            .map(|(id, _)| *id),
    ) {
        let placed = sink.children.remove(&id).unwrap_or_default();
        if !reader.children(id).eq(placed.iter().copied()) {
            children.push((id, placed));
        }
    }
    let parents: Vec<_> = sink
        .parents
        .into_iter()
        .filter(|(child, parent)| reader.parent(*child) != Some(*parent))
        .collect();

    let overlay = &mut state.overlay;
    for (id, placed) in children {
        overlay.override_children(id, placed);
    }
    for (child, parent) in parents {
        overlay.override_parent(child, parent);
    }
    tracing::debug!(elements = spine.len(), "sections placed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{Action, DocumentBuilder, Record, fragment::Fragment, model::DocumentAttributes};

    struct Fixture {
        arena: Arena,
        state: BuildState,
        main: ElementId,
        first: ElementId,
        paragraph: ElementId,
        included: ElementId,
        included_paragraph: ElementId,
    }

    /// `main` holds `= A` with a paragraph and an include of a file holding
    /// a single section `B`, whose resolved level is `included_level`.
    fn fixture(included_level: SectionLevel) -> Result<Fixture, Error> {
        let mut arena = Arena::new();
        let main = DocumentBuilder::new(&mut arena, "main.adoc").build(vec![
            Fragment::section(1, "A"),
            Fragment::paragraph(vec![Fragment::text("a")]),
            Fragment::include("b.adoc"),
        ])?;
        let other = DocumentBuilder::new(&mut arena, "b.adoc").build(vec![
            Fragment::section(2, "B"),
            Fragment::paragraph(vec![Fragment::text("b")]),
        ])?;
        let &[first] = arena.children(main) else {
            return Err(Error::UnknownElement(main));
        };
        let &[paragraph, include] = arena.children(first) else {
            return Err(Error::UnknownElement(first));
        };
        let &[included] = arena.children(other) else {
            return Err(Error::UnknownElement(other));
        };
        let &[included_paragraph] = arena.children(included) else {
            return Err(Error::UnknownElement(included));
        };

        let mut state = BuildState::new(DocumentAttributes::default());
        state.overlay.replace(include, vec![included]);
        state
            .sections
            .insert(first, ResolvedSection::new("A".to_string(), 1));
        state.sections.insert(
            included,
            ResolvedSection::new("B".to_string(), included_level),
        );
        Ok(Fixture {
            arena,
            state,
            main,
            first,
            paragraph,
            included,
            included_paragraph,
        })
    }

    #[test]
    fn test_included_section_nests_under_including_section() -> Result<(), Error> {
        let Fixture {
            arena,
            mut state,
            main,
            first,
            paragraph,
            included,
            included_paragraph,
        } = fixture(2)?;
        place(&arena, &mut state, main)?;

        let reader = Reader::new(&arena, &state.overlay);
        assert_eq!(reader.children(main).collect::<Vec<_>>(), vec![first]);
        assert_eq!(
            reader.children(first).collect::<Vec<_>>(),
            vec![paragraph, included]
        );
        assert_eq!(
            reader.children(included).collect::<Vec<_>>(),
            vec![included_paragraph]
        );
        assert_eq!(reader.parent(included), Some(first));
        assert_eq!(reader.parent(first), Some(main));
        Ok(())
    }

    #[test]
    fn test_unchanged_placement_records_nothing() -> Result<(), Error> {
        let mut arena = Arena::new();
        let main = DocumentBuilder::new(&mut arena, "main.adoc").build(vec![
            Fragment::paragraph(vec![Fragment::text("intro")]),
            Fragment::section(1, "A"),
            Fragment::paragraph(vec![Fragment::text("a")]),
            Fragment::section(2, "B"),
        ])?;
        let mut state = BuildState::new(DocumentAttributes::default());
        place(&arena, &mut state, main)?;
        assert!(state.overlay.is_empty());
        Ok(())
    }

    #[test]
    fn test_only_moved_elements_are_overridden() -> Result<(), Error> {
        let Fixture {
            arena,
            mut state,
            main,
            first,
            paragraph,
            included,
            included_paragraph,
        } = fixture(2)?;
        place(&arena, &mut state, main)?;

        // The include already splices `B` under `A`; only its parent moves.
        for untouched in [main, first, paragraph, included_paragraph] {
            assert!(state.overlay.get(untouched).is_none());
        }
        assert_eq!(
            state.overlay.get(included).map(Record::action),
            Some(Action::OVERRIDE_PARENT)
        );
        Ok(())
    }

    #[test]
    fn test_resolved_level_lifts_section_to_root() -> Result<(), Error> {
        let Fixture {
            arena,
            mut state,
            main,
            first,
            paragraph,
            included,
            ..
        } = fixture(1)?;
        place(&arena, &mut state, main)?;

        let reader = Reader::new(&arena, &state.overlay);
        assert_eq!(
            reader.children(main).collect::<Vec<_>>(),
            vec![first, included]
        );
        assert_eq!(reader.children(first).collect::<Vec<_>>(), vec![paragraph]);
        assert_eq!(reader.parent(included), Some(main));
        Ok(())
    }
}
