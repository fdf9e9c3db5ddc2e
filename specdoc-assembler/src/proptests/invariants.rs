//! Overlay and assembly invariants checked with property-based testing
//!
//! - the reader is a pure function of the overlay
//! - removal beats every other record
//! - a document without directives reads exactly as it was built
//! - sections always sit under a section of a lower level

use proptest::prelude::*;

use crate::{
    Action, Arena, AttributeList, ElementId, ElementKind, Error, Fragment, FragmentKind, Location,
    MemoryHost, Options, OverlayMap, Reader, Section, TableCell, Text, assemble, find_all,
};

use super::generators::*;

/// A cell with `len` text children and `edits` applied to it.
struct Edited {
    arena: Arena,
    overlay: OverlayMap,
    parent: ElementId,
    children: Vec<ElementId>,
    appended: Vec<ElementId>,
}

fn fresh(arena: &mut Arena, count: usize) -> Vec<ElementId> {
    (0..count)
        .map(|_| arena.alloc(ElementKind::Text(Text::new("fresh")), Location::default()))
        .collect()
}

fn edited(len: usize, edits: &[Edit]) -> Result<Edited, Error> {
    let mut arena = Arena::new();
    let parent = arena.alloc(ElementKind::TableCell(TableCell::default()), Location::default());
    for _ in 0..len {
        let child = arena.alloc(ElementKind::Text(Text::new("native")), Location::default());
        arena.attach(parent, child)?;
    }
    let children = arena.children(parent).to_vec();
    let mut overlay = OverlayMap::new();
    let mut appended = Vec::new();
    for edit in edits {
        match *edit {
            Edit::Remove(at) => {
                if let Some(id) = children.get(at % len.max(1)) {
                    overlay.remove(*id);
                }
            }
            Edit::Replace(at, count) => {
                let replacement = fresh(&mut arena, count);
                if let Some(id) = children.get(at % len.max(1)) {
                    overlay.replace(*id, replacement);
                }
            }
            Edit::Append(count) => {
                let elements = fresh(&mut arena, count);
                appended.extend(&elements);
                overlay.append(parent, elements);
            }
        }
    }
    Ok(Edited {
        arena,
        overlay,
        parent,
        children,
        appended,
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// Reading the same overlay twice gives the same sequence.
    #[test]
    fn reader_is_idempotent(len in 0..12_usize, edits in edits()) {
        let Edited { arena, overlay, parent, .. } = edited(len, &edits)?;
        let reader = Reader::new(&arena, &overlay);
        let first: Vec<_> = reader.children(parent).collect();
        let second: Vec<_> = reader.children(parent).collect();
        prop_assert_eq!(first, second);
    }

    /// Nothing removed is read, and neither is anything that replaced it.
    #[test]
    fn remove_wins(len in 1..12_usize, edits in edits()) {
        let Edited { arena, overlay, parent, children, .. } = edited(len, &edits)?;
        let reader = Reader::new(&arena, &overlay);
        let read: Vec<_> = reader.children(parent).collect();
        for id in &children {
            let Some(record) = overlay.get(*id) else {
                continue;
            };
            if record.action().contains(Action::REMOVE) {
                prop_assert!(!read.contains(id));
                for replaced in record.replacement() {
                    prop_assert!(!read.contains(replaced));
                }
            }
        }
    }

    /// Appended elements come last, in the order they were appended.
    #[test]
    fn appended_come_last(len in 0..12_usize, edits in edits()) {
        let Edited { arena, overlay, parent, appended, .. } = edited(len, &edits)?;
        let reader = Reader::new(&arena, &overlay);
        let read: Vec<_> = reader.children(parent).collect();
        prop_assert!(read.ends_with(&appended));
    }

    /// Without directives, the assembled tree reads exactly like the built one.
    #[test]
    fn plain_document_round_trips(fragments in plain_document()) {
        let mut host = MemoryHost::new().with_file("main.adoc", fragments);
        let assembly = assemble(&mut host, "main.adoc", &Options::default())?;
        let reader = assembly.reader();
        let arena = assembly.arena();

        prop_assert!(assembly.overlay().is_empty());
        let mut pending = vec![assembly.root()];
        while let Some(id) = pending.pop() {
            let read: Vec<_> = reader.children(id).collect();
            prop_assert_eq!(read.as_slice(), arena.children(id));
            pending.extend(read);
        }
    }

    /// Across files, a section's placed parent is the root or a section of a lower level.
    #[test]
    fn sections_nest_under_lower_levels(
        main in plain_document(),
        part in plain_document(),
        leveloffset in 0..=1_u8,
    ) {
        // Raw levels of 5 cannot take an offset.
        let part: Vec<_> = part
            .into_iter()
            .filter(|fragment| {
                !matches!(&fragment.kind, FragmentKind::Section { level, .. } if *level + leveloffset > 5)
            })
            .collect();
        let mut main = main;
        main.push(Fragment::include_with(
            "part.adoc",
            AttributeList::new().with_named("leveloffset", format!("+{leveloffset}")),
        ));
        let mut host = MemoryHost::new()
            .with_file("main.adoc", main)
            .with_file("part.adoc", part);
        let assembly = assemble(&mut host, "main.adoc", &Options::default())?;
        let reader = assembly.reader();

        for (id, _) in find_all::<Section>(&reader, assembly.root()) {
            let level = assembly.section(id).map(|resolved| resolved.level);
            prop_assert!(level.is_some());
            let Some(parent) = reader.parent(id) else {
                return Err(TestCaseError::fail("placed section without a parent"));
            };
            if parent == assembly.root() {
                continue;
            }
            let parent_level = assembly.section(parent).map(|resolved| resolved.level);
            prop_assert!(parent_level < level, "{parent_level:?} !< {level:?}");
        }
    }
}
