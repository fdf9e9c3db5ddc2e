//! Walking the assembled tree.
//!
//! Everything here reads through a [`Reader`], so removed elements are never
//! seen, replacements are seen in place of what they replace, and sections
//! are found where placement put them.
use crate::{
    Reader,
    model::{ElementId, ElementKind, Kind},
};

/// What a walk does after visiting an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchShould {
    Continue,
    /// Go on with the next sibling without entering this element.
    SkipChildren,
    Stop,
}

/// Depth-first, pre-order walk of everything below `root`.
///
/// `visit` gets each element with its depth, 1 for the children of `root`.
/// Section titles and attribute values are not children and are not walked.
pub fn traverse<'a>(
    reader: &Reader<'a>,
    root: ElementId,
    mut visit: impl FnMut(ElementId, &'a ElementKind, usize) -> SearchShould,
) {
    let mut stack = vec![(reader.children(root), 1_usize)];
    while let Some((children, depth)) = stack.last_mut() {
        let depth = *depth;
        let Some(id) = children.next() else {
            stack.pop();
            continue;
        };
        let Some(kind) = reader.kind(id) else {
            continue;
        };
        match visit(id, kind, depth) {
            SearchShould::Continue => stack.push((reader.children(id), depth + 1)),
            SearchShould::SkipChildren => {}
            SearchShould::Stop => return,
        }
    }
}

/// Like [`traverse`], visiting only elements of kind `T`.
pub fn search<'a, T: Kind + 'a>(
    reader: &Reader<'a>,
    root: ElementId,
    mut visit: impl FnMut(ElementId, &'a T) -> SearchShould,
) {
    traverse(reader, root, |id, kind, _| match T::from_kind(kind) {
        Some(inner) => visit(id, inner),
        None => SearchShould::Continue,
    });
}

/// Every element of kind `T` below `root`, in reading order.
#[must_use]
pub fn find_all<'a, T: Kind + 'a>(reader: &Reader<'a>, root: ElementId) -> Vec<(ElementId, &'a T)> {
    let mut found = Vec::new();
    search(reader, root, |id, inner: &'a T| {
        found.push((id, inner));
        SearchShould::Continue
    });
    found
}

/// The children of `parent` of kind `T`, without descending.
pub fn skim<'a, T: Kind + 'a>(
    reader: &Reader<'a>,
    parent: ElementId,
) -> impl Iterator<Item = (ElementId, &'a T)> + 'a {
    let reader = *reader;
    reader
        .children(parent)
        .filter_map(move |id| reader.kind(id).and_then(T::from_kind).map(|inner| (id, inner)))
}

/// Like [`skim`], over a list `parent` owns but does not hold as children,
/// such as a section title.
pub fn skim_list<'a, T: Kind + 'a>(
    reader: &Reader<'a>,
    parent: ElementId,
    elements: &'a [ElementId],
) -> impl Iterator<Item = (ElementId, &'a T)> + 'a {
    let reader = *reader;
    reader
        .iterate(Some(parent), elements)
        .filter_map(move |id| reader.kind(id).and_then(T::from_kind).map(|inner| (id, inner)))
}

/// Visit the children of `parent` in order until `visit` says stop.
/// [`SearchShould::SkipChildren`] is the same as continuing here.
pub fn skim_func<'a>(
    reader: &Reader<'a>,
    parent: ElementId,
    mut visit: impl FnMut(ElementId, &'a ElementKind) -> SearchShould,
) {
    for id in reader.children(parent) {
        let Some(kind) = reader.kind(id) else {
            continue;
        };
        if visit(id, kind) == SearchShould::Stop {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        DocumentBuilder, Error, OverlayMap,
        fragment::Fragment,
        model::{Arena, Paragraph, Section, Text},
    };

    fn build(arena: &mut Arena) -> Result<ElementId, Error> {
        DocumentBuilder::new(arena, "main.adoc").build(vec![
            Fragment::paragraph(vec![Fragment::text("intro")]),
            Fragment::section(1, "One"),
            Fragment::paragraph(vec![Fragment::text("first")]),
            Fragment::section(2, "Nested"),
            Fragment::paragraph(vec![Fragment::text("second")]),
            Fragment::section(1, "Two"),
        ])
    }

    fn contents(found: &[(ElementId, &Text)]) -> Vec<String> {
        found.iter().map(|(_, text)| text.content.clone()).collect()
    }

    #[test]
    fn test_find_all_in_reading_order() -> Result<(), Error> {
        let mut arena = Arena::new();
        let root = build(&mut arena)?;
        let overlay = OverlayMap::new();
        let reader = Reader::new(&arena, &overlay);

        let texts = find_all::<Text>(&reader, root);
        assert_eq!(contents(&texts), vec!["intro", "first", "second"]);
        assert_eq!(find_all::<Section>(&reader, root).len(), 3);
        Ok(())
    }

    #[test]
    fn test_removed_subtrees_are_not_walked() -> Result<(), Error> {
        let mut arena = Arena::new();
        let root = build(&mut arena)?;
        let mut overlay = OverlayMap::new();
        let first = find_all::<Section>(&Reader::new(&arena, &overlay), root)
            .first()
            .map(|(id, _)| *id)
            .ok_or(Error::UnknownElement(root))?;
        overlay.remove(first);
        let reader = Reader::new(&arena, &overlay);
        let texts = find_all::<Text>(&reader, root);
        assert_eq!(contents(&texts), vec!["intro"]);
        Ok(())
    }

    #[test]
    fn test_skip_children_and_stop() -> Result<(), Error> {
        let mut arena = Arena::new();
        let root = build(&mut arena)?;
        let overlay = OverlayMap::new();
        let reader = Reader::new(&arena, &overlay);

        let mut seen = Vec::new();
        traverse(&reader, root, |_, kind, depth| {
            seen.push((kind.name(), depth));
            if matches!(kind, ElementKind::Section(_)) {
                SearchShould::SkipChildren
            } else {
                SearchShould::Continue
            }
        });
        assert_eq!(
            seen,
            vec![
                ("paragraph", 1),
                ("text", 2),
                ("section", 1),
                ("section", 1)
            ]
        );

        let mut visited = 0;
        search(&reader, root, |_, _: &Paragraph| {
            visited += 1;
            SearchShould::Stop
        });
        assert_eq!(visited, 1);
        Ok(())
    }

    #[test]
    fn test_skim_is_flat() -> Result<(), Error> {
        let mut arena = Arena::new();
        let root = build(&mut arena)?;
        let overlay = OverlayMap::new();
        let reader = Reader::new(&arena, &overlay);

        let sections: Vec<_> = skim::<Section>(&reader, root).collect();
        assert_eq!(sections.len(), 2);
        assert_eq!(skim::<Paragraph>(&reader, root).count(), 1);

        let mut names = Vec::new();
        skim_func(&reader, root, |_, kind| {
            names.push(kind.name());
            SearchShould::Continue
        });
        assert_eq!(names, vec!["paragraph", "section", "section"]);

        let &(section, inner) = sections.first().ok_or(Error::UnknownElement(root))?;
        let words: Vec<_> = skim_list::<Text>(&reader, section, &inner.title)
            .map(|(_, text)| text.content.as_str())
            .collect();
        assert_eq!(words, vec!["One"]);
        Ok(())
    }
}
