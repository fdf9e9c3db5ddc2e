use tracing::instrument;

use crate::{
    Error,
    model::{Arena, ElementId, SectionLevel},
};

/// Where the nester hangs elements. Local nesting writes native children into
/// the arena; global placement writes overlay records instead.
pub(crate) trait SectionSink {
    fn attach(&mut self, parent: ElementId, child: ElementId) -> Result<(), Error>;
}

/// Attaches elements natively, while a document is being built.
pub(crate) struct ArenaSink<'a> {
    pub(crate) arena: &'a mut Arena,
}

impl SectionSink for ArenaSink<'_> {
    fn attach(&mut self, parent: ElementId, child: ElementId) -> Result<(), Error> {
        self.arena.attach(parent, child)
    }
}

/// Build a tree of sections out of a flat element sequence.
///
/// Non-section elements go to the last open section, or to the root if no
/// section has been seen yet. A section closes every open section whose level
/// is not strictly lower than its own and becomes a child of the first one
/// left, or of the root.
#[derive(Debug)]
pub(crate) struct SectionNester {
    root: ElementId,
    /// The chain of enclosing sections of the last section, outermost first.
    open: Vec<(ElementId, SectionLevel)>,
}

impl SectionNester {
    pub(crate) fn new(root: ElementId) -> Self {
        Self {
            root,
            open: Vec::new(),
        }
    }

    fn container(&self) -> ElementId {
        self.open.last().map_or(self.root, |(id, _)| *id)
    }

    /// Place one element. `level` is `Some` for sections.
    #[instrument(level = "trace", skip(self, sink))]
    pub(crate) fn push<S: SectionSink>(
        &mut self,
        sink: &mut S,
        element: ElementId,
        level: Option<SectionLevel>,
    ) -> Result<(), Error> {
        let Some(level) = level else {
            return sink.attach(self.container(), element);
        };
        while self.open.last().is_some_and(|(_, open)| *open >= level) {
            self.open.pop();
        }
        sink.attach(self.container(), element)?;
        self.open.push((element, level));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// Records attachments instead of touching an arena.
    #[derive(Default)]
    struct RecordingSink {
        attached: Vec<(ElementId, ElementId)>,
    }

    impl SectionSink for RecordingSink {
        fn attach(&mut self, parent: ElementId, child: ElementId) -> Result<(), Error> {
            self.attached.push((parent, child));
            Ok(())
        }
    }

    fn ids<const N: usize>(arena: &mut Arena) -> [ElementId; N] {
        std::array::from_fn(|_| {
            arena.alloc(
                crate::model::ElementKind::EmptyLine,
                crate::model::Location::default(),
            )
        })
    }

    #[test]
    fn test_levels_nest_by_strictly_lower_parent() -> Result<(), Error> {
        let mut arena = Arena::new();
        let [root, s1, s2, s3, s2b, s1b] = ids(&mut arena);
        let mut sink = RecordingSink::default();
        let mut nester = SectionNester::new(root);
        for (id, level) in [(s1, 1), (s2, 2), (s3, 3), (s2b, 2), (s1b, 1)] {
            nester.push(&mut sink, id, Some(level))?;
        }
        assert_eq!(
            sink.attached,
            vec![
                (root, s1),
                (s1, s2),
                (s2, s3),
                (s1, s2b),
                (root, s1b),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_content_goes_to_last_open_section() -> Result<(), Error> {
        let mut arena = Arena::new();
        let [root, before, s2, after, s1] = ids(&mut arena);
        let mut sink = RecordingSink::default();
        let mut nester = SectionNester::new(root);
        nester.push(&mut sink, before, None)?;
        nester.push(&mut sink, s2, Some(2))?;
        nester.push(&mut sink, after, None)?;
        // A shallower section after a deeper first one still lands at the root.
        nester.push(&mut sink, s1, Some(1))?;
        assert_eq!(
            sink.attached,
            vec![
                (root, before),
                (root, s2),
                (s2, after),
                (root, s1),
            ]
        );
        Ok(())
    }
}
