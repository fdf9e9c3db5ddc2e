//! Merge adjacent text, and attach pending block attributes and admonition
//! markers to the block that follows them.
use crate::{
    fragment::{Fragment, FragmentKind},
    model::{AttributeList, Location},
};

/// Block attributes or an admonition marker waiting for the next block.
#[derive(Debug)]
struct PendingMarker {
    attributes: AttributeList,
    location: Location,
}

#[derive(Debug, Default)]
struct Coalescer {
    output: Vec<Fragment>,
    text: Option<(String, Location)>,
    inline: Vec<Fragment>,
    marker: Option<PendingMarker>,
}

impl Coalescer {
    fn push_text(&mut self, content: &str, location: Location) {
        match &mut self.text {
            Some((buffer, buffer_location)) => {
                buffer.push_str(content);
                buffer_location.extend(&location);
            }
            None => self.text = Some((content.to_string(), location)),
        }
    }

    fn flush_text(&mut self) {
        if let Some((content, location)) = self.text.take() {
            self.inline
                .push(Fragment::new(FragmentKind::Text(content)).at(location));
        }
    }

    /// Emit the pending inline run, wrapped in a paragraph if a marker is waiting.
    fn flush_inline(&mut self) {
        self.flush_text();
        if self.inline.is_empty() {
            return;
        }
        let content = std::mem::take(&mut self.inline);
        match self.marker.take() {
            Some(marker) => {
                let mut location = marker.location;
                for fragment in &content {
                    location.extend(&fragment.location);
                }
                tracing::trace!(?marker.attributes, "wrapping inline run in a paragraph");
                self.output.push(
                    Fragment::new(FragmentKind::Paragraph {
                        attributes: marker.attributes,
                        content,
                    })
                    .at(location),
                );
            }
            None => self.output.extend(content),
        }
    }

    fn mark(&mut self, attributes: AttributeList, location: Location) {
        match &mut self.marker {
            Some(marker) => {
                marker.attributes.merge(attributes);
                marker.location.extend(&location);
            }
            None => self.marker = Some(PendingMarker { attributes, location }),
        }
    }

    /// Hand the pending marker's attributes to a block.
    fn take_marker(&mut self, attributes: &mut AttributeList) {
        if let Some(marker) = self.marker.take() {
            let own = std::mem::take(attributes);
            *attributes = marker.attributes;
            attributes.merge(own);
        }
    }

    fn fragment(&mut self, fragment: Fragment) {
        let Fragment { kind, location } = fragment;
        match kind {
            FragmentKind::Text(content) => self.push_text(&content, location),
            FragmentKind::Formatted { style, content } => {
                self.flush_text();
                self.inline.push(
                    Fragment::new(FragmentKind::Formatted {
                        style,
                        content: coalesce(content),
                    })
                    .at(location),
                );
            }
            FragmentKind::InlineConditional { condition, content } => {
                self.flush_text();
                self.inline.push(
                    Fragment::new(FragmentKind::InlineConditional {
                        condition,
                        content: coalesce(content),
                    })
                    .at(location),
                );
            }
            kind @ (FragmentKind::NewLine
            | FragmentKind::LineBreak
            | FragmentKind::CharacterReplacement { .. }
            | FragmentKind::AttributeReference(_)
            | FragmentKind::Counter { .. }) => {
                self.flush_text();
                self.inline.push(Fragment::new(kind).at(location));
            }
            FragmentKind::BlockAttributes(attributes) => {
                self.flush_inline();
                self.mark(attributes, location);
            }
            FragmentKind::Admonition(variant) => {
                self.flush_inline();
                self.mark(
                    AttributeList::new().with_positional(variant.to_string()),
                    location,
                );
            }
            FragmentKind::Paragraph {
                mut attributes,
                content,
            } => {
                self.flush_inline();
                self.take_marker(&mut attributes);
                self.output.push(
                    Fragment::new(FragmentKind::Paragraph {
                        attributes,
                        content: coalesce(content),
                    })
                    .at(location),
                );
            }
            FragmentKind::Section {
                level,
                mut attributes,
                title,
            } => {
                self.flush_inline();
                self.take_marker(&mut attributes);
                self.output.push(
                    Fragment::new(FragmentKind::Section {
                        level,
                        attributes,
                        title: coalesce(title),
                    })
                    .at(location),
                );
            }
            FragmentKind::Delimited {
                kind,
                mut attributes,
                content,
            } => {
                self.flush_inline();
                self.take_marker(&mut attributes);
                self.output.push(
                    Fragment::new(FragmentKind::Delimited {
                        kind,
                        attributes,
                        content: coalesce(content),
                    })
                    .at(location),
                );
            }
            // Cell content is coalesced once the grid is known and each cell's style is resolved.
            FragmentKind::Table(mut table) => {
                self.flush_inline();
                self.take_marker(&mut table.attributes);
                self.output
                    .push(Fragment::new(FragmentKind::Table(table)).at(location));
            }
            FragmentKind::AttributeEntry { name, value } => {
                self.flush_inline();
                self.output.push(
                    Fragment::new(FragmentKind::AttributeEntry {
                        name,
                        value: coalesce(value),
                    })
                    .at(location),
                );
            }
            FragmentKind::FileInclude { path, attributes } => {
                self.flush_inline();
                self.output.push(
                    Fragment::new(FragmentKind::FileInclude {
                        path: coalesce(path),
                        attributes,
                    })
                    .at(location),
                );
            }
            // Directives and blank lines end the inline run but leave a pending marker in place.
            kind @ (FragmentKind::EmptyLine
            | FragmentKind::AttributeReset(_)
            | FragmentKind::Conditional(_)
            | FragmentKind::EndIf(_)) => {
                self.flush_inline();
                self.output.push(Fragment::new(kind).at(location));
            }
        }
    }

    fn finish(mut self) -> Vec<Fragment> {
        self.flush_inline();
        if let Some(marker) = self.marker {
            tracing::warn!(attributes = ?marker.attributes, location = %marker.location, "block attributes with no block to apply to");
        }
        self.output
    }
}

/// Coalesce a fragment list, recursing into every container.
pub(crate) fn coalesce(fragments: Vec<Fragment>) -> Vec<Fragment> {
    let mut coalescer = Coalescer::default();
    for fragment in fragments {
        coalescer.fragment(fragment);
    }
    coalescer.finish()
}
