//! Flattening resolved element lists to strings.
use std::path::Path;

use crate::{
    Error, Reader,
    error::SourceLocation,
    model::{ElementId, ElementKind},
};

/// Render `elements` as plain text, dropping what has no textual form.
pub(crate) fn plain_text(reader: &Reader<'_>, parent: ElementId, elements: &[ElementId]) -> String {
    let mut out = String::new();
    push_plain_text(reader, parent, elements, &mut out);
    out
}

fn push_plain_text(
    reader: &Reader<'_>,
    parent: ElementId,
    elements: &[ElementId],
    out: &mut String,
) {
    for id in reader.iterate(Some(parent), elements) {
        match reader.kind(id) {
            Some(ElementKind::Text(text)) => out.push_str(&text.content),
            Some(ElementKind::NewLine | ElementKind::LineBreak) => out.push(' '),
            Some(ElementKind::CharacterReplacement(replacement)) => {
                out.push_str(&replacement.replacement);
            }
            Some(ElementKind::AttributeReference(reference)) => {
                out.push('{');
                out.push_str(&reference.name);
                out.push('}');
            }
            Some(kind) => push_plain_text(reader, id, kind.children(), out),
            None => {}
        }
    }
}

/// Render `elements` where only simple text is allowed, such as an include target.
///
/// # Errors
///
/// Returns [`Error::IllegalSimpleTextElement`] for anything other than text,
/// line breaks, character replacements and nested include directives.
pub(crate) fn simple_text(
    reader: &Reader<'_>,
    parent: ElementId,
    elements: &[ElementId],
    file: &Path,
) -> Result<String, Error> {
    let mut out = String::new();
    for id in reader.iterate(Some(parent), elements) {
        let element = reader.arena().element(id)?;
        match &element.kind {
            ElementKind::Text(text) => out.push_str(&text.content),
            ElementKind::NewLine | ElementKind::LineBreak => out.push('\n'),
            ElementKind::CharacterReplacement(replacement) => out.push_str(&replacement.source),
            ElementKind::FileInclude(include) => {
                out.push_str("include::");
                out.push_str(&simple_text(reader, id, &include.path, file)?);
                out.push_str("[]");
            }
            ElementKind::Document(_)
            | ElementKind::Section(_)
            | ElementKind::Paragraph(_)
            | ElementKind::Delimited(_)
            | ElementKind::Table(_)
            | ElementKind::TableRow(_)
            | ElementKind::TableCell(_)
            | ElementKind::Formatted(_)
            | ElementKind::EmptyLine
            | ElementKind::AttributeEntry(_)
            | ElementKind::AttributeReset(_)
            | ElementKind::AttributeReference(_)
            | ElementKind::Counter(_)
            | ElementKind::Conditional(_)
            | ElementKind::EndIf(_)
            | ElementKind::InlineConditional(_) => {
                let kind = element.kind.name();
                tracing::error!(kind, %id, "element not allowed in simple text");
                return Err(Error::IllegalSimpleTextElement {
                    kind,
                    location: SourceLocation::boxed(Some(file.to_path_buf()), element.location),
                });
            }
        }
    }
    Ok(out)
}
