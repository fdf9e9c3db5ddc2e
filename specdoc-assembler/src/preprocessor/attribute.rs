use crate::{
    Reader,
    model::{AttributeValue, ElementId, ElementKind},
};

/// A `leveloffset` value as written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LevelOffset {
    Absolute(isize),
    Relative(isize),
}

peg::parser! {
    grammar level_offset_parser() for str {
        pub(crate) rule level_offset() -> LevelOffset
            = _ sign:sign() n:number() _ ![_] { LevelOffset::Relative(sign * n) }
            / _ n:number() _ ![_] { LevelOffset::Absolute(n) }
            / _ ![_] { LevelOffset::Absolute(0) }

        rule sign() -> isize
            = "+" { 1 }
            / "-" { -1 }

        rule number() -> isize
            = n:$(['0'..='9']+) {? n.parse().or(Err("number")) }

        rule _ = quiet!{[' ' | '\t']*}
    }
}

/// Apply a `leveloffset` value to the running offset `current`.
///
/// `+n` and `-n` shift the running offset, a bare `n` replaces it, and an
/// empty value resets it to 0.
#[tracing::instrument(level = "trace")]
pub(crate) fn parse_level_offset(value: &str, current: isize) -> Result<isize, String> {
    match level_offset_parser::level_offset(value) {
        Ok(LevelOffset::Absolute(offset)) => Ok(offset),
        Ok(LevelOffset::Relative(delta)) => current
            .checked_add(delta)
            .ok_or_else(|| format!("shifting {current} by {delta} overflows")),
        Err(error) => {
            tracing::warn!(?error, value, "failed to parse leveloffset");
            Err(format!("expected a number, +n or -n, got '{value}'"))
        }
    }
}

/// The value an attribute entry binds: plain text when its resolved value is
/// only text, otherwise the raw element list so references to it keep their
/// markup.
pub(crate) fn entry_value(reader: &Reader<'_>, entry: ElementId, value: &[ElementId]) -> AttributeValue {
    let mut text = String::new();
    for id in reader.iterate(Some(entry), value) {
        match reader.kind(id) {
            Some(ElementKind::Text(inner)) => text.push_str(&inner.content),
            Some(_) | None => return AttributeValue::Elements(value.to_vec()),
        }
    }
    AttributeValue::String(text)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{
        OverlayMap,
        model::{Arena, FormatStyle, Formatted, Location, Text},
    };

    #[rstest]
    #[case::relative_up("+1", 1, 2)]
    #[case::relative_down("-2", 1, -1)]
    #[case::absolute("0", 3, 0)]
    #[case::absolute_positive(" 2 ", -1, 2)]
    #[case::empty("", 4, 0)]
    fn test_parse_level_offset(
        #[case] value: &str,
        #[case] current: isize,
        #[case] expected: isize,
    ) -> Result<(), String> {
        assert_eq!(parse_level_offset(value, current)?, expected);
        Ok(())
    }

    #[rstest]
    #[case("one")]
    #[case("+")]
    #[case("1+")]
    fn test_parse_level_offset_rejects(#[case] value: &str) {
        assert!(parse_level_offset(value, 0).is_err());
    }

    #[rstest]
    #[case::past_max("+9223372036854775807", isize::MAX)]
    #[case::past_min("-9223372036854775807", isize::MIN)]
    fn test_parse_level_offset_overflow(#[case] value: &str, #[case] current: isize) {
        assert!(parse_level_offset(value, current).is_err());
    }

    #[test]
    fn test_entry_value() {
        let mut arena = Arena::new();
        let entry = arena.alloc(ElementKind::EmptyLine, Location::default());
        let a = arena.alloc(ElementKind::Text(Text::new("a ")), Location::default());
        let b = arena.alloc(ElementKind::Text(Text::new("b")), Location::default());
        let bold = arena.alloc(
            ElementKind::Formatted(Formatted {
                style: FormatStyle::Bold,
                children: vec![b],
            }),
            Location::default(),
        );
        let overlay = OverlayMap::new();
        let reader = Reader::new(&arena, &overlay);

        assert_eq!(
            entry_value(&reader, entry, &[a, b]),
            AttributeValue::from("a b")
        );
        assert_eq!(
            entry_value(&reader, entry, &[a, bold]),
            AttributeValue::Elements(vec![a, bold])
        );
        assert_eq!(entry_value(&reader, entry, &[]), AttributeValue::from(""));
    }
}
