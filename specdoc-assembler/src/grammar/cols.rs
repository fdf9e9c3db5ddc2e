use crate::model::{
    CellFormat, ColumnFormat, ColumnStyle, ColumnWidth, HorizontalAlignment, VerticalAlignment,
};

/// One comma-separated entry of a `cols` attribute before expansion.
#[derive(Debug, PartialEq)]
struct ColumnSpec {
    multiplier: usize,
    format: ColumnFormat,
}

peg::parser! {
    grammar table_parser() for str {
        pub(crate) rule cols() -> Vec<ColumnSpec>
            = specs:(column() ** separator()) ![_] { specs }

        pub(crate) rule cell() -> CellFormat
            = span:span()? duplicate:duplicate()? halign:halign()? valign:valign()? style:style()? ![_] {
                let (col_span, row_span) = span.unwrap_or((1, 1));
                CellFormat {
                    col_span,
                    row_span,
                    duplicate: duplicate.unwrap_or(1),
                    halign,
                    valign,
                    style,
                }
            }

        rule separator() = _ ("," / ";") _

        rule column() -> ColumnSpec
            = _ multiplier:multiplier()? halign:halign()? valign:valign()? width:width()? style:style()? _ {
                ColumnSpec {
                    multiplier: multiplier.unwrap_or(1),
                    format: ColumnFormat {
                        halign: halign.unwrap_or_default(),
                        valign: valign.unwrap_or_default(),
                        width: width.unwrap_or_default(),
                        style: style.unwrap_or_default(),
                    },
                }
            }

        rule multiplier() -> usize
            = n:number() "*" { n }

        rule span() -> (usize, usize)
            = c:number() "." r:number() "+" { (c, r) }
            / "." r:number() "+" { (1, r) }
            / c:number() "+" { (c, 1) }

        rule duplicate() -> usize
            = n:number() "*" { n }

        rule halign() -> HorizontalAlignment
            = "<" { HorizontalAlignment::Left }
            / "^" { HorizontalAlignment::Center }
            / ">" { HorizontalAlignment::Right }

        rule valign() -> VerticalAlignment
            = ".<" { VerticalAlignment::Top }
            / ".^" { VerticalAlignment::Middle }
            / ".>" { VerticalAlignment::Bottom }

        rule width() -> ColumnWidth
            = n:number() "%" {? u32::try_from(n).map(ColumnWidth::Percentage).or(Err("width")) }
            / n:number() {? u32::try_from(n).map(ColumnWidth::Proportional).or(Err("width")) }
            / "~" { ColumnWidth::Auto }

        rule style() -> ColumnStyle
            = "a" { ColumnStyle::AsciiDoc }
            / "d" { ColumnStyle::Default }
            / "e" { ColumnStyle::Emphasis }
            / "h" { ColumnStyle::Header }
            / "l" { ColumnStyle::Literal }
            / "m" { ColumnStyle::Monospace }
            / "s" { ColumnStyle::Strong }

        rule number() -> usize
            = n:$(['0'..='9']+) {? n.parse().or(Err("number")) }

        rule _ = [' ' | '\t']*
    }
}

/// Expand a `cols` attribute value into one format per column.
///
/// A lone integer (`cols=3`) is a column count, not a width.
pub(crate) fn parse_column_formats(value: &str) -> Result<Vec<ColumnFormat>, String> {
    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        let count: usize = trimmed.parse().map_err(|e| format!("{e}"))?;
        return Ok(vec![ColumnFormat::default(); count]);
    }
    let specs = table_parser::cols(trimmed).map_err(|error| error.to_string())?;
    Ok(specs
        .into_iter()
        .flat_map(|spec| std::iter::repeat_n(spec.format, spec.multiplier))
        .collect())
}

/// Parse a cell specifier, the text in front of a cell separator (`2+^a`).
pub(crate) fn parse_cell_format(value: &str) -> Result<CellFormat, String> {
    let format = table_parser::cell(value.trim()).map_err(|error| error.to_string())?;
    Ok(format
        .with_col_span(format.col_span)
        .with_row_span(format.row_span)
        .with_duplicate(format.duplicate))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[rstest::rstest]
    #[case("1,2,3", 3)]
    #[case("3*", 3)]
    #[case("2*,1", 3)]
    #[case("3", 3)]
    #[case("<,^,>", 3)]
    #[case("1a, 2m", 2)]
    #[case("15%,85%", 2)]
    #[case("2*^.>3s,~", 3)]
    fn test_column_count(#[case] value: &str, #[case] expected: usize) -> Result<(), String> {
        assert_eq!(parse_column_formats(value)?.len(), expected);
        Ok(())
    }

    #[test]
    fn test_column_formats() -> Result<(), String> {
        let formats = parse_column_formats("^.>2a,30%l")?;
        assert_eq!(
            formats,
            vec![
                ColumnFormat::new()
                    .with_halign(HorizontalAlignment::Center)
                    .with_valign(VerticalAlignment::Bottom)
                    .with_width(ColumnWidth::Proportional(2))
                    .with_style(ColumnStyle::AsciiDoc),
                ColumnFormat::new()
                    .with_width(ColumnWidth::Percentage(30))
                    .with_style(ColumnStyle::Literal),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_invalid_cols() {
        assert!(parse_column_formats("x,y").is_err());
    }

    #[rstest::rstest]
    #[case("", 1, 1, 1)]
    #[case("2+", 2, 1, 1)]
    #[case(".3+", 1, 3, 1)]
    #[case("2.3+", 2, 3, 1)]
    #[case("3*", 1, 1, 3)]
    #[case("2+^.>a", 2, 1, 1)]
    fn test_cell_format(
        #[case] value: &str,
        #[case] col_span: usize,
        #[case] row_span: usize,
        #[case] duplicate: usize,
    ) -> Result<(), String> {
        let format = parse_cell_format(value)?;
        assert_eq!(
            (format.col_span, format.row_span, format.duplicate),
            (col_span, row_span, duplicate)
        );
        Ok(())
    }

    #[test]
    fn test_cell_format_style() -> Result<(), String> {
        let format = parse_cell_format("2+^.>a")?;
        assert_eq!(format.halign, Some(HorizontalAlignment::Center));
        assert_eq!(format.valign, Some(VerticalAlignment::Bottom));
        assert_eq!(format.style, Some(ColumnStyle::AsciiDoc));
        Ok(())
    }
}
