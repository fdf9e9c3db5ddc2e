//! Small grammars for attribute values the assembler has to understand.
mod cols;

pub(crate) use cols::{parse_cell_format, parse_column_formats};
