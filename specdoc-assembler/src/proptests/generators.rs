//! Input generators for property-based testing
#![allow(clippy::expect_used)]
use proptest::prelude::*;

use crate::{Fragment, SectionLevel};

/// One overlay edit, applied to a list of native children by position.
#[derive(Clone, Debug)]
pub enum Edit {
    Remove(usize),
    /// Replace the element at the position with this many fresh elements.
    Replace(usize, usize),
    /// Append this many fresh elements to the parent.
    Append(usize),
}

pub fn edits() -> impl Strategy<Value = Vec<Edit>> {
    prop::collection::vec(
        prop_oneof![
            (0..16_usize).prop_map(Edit::Remove),
            (0..16_usize, 0..4_usize).prop_map(|(at, count)| Edit::Replace(at, count)),
            (1..4_usize).prop_map(Edit::Append),
        ],
        0..12,
    )
}

pub fn paragraph() -> impl Strategy<Value = Fragment> {
    prop::string::string_regex("[a-z]{1,8}( [a-z]{1,8}){0,3}")
        .expect("Failed to create paragraph strategy")
        .prop_map(|text| Fragment::paragraph(vec![Fragment::text(&text)]))
}

pub fn section_level() -> impl Strategy<Value = SectionLevel> {
    0..=5_u8
}

pub fn section() -> impl Strategy<Value = Fragment> {
    (section_level(), "[A-Z][a-z]{0,8}").prop_map(|(level, title)| Fragment::section(level, &title))
}

/// A file without any directive: sections, paragraphs and blank lines.
pub fn plain_document() -> impl Strategy<Value = Vec<Fragment>> {
    prop::collection::vec(
        prop_oneof![
            3 => paragraph(),
            2 => section(),
            1 => Just(Fragment::empty_line()),
        ],
        0..24,
    )
}
