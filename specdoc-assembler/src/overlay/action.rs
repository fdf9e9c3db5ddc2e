use std::{fmt, ops::BitOr};

use serde::Serialize;

/// The set of edits recorded for one element. Bits combine; an element can
/// pick up several of them over a build.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Action(u8);

impl Action {
    pub const NONE: Action = Action(0);
    /// Drop the element. Wins over every other bit when reading.
    pub const REMOVE: Action = Action(1);
    /// Read the replacement list in place of the element.
    pub const REPLACE: Action = Action(1 << 1);
    pub const OVERRIDE_PARENT: Action = Action(1 << 2);
    pub const OVERRIDE_CHILDREN: Action = Action(1 << 3);
    /// Read the appended list after the element's children.
    pub const APPEND_ELEMENTS: Action = Action(1 << 4);

    const NAMES: [(Action, &'static str); 5] = [
        (Action::REMOVE, "remove"),
        (Action::REPLACE, "replace"),
        (Action::OVERRIDE_PARENT, "override_parent"),
        (Action::OVERRIDE_CHILDREN, "override_children"),
        (Action::APPEND_ELEMENTS, "append_elements"),
    ];

    #[must_use]
    pub fn contains(self, other: Action) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Action) {
        self.0 |= other.0;
    }
}

impl BitOr for Action {
    type Output = Action;

    fn bitor(self, rhs: Action) -> Action {
        Action(self.0 | rhs.0)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Action(none)");
        }
        let names: Vec<&str> = Action::NAMES
            .iter()
            .filter(|(action, _)| self.contains(*action))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "Action({})", names.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_combine() {
        let mut action = Action::APPEND_ELEMENTS;
        action.insert(Action::REMOVE);
        assert!(action.contains(Action::REMOVE));
        assert!(action.contains(Action::APPEND_ELEMENTS));
        assert!(action.contains(Action::REMOVE | Action::APPEND_ELEMENTS));
        assert!(!action.contains(Action::REPLACE));
        assert!(!action.contains(Action::NONE));
        assert_eq!(format!("{action:?}"), "Action(remove | append_elements)");
    }
}
