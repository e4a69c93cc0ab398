use serde::{Deserialize, Serialize};

/// Where a cursor points. `At(i)` always satisfies `i < len` of its store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorPosition {
    #[default]
    Empty,
    At(usize),
}

impl CursorPosition {
    pub fn index(&self) -> Option<usize> {
        match self {
            CursorPosition::Empty => None,
            CursorPosition::At(index) => Some(*index),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CursorPosition::Empty)
    }
}

/// What the cursor does when an item is inserted in front of it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InsertFrontPolicy {
    /// Keep showing the same item (its index shifts by one).
    #[default]
    KeepCurrent,
    /// Move to the newly inserted item.
    JumpToInserted,
}
