//! Insertion policy for `insert`-family operations.

use core::fmt;

/// Controls whether an `insert` call is allowed to create a new entry,
/// update an existing one, or both.
///
/// By default every `insert` behaves as [`Allow::InsertOrUpdate`]. Passing
/// [`Allow::Insert`] or [`Allow::Update`] narrows that behavior to only one
/// of the two outcomes, returning `false` instead of mutating the cache
/// when the narrower condition isn't met.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Allow {
    /// Succeed only if no live entry exists for the key.
    Insert,
    /// Succeed only if a live entry already exists for the key.
    Update,
    /// Succeed unconditionally, inserting or updating as needed.
    #[default]
    InsertOrUpdate,
}

impl Allow {
    /// Whether this mode permits creating a brand new entry.
    pub const fn permits_insert(self) -> bool {
        matches!(self, Allow::Insert | Allow::InsertOrUpdate)
    }

    /// Whether this mode permits overwriting an existing entry.
    pub const fn permits_update(self) -> bool {
        matches!(self, Allow::Update | Allow::InsertOrUpdate)
    }
}

impl fmt::Display for Allow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Allow::Insert => "insert",
            Allow::Update => "update",
            Allow::InsertOrUpdate => "insert_or_update",
        };
        f.write_str(s)
    }
}
