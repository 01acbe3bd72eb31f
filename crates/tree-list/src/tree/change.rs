//! Change notifications reported to the renderer

use derive_more::Display;

use crate::tree::Coordinate;

/// The kind of a [`Change`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ChangeKind {
    #[display(fmt = "insert")]
    Insert,
    #[display(fmt = "delete")]
    Delete,
    #[display(fmt = "move")]
    Move,
    #[display(fmt = "update")]
    Update,
    #[display(fmt = "reload")]
    Reload,
}

/// One logical change to the flattened list
///
/// Coordinates of `Delete` refer to positions before the change, those of
/// `Insert` to positions after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Rows that appeared
    Insert(Vec<Coordinate>),
    /// Rows that disappeared
    Delete(Vec<Coordinate>),
    /// A row that moved
    Move { from: Coordinate, to: Coordinate },
    /// A row whose payload changed in place
    Update(Coordinate),
    /// No row-level diff exists; resynchronize everything
    Reload,
}

impl Change {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::Insert(_) => ChangeKind::Insert,
            Change::Delete(_) => ChangeKind::Delete,
            Change::Move { .. } => ChangeKind::Move,
            Change::Update(_) => ChangeKind::Update,
            Change::Reload => ChangeKind::Reload,
        }
    }

    /// Coordinates touched by this change (`from` then `to` for moves)
    pub fn coordinates(&self) -> Vec<Coordinate> {
        match self {
            Change::Insert(coords) | Change::Delete(coords) => coords.clone(),
            Change::Move { from, to } => vec![*from, *to],
            Change::Update(coord) => vec![*coord],
            Change::Reload => Vec::new(),
        }
    }

    pub fn is_reload(&self) -> bool {
        matches!(self, Change::Reload)
    }
}

/// Flatten a change-set into the coordinates it touched
///
/// Returns `None` when the set contains a reload, meaning there is no
/// row-level diff and the caller should resynchronize.
pub fn affected_coordinates(changes: &[Change]) -> Option<Vec<Coordinate>> {
    if changes.iter().any(Change::is_reload) {
        return None;
    }
    Some(changes.iter().flat_map(Change::coordinates).collect())
}

/// Push a row change unless it carries no coordinates
pub(crate) fn push_rows(
    changes: &mut Vec<Change>,
    make: fn(Vec<Coordinate>) -> Change,
    rows: Vec<Coordinate>,
) {
    if !rows.is_empty() {
        changes.push(make(rows));
    }
}
