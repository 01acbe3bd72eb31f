//! Coordinate projection
//!
//! Maps the tree onto flat `(root, row)` coordinates. Rows are assigned by a
//! depth-first pre-order walk that numbers a node before descending into it
//! and never descends below a collapsed node. Every other part of the crate
//! that talks about "row N" agrees with this order.
//!
//! Each root keeps a coordinate index (`row -> key`) rebuilt here. A node
//! whose visible count is still cached and whose row did not move reuses its
//! slice of the previous index instead of walking its subtree again.

use crate::tree::arena::{Arena, Key};
use crate::tree::node::{Coordinate, Entry, Placement};

/// Project one root and rebuild its coordinate index
///
/// Returns the root's visible descendant count.
pub(crate) fn project_root<P>(
    arena: &mut Arena<Entry<P>>,
    root: Key,
    root_index: usize,
    index: &mut Vec<Key>,
) -> usize {
    let previous = std::mem::take(index);
    arena[root].placement = Placement::Header(root_index);

    if arena[root].expanded {
        for i in 0..arena[root].children.len() {
            let child = arena[root].children[i];
            project_node(arena, child, root_index, &previous, index);
        }
    }

    let visible = index.len();
    arena[root].visible_count = Some(visible);
    visible
}

fn project_node<P>(
    arena: &mut Arena<Entry<P>>,
    key: Key,
    root_index: usize,
    previous: &[Key],
    index: &mut Vec<Key>,
) {
    let row = index.len();
    let here = Coordinate::new(root_index, row);

    let entry = &mut arena[key];
    let cached = match (entry.visible_count, entry.placement) {
        (Some(count), Placement::Row(old))
            if old == here
                && previous.get(row) == Some(&key)
                && previous.len() > row + count =>
        {
            Some(count)
        }
        _ => None,
    };
    entry.placement = Placement::Row(here);
    index.push(key);

    if let Some(count) = cached {
        index.extend_from_slice(&previous[row + 1..row + 1 + count]);
        return;
    }

    if arena[key].expanded {
        for i in 0..arena[key].children.len() {
            let child = arena[key].children[i];
            project_node(arena, child, root_index, previous, index);
        }
    }
    arena[key].visible_count = Some(index.len() - row - 1);
}

/// Mark a node, all of its descendants and its ancestor chain dirty
///
/// Used when the node's expanded flag flips.
pub(crate) fn invalidate<P>(arena: &mut Arena<Entry<P>>, key: Key) {
    let mut stack = vec![key];
    while let Some(current) = stack.pop() {
        let entry = &mut arena[current];
        entry.visible_count = None;
        stack.extend(entry.children.iter().copied());
    }
    invalidate_upward(arena, key);
}

/// Mark a node and its ancestor chain dirty
///
/// Enough when only the node's children list changed: untouched sibling
/// subtrees keep their cached counts.
pub(crate) fn invalidate_upward<P>(arena: &mut Arena<Entry<P>>, key: Key) {
    let mut current = Some(key);
    while let Some(node) = current {
        let entry = &mut arena[node];
        entry.visible_count = None;
        current = entry.parent;
    }
}

/// Drop the row coordinates of every descendant of `key`
pub(crate) fn hide_descendants<P>(arena: &mut Arena<Entry<P>>, key: Key) {
    let mut stack: Vec<Key> = arena[key].children.clone();
    while let Some(current) = stack.pop() {
        let entry = &mut arena[current];
        entry.placement = Placement::Hidden;
        entry.visible_count = None;
        stack.extend(entry.children.iter().copied());
    }
}

/// Coordinates of the visible descendants of `key`
///
/// For a root this is every row of its section.
pub(crate) fn descendant_rows<P>(arena: &Arena<Entry<P>>, key: Key) -> Vec<Coordinate> {
    let entry = &arena[key];
    let count = entry.visible_count.unwrap_or(0);
    match entry.placement {
        Placement::Header(root) => (0..count).map(|row| Coordinate::new(root, row)).collect(),
        Placement::Row(at) => (at.row + 1..=at.row + count)
            .map(|row| Coordinate::new(at.root, row))
            .collect(),
        Placement::Hidden => Vec::new(),
    }
}

/// Coordinates of `key` itself (when it is a row) and its visible descendants
pub(crate) fn subtree_rows<P>(arena: &Arena<Entry<P>>, key: Key) -> Vec<Coordinate> {
    let mut rows = Vec::new();
    if let Placement::Row(at) = arena[key].placement {
        rows.push(at);
    }
    rows.extend(descendant_rows(arena, key));
    rows
}
