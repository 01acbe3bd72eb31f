//! Forest traversal

use std::collections::{HashSet, VecDeque};

use crate::tree::arena::{Arena, Key};
use crate::tree::node::Entry;

/// Traversal order for walking the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalOrder {
    /// Visit parent before children (top-down)
    PreOrder,
    /// Visit children before parent (bottom-up)
    PostOrder,
    /// Visit level by level (breadth-first)
    BreadthFirst,
}

/// Iterator over arena keys in a given order
///
/// Walks every materialized node regardless of expansion. Starting from
/// several keys walks each of their subtrees in turn, which is how the
/// whole forest is walked.
pub(crate) struct Walk<'a, P> {
    arena: &'a Arena<Entry<P>>,
    order: TraversalOrder,
    stack: Vec<Key>,
    queue: VecDeque<Key>,
    visited: HashSet<Key>,
}

impl<'a, P> Walk<'a, P> {
    pub(crate) fn new(arena: &'a Arena<Entry<P>>, starts: &[Key], order: TraversalOrder) -> Self {
        let mut walk = Self {
            arena,
            order,
            stack: Vec::new(),
            queue: VecDeque::new(),
            visited: HashSet::new(),
        };

        match order {
            TraversalOrder::BreadthFirst => walk.queue.extend(starts.iter().copied()),
            // Pushed in reverse so the first start is popped first
            _ => walk.stack.extend(starts.iter().rev().copied()),
        }

        walk
    }

    fn next_preorder(&mut self) -> Option<Key> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.arena[current].children.iter().rev().copied());
        Some(current)
    }

    fn next_postorder(&mut self) -> Option<Key> {
        while let Some(&current) = self.stack.last() {
            if self.visited.contains(&current) {
                self.stack.pop();
                return Some(current);
            }

            self.visited.insert(current);
            self.stack
                .extend(self.arena[current].children.iter().rev().copied());
        }
        None
    }

    fn next_breadthfirst(&mut self) -> Option<Key> {
        let current = self.queue.pop_front()?;
        self.queue.extend(self.arena[current].children.iter().copied());
        Some(current)
    }
}

impl<P> Iterator for Walk<'_, P> {
    type Item = Key;

    fn next(&mut self) -> Option<Key> {
        match self.order {
            TraversalOrder::PreOrder => self.next_preorder(),
            TraversalOrder::PostOrder => self.next_postorder(),
            TraversalOrder::BreadthFirst => self.next_breadthfirst(),
        }
    }
}
