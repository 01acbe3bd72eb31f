//! Core node types for the tree-in-a-list model

use derive_more::Display;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::tree::arena::Key;

/// Stable identity of a node
///
/// Identities are unique across the whole forest at any instant. Cloning is
/// cheap: the token is reference counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display(fmt = "{}", _0)]
pub struct NodeId(Arc<str>);

impl NodeId {
    /// Create a new identity from any string-like token
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        NodeId(id.into())
    }

    /// Get the identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        NodeId::new(id)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Position of a visible node: the root (section) it belongs to and its
/// row among that root's visible descendants
///
/// Ordering is by root first, then row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[display(fmt = "({}, {})", root, row)]
pub struct Coordinate {
    /// Index of the root in the forest's root list
    pub root: usize,
    /// Row among the root's visible descendants, in pre-order
    pub row: usize,
}

impl Coordinate {
    pub const fn new(root: usize, row: usize) -> Self {
        Self { root, row }
    }
}

impl From<(usize, usize)> for Coordinate {
    fn from((root, row): (usize, usize)) -> Self {
        Self::new(root, row)
    }
}

/// A detached node value
///
/// Used to hand new subtrees to the store and to receive subtrees taken
/// out of it. Children are ordered; their order is display order.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<P> {
    /// Stable identity
    pub id: NodeId,
    /// Caller data, never interpreted by the tree
    pub payload: P,
    /// Whether the node's children are shown
    pub expanded: bool,
    /// Ordered children
    pub children: Vec<Node<P>>,
    /// False when the children were never pulled from the source
    pub(crate) materialized: bool,
}

impl<P> Node<P> {
    /// Create a collapsed node without children
    pub fn new(id: impl Into<NodeId>, payload: P) -> Self {
        Self {
            id: id.into(),
            payload,
            expanded: false,
            children: Vec::new(),
            materialized: true,
        }
    }

    /// Set the expanded flag
    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    /// Append a child
    pub fn child(mut self, child: Node<P>) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children
    pub fn with_children(mut self, children: impl IntoIterator<Item = Node<P>>) -> Self {
        self.children.extend(children);
        self
    }

    /// Returns true if the node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Count this node and all of its descendants
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Node::subtree_len).sum::<usize>()
    }

    /// Visit every identity in the subtree, pre-order
    pub fn ids(&self) -> Vec<&NodeId> {
        let mut out = Vec::with_capacity(self.subtree_len());
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(&node.id);
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

impl<P: Default> Node<P> {
    /// Create a collapsed node carrying a default payload
    pub fn with_default(id: impl Into<NodeId>) -> Self {
        Self::new(id, P::default())
    }
}

impl<P: fmt::Display> fmt::Display for Node<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.id, self.payload)
    }
}

/// Borrowed view of a node living in a store
pub struct NodeRef<'a, P> {
    pub id: &'a NodeId,
    pub payload: &'a P,
    /// Depth below its root (roots are level 0)
    pub level: usize,
    pub expanded: bool,
    /// Visible coordinate, `None` for roots and hidden nodes
    pub coordinate: Option<Coordinate>,
    /// Number of materialized children
    pub child_count: usize,
}

impl<P> Clone for NodeRef<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for NodeRef<'_, P> {}

impl<P: fmt::Debug> fmt::Debug for NodeRef<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", self.id)
            .field("payload", self.payload)
            .field("level", &self.level)
            .field("expanded", &self.expanded)
            .field("coordinate", &self.coordinate)
            .finish()
    }
}

impl<P: Clone> NodeRef<'_, P> {
    /// Copy the view out into an owned snapshot
    pub fn to_snapshot(&self) -> NodeSnapshot<P> {
        NodeSnapshot {
            id: self.id.clone(),
            payload: self.payload.clone(),
            level: self.level,
            expanded: self.expanded,
            coordinate: self.coordinate,
        }
    }
}

/// Owned copy of a node's state, safe to hand across threads
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot<P> {
    pub id: NodeId,
    pub payload: P,
    pub level: usize,
    pub expanded: bool,
    pub coordinate: Option<Coordinate>,
}

/// Where a stored node currently sits in the flattened list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    /// A root: section header at the given root index, never a row
    Header(usize),
    /// A visible descendant
    Row(Coordinate),
    /// Hidden under a collapsed ancestor, or not projected yet
    Hidden,
}

impl Placement {
    pub(crate) fn coordinate(self) -> Option<Coordinate> {
        match self {
            Placement::Row(coordinate) => Some(coordinate),
            _ => None,
        }
    }
}

/// Arena record for a stored node
#[derive(Debug, Clone)]
pub(crate) struct Entry<P> {
    pub(crate) id: NodeId,
    pub(crate) payload: P,
    pub(crate) expanded: bool,
    pub(crate) level: usize,
    pub(crate) parent: Option<Key>,
    pub(crate) children: Vec<Key>,
    /// Children have been pulled from the source (or were given explicitly)
    pub(crate) loaded: bool,
    pub(crate) placement: Placement,
    /// Visible descendant count; `None` when dirty
    pub(crate) visible_count: Option<usize>,
}

impl<P> Entry<P> {
    pub(crate) fn new(id: NodeId, payload: P, level: usize, parent: Option<Key>) -> Self {
        Self {
            id,
            payload,
            expanded: false,
            level,
            parent,
            children: Vec::new(),
            loaded: false,
            placement: Placement::Hidden,
            visible_count: None,
        }
    }
}
