//! The data-source boundary
//!
//! A [`SourceAdapter`] supplies roots and children on demand. The store
//! never walks the source on its own initiative: it asks for a node's
//! children once, when the node is first traversed, and only asks again
//! after an explicit reload.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::tree::{Node, NodeId, NodeRef};

/// A node as produced by a source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceItem<P> {
    pub id: NodeId,
    pub payload: P,
    /// Initial expanded flag
    pub expanded: bool,
}

impl<P> SourceItem<P> {
    pub fn new(id: impl Into<NodeId>, payload: P) -> Self {
        Self {
            id: id.into(),
            payload,
            expanded: false,
        }
    }

    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }
}

/// External collaborator supplying tree data lazily
///
/// # Example
///
/// ```ignore
/// struct Numbers;
///
/// impl SourceAdapter for Numbers {
///     type Payload = u32;
///
///     fn root_count(&self) -> usize { 1 }
///     fn root(&self, root_index: usize) -> Option<SourceItem<u32>> {
///         Some(SourceItem::new(format!("root-{root_index}"), 0))
///     }
///     fn child_count(&self, parent: &NodeRef<'_, u32>, _root: usize) -> usize {
///         if parent.level < 2 { 3 } else { 0 }
///     }
///     fn child(&self, index: usize, parent: &NodeRef<'_, u32>, _root: usize) -> Option<SourceItem<u32>> {
///         Some(SourceItem::new(format!("{}/{index}", parent.id), index as u32))
///     }
/// }
/// ```
pub trait SourceAdapter {
    /// Caller data attached to every node
    type Payload;

    /// Number of roots
    fn root_count(&self) -> usize;

    /// The root at `root_index`
    ///
    /// Returning `None` ends the root list early.
    fn root(&self, root_index: usize) -> Option<SourceItem<Self::Payload>>;

    /// Number of children of `parent`
    fn child_count(&self, parent: &NodeRef<'_, Self::Payload>, root_index: usize) -> usize;

    /// The child at `index` under `parent`
    ///
    /// Returning `None` is a stop condition, not an error: no further
    /// children of `parent` are requested.
    fn child(
        &self,
        index: usize,
        parent: &NodeRef<'_, Self::Payload>,
        root_index: usize,
    ) -> Option<SourceItem<Self::Payload>>;
}

impl<T: SourceAdapter + ?Sized> SourceAdapter for Box<T> {
    type Payload = T::Payload;

    fn root_count(&self) -> usize {
        (**self).root_count()
    }

    fn root(&self, root_index: usize) -> Option<SourceItem<Self::Payload>> {
        (**self).root(root_index)
    }

    fn child_count(&self, parent: &NodeRef<'_, Self::Payload>, root_index: usize) -> usize {
        (**self).child_count(parent, root_index)
    }

    fn child(
        &self,
        index: usize,
        parent: &NodeRef<'_, Self::Payload>,
        root_index: usize,
    ) -> Option<SourceItem<Self::Payload>> {
        (**self).child(index, parent, root_index)
    }
}

/// A source with no data, for trees built entirely through inserts
#[derive(Debug)]
pub struct EmptySource<P>(PhantomData<fn() -> P>);

impl<P> Default for EmptySource<P> {
    fn default() -> Self {
        EmptySource(PhantomData)
    }
}

impl<P> SourceAdapter for EmptySource<P> {
    type Payload = P;

    fn root_count(&self) -> usize {
        0
    }

    fn root(&self, _root_index: usize) -> Option<SourceItem<P>> {
        None
    }

    fn child_count(&self, _parent: &NodeRef<'_, P>, _root_index: usize) -> usize {
        0
    }

    fn child(&self, _index: usize, _parent: &NodeRef<'_, P>, _root_index: usize) -> Option<SourceItem<P>> {
        None
    }
}

struct StaticEntry<P> {
    payload: P,
    expanded: bool,
    children: Vec<NodeId>,
}

/// In-memory source built from nested [`Node`] values
///
/// Counts every child query so callers can observe how often the store
/// goes back to the source.
pub struct StaticSource<P> {
    roots: Vec<NodeId>,
    entries: HashMap<NodeId, StaticEntry<P>>,
    queries: AtomicUsize,
}

impl<P: Clone> StaticSource<P> {
    pub fn new(roots: Vec<Node<P>>) -> Self {
        let mut source = Self {
            roots: Vec::new(),
            entries: HashMap::new(),
            queries: AtomicUsize::new(0),
        };
        source.set_roots(roots);
        source
    }

    /// Replace the data; takes effect on the store's next load
    pub fn set_roots(&mut self, roots: Vec<Node<P>>) {
        self.entries.clear();
        self.roots = roots.iter().map(|root| root.id.clone()).collect();
        let mut stack = roots;
        while let Some(node) = stack.pop() {
            let children = node.children.iter().map(|child| child.id.clone()).collect();
            self.entries.insert(
                node.id,
                StaticEntry {
                    payload: node.payload,
                    expanded: node.expanded,
                    children,
                },
            );
            stack.extend(node.children);
        }
    }

    /// Number of `child_count`/`child` calls served so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    fn item(&self, id: &NodeId) -> Option<SourceItem<P>> {
        self.entries.get(id).map(|entry| SourceItem {
            id: id.clone(),
            payload: entry.payload.clone(),
            expanded: entry.expanded,
        })
    }
}

impl<P: Clone> SourceAdapter for StaticSource<P> {
    type Payload = P;

    fn root_count(&self) -> usize {
        self.roots.len()
    }

    fn root(&self, root_index: usize) -> Option<SourceItem<P>> {
        self.item(self.roots.get(root_index)?)
    }

    fn child_count(&self, parent: &NodeRef<'_, P>, _root_index: usize) -> usize {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.entries
            .get(parent.id)
            .map(|entry| entry.children.len())
            .unwrap_or(0)
    }

    fn child(&self, index: usize, parent: &NodeRef<'_, P>, _root_index: usize) -> Option<SourceItem<P>> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let child = self.entries.get(parent.id)?.children.get(index)?;
        self.item(child)
    }
}
