//! The tree store
//!
//! Owns the forest, resolves identities and coordinates, and performs every
//! structural edit. Each edit re-projects the roots it touched before
//! returning, so reads never observe stale coordinates.

use log::{debug, info, trace, warn};
use std::collections::{HashMap, HashSet};

use crate::error::{Result, TreeError};
use crate::options::TreeOptions;
use crate::tree::arena::{Arena, Key};
use crate::tree::change::{push_rows, Change};
use crate::tree::node::{Entry, Placement};
use crate::tree::projector;
use crate::tree::source::{SourceAdapter, SourceItem};
use crate::tree::traversal::{TraversalOrder, Walk};
use crate::tree::{Coordinate, Node, NodeId, NodeRef};

/// Where an inserted node lands among its siblings
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InsertMode {
    /// First child (or first root)
    Leading,
    /// Last child (or last root)
    Trailing,
    /// Immediately before the named sibling
    Before(NodeId),
    /// Immediately after the named sibling
    After(NodeId),
}

/// A validated move, expressed by identity so it survives other edits
///
/// The origin fields say where the node came from, so a node whose
/// destination disappears can be put back instead of lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    /// The node being moved
    pub node: NodeId,
    /// Its new parent
    pub parent: NodeId,
    /// Its position among the new parent's children
    pub mode: InsertMode,
    /// Its old parent
    pub origin: NodeId,
    /// Its old position among the old parent's children
    pub origin_mode: InsertMode,
    /// The root of the section it was moved out of
    pub origin_root: NodeId,
}

/// A multi-root tree projected onto flat visible coordinates
///
/// Roots are section headers: they never occupy a row themselves, and
/// row numbering restarts at 0 under each root.
///
/// # Example
///
/// ```ignore
/// let source = StaticSource::new(vec![
///     Node::new("docs", ()).child(Node::new("guide", ())),
/// ]);
/// let mut store = TreeStore::new(source);
/// store.load_roots();
/// assert_eq!(store.visible_row_count(0), 0);
///
/// store.expand(&NodeId::new("docs"))?;
/// assert_eq!(store.visible_row_count(0), 1);
/// assert_eq!(store.node_at(Coordinate::new(0, 0)).unwrap().id.as_str(), "guide");
/// ```
pub struct TreeStore<S: SourceAdapter> {
    source: S,
    options: TreeOptions,
    arena: Arena<Entry<S::Payload>>,
    roots: Vec<Key>,
    /// Root count the source reported at the last rebuild
    loaded_root_count: Option<usize>,
    /// Identity index
    ids: HashMap<NodeId, Key>,
    /// Coordinate index: `rows[root][row]`
    rows: Vec<Vec<Key>>,
}

impl<S: SourceAdapter> TreeStore<S> {
    /// Create an empty store; call [`load_roots`](Self::load_roots) to pull data
    pub fn new(source: S) -> Self {
        Self::with_options(source, TreeOptions::default())
    }

    pub fn with_options(source: S, options: TreeOptions) -> Self {
        Self {
            source,
            options,
            arena: Arena::with_key(),
            roots: Vec::new(),
            loaded_root_count: None,
            ids: HashMap::new(),
            rows: Vec::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the source; changes are picked up by the next load
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Identities of the roots, in order
    pub fn roots(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.roots.iter().map(move |&key| &self.arena[key].id)
    }

    /// Number of materialized nodes across the forest
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.ids.contains_key(id)
    }

    /// Number of visible rows under a root (0 for an unknown root)
    pub fn visible_row_count(&self, root: usize) -> usize {
        self.rows.get(root).map_or(0, Vec::len)
    }

    /// Total visible rows across all roots
    pub fn total_visible_rows(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn node(&self, id: &NodeId) -> Option<NodeRef<'_, S::Payload>> {
        self.ids.get(id).map(|&key| self.view(key))
    }

    /// Identity lookup, optionally restricted to one root
    pub fn node_for(&self, id: &NodeId, within_root: Option<usize>) -> Option<NodeRef<'_, S::Payload>> {
        self.lookup(id, within_root).ok().map(|key| self.view(key))
    }

    /// The visible node at `coordinate`
    pub fn node_at(&self, coordinate: Coordinate) -> Option<NodeRef<'_, S::Payload>> {
        self.key_at(coordinate).map(|key| self.view(key))
    }

    /// Visible coordinate of a node; `None` for roots and hidden nodes
    pub fn coordinate_of(&self, id: &NodeId) -> Option<Coordinate> {
        let key = *self.ids.get(id)?;
        self.arena[key].placement.coordinate()
    }

    pub fn is_visible(&self, id: &NodeId) -> bool {
        self.coordinate_of(id).is_some()
    }

    /// Number of currently visible descendants of a node
    ///
    /// A collapsed node has none. For a hidden node this is the count it
    /// would have if its ancestors were expanded.
    pub fn visible_descendant_count(&self, id: &NodeId) -> Result<usize> {
        let key = self.key(id)?;
        Ok(self.count_visible(key))
    }

    pub fn level(&self, id: &NodeId) -> Option<usize> {
        self.ids.get(id).map(|&key| self.arena[key].level)
    }

    pub fn parent(&self, id: &NodeId) -> Option<&NodeId> {
        let key = *self.ids.get(id)?;
        let parent = self.arena[key].parent?;
        Some(&self.arena[parent].id)
    }

    /// Materialized children of a node; empty for unknown identities
    pub fn children(&self, id: &NodeId) -> impl Iterator<Item = &NodeId> + '_ {
        self.ids
            .get(id)
            .map(|&key| self.arena[key].children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&child| &self.arena[child].id)
    }

    /// Index of the root a node belongs to
    pub fn root_of(&self, id: &NodeId) -> Option<usize> {
        self.ids.get(id).map(|&key| self.section_of(key))
    }

    /// Ancestors from parent up to the root
    pub fn ancestors(&self, id: &NodeId) -> Vec<&NodeId> {
        let mut ancestors = Vec::new();
        let mut current = self.ids.get(id).and_then(|&key| self.arena[key].parent);
        while let Some(key) = current {
            ancestors.push(&self.arena[key].id);
            current = self.arena[key].parent;
        }
        ancestors
    }

    pub fn is_expanded(&self, id: &NodeId) -> bool {
        self.ids
            .get(id)
            .map(|&key| self.arena[key].expanded)
            .unwrap_or(false)
    }

    /// Returns true once a node's children have been pulled or given
    pub fn is_loaded(&self, id: &NodeId) -> bool {
        self.ids
            .get(id)
            .map(|&key| self.arena[key].loaded)
            .unwrap_or(false)
    }

    pub fn payload(&self, id: &NodeId) -> Option<&S::Payload> {
        self.ids.get(id).map(|&key| &self.arena[key].payload)
    }

    /// Visible rows of a root, in row order
    pub fn rows(&self, root: usize) -> impl Iterator<Item = NodeRef<'_, S::Payload>> + '_ {
        self.rows
            .get(root)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(move |&key| self.view(key))
    }

    /// Walk every materialized node of the forest
    pub fn walk(&self, order: TraversalOrder) -> impl Iterator<Item = NodeRef<'_, S::Payload>> + '_ {
        Walk::new(&self.arena, &self.roots, order).map(move |key| self.view(key))
    }

    /// Walk the subtree rooted at `id`
    pub fn walk_from(
        &self,
        id: &NodeId,
        order: TraversalOrder,
    ) -> Result<impl Iterator<Item = NodeRef<'_, S::Payload>> + '_> {
        let key = self.key(id)?;
        Ok(Walk::new(&self.arena, &[key], order).map(move |key| self.view(key)))
    }

    /// Visible rows of a root as indented text lines
    ///
    /// `v` marks an expanded node, `>` a collapsed one that has (or may
    /// have) children, `-` a leaf.
    pub fn outline(&self, root: usize) -> Vec<String> {
        self.rows(root)
            .map(|node| {
                let key = self.ids[node.id];
                format!(
                    "{}{} {}",
                    "  ".repeat(node.level.saturating_sub(1)),
                    self.marker(key),
                    node.id
                )
            })
            .collect()
    }

    /// Every root header followed by its indented visible rows
    pub fn outline_all(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (index, &key) in self.roots.iter().enumerate() {
            lines.push(format!("{} {}", self.marker(key), self.arena[key].id));
            lines.extend(self.outline(index).into_iter().map(|line| format!("  {line}")));
        }
        lines
    }

    fn marker(&self, key: Key) -> &'static str {
        let entry = &self.arena[key];
        if entry.children.is_empty() && entry.loaded {
            "-"
        } else if entry.expanded {
            "v"
        } else {
            ">"
        }
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Pull the roots from the source
    ///
    /// Rebuilds everything when the source reports a root count different
    /// from the one it reported at the last load; otherwise does nothing.
    /// Roots the source failed to supply or supplied twice do not count
    /// as a change.
    pub fn load_roots(&mut self) -> Vec<Change> {
        let count = self.source.root_count();
        if self.loaded_root_count == Some(count) {
            trace!("load_roots: root count unchanged ({count}), nothing to do");
            return Vec::new();
        }
        self.rebuild()
    }

    /// Discard all state and rebuild from the source
    pub fn reload(&mut self) -> Vec<Change> {
        self.rebuild()
    }

    fn rebuild(&mut self) -> Vec<Change> {
        let count = self.source.root_count();
        info!(
            "Rebuilding tree from source: {} roots ({:?} load)",
            count, self.options.load_policy
        );

        self.arena.clear();
        self.ids.clear();
        self.roots.clear();
        self.loaded_root_count = Some(count);

        for index in 0..count {
            let Some(item) = self.source.root(index) else {
                warn!("Source reported {count} roots but has none at {index}");
                break;
            };
            if self.ids.contains_key(&item.id) {
                warn!("Source returned duplicate root {}, skipping", item.id);
                continue;
            }
            let key = self.alloc(item, None);
            if self.options.expand_roots {
                self.arena[key].expanded = true;
            }
            self.roots.push(key);
        }

        self.rows = vec![Vec::new(); self.roots.len()];
        self.renumber_roots();

        for index in 0..self.roots.len() {
            let root = self.roots[index];
            if self.options.is_lazy() {
                self.reveal(root, index);
            } else {
                self.materialize_deep(root, index);
            }
        }

        self.project_dirty();
        debug!(
            "Tree rebuilt: {} nodes, {} visible rows",
            self.node_count(),
            self.total_visible_rows()
        );
        vec![Change::Reload]
    }

    fn alloc(&mut self, item: SourceItem<S::Payload>, parent: Option<Key>) -> Key {
        let level = parent.map_or(0, |p| self.arena[p].level + 1);
        let mut entry = Entry::new(item.id.clone(), item.payload, level, parent);
        entry.expanded = item.expanded;
        let key = self.arena.insert(entry);
        self.ids.insert(item.id, key);
        key
    }

    /// Pull a node's children from the source, once
    fn materialize(&mut self, key: Key, root_index: usize) {
        if self.arena[key].loaded {
            return;
        }

        let items: Vec<SourceItem<S::Payload>> = {
            let parent = self.view(key);
            let count = self.source.child_count(&parent, root_index);
            (0..count)
                .map_while(|index| self.source.child(index, &parent, root_index))
                .collect()
        };

        self.arena[key].loaded = true;
        trace!("Pulled {} children for {}", items.len(), self.arena[key].id);

        for item in items {
            if self.ids.contains_key(&item.id) {
                warn!("Source returned duplicate node {}, skipping", item.id);
                continue;
            }
            let child = self.alloc(item, Some(key));
            self.arena[key].children.push(child);
        }
        projector::invalidate_upward(&mut self.arena, key);
    }

    /// Pull the whole subtree, pre-order
    fn materialize_deep(&mut self, key: Key, root_index: usize) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            self.materialize(current, root_index);
            stack.extend(self.arena[current].children.iter().rev().copied());
        }
    }

    /// Pull the children of every expanded node reachable through expanded
    /// nodes, so everything that should be visible exists
    fn reveal(&mut self, key: Key, root_index: usize) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if self.arena[current].expanded {
                self.materialize(current, root_index);
                stack.extend(self.arena[current].children.iter().copied());
            }
        }
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Insert a node (with any children it carries)
    ///
    /// Without a parent the node becomes a new root and the change is
    /// reported as a reload. `root` scopes the parent lookup.
    pub fn insert(
        &mut self,
        node: Node<S::Payload>,
        parent: Option<&NodeId>,
        root: Option<usize>,
        mode: InsertMode,
    ) -> Result<Vec<Change>> {
        let (parent_key, index) = self.plan_insert(&node, parent, root, &mode)?;
        let id = node.id.clone();
        let key = self.attach(node, parent_key);

        let Some(parent_key) = parent_key else {
            self.roots.insert(index, key);
            self.rows.insert(index, Vec::new());
            self.renumber_roots();
            self.reveal(key, index);
            self.project_dirty();
            debug!("Inserted root {id} at {index}");
            return Ok(vec![Change::Reload]);
        };

        self.arena[parent_key].children.insert(index, key);
        let section = self.section_of(parent_key);
        self.reveal(key, section);
        projector::invalidate_upward(&mut self.arena, parent_key);
        self.project_dirty();

        debug!(
            "Inserted {id} under {} at {index}",
            self.arena[parent_key].id
        );
        let mut changes = Vec::new();
        push_rows(
            &mut changes,
            Change::Insert,
            projector::subtree_rows(&self.arena, key),
        );
        Ok(changes)
    }

    /// Validate an insert without performing it
    pub fn check_insert(
        &self,
        node: &Node<S::Payload>,
        parent: Option<&NodeId>,
        root: Option<usize>,
        mode: &InsertMode,
    ) -> Result<()> {
        self.plan_insert(node, parent, root, mode).map(|_| ())
    }

    fn plan_insert(
        &self,
        node: &Node<S::Payload>,
        parent: Option<&NodeId>,
        root: Option<usize>,
        mode: &InsertMode,
    ) -> Result<(Option<Key>, usize)> {
        let mut seen = HashSet::new();
        for id in node.ids() {
            if self.ids.contains_key(id) || !seen.insert(id) {
                return Err(TreeError::AlreadyExists(id.clone()));
            }
        }

        match parent {
            None => Ok((None, self.position(&self.roots, mode)?)),
            Some(parent) => {
                let key = self.lookup(parent, root)?;
                let index = self.position(&self.arena[key].children, mode)?;
                Ok((Some(key), index))
            }
        }
    }

    fn position(&self, siblings: &[Key], mode: &InsertMode) -> Result<usize> {
        let find = |id: &NodeId| {
            siblings
                .iter()
                .position(|&key| self.arena[key].id == *id)
                .ok_or_else(|| TreeError::NotFound(id.clone()))
        };
        match mode {
            InsertMode::Leading => Ok(0),
            InsertMode::Trailing => Ok(siblings.len()),
            InsertMode::Before(id) => find(id),
            InsertMode::After(id) => find(id).map(|index| index + 1),
        }
    }

    fn attach(&mut self, node: Node<S::Payload>, parent: Option<Key>) -> Key {
        let Node {
            id,
            payload,
            expanded,
            children,
            materialized,
        } = node;
        let level = parent.map_or(0, |p| self.arena[p].level + 1);
        let mut entry = Entry::new(id.clone(), payload, level, parent);
        entry.expanded = expanded;
        entry.loaded = materialized;

        let key = self.arena.insert(entry);
        self.ids.insert(id, key);
        for child in children {
            let child = self.attach(child, Some(key));
            self.arena[key].children.push(child);
        }
        key
    }

    /// Remove a node and its subtree
    pub fn delete(&mut self, id: &NodeId, root: Option<usize>) -> Result<Vec<Change>> {
        let key = self.lookup(id, root)?;
        let (_, changes) = self.detach_key(key, true)?;
        debug!("Deleted {id}");
        Ok(changes)
    }

    /// Take a node out of the tree and hand it back as a value
    ///
    /// With `keep_children` false the node comes back without children.
    pub fn detach(&mut self, id: &NodeId, keep_children: bool) -> Result<(Node<S::Payload>, Vec<Change>)> {
        let key = self.key(id)?;
        self.detach_key(key, keep_children)
    }

    fn detach_key(&mut self, key: Key, keep_children: bool) -> Result<(Node<S::Payload>, Vec<Change>)> {
        let id = self.arena[key].id.clone();
        let removed_rows = projector::subtree_rows(&self.arena, key);
        let parent = self.arena[key].parent;

        match parent {
            Some(parent) => {
                self.arena[parent].children.retain(|&child| child != key);
                projector::invalidate_upward(&mut self.arena, parent);
            }
            None => {
                if let Some(index) = self.roots.iter().position(|&root| root == key) {
                    self.roots.remove(index);
                    self.rows.remove(index);
                    self.renumber_roots();
                }
            }
        }

        let node = self
            .take_subtree(key, keep_children)
            .ok_or(TreeError::NotFound(id))?;
        self.project_dirty();

        let mut changes = Vec::new();
        if parent.is_none() {
            changes.push(Change::Reload);
        } else {
            push_rows(&mut changes, Change::Delete, removed_rows);
        }
        Ok((node, changes))
    }

    fn take_subtree(&mut self, key: Key, keep_children: bool) -> Option<Node<S::Payload>> {
        let entry = self.arena.remove(key)?;
        self.ids.remove(&entry.id);

        let mut children = Vec::new();
        for child in entry.children {
            let taken = self.take_subtree(child, true);
            if keep_children {
                children.extend(taken);
            }
        }

        Some(Node {
            id: entry.id,
            payload: entry.payload,
            expanded: entry.expanded,
            children,
            materialized: entry.loaded || !keep_children,
        })
    }

    /// Replace a node's payload; coordinates are unaffected
    pub fn update(&mut self, id: &NodeId, payload: S::Payload) -> Result<Vec<Change>> {
        let key = self.key(id)?;
        let entry = &mut self.arena[key];
        entry.payload = payload;
        trace!("Updated payload of {id}");
        Ok(entry.placement.coordinate().map(Change::Update).into_iter().collect())
    }

    /// Move the node at `source` to `target`'s position among its siblings
    ///
    /// Both coordinates are checked before anything changes. Without
    /// `move_children` the node's children are discarded.
    pub fn move_node(
        &mut self,
        source: Coordinate,
        target: Coordinate,
        move_children: bool,
    ) -> Result<Vec<Change>> {
        let Some(plan) = self.plan_move(source, target)? else {
            return Ok(Vec::new());
        };

        let key = self.key(&plan.node)?;
        let carried = projector::descendant_rows(&self.arena, key);
        let (node, _) = self.detach_key(key, move_children)?;
        self.land(node, &plan)?;

        let key = self.key(&plan.node)?;
        let mut changes = Vec::new();
        push_rows(&mut changes, Change::Delete, carried);
        match self.arena[key].placement.coordinate() {
            Some(to) => changes.push(Change::Move { from: source, to }),
            None => changes.push(Change::Delete(vec![source])),
        }
        push_rows(
            &mut changes,
            Change::Insert,
            projector::descendant_rows(&self.arena, key),
        );

        debug!("Moved {} from {source} to {target}", plan.node);
        Ok(changes)
    }

    /// Validate a move and express it by identity
    ///
    /// `target` is either a visible row, whose position the node takes, or
    /// the row just past the end of a section (`row == visible_row_count`),
    /// which appends the node as the last child of that section's root.
    /// Returns `None` when source and target are the same node.
    pub fn plan_move(&self, source: Coordinate, target: Coordinate) -> Result<Option<MovePlan>> {
        let src = self
            .key_at(source)
            .ok_or(TreeError::InvalidCoordinate(source))?;
        let old_parent = self.arena[src]
            .parent
            .ok_or(TreeError::InvalidCoordinate(source))?;

        let (parent, mode) = match self.key_at(target) {
            Some(dst) if dst == src => return Ok(None),
            Some(dst) if self.is_in_subtree(dst, src) => {
                return Err(TreeError::InvalidCoordinate(target))
            }
            Some(dst) => {
                let parent = self.arena[dst]
                    .parent
                    .ok_or(TreeError::InvalidCoordinate(target))?;
                let siblings = &self.arena[parent].children;
                let index_of = |key: Key| siblings.iter().position(|&k| k == key);

                let target_id = self.arena[dst].id.clone();
                let moving_down = old_parent == parent && index_of(src) < index_of(dst);
                let mode = if moving_down {
                    InsertMode::After(target_id)
                } else {
                    InsertMode::Before(target_id)
                };
                (parent, mode)
            }
            None if target.row == self.visible_row_count(target.root) => {
                let root = *self
                    .roots
                    .get(target.root)
                    .ok_or(TreeError::InvalidCoordinate(target))?;
                (root, InsertMode::Trailing)
            }
            None => return Err(TreeError::InvalidCoordinate(target)),
        };

        let siblings = &self.arena[old_parent].children;
        let next = siblings
            .iter()
            .position(|&key| key == src)
            .and_then(|index| siblings.get(index + 1));
        let origin_mode = match next {
            Some(&next) => InsertMode::Before(self.arena[next].id.clone()),
            None => InsertMode::Trailing,
        };
        let origin_root = self.roots[self.section_of(src)];

        Ok(Some(MovePlan {
            node: self.arena[src].id.clone(),
            parent: self.arena[parent].id.clone(),
            mode,
            origin: self.arena[old_parent].id.clone(),
            origin_mode,
            origin_root: self.arena[origin_root].id.clone(),
        }))
    }

    /// Insert a node taken out by a move at the first place that still
    /// exists: the planned position, the end of the planned parent, the
    /// original position, the end of the original parent, then the end of
    /// the original root
    pub fn land(&mut self, node: Node<S::Payload>, plan: &MovePlan) -> Result<Vec<Change>> {
        let trailing = InsertMode::Trailing;
        let destinations = [
            (&plan.parent, &plan.mode),
            (&plan.parent, &trailing),
            (&plan.origin, &plan.origin_mode),
            (&plan.origin, &trailing),
            (&plan.origin_root, &trailing),
        ];
        for (parent, mode) in destinations {
            match self.check_insert(&node, Some(parent), None, mode) {
                Ok(()) => {
                    if parent != &plan.parent || mode != &plan.mode {
                        debug!("Destination of {} gone, landing under {parent} ({mode:?})", plan.node);
                    }
                    return self.insert(node, Some(parent), None, mode.clone());
                }
                Err(TreeError::NotFound(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(TreeError::NotFound(plan.origin_root.clone()))
    }

    /// Returns true if `key` is `ancestor` or lies below it
    fn is_in_subtree(&self, key: Key, ancestor: Key) -> bool {
        let mut current = Some(key);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.arena[node].parent;
        }
        false
    }

    /// Set a node's expanded flag
    ///
    /// With `propagate`, every descendant that has children receives the
    /// same flag. The reported changes are the rows that disappeared
    /// (old coordinates) followed by the rows that appeared (new ones).
    pub fn set_expanded(&mut self, id: &NodeId, expanded: bool, propagate: bool) -> Result<Vec<Change>> {
        let key = self.key(id)?;
        let before = self.visible_below(key);
        let section = self.section_of(key);

        self.arena[key].expanded = expanded;
        if expanded {
            self.materialize(key, section);
        }
        if propagate {
            let mut stack = self.arena[key].children.clone();
            while let Some(current) = stack.pop() {
                if expanded {
                    self.materialize(current, section);
                }
                if !self.arena[current].children.is_empty() {
                    self.arena[current].expanded = expanded;
                    stack.extend(self.arena[current].children.iter().copied());
                }
            }
        }

        projector::invalidate(&mut self.arena, key);
        projector::hide_descendants(&mut self.arena, key);
        self.reveal(key, section);
        self.project_dirty();

        let after = self.visible_below(key);
        let before_keys: HashSet<Key> = before.iter().map(|(key, _)| *key).collect();
        let after_keys: HashSet<Key> = after.iter().map(|(key, _)| *key).collect();

        let mut changes = Vec::new();
        push_rows(
            &mut changes,
            Change::Delete,
            before
                .iter()
                .filter(|(key, _)| !after_keys.contains(key))
                .map(|(_, coordinate)| *coordinate)
                .collect(),
        );
        push_rows(
            &mut changes,
            Change::Insert,
            after
                .iter()
                .filter(|(key, _)| !before_keys.contains(key))
                .map(|(_, coordinate)| *coordinate)
                .collect(),
        );

        debug!(
            "{} {id}{}",
            if expanded { "Expanded" } else { "Collapsed" },
            if propagate { " and descendants" } else { "" }
        );
        Ok(changes)
    }

    pub fn expand(&mut self, id: &NodeId) -> Result<Vec<Change>> {
        self.set_expanded(id, true, false)
    }

    pub fn collapse(&mut self, id: &NodeId) -> Result<Vec<Change>> {
        self.set_expanded(id, false, false)
    }

    pub fn toggle(&mut self, id: &NodeId) -> Result<Vec<Change>> {
        let expanded = self.is_expanded(id);
        self.set_expanded(id, !expanded, false)
    }

    /// Expand every root and every descendant that has children
    pub fn expand_all(&mut self) -> Vec<Change> {
        self.set_all(true)
    }

    /// Collapse every root and every descendant that has children
    pub fn collapse_all(&mut self) -> Vec<Change> {
        self.set_all(false)
    }

    fn set_all(&mut self, expanded: bool) -> Vec<Change> {
        let roots: Vec<NodeId> = self.roots().cloned().collect();
        let mut changes = Vec::new();
        for id in roots {
            // Roots come from our own list, so the lookup cannot fail
            if let Ok(root_changes) = self.set_expanded(&id, expanded, true) {
                changes.extend(root_changes);
            }
        }
        changes
    }

    // ------------------------------------------------------------------
    // Coordinates used to order scheduled operations
    // ------------------------------------------------------------------

    /// The node's coordinate, or that of its nearest visible ancestor
    ///
    /// Roots and nodes hidden directly under a root anchor at row 0.
    pub fn anchor_coordinate(&self, id: &NodeId) -> Option<Coordinate> {
        let mut current = Some(*self.ids.get(id)?);
        while let Some(key) = current {
            match self.arena[key].placement {
                Placement::Row(coordinate) => return Some(coordinate),
                Placement::Header(root) => return Some(Coordinate::new(root, 0)),
                Placement::Hidden => current = self.arena[key].parent,
            }
        }
        None
    }

    /// Where an insert with these arguments would appear
    ///
    /// Falls back to the nearest visible anchor when the parent is hidden
    /// or collapsed.
    /// Returns `None` for an unknown parent.
    pub fn insertion_coordinate(&self, parent: Option<&NodeId>, mode: &InsertMode) -> Option<Coordinate> {
        let Some(parent) = parent else {
            let index = self.position(&self.roots, mode).unwrap_or(self.roots.len());
            return Some(Coordinate::new(index, 0));
        };
        let key = *self.ids.get(parent)?;

        let entry = &self.arena[key];
        let first = match entry.placement {
            Placement::Header(root) if entry.expanded => Coordinate::new(root, 0),
            Placement::Row(at) if entry.expanded => Coordinate::new(at.root, at.row + 1),
            _ => return self.anchor_coordinate(parent),
        };

        let sibling_end = |id: &NodeId, after: bool| -> Option<Coordinate> {
            let sibling = &self.arena[*self.ids.get(id)?];
            let at = sibling.placement.coordinate()?;
            let skip = if after {
                1 + sibling.visible_count.unwrap_or(0)
            } else {
                0
            };
            Some(Coordinate::new(at.root, at.row + skip))
        };

        Some(match mode {
            InsertMode::Leading => first,
            InsertMode::Trailing => {
                Coordinate::new(first.root, first.row + entry.visible_count.unwrap_or(0))
            }
            InsertMode::Before(id) => sibling_end(id, false).unwrap_or(first),
            InsertMode::After(id) => sibling_end(id, true).unwrap_or(first),
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn view(&self, key: Key) -> NodeRef<'_, S::Payload> {
        let entry = &self.arena[key];
        NodeRef {
            id: &entry.id,
            payload: &entry.payload,
            level: entry.level,
            expanded: entry.expanded,
            coordinate: entry.placement.coordinate(),
            child_count: entry.children.len(),
        }
    }

    fn key(&self, id: &NodeId) -> Result<Key> {
        self.ids
            .get(id)
            .copied()
            .ok_or_else(|| TreeError::NotFound(id.clone()))
    }

    /// Identity lookup scoped to a root; a node of another root is not found
    fn lookup(&self, id: &NodeId, root: Option<usize>) -> Result<Key> {
        let key = self.key(id)?;
        match root {
            Some(root) if self.section_of(key) != root => Err(TreeError::NotFound(id.clone())),
            _ => Ok(key),
        }
    }

    fn key_at(&self, coordinate: Coordinate) -> Option<Key> {
        self.rows.get(coordinate.root)?.get(coordinate.row).copied()
    }

    fn section_of(&self, key: Key) -> usize {
        let mut top = key;
        while let Some(parent) = self.arena[top].parent {
            top = parent;
        }
        match self.arena[top].placement {
            Placement::Header(index) => index,
            _ => self.roots.iter().position(|&root| root == top).unwrap_or(0),
        }
    }

    fn count_visible(&self, key: Key) -> usize {
        let entry = &self.arena[key];
        if !entry.expanded {
            return 0;
        }
        if let Some(count) = entry.visible_count {
            return count;
        }
        entry
            .children
            .iter()
            .map(|&child| 1 + self.count_visible(child))
            .sum()
    }

    fn visible_below(&self, key: Key) -> Vec<(Key, Coordinate)> {
        projector::descendant_rows(&self.arena, key)
            .into_iter()
            .filter_map(|coordinate| Some((self.key_at(coordinate)?, coordinate)))
            .collect()
    }

    /// Write each root's header index; roots whose index changed are dirtied
    fn renumber_roots(&mut self) {
        for (index, &key) in self.roots.iter().enumerate() {
            let entry = &mut self.arena[key];
            if entry.placement != Placement::Header(index) {
                entry.placement = Placement::Header(index);
                entry.visible_count = None;
            }
        }
    }

    /// Re-project every root whose cache is dirty
    fn project_dirty(&mut self) {
        for index in 0..self.roots.len() {
            let root = self.roots[index];
            if self.arena[root].visible_count.is_none() {
                let visible =
                    projector::project_root(&mut self.arena, root, index, &mut self.rows[index]);
                trace!("Projected root {index}: {visible} visible rows");
            }
        }
    }
}

impl<P> TreeStore<crate::tree::EmptySource<P>> {
    /// A store with no source, built entirely through inserts
    pub fn detached() -> Self {
        Self::new(crate::tree::EmptySource::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::StaticSource;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> NodeId {
        NodeId::new(s)
    }

    // Three roots, each with one child, each with one grandchild
    fn chain_source() -> StaticSource<u32> {
        StaticSource::new(
            (0..3)
                .map(|r| {
                    Node::new(format!("r{r}"), r)
                        .child(Node::new(format!("c{r}"), r).child(Node::new(format!("g{r}"), r)))
                })
                .collect(),
        )
    }

    #[test]
    fn test_load_roots_chain() {
        let mut store = TreeStore::new(chain_source());
        assert_eq!(store.load_roots(), vec![Change::Reload]);

        assert_eq!(store.root_count(), 3);
        assert_eq!(store.node_count(), 9);
        assert_eq!(store.visible_row_count(0), 0);

        store.expand(&id("r0")).unwrap();
        assert_eq!(store.visible_row_count(0), 1);

        store.expand(&id("c0")).unwrap();
        assert_eq!(store.visible_row_count(0), 2);
        assert_eq!(store.visible_row_count(1), 0);
    }

    #[test]
    fn test_load_roots_is_idempotent() {
        let mut store = TreeStore::new(chain_source());
        store.load_roots();
        store.expand(&id("r0")).unwrap();

        assert!(store.load_roots().is_empty());
        assert!(store.is_expanded(&id("r0")));
    }

    #[test]
    fn test_load_roots_is_idempotent_with_duplicate_roots() {
        let source = StaticSource::new(vec![
            Node::new("a", 0).child(Node::new("c", 0)),
            Node::new("a", 1),
        ]);
        let mut store = TreeStore::new(source);
        assert_eq!(store.load_roots(), vec![Change::Reload]);
        assert_eq!(store.root_count(), 1);
        store.expand(&id("a")).unwrap();

        assert!(store.load_roots().is_empty());
        assert!(store.is_expanded(&id("a")));
    }

    /// Claims more roots than it can hand out
    struct ShortSource;

    impl SourceAdapter for ShortSource {
        type Payload = u32;

        fn root_count(&self) -> usize {
            3
        }

        fn root(&self, root_index: usize) -> Option<SourceItem<u32>> {
            (root_index == 0).then(|| SourceItem::new("only", 0).expanded(true))
        }

        fn child_count(&self, _parent: &NodeRef<'_, u32>, _root_index: usize) -> usize {
            0
        }

        fn child(&self, _index: usize, _parent: &NodeRef<'_, u32>, _root_index: usize) -> Option<SourceItem<u32>> {
            None
        }
    }

    #[test]
    fn test_load_roots_is_idempotent_with_missing_roots() {
        let mut store = TreeStore::new(ShortSource);
        assert_eq!(store.load_roots(), vec![Change::Reload]);
        assert_eq!(store.root_count(), 1);

        store
            .insert(Node::new("kid", 0), Some(&id("only")), None, InsertMode::Trailing)
            .unwrap();
        assert!(store.load_roots().is_empty());
        assert!(store.contains(&id("kid")));
        assert_eq!(store.visible_row_count(0), 1);
    }

    #[test]
    fn test_load_roots_rebuilds_on_count_change() {
        let mut store = TreeStore::new(chain_source());
        store.load_roots();
        store.expand(&id("r0")).unwrap();

        store
            .source_mut()
            .set_roots(vec![Node::new("only", 9).child(Node::new("leaf", 9))]);
        assert_eq!(store.load_roots(), vec![Change::Reload]);
        assert_eq!(store.root_count(), 1);
        assert!(!store.contains(&id("r0")));
        assert_eq!(store.roots().collect::<Vec<_>>(), vec![&id("only")]);
    }

    #[test]
    fn test_lazy_load_pulls_on_expand_only_once() {
        let options = TreeOptions::new().lazy();
        let mut store = TreeStore::with_options(chain_source(), options);
        store.load_roots();

        // Only roots exist before anything is expanded
        assert_eq!(store.node_count(), 3);
        assert_eq!(store.source().query_count(), 0);

        store.expand(&id("r1")).unwrap();
        assert_eq!(store.node_count(), 4);
        let queries = store.source().query_count();
        assert!(queries > 0);

        store.collapse(&id("r1")).unwrap();
        store.expand(&id("r1")).unwrap();
        assert_eq!(store.source().query_count(), queries);
        assert_eq!(store.visible_row_count(1), 1);
    }

    #[test]
    fn test_insert_child_positions() {
        let mut store = TreeStore::detached();
        store
            .insert(Node::new("root", 0).expanded(true), None, None, InsertMode::Trailing)
            .unwrap();

        let root = id("root");
        store.insert(Node::new("b", 0), Some(&root), None, InsertMode::Trailing).unwrap();
        store.insert(Node::new("a", 0), Some(&root), None, InsertMode::Leading).unwrap();
        store
            .insert(Node::new("c", 0), Some(&root), None, InsertMode::After(id("b")))
            .unwrap();
        let changes = store
            .insert(Node::new("ab", 0), Some(&root), None, InsertMode::Before(id("b")))
            .unwrap();

        assert_eq!(changes, vec![Change::Insert(vec![Coordinate::new(0, 1)])]);
        let order: Vec<_> = store.children(&root).map(NodeId::as_str).collect();
        assert_eq!(order, vec!["a", "ab", "b", "c"]);
        assert_eq!(store.coordinate_of(&id("c")), Some(Coordinate::new(0, 3)));
    }

    #[test]
    fn test_insert_errors_leave_tree_unchanged() {
        let mut store = TreeStore::detached();
        store
            .insert(Node::new("root", 0).expanded(true), None, None, InsertMode::Trailing)
            .unwrap();
        store
            .insert(Node::new("a", 0), Some(&id("root")), None, InsertMode::Trailing)
            .unwrap();

        assert_eq!(
            store.insert(Node::new("x", 0), Some(&id("missing")), None, InsertMode::Trailing),
            Err(TreeError::NotFound(id("missing")))
        );
        assert_eq!(
            store.insert(
                Node::new("x", 0),
                Some(&id("root")),
                None,
                InsertMode::Before(id("nope"))
            ),
            Err(TreeError::NotFound(id("nope")))
        );
        assert_eq!(
            store.insert(
                Node::new("x", 0).child(Node::new("a", 1)),
                Some(&id("root")),
                None,
                InsertMode::Trailing
            ),
            Err(TreeError::AlreadyExists(id("a")))
        );
        assert_eq!(
            store.insert(
                Node::new("y", 0).child(Node::new("y", 1)),
                None,
                None,
                InsertMode::Trailing
            ),
            Err(TreeError::AlreadyExists(id("y")))
        );

        assert_eq!(store.node_count(), 2);
        assert!(!store.contains(&id("x")));
        assert_eq!(store.visible_row_count(0), 1);
    }

    #[test]
    fn test_insert_root_renumbers_sections() {
        let mut store = TreeStore::new(chain_source());
        store.load_roots();
        store.expand(&id("r1")).unwrap();
        assert_eq!(store.coordinate_of(&id("c1")), Some(Coordinate::new(1, 0)));

        let changes = store
            .insert(Node::new("new", 0), None, None, InsertMode::Before(id("r1")))
            .unwrap();
        assert_eq!(changes, vec![Change::Reload]);
        assert_eq!(store.root_of(&id("new")), Some(1));
        assert_eq!(store.root_of(&id("c1")), Some(2));
        assert_eq!(store.coordinate_of(&id("c1")), Some(Coordinate::new(2, 0)));
    }

    #[test]
    fn test_scoped_lookup() {
        let mut store = TreeStore::new(chain_source());
        store.load_roots();

        assert!(store.node_for(&id("g2"), Some(2)).is_some());
        assert!(store.node_for(&id("g2"), Some(0)).is_none());
        assert_eq!(
            store.delete(&id("g2"), Some(1)),
            Err(TreeError::NotFound(id("g2")))
        );
        assert!(store.delete(&id("g2"), Some(2)).is_ok());
    }

    #[test]
    fn test_delete_reports_old_rows() {
        let mut store = TreeStore::new(chain_source());
        store.load_roots();
        store.expand_all();
        assert_eq!(store.visible_row_count(0), 2);

        let changes = store.delete(&id("c0"), None).unwrap();
        assert_eq!(
            changes,
            vec![Change::Delete(vec![Coordinate::new(0, 0), Coordinate::new(0, 1)])]
        );
        assert_eq!(store.visible_row_count(0), 0);
        assert!(!store.contains(&id("g0")));
        assert_eq!(store.delete(&id("c0"), None), Err(TreeError::NotFound(id("c0"))));
    }

    #[test]
    fn test_delete_root() {
        let mut store = TreeStore::new(chain_source());
        store.load_roots();
        store.expand_all();

        assert_eq!(store.delete(&id("r0"), None).unwrap(), vec![Change::Reload]);
        assert_eq!(store.root_count(), 2);
        assert_eq!(store.coordinate_of(&id("c1")), Some(Coordinate::new(0, 0)));
        assert_eq!(store.node_count(), 6);
    }

    #[test]
    fn test_update_payload() {
        let mut store = TreeStore::new(chain_source());
        store.load_roots();
        store.expand(&id("r0")).unwrap();

        assert_eq!(
            store.update(&id("c0"), 42).unwrap(),
            vec![Change::Update(Coordinate::new(0, 0))]
        );
        assert_eq!(store.payload(&id("c0")), Some(&42));
        // Hidden nodes update silently
        assert!(store.update(&id("g0"), 7).unwrap().is_empty());
        assert_eq!(store.update(&id("zz"), 1), Err(TreeError::NotFound(id("zz"))));
    }

    #[test]
    fn test_collapse_and_reexpand_restore_coordinates() {
        let mut store = TreeStore::new(chain_source());
        store.load_roots();
        store.expand_all();
        let before: Vec<_> = store.rows(0).map(|n| n.coordinate).collect();

        let changes = store.set_expanded(&id("r0"), false, true).unwrap();
        assert_eq!(
            changes,
            vec![Change::Delete(vec![Coordinate::new(0, 0), Coordinate::new(0, 1)])]
        );
        assert_eq!(store.visible_row_count(0), 0);
        assert_eq!(store.coordinate_of(&id("c0")), None);
        assert_eq!(store.coordinate_of(&id("g0")), None);
        assert!(!store.is_expanded(&id("c0")));

        let changes = store.set_expanded(&id("r0"), true, true).unwrap();
        assert_eq!(
            changes,
            vec![Change::Insert(vec![Coordinate::new(0, 0), Coordinate::new(0, 1)])]
        );
        let after: Vec<_> = store.rows(0).map(|n| n.coordinate).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_visible_descendant_count_of_hidden_node() {
        let mut store = TreeStore::new(chain_source());
        store.load_roots();
        store.expand(&id("c0")).unwrap();

        // c0 is expanded but hidden under the collapsed root
        assert_eq!(store.visible_descendant_count(&id("c0")), Ok(1));
        assert_eq!(store.visible_descendant_count(&id("r0")), Ok(0));
    }

    #[test]
    fn test_move_within_parent() {
        let mut store = TreeStore::detached();
        store
            .insert(
                Node::new("root", 0)
                    .expanded(true)
                    .with_children(["a", "b", "c", "d"].map(|s| Node::new(s, 0))),
                None,
                None,
                InsertMode::Trailing,
            )
            .unwrap();

        let changes = store
            .move_node(Coordinate::new(0, 1), Coordinate::new(0, 3), true)
            .unwrap();
        assert_eq!(
            changes,
            vec![Change::Move {
                from: Coordinate::new(0, 1),
                to: Coordinate::new(0, 3)
            }]
        );
        let order: Vec<_> = store.children(&id("root")).map(NodeId::as_str).collect();
        assert_eq!(order, vec!["a", "c", "d", "b"]);

        store
            .move_node(Coordinate::new(0, 3), Coordinate::new(0, 0), true)
            .unwrap();
        let order: Vec<_> = store.children(&id("root")).map(NodeId::as_str).collect();
        assert_eq!(order, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_move_across_roots_with_and_without_children() {
        let mut store = TreeStore::new(chain_source());
        store.load_roots();
        store.expand_all();

        // Carry c0 (and g0) before c1
        store
            .move_node(Coordinate::new(0, 0), Coordinate::new(1, 0), true)
            .unwrap();
        assert_eq!(store.root_of(&id("g0")), Some(1));
        assert_eq!(store.level(&id("g0")), Some(2));
        assert_eq!(store.visible_row_count(0), 0);
        assert_eq!(store.visible_row_count(1), 4);

        // Move c1 to root 2 dropping g1
        let c1 = store.coordinate_of(&id("c1")).unwrap();
        store.move_node(c1, Coordinate::new(2, 0), false).unwrap();
        assert!(!store.contains(&id("g1")));
        assert_eq!(store.root_of(&id("c1")), Some(2));
        assert_eq!(store.children(&id("c1")).count(), 0);
        assert_eq!(store.node_count(), 8);
    }

    // Two roots: r0 { a, b } and r1 with no children
    fn two_sections(r1_expanded: bool) -> TreeStore<crate::tree::EmptySource<u32>> {
        let mut store = TreeStore::detached();
        store
            .insert(
                Node::new("r0", 0)
                    .expanded(true)
                    .with_children(["a", "b"].map(|s| Node::new(s, 0))),
                None,
                None,
                InsertMode::Trailing,
            )
            .unwrap();
        store
            .insert(Node::new("r1", 0).expanded(r1_expanded), None, None, InsertMode::Trailing)
            .unwrap();
        store
    }

    #[test]
    fn test_move_into_empty_section() {
        let mut store = two_sections(true);

        let changes = store
            .move_node(Coordinate::new(0, 0), Coordinate::new(1, 0), true)
            .unwrap();
        assert_eq!(
            changes,
            vec![Change::Move {
                from: Coordinate::new(0, 0),
                to: Coordinate::new(1, 0)
            }]
        );
        assert_eq!(store.parent(&id("a")), Some(&id("r1")));
        assert_eq!(store.visible_row_count(0), 1);
        assert_eq!(store.visible_row_count(1), 1);
    }

    #[test]
    fn test_move_into_collapsed_section() {
        let mut store = two_sections(false);

        let changes = store
            .move_node(Coordinate::new(0, 1), Coordinate::new(1, 0), true)
            .unwrap();
        assert_eq!(changes, vec![Change::Delete(vec![Coordinate::new(0, 1)])]);
        assert_eq!(store.parent(&id("b")), Some(&id("r1")));
        assert!(!store.is_visible(&id("b")));
    }

    #[test]
    fn test_move_to_end_of_section() {
        let mut store = two_sections(true);

        let changes = store
            .move_node(Coordinate::new(0, 0), Coordinate::new(0, 2), true)
            .unwrap();
        assert_eq!(
            changes,
            vec![Change::Move {
                from: Coordinate::new(0, 0),
                to: Coordinate::new(0, 1)
            }]
        );
        let order: Vec<_> = store.children(&id("r0")).map(NodeId::as_str).collect();
        assert_eq!(order, vec!["b", "a"]);

        // One past the end is the limit
        assert_eq!(
            store.move_node(Coordinate::new(0, 0), Coordinate::new(0, 3), true),
            Err(TreeError::InvalidCoordinate(Coordinate::new(0, 3)))
        );
    }

    #[test]
    fn test_plan_move_records_origin() {
        let store = two_sections(true);
        let plan = store
            .plan_move(Coordinate::new(0, 0), Coordinate::new(1, 0))
            .unwrap()
            .unwrap();
        assert_eq!(
            plan,
            MovePlan {
                node: id("a"),
                parent: id("r1"),
                mode: InsertMode::Trailing,
                origin: id("r0"),
                origin_mode: InsertMode::Before(id("b")),
                origin_root: id("r0"),
            }
        );
    }

    #[test]
    fn test_land_falls_back_to_origin() {
        let mut store = two_sections(true);
        let plan = store
            .plan_move(Coordinate::new(0, 0), Coordinate::new(1, 0))
            .unwrap()
            .unwrap();

        let (node, _) = store.detach(&id("a"), true).unwrap();
        store.delete(&id("r1"), None).unwrap();
        assert_eq!(
            store.land(node, &plan).unwrap(),
            vec![Change::Insert(vec![Coordinate::new(0, 0)])]
        );
        let order: Vec<_> = store.children(&id("r0")).map(NodeId::as_str).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn test_move_validates_before_mutating() {
        let mut store = TreeStore::new(chain_source());
        store.load_roots();
        store.expand_all();

        assert_eq!(
            store.move_node(Coordinate::new(0, 0), Coordinate::new(9, 0), true),
            Err(TreeError::InvalidCoordinate(Coordinate::new(9, 0)))
        );
        assert_eq!(
            store.move_node(Coordinate::new(0, 7), Coordinate::new(1, 0), true),
            Err(TreeError::InvalidCoordinate(Coordinate::new(0, 7)))
        );
        // Into its own subtree
        assert_eq!(
            store.move_node(Coordinate::new(0, 0), Coordinate::new(0, 1), true),
            Err(TreeError::InvalidCoordinate(Coordinate::new(0, 1)))
        );
        assert_eq!(store.node_count(), 9);
        assert_eq!(store.visible_row_count(0), 2);
    }

    #[test]
    fn test_insertion_coordinate() {
        let mut store = TreeStore::new(chain_source());
        store.load_roots();
        store.expand_all();

        assert_eq!(
            store.insertion_coordinate(Some(&id("r0")), &InsertMode::Leading),
            Some(Coordinate::new(0, 0))
        );
        assert_eq!(
            store.insertion_coordinate(Some(&id("r0")), &InsertMode::Trailing),
            Some(Coordinate::new(0, 2))
        );
        assert_eq!(
            store.insertion_coordinate(Some(&id("r1")), &InsertMode::After(id("c1"))),
            Some(Coordinate::new(1, 2))
        );
        assert_eq!(
            store.insertion_coordinate(None, &InsertMode::Trailing),
            Some(Coordinate::new(3, 0))
        );
        assert_eq!(
            store.insertion_coordinate(Some(&id("zz")), &InsertMode::Trailing),
            None
        );
    }

    #[test]
    fn test_walk_and_outline() {
        let mut store = TreeStore::new(chain_source());
        store.load_roots();
        store.expand(&id("r0")).unwrap();

        let walked: Vec<_> = store
            .walk(TraversalOrder::PreOrder)
            .take(4)
            .map(|n| n.id.to_string())
            .collect();
        assert_eq!(walked, vec!["r0", "c0", "g0", "r1"]);

        assert_eq!(store.outline(0), vec!["> c0"]);
        assert_eq!(store.ancestors(&id("g0")), vec![&id("c0"), &id("r0")]);
        assert_eq!(store.parent(&id("c0")), Some(&id("r0")));
    }
}
