//! Renderer-facing tree list
//!
//! [`TreeList`] wraps a [`TreeStore`] with a [`BatchScheduler`] and a set of
//! change listeners. Every edit is validated when it is scheduled, so a
//! caller learns about a bad identity or coordinate right away even if the
//! edit itself is queued until the batch commits.

use log::{debug, warn};

use crate::batch::{BatchScheduler, OpKind, PendingOp};
use crate::error::{Result, TreeError};
use crate::options::TreeOptions;
use crate::tree::{
    Change, Coordinate, InsertMode, Node, NodeId, NodeRef, SourceAdapter, TreeStore,
};

/// Receives every committed change-set
pub type Listener = Box<dyn FnMut(&[Change]) + Send + Sync>;

/// A tree store driven through batched, ordered edits
///
/// Mutating methods return `Ok(Some(changes))` when the edit was applied
/// immediately and `Ok(None)` when it was queued in an open batch; the
/// queued changes are returned by [`end_batch`](Self::end_batch).
pub struct TreeList<S: SourceAdapter> {
    store: TreeStore<S>,
    scheduler: BatchScheduler<TreeStore<S>>,
    listeners: Vec<Listener>,
}

impl<S> TreeList<S>
where
    S: SourceAdapter + 'static,
    S::Payload: Send + Sync + 'static,
{
    pub fn new(source: S) -> Self {
        Self::from_store(TreeStore::new(source))
    }

    pub fn with_options(source: S, options: TreeOptions) -> Self {
        Self::from_store(TreeStore::with_options(source, options))
    }

    pub fn from_store(store: TreeStore<S>) -> Self {
        Self {
            store,
            scheduler: BatchScheduler::new(),
            listeners: Vec::new(),
        }
    }

    /// Read access to the underlying store
    pub fn store(&self) -> &TreeStore<S> {
        &self.store
    }

    /// Register a listener for committed changes
    pub fn on_change(&mut self, listener: impl FnMut(&[Change]) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, changes: &[Change]) {
        if changes.is_empty() {
            return;
        }
        debug!(
            "Emitting {} changes to {} listeners",
            changes.len(),
            self.listeners.len()
        );
        for listener in &mut self.listeners {
            listener(changes);
        }
    }

    fn schedule(&mut self, op: PendingOp<TreeStore<S>>) -> Option<Vec<Change>> {
        let changes = self.scheduler.schedule(op, &mut self.store)?;
        self.emit(&changes);
        Some(changes)
    }

    // ------------------------------------------------------------------
    // Renderer contract
    // ------------------------------------------------------------------

    pub fn visible_row_count(&self, root: usize) -> usize {
        self.store.visible_row_count(root)
    }

    pub fn node_at(&self, coordinate: Coordinate) -> Option<NodeRef<'_, S::Payload>> {
        self.store.node_at(coordinate)
    }

    pub fn root_count(&self) -> usize {
        self.store.root_count()
    }

    /// Load roots from the source; applied immediately, even inside a batch
    pub fn load_roots(&mut self) -> Vec<Change> {
        let changes = self.store.load_roots();
        self.emit(&changes);
        changes
    }

    /// Rebuild from the source; applied immediately, even inside a batch
    pub fn reload(&mut self) -> Vec<Change> {
        let changes = self.store.reload();
        self.emit(&changes);
        changes
    }

    // ------------------------------------------------------------------
    // Batching
    // ------------------------------------------------------------------

    pub fn begin_batch(&mut self) {
        self.scheduler.begin();
    }

    /// Close a batch; the outermost close commits and notifies listeners
    pub fn end_batch(&mut self) -> Option<Vec<Change>> {
        let changes = self.scheduler.end(&mut self.store)?;
        self.emit(&changes);
        Some(changes)
    }

    pub fn is_batching(&self) -> bool {
        self.scheduler.is_batching()
    }

    /// Run `f` inside a batch and return the committed changes
    pub fn batch(&mut self, f: impl FnOnce(&mut Self)) -> Vec<Change> {
        self.begin_batch();
        f(self);
        self.end_batch().unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    pub fn insert(
        &mut self,
        node: Node<S::Payload>,
        parent: Option<&NodeId>,
        root: Option<usize>,
        mode: InsertMode,
    ) -> Result<Option<Vec<Change>>> {
        self.store.check_insert(&node, parent, root, &mode)?;
        let coordinate = self
            .store
            .insertion_coordinate(parent, &mode)
            .unwrap_or_default();
        let parent = parent.cloned();
        Ok(self.schedule(PendingOp::new(
            OpKind::Insert,
            coordinate,
            move |store: &mut TreeStore<S>| store.insert(node, parent.as_ref(), root, mode),
        )))
    }

    pub fn delete(&mut self, id: &NodeId, root: Option<usize>) -> Result<Option<Vec<Change>>> {
        let coordinate = self.anchor(id, root)?;
        let id = id.clone();
        Ok(self.schedule(PendingOp::new(
            OpKind::Delete,
            coordinate,
            move |store: &mut TreeStore<S>| store.delete(&id, root),
        )))
    }

    pub fn update(&mut self, id: &NodeId, payload: S::Payload) -> Result<Option<Vec<Change>>> {
        let coordinate = self.anchor(id, None)?;
        let id = id.clone();
        Ok(self.schedule(PendingOp::new(
            OpKind::Update,
            coordinate,
            move |store: &mut TreeStore<S>| store.update(&id, payload),
        )))
    }

    pub fn set_expanded(
        &mut self,
        id: &NodeId,
        expanded: bool,
        propagate: bool,
    ) -> Result<Option<Vec<Change>>> {
        let coordinate = self.anchor(id, None)?;
        let kind = if expanded {
            OpKind::Expand
        } else {
            OpKind::Collapse
        };
        let id = id.clone();
        Ok(self.schedule(PendingOp::new(
            kind,
            coordinate,
            move |store: &mut TreeStore<S>| store.set_expanded(&id, expanded, propagate),
        )))
    }

    pub fn expand(&mut self, id: &NodeId) -> Result<Option<Vec<Change>>> {
        self.set_expanded(id, true, false)
    }

    pub fn collapse(&mut self, id: &NodeId) -> Result<Option<Vec<Change>>> {
        self.set_expanded(id, false, false)
    }

    /// Move the node at `source` to `target`'s position
    ///
    /// Outside a batch this is a single edit reporting a move. Inside a
    /// batch it becomes a destructive detach at `source` and a
    /// constructive attach at `target`, each ordered with the rest of the
    /// batch. If the target sibling is gone by the time the attach runs,
    /// the node is appended to the target parent instead; if the target
    /// parent is gone, the node goes back where it came from.
    pub fn move_node(
        &mut self,
        source: Coordinate,
        target: Coordinate,
        move_children: bool,
    ) -> Result<Option<Vec<Change>>> {
        let Some(plan) = self.store.plan_move(source, target)? else {
            return Ok(Some(Vec::new()));
        };

        if !self.is_batching() {
            let changes = self.store.move_node(source, target, move_children)?;
            self.emit(&changes);
            return Ok(Some(changes));
        }

        let (carry, landing) = flume::bounded::<Node<S::Payload>>(1);
        let node = plan.node.clone();
        self.schedule(PendingOp::new(
            OpKind::Detach,
            source,
            move |store: &mut TreeStore<S>| {
                let (detached, changes) = store.detach(&node, move_children)?;
                if carry.send(detached).is_err() {
                    warn!("Attach for {node} was dropped; node discarded");
                }
                Ok(changes)
            },
        ));
        self.schedule(PendingOp::new(
            OpKind::Attach,
            target,
            move |store: &mut TreeStore<S>| {
                let node = landing
                    .try_recv()
                    .map_err(|_| TreeError::NotFound(plan.node.clone()))?;
                store.land(node, &plan)
            },
        ));
        Ok(None)
    }

    /// Coordinate used to order an edit of `id`, validating the identity
    fn anchor(&self, id: &NodeId, root: Option<usize>) -> Result<Coordinate> {
        self.store
            .node_for(id, root)
            .ok_or_else(|| TreeError::NotFound(id.clone()))?;
        Ok(self.store.anchor_coordinate(id).unwrap_or_default())
    }
}
