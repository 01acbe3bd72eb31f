//! Batched structural edits
//!
//! While a batch is open, operations are queued instead of applied. Closing
//! the outermost batch sorts the queue into a deterministic order and
//! replays it as one change-set:
//!
//! 1. destructive operations (delete, collapse, detach), highest coordinate first
//! 2. constructive operations (insert, expand, attach), lowest coordinate first
//! 3. neutral operations (update), in the order they were scheduled
//!
//! Removing from the bottom up keeps the coordinates of the remaining
//! destructive operations meaningful, and adding from the top down does the
//! same for constructive ones.

use derive_more::Display;
use log::{debug, trace, warn};
use std::cmp::Ordering;
use std::fmt;

use crate::error::Result;
use crate::tree::{Change, Coordinate};

/// What a scheduled operation does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum OpKind {
    #[display(fmt = "insert")]
    Insert,
    #[display(fmt = "delete")]
    Delete,
    #[display(fmt = "expand")]
    Expand,
    #[display(fmt = "collapse")]
    Collapse,
    #[display(fmt = "update")]
    Update,
    /// First half of a move: take the node out
    #[display(fmt = "detach")]
    Detach,
    /// Second half of a move: put the node back
    #[display(fmt = "attach")]
    Attach,
}

/// Ordering group of an operation; groups run in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpClass {
    Destructive,
    Constructive,
    Neutral,
}

impl OpKind {
    pub fn class(self) -> OpClass {
        match self {
            OpKind::Delete | OpKind::Collapse | OpKind::Detach => OpClass::Destructive,
            OpKind::Insert | OpKind::Expand | OpKind::Attach => OpClass::Constructive,
            OpKind::Update => OpClass::Neutral,
        }
    }
}

type Apply<C> = Box<dyn FnOnce(&mut C) -> Result<Vec<Change>> + Send + Sync>;

/// An operation waiting for its batch to commit
pub struct PendingOp<C> {
    pub kind: OpKind,
    /// Coordinate the operation was expected to affect when scheduled
    pub coordinate: Coordinate,
    apply: Apply<C>,
}

impl<C> PendingOp<C> {
    pub fn new<F>(kind: OpKind, coordinate: Coordinate, apply: F) -> Self
    where
        F: FnOnce(&mut C) -> Result<Vec<Change>> + Send + Sync + 'static,
    {
        Self {
            kind,
            coordinate,
            apply: Box::new(apply),
        }
    }

    fn run(self, context: &mut C) -> Vec<Change> {
        let (kind, coordinate) = (self.kind, self.coordinate);
        match (self.apply)(context) {
            Ok(changes) => changes,
            Err(e) => {
                warn!("Skipping {kind} at {coordinate}: {e}");
                Vec::new()
            }
        }
    }
}

impl<C> fmt::Debug for PendingOp<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingOp")
            .field("kind", &self.kind)
            .field("coordinate", &self.coordinate)
            .finish_non_exhaustive()
    }
}

/// Commit order of two pending operations
///
/// A detach sorts after any other destructive operation at the same
/// coordinate, so deleting a node that is also being moved always wins.
fn commit_order<C>(a: &PendingOp<C>, b: &PendingOp<C>) -> Ordering {
    let class = a.kind.class();
    class.cmp(&b.kind.class()).then_with(|| match class {
        OpClass::Destructive => b
            .coordinate
            .cmp(&a.coordinate)
            .then_with(|| (a.kind == OpKind::Detach).cmp(&(b.kind == OpKind::Detach))),
        OpClass::Constructive => a.coordinate.cmp(&b.coordinate),
        OpClass::Neutral => Ordering::Equal,
    })
}

/// Nestable batch window over a mutable context `C`
///
/// The scheduler never fails: an operation whose apply step errors at
/// commit time is logged and skipped.
pub struct BatchScheduler<C> {
    depth: usize,
    pending: Vec<PendingOp<C>>,
}

impl<C> Default for BatchScheduler<C> {
    fn default() -> Self {
        Self {
            depth: 0,
            pending: Vec::new(),
        }
    }
}

impl<C> BatchScheduler<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a batch; the outermost call clears any stale pending operations
    pub fn begin(&mut self) {
        if self.depth == 0 {
            self.pending.clear();
            debug!("Batch opened");
        }
        self.depth += 1;
        trace!("Batch depth {}", self.depth);
    }

    /// Close a batch
    ///
    /// Closing the outermost batch commits every pending operation and
    /// returns the combined change-set. Inner closes return `None`.
    pub fn end(&mut self, context: &mut C) -> Option<Vec<Change>> {
        let Some(depth) = self.depth.checked_sub(1) else {
            warn!("end_batch called without a matching begin_batch");
            return None;
        };
        self.depth = depth;
        if depth > 0 {
            trace!("Batch depth {depth}");
            return None;
        }

        let mut ops = std::mem::take(&mut self.pending);
        ops.sort_by(commit_order);
        debug!("Committing batch of {} operations", ops.len());

        let mut changes = Vec::new();
        for op in ops {
            trace!("Applying {} at {}", op.kind, op.coordinate);
            changes.extend(op.run(context));
        }
        Some(changes)
    }

    /// Queue an operation, or run it right away when no batch is open
    ///
    /// Returns the changes when the operation ran, `None` when it was queued.
    pub fn schedule(&mut self, op: PendingOp<C>, context: &mut C) -> Option<Vec<Change>> {
        if self.is_batching() {
            trace!("Queued {} at {}", op.kind, op.coordinate);
            self.pending.push(op);
            None
        } else {
            Some(op.run(context))
        }
    }

    pub fn is_batching(&self) -> bool {
        self.depth > 0
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pending operations in scheduling order
    pub fn pending(&self) -> impl Iterator<Item = (OpKind, Coordinate)> + '_ {
        self.pending.iter().map(|op| (op.kind, op.coordinate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TreeError;
    use crate::tree::NodeId;
    use pretty_assertions::assert_eq;

    // The context records the label of every applied operation
    type Log = Vec<String>;

    fn op(kind: OpKind, row: usize) -> PendingOp<Log> {
        PendingOp::new(kind, Coordinate::new(0, row), move |log: &mut Log| {
            log.push(format!("{kind}@{row}"));
            Ok(Vec::new())
        })
    }

    #[test]
    fn test_runs_immediately_when_idle() {
        let mut scheduler = BatchScheduler::new();
        let mut log = Log::new();

        assert_eq!(scheduler.schedule(op(OpKind::Insert, 1), &mut log), Some(vec![]));
        assert_eq!(log, vec!["insert@1"]);
        assert_eq!(scheduler.pending_len(), 0);
    }

    #[test]
    fn test_commit_order() {
        let mut scheduler = BatchScheduler::new();
        let mut log = Log::new();

        scheduler.begin();
        for (kind, row) in [
            (OpKind::Delete, 5),
            (OpKind::Insert, 2),
            (OpKind::Delete, 2),
            (OpKind::Insert, 6),
        ] {
            assert_eq!(scheduler.schedule(op(kind, row), &mut log), None);
        }
        assert!(log.is_empty());

        assert_eq!(scheduler.end(&mut log), Some(vec![]));
        assert_eq!(log, vec!["delete@5", "delete@2", "insert@2", "insert@6"]);
    }

    #[test]
    fn test_detach_yields_to_delete_at_same_coordinate() {
        let mut scheduler = BatchScheduler::new();
        let mut log = Log::new();

        scheduler.begin();
        for (kind, row) in [
            (OpKind::Detach, 3),
            (OpKind::Attach, 0),
            (OpKind::Delete, 3),
            (OpKind::Collapse, 1),
        ] {
            scheduler.schedule(op(kind, row), &mut log);
        }
        scheduler.end(&mut log);

        assert_eq!(log, vec!["delete@3", "detach@3", "collapse@1", "attach@0"]);
    }

    #[test]
    fn test_neutral_ops_keep_schedule_order() {
        let mut scheduler = BatchScheduler::new();
        let mut log = Log::new();

        scheduler.begin();
        for (kind, row) in [
            (OpKind::Update, 9),
            (OpKind::Expand, 4),
            (OpKind::Update, 1),
            (OpKind::Collapse, 3),
            (OpKind::Detach, 7),
            (OpKind::Attach, 0),
        ] {
            scheduler.schedule(op(kind, row), &mut log);
        }
        scheduler.end(&mut log);

        assert_eq!(
            log,
            vec!["detach@7", "collapse@3", "attach@0", "expand@4", "update@9", "update@1"]
        );
    }

    #[test]
    fn test_nested_batches_commit_once() {
        let mut scheduler = BatchScheduler::new();
        let mut log = Log::new();

        scheduler.begin();
        scheduler.schedule(op(OpKind::Insert, 0), &mut log);
        scheduler.begin();
        scheduler.schedule(op(OpKind::Insert, 1), &mut log);
        assert_eq!(scheduler.depth(), 2);

        assert_eq!(scheduler.end(&mut log), None);
        assert!(log.is_empty());
        assert_eq!(scheduler.end(&mut log), Some(vec![]));
        assert_eq!(log, vec!["insert@0", "insert@1"]);
        assert!(!scheduler.is_batching());
    }

    #[test]
    fn test_unbalanced_end_is_ignored() {
        let mut scheduler: BatchScheduler<Log> = BatchScheduler::new();
        let mut log = Log::new();
        assert_eq!(scheduler.end(&mut log), None);
        assert_eq!(scheduler.depth(), 0);
    }

    #[test]
    fn test_failed_op_is_skipped() {
        let mut scheduler = BatchScheduler::new();
        let mut log = Log::new();

        scheduler.begin();
        scheduler.schedule(
            PendingOp::new(OpKind::Delete, Coordinate::new(0, 3), |_: &mut Log| {
                Err(TreeError::NotFound(NodeId::new("gone")))
            }),
            &mut log,
        );
        scheduler.schedule(op(OpKind::Delete, 1), &mut log);
        scheduler.end(&mut log);

        assert_eq!(log, vec!["delete@1"]);
    }

    #[test]
    fn test_begin_clears_stale_pending() {
        let mut scheduler = BatchScheduler::new();
        let mut log = Log::new();

        scheduler.begin();
        scheduler.schedule(op(OpKind::Insert, 0), &mut log);
        assert_eq!(
            scheduler.pending().collect::<Vec<_>>(),
            vec![(OpKind::Insert, Coordinate::new(0, 0))]
        );
        scheduler.end(&mut log);

        scheduler.begin();
        assert_eq!(scheduler.pending_len(), 0);
    }
}
