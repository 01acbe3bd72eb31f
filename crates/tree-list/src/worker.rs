//! Background mutation queue
//!
//! A single worker thread owns every structural edit. Callers on any thread
//! submit jobs through a channel; the worker applies them one at a time
//! under the write lock. Readers take the read lock only long enough to
//! copy data out.
//!
//! Completion callbacks never run on the worker. They are queued and run by
//! whichever thread calls [`TreeWorker::poll_completions`], normally the
//! presentation thread once per frame.

use anyhow::Context;
use log::{debug, info, trace, warn};
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::Result;
use crate::list::TreeList;
use crate::tree::{
    affected_coordinates, Change, Coordinate, InsertMode, Node, NodeId, NodeSnapshot,
    SourceAdapter,
};

type Job<S> = Box<dyn FnOnce(&mut TreeList<S>) + Send>;
type Completion = Box<dyn FnOnce() + Send>;

/// Affected coordinates of an applied edit, or `None` to fully reload
pub type Outcome = Result<Option<Vec<Coordinate>>>;

fn outcome(result: Result<Option<Vec<Change>>>) -> Outcome {
    // A queued edit (open batch) has no coordinates yet: reload
    result.map(|changes| changes.and_then(|changes| affected_coordinates(&changes)))
}

/// Serial worker thread applying edits to a shared [`TreeList`]
pub struct TreeWorker<S: SourceAdapter> {
    list: Arc<RwLock<TreeList<S>>>,
    jobs: Option<flume::Sender<Job<S>>>,
    completions_tx: flume::Sender<Completion>,
    completions: flume::Receiver<Completion>,
    handle: Option<JoinHandle<()>>,
}

impl<S> TreeWorker<S>
where
    S: SourceAdapter + Send + Sync + 'static,
    S::Payload: Send + Sync + 'static,
{
    /// Start the worker thread, named after `options().worker_name`
    pub fn spawn(list: TreeList<S>) -> anyhow::Result<Self> {
        let name = list.store().options().worker_name.clone();
        let list = Arc::new(RwLock::new(list));
        let (jobs, queue) = flume::unbounded::<Job<S>>();
        let (completions_tx, completions) = flume::unbounded();

        let shared = list.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                info!("Tree worker started");
                for job in queue.iter() {
                    let mut list = shared.write();
                    job(&mut *list);
                }
                info!("Tree worker stopped");
            })
            .with_context(|| format!("Failed to spawn worker thread {name}"))?;

        Ok(Self {
            list,
            jobs: Some(jobs),
            completions_tx,
            completions,
            handle: Some(handle),
        })
    }

    fn submit(&self, job: Job<S>) {
        match &self.jobs {
            Some(jobs) if jobs.send(job).is_ok() => {}
            _ => warn!("Tree worker is gone; job dropped"),
        }
    }

    /// Run `job` on the worker and hand its result to `callback` on the
    /// thread that next polls completions
    pub fn apply_async<R, F, C>(&self, job: F, callback: C)
    where
        R: Send + 'static,
        F: FnOnce(&mut TreeList<S>) -> R + Send + 'static,
        C: FnOnce(R) + Send + 'static,
    {
        let completions = self.completions_tx.clone();
        self.submit(Box::new(move |list| {
            let result = job(list);
            let _ = completions.send(Box::new(move || callback(result)));
        }));
    }

    pub fn insert_async(
        &self,
        node: Node<S::Payload>,
        parent: Option<NodeId>,
        root: Option<usize>,
        mode: InsertMode,
        callback: impl FnOnce(Outcome) + Send + 'static,
    ) {
        trace!("Queueing insert of {}", node.id);
        self.apply_async(
            move |list| outcome(list.insert(node, parent.as_ref(), root, mode)),
            callback,
        );
    }

    pub fn delete_async(
        &self,
        id: NodeId,
        root: Option<usize>,
        callback: impl FnOnce(Outcome) + Send + 'static,
    ) {
        trace!("Queueing delete of {id}");
        self.apply_async(move |list| outcome(list.delete(&id, root)), callback);
    }

    /// Rebuild from the source; the callback always receives `None`
    pub fn reload_async(&self, callback: impl FnOnce(Outcome) + Send + 'static) {
        self.apply_async(
            |list| {
                list.reload();
                Ok(None)
            },
            callback,
        );
    }

    /// Run every queued completion callback on the calling thread
    ///
    /// Returns how many ran.
    pub fn poll_completions(&self) -> usize {
        let mut count = 0;
        while let Ok(completion) = self.completions.try_recv() {
            completion();
            count += 1;
        }
        if count > 0 {
            debug!("Ran {count} completion callbacks");
        }
        count
    }

    /// Block until every job submitted so far has been applied
    pub fn flush(&self) {
        let (done, wait) = flume::bounded(1);
        self.submit(Box::new(move |_| {
            let _ = done.send(());
        }));
        let _ = wait.recv();
    }

    /// Read the list under the read lock
    pub fn read<R>(&self, f: impl FnOnce(&TreeList<S>) -> R) -> R {
        f(&*self.list.read())
    }

    pub fn visible_row_count(&self, root: usize) -> usize {
        self.read(|list| list.visible_row_count(root))
    }

    /// Identities of a node's children, copied out
    pub fn children(&self, id: &NodeId) -> Vec<NodeId> {
        self.read(|list| list.store().children(id).cloned().collect())
    }
}

impl<S> TreeWorker<S>
where
    S: SourceAdapter + Send + Sync + 'static,
    S::Payload: Clone + Send + Sync + 'static,
{
    /// Owned copy of the node at `coordinate`
    pub fn snapshot_at(&self, coordinate: Coordinate) -> Option<NodeSnapshot<S::Payload>> {
        self.read(|list| list.node_at(coordinate).map(|node| node.to_snapshot()))
    }
}

impl<S: SourceAdapter> TreeWorker<S> {
    /// Stop accepting jobs, finish the queued ones and join the thread
    pub fn shutdown(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Tree worker panicked");
            }
        }
    }
}

impl<S: SourceAdapter> Drop for TreeWorker<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
