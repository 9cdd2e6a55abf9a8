use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::{ContextId, Executor, Task};
use crate::error::Error;

#[derive(Debug, Default)]
struct InlineContext {
    work: AtomicUsize,
    errors: Mutex<Vec<Error>>,
}

/// Executor that runs every task immediately on the calling thread.
///
/// Completions delivered through it resume their frame before the initiating
/// call returns. Task failures have no run loop to surface through, so they
/// are logged and kept until [`InlineExecutor::take_errors`]. Nothing drains
/// them otherwise: an executor that keeps failing keeps growing its record
/// until the owner takes it.
#[derive(Debug, Clone, Default)]
pub struct InlineExecutor {
    inner: Arc<InlineContext>,
}

impl InlineExecutor {
    /// An executor with its own context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Work tokens currently alive for this context.
    pub fn outstanding_work(&self) -> usize {
        self.inner.work.load(Ordering::Acquire)
    }

    /// Drains the failures recorded from tasks run so far, oldest first.
    /// Clones share one record.
    pub fn take_errors(&self) -> Vec<Error> {
        std::mem::take(&mut *self.inner.errors.lock())
    }

    fn run(&self, task: Task) {
        if let Err(err) = task() {
            tracing::error!(error = %err, "inline task failed");
            self.inner.errors.lock().push(err);
        }
    }
}

/// Work token of an [`InlineExecutor`]. Clones share one count.
#[derive(Debug, Clone)]
pub struct InlineWork(#[allow(dead_code)] Arc<InlineWorkGuard>);

#[derive(Debug)]
struct InlineWorkGuard(Arc<InlineContext>);

impl Drop for InlineWorkGuard {
    fn drop(&mut self) {
        self.0.work.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Executor for InlineExecutor {
    type Work = InlineWork;

    fn make_work(&self) -> InlineWork {
        self.inner.work.fetch_add(1, Ordering::AcqRel);
        InlineWork(Arc::new(InlineWorkGuard(Arc::clone(&self.inner))))
    }

    fn post(&self, task: Task) {
        self.run(task);
    }

    fn dispatch(&self, task: Task) {
        self.run(task);
    }

    fn context_id(&self) -> ContextId {
        ContextId::of(&self.inner)
    }
}
