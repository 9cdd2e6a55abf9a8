use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Condvar, Mutex};

use super::{ContextId, Executor, SchedulerConfig, Task};
use crate::error::{Error, Result};

thread_local! {
    /// Contexts whose run loop is active on this thread, innermost last.
    static RUNNING: RefCell<Vec<ContextId>> = const { RefCell::new(Vec::new()) };
}

struct RunningGuard;

impl RunningGuard {
    fn enter(id: ContextId) -> Self {
        RUNNING.with(|running| running.borrow_mut().push(id));
        RunningGuard
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        RUNNING.with(|running| running.borrow_mut().pop());
    }
}

fn running_inside(id: ContextId) -> bool {
    RUNNING.with(|running| running.borrow().contains(&id))
}

#[derive(Default)]
struct LoopQueue {
    tasks: VecDeque<(Task, LoopWork)>,
    work: usize,
    stopped: bool,
    /// Failures not yet returned by a run call: inline dispatch failures,
    /// and worker failures beyond the first from `run_threads`.
    failed: VecDeque<Error>,
}

struct LoopContext {
    config: SchedulerConfig,
    queue: Mutex<LoopQueue>,
    ready: Condvar,
}

impl LoopContext {
    fn id(self: &Arc<Self>) -> ContextId {
        ContextId::of(self)
    }

    /// Runs at most one task. With `block`, waits for one while work is
    /// outstanding.
    fn run_one(&self, block: bool) -> Result<usize> {
        let (task, work) = {
            let mut queue = self.queue.lock();
            loop {
                if let Some(err) = queue.failed.pop_front() {
                    return Err(err);
                }
                if queue.stopped {
                    return Ok(0);
                }
                if let Some(item) = queue.tasks.pop_front() {
                    break item;
                }
                if queue.work == 0 || !block {
                    return Ok(0);
                }
                self.ready.wait(&mut queue);
            }
        };
        let result = task();
        drop(work);
        match result {
            // the task may have left inline dispatch failures behind
            Ok(()) => match self.queue.lock().failed.pop_front() {
                Some(err) => Err(err),
                None => Ok(1),
            },
            Err(err) => {
                tracing::debug!(error = %err, "task failed");
                Err(err)
            }
        }
    }

    fn defer_failures(&self, errors: impl DoubleEndedIterator<Item = Error>) {
        let mut queue = self.queue.lock();
        for err in errors.rev() {
            queue.failed.push_front(err);
        }
    }
}

/// A run-loop execution context.
///
/// Tasks posted through its [`LoopExecutor`] run when some thread calls
/// [`LoopScheduler::run`] (or one of its variants). `run` keeps going while
/// work is outstanding, so a frame parked on an operation holds the loop
/// open until the frame finishes.
///
/// ```rust
/// use await_context::{Executor, LoopScheduler};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let scheduler = LoopScheduler::new();
/// let ex = scheduler.executor();
/// let hits = Arc::new(AtomicUsize::new(0));
///
/// let counter = hits.clone();
/// ex.post(Box::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Ok(())
/// }));
///
/// assert_eq!(scheduler.run().unwrap(), 1);
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
pub struct LoopScheduler {
    inner: Arc<LoopContext>,
}

impl LoopScheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        LoopScheduler {
            inner: Arc::new(LoopContext {
                config,
                queue: Mutex::new(LoopQueue::default()),
                ready: Condvar::new(),
            }),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    pub fn executor(&self) -> LoopExecutor {
        LoopExecutor {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Runs tasks until stopped or until no work is left. Returns the number
    /// of tasks run, or the first failure a task surfaced.
    pub fn run(&self) -> Result<usize> {
        self.drain(true, usize::MAX)
    }

    /// Runs at most one task, waiting for it while work is outstanding.
    pub fn run_one(&self) -> Result<usize> {
        self.drain(true, 1)
    }

    /// Runs the tasks that are ready without waiting.
    pub fn poll(&self) -> Result<usize> {
        self.drain(false, usize::MAX)
    }

    fn drain(&self, block: bool, limit: usize) -> Result<usize> {
        let span = tracing::debug_span!("run", scheduler = %self.inner.config.name);
        let _span = span.enter();
        let _running = RunningGuard::enter(self.inner.id());
        let mut ran = 0;
        while ran < limit {
            match self.inner.run_one(block)? {
                0 => break,
                n => ran += n,
            }
        }
        tracing::trace!(ran, "run loop returned");
        Ok(ran)
    }

    /// Runs the loop on `threads` scoped worker threads and waits for all of
    /// them. Returns the total number of tasks run, or the first failure.
    ///
    /// Every worker stops at its own first failure. When several fail, the
    /// first is returned here and the rest are returned, in worker order, by
    /// the following run calls.
    pub fn run_threads(&self, threads: usize) -> Result<usize> {
        let results: Vec<Result<usize>> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..threads.max(1))
                .map(|_| scope.spawn(|| self.run()))
                .collect();
            workers
                .into_iter()
                .map(|worker| {
                    worker
                        .join()
                        .unwrap_or_else(|_| Err(Error::Panicked("loop worker".to_string())))
                })
                .collect()
        });
        let mut total = 0;
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(ran) => total += ran,
                Err(err) => errors.push(err),
            }
        }
        let mut errors = errors.into_iter();
        match errors.next() {
            None => Ok(total),
            Some(first) => {
                if errors.len() > 0 {
                    tracing::debug!(deferred = errors.len(), "several loop workers failed");
                    self.inner.defer_failures(errors);
                }
                Err(first)
            }
        }
    }

    /// [`run_threads`](Self::run_threads) with the configured thread count.
    pub fn run_pool(&self) -> Result<usize> {
        self.run_threads(self.inner.config.threads)
    }

    /// Makes every run call return as soon as possible. Queued tasks stay
    /// queued until [`restart`](Self::restart) and another run.
    pub fn stop(&self) {
        self.inner.queue.lock().stopped = true;
        self.inner.ready.notify_all();
    }

    pub fn stopped(&self) -> bool {
        self.inner.queue.lock().stopped
    }

    pub fn restart(&self) {
        self.inner.queue.lock().stopped = false;
    }

    /// Work tokens and queued tasks currently keeping the loop alive.
    pub fn outstanding_work(&self) -> usize {
        self.inner.queue.lock().work
    }
}

impl Default for LoopScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LoopScheduler {
    fn drop(&mut self) {
        // queued tasks may own frames that own executors of this context
        let abandoned = std::mem::take(&mut self.inner.queue.lock().tasks);
        if !abandoned.is_empty() {
            tracing::debug!(tasks = abandoned.len(), "dropping unrun tasks");
        }
        drop(abandoned);
    }
}

impl fmt::Debug for LoopScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopScheduler")
            .field("name", &self.inner.config.name)
            .field("context", &self.inner.id())
            .finish()
    }
}

/// Cloneable handle scheduling tasks on a [`LoopScheduler`].
#[derive(Clone)]
pub struct LoopExecutor {
    inner: Arc<LoopContext>,
}

impl fmt::Debug for LoopExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LoopExecutor").field(&self.inner.id()).finish()
    }
}

/// Work token of a [`LoopScheduler`]. Clones share one count.
#[derive(Clone)]
pub struct LoopWork(#[allow(dead_code)] Arc<LoopWorkGuard>);

struct LoopWorkGuard(Weak<LoopContext>);

impl Drop for LoopWorkGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.0.upgrade() {
            let mut queue = inner.queue.lock();
            queue.work -= 1;
            if queue.work == 0 {
                inner.ready.notify_all();
            }
        }
    }
}

impl Executor for LoopExecutor {
    type Work = LoopWork;

    fn make_work(&self) -> LoopWork {
        self.inner.queue.lock().work += 1;
        LoopWork(Arc::new(LoopWorkGuard(Arc::downgrade(&self.inner))))
    }

    fn post(&self, task: Task) {
        let work = self.make_work();
        self.inner.queue.lock().tasks.push_back((task, work));
        self.inner.ready.notify_one();
    }

    fn dispatch(&self, task: Task) {
        if !running_inside(self.inner.id()) {
            return self.post(task);
        }
        if let Err(err) = task() {
            tracing::debug!(error = %err, "inline task failed");
            self.inner.queue.lock().failed.push_back(err);
        }
    }

    fn context_id(&self) -> ContextId {
        self.inner.id()
    }
}
