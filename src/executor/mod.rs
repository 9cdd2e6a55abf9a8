//! Executors driving completions and resumptions
//!
//! The core only needs three things from an executor: a work token that keeps
//! its run loop alive while a frame is outstanding, a way to schedule a task,
//! and an identity for the execution context behind it.

mod config;
mod inline;
mod scheduler;

use std::fmt;
use std::sync::Arc;

use crate::error::Result;

pub use config::SchedulerConfig;
pub use inline::{InlineExecutor, InlineWork};
pub use scheduler::{LoopExecutor, LoopScheduler, LoopWork};

/// A unit of work scheduled on an executor. Failures are surfaced by the
/// executor's run call.
pub type Task = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

/// Identity of the execution context an executor routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(usize);

impl ContextId {
    /// The identity of the context owned through `inner`.
    pub fn of<T: ?Sized>(inner: &Arc<T>) -> Self {
        ContextId(Arc::as_ptr(inner) as *const () as usize)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{:x}", self.0)
    }
}

pub trait Executor: Clone + Send + Sync + 'static {
    /// Keeps the executor's run loop alive while held.
    type Work: Clone + Send + Sync + 'static;

    fn make_work(&self) -> Self::Work;

    /// Schedules `task` to run later; never runs it inline.
    fn post(&self, task: Task);

    /// Runs `task` inline if the caller is already inside this executor,
    /// otherwise behaves like [`Executor::post`].
    fn dispatch(&self, task: Task);

    fn context_id(&self) -> ContextId;

    /// Returns `true` if both executors route to the same context.
    fn same_context<O: Executor>(&self, other: &O) -> bool {
        self.context_id() == other.context_id()
    }
}
