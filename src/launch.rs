//! Starting governed bodies.
//!
//! A [`Launcher`] pairs a governed function with the executor it will be
//! resumed on, and holds that executor's work token until it is called. The
//! call allocates the frame, hands the token over to it, and runs the first
//! pass before returning.

use std::fmt;

use crate::Resumption;
use crate::context::{CompletionHandler, CompletionToken};
use crate::error::Result;
use crate::executor::Executor;
use crate::frame::Frame;
use crate::governed::Governed;
use crate::outcome::Signature;

/// A governed function ready to be started.
///
/// # Examples
///
/// ```rust
/// use await_context::prelude::*;
///
/// let scheduler = LoopScheduler::new();
/// let ex = scheduler.executor();
///
/// let body = {
///     let ex = ex.clone();
///     move |n: &mut u32, ctx: AwaitContext<LoopExecutor>| -> Resumption<u32> {
///         reenter!(co = ctx; {
///             0 => { suspend!(co, 1, post_with(&ex, { let n = *n; move || n + 1 }, ctx.clone())); }
///             1 => { Ok(Step::Complete(co.outcome::<u32>()?)) }
///         })
///     }
/// };
///
/// let launcher = Launcher::on(&ex, body);
/// assert_eq!(scheduler.outstanding_work(), 1);
///
/// let first = launcher.call(1).unwrap();
/// assert_eq!(first, Step::Yielded(Suspended::at(1)));
///
/// scheduler.run().unwrap();
/// assert_eq!(scheduler.outstanding_work(), 0);
/// ```
pub struct Launcher<E: Executor, F> {
    executor: E,
    work: E::Work,
    func: F,
}

impl<E: Executor, F> Launcher<E, F> {
    /// Launches `func` on `executor`.
    pub fn on(executor: &E, func: F) -> Self {
        Launcher {
            executor: executor.clone(),
            work: executor.make_work(),
            func,
        }
    }

    /// Launches `func` on the executor it declares through
    /// [`Governed::associated_executor`], or on `E::default()` if it
    /// declares none.
    pub fn new<A>(func: F) -> Self
    where
        E: Default,
        F: Governed<E, A>,
    {
        let executor = func.associated_executor().unwrap_or_default();
        let work = executor.make_work();
        Launcher {
            executor,
            work,
            func,
        }
    }

    /// Launches `func` on the executor it declares, or on `fallback`.
    pub fn with_fallback<A>(fallback: &E, func: F) -> Self
    where
        F: Governed<E, A>,
    {
        match func.associated_executor() {
            Some(executor) => Launcher::on(&executor, func),
            None => Launcher::on(fallback, func),
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Creates the frame with `args` as its captured state and runs the
    /// first pass.
    pub fn call<A>(self, args: A) -> Resumption<F::Output>
    where
        F: Governed<E, A>,
        A: Send + 'static,
    {
        let Launcher {
            executor,
            work,
            func,
        } = self;
        Frame::new(executor, work, func, args).drive()
    }
}

impl<E: Executor, F> fmt::Debug for Launcher<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Launcher")
            .field("context", &self.executor.context_id())
            .field("body", &std::any::type_name::<F>())
            .finish()
    }
}

/// A launcher completes an operation by starting its body with the
/// operation's arguments. A failure raised by the first pass is returned.
impl<E, F, S> CompletionHandler<S> for Launcher<E, F>
where
    E: Executor,
    S: Signature,
    F: Governed<E, S::Args>,
{
    fn complete(self, args: S::Args) -> Result<()> {
        self.call(args).map(|_| ())
    }
}

impl<E, F, S> CompletionToken<S> for Launcher<E, F>
where
    E: Executor,
    S: Signature,
    F: Governed<E, S::Args>,
{
    type Handler = Self;
    type Output = ();

    fn into_completion(self) -> (Self, ()) {
        (self, ())
    }
}
