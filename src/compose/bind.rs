use crate::Resumption;
use crate::context::{AwaitContext, CompletionHandler, CompletionToken};
use crate::error::Result;
use crate::executor::Executor;
use crate::governed::Governed;
use crate::outcome::Signature;

/// A handler or governed body tied to an executor.
///
/// As a completion handler, the wrapped handler's completion is dispatched
/// onto the bound executor instead of running wherever the operation
/// completed. As a governed body, the executor becomes its
/// [`associated_executor`](Governed::associated_executor), which
/// [`Launcher::new`](crate::Launcher::new) and
/// [`Launcher::with_fallback`](crate::Launcher::with_fallback) launch it on.
#[derive(Debug, Clone)]
pub struct Bound<E, X> {
    executor: E,
    inner: X,
}

/// Binds `inner` to `executor`.
///
/// ```rust
/// use await_context::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let scheduler = LoopScheduler::new();
/// let seen = Arc::new(Mutex::new(None));
///
/// // the operation completes inline, the handler still runs on the loop
/// let handler = {
///     let seen = seen.clone();
///     bind_executor(&scheduler.executor(), move |(n,): (u8,)| *seen.lock().unwrap() = Some(n))
/// };
/// post_with(&InlineExecutor::new(), || 9_u8, handler);
/// assert_eq!(*seen.lock().unwrap(), None);
///
/// scheduler.run().unwrap();
/// assert_eq!(*seen.lock().unwrap(), Some(9));
/// ```
pub fn bind_executor<E: Executor, X>(executor: &E, inner: X) -> Bound<E, X> {
    Bound {
        executor: executor.clone(),
        inner,
    }
}

impl<E, X> Bound<E, X> {
    pub fn executor(&self) -> &E {
        &self.executor
    }
}

impl<E, X, S> CompletionHandler<S> for Bound<E, X>
where
    E: Executor,
    S: Signature,
    X: CompletionHandler<S>,
{
    fn complete(self, args: S::Args) -> Result<()> {
        let Bound { executor, inner } = self;
        let work = executor.make_work();
        executor.dispatch(Box::new(move || {
            let _work = work;
            inner.complete(args)
        }));
        Ok(())
    }
}

impl<E, X, S> CompletionToken<S> for Bound<E, X>
where
    E: Executor,
    S: Signature,
    X: CompletionHandler<S>,
{
    type Handler = Self;
    type Output = ();

    fn into_completion(self) -> (Self, ()) {
        (self, ())
    }
}

impl<E, A, X> Governed<E, A> for Bound<E, X>
where
    E: Executor,
    X: Governed<E, A>,
{
    type Output = X::Output;

    fn resume(&mut self, args: &mut A, ctx: AwaitContext<E>) -> Resumption<X::Output> {
        self.inner.resume(args, ctx)
    }

    fn associated_executor(&self) -> Option<E> {
        Some(self.executor.clone())
    }
}
