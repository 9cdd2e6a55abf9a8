use crate::Resumption;
use crate::context::AwaitContext;
use crate::executor::Executor;
use crate::governed::Governed;
use crate::step::Step;

/// Runs a governed body, then hands its final value to a follow-up action.
///
/// Created with [`chain`] or [`Governed::then`]. The follow-up fires exactly
/// once, on the pass where the body reaches its end. A failure raised by the
/// body propagates unchanged and the follow-up never runs. The chain is a
/// governed function itself, finishing with `()`.
pub struct Chain<F, C> {
    func: F,
    follow: Option<C>,
}

/// Chains `follow` after `func`.
///
/// ```rust
/// use await_context::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let scheduler = LoopScheduler::new();
/// let ex = scheduler.executor();
/// let log = Arc::new(Mutex::new(Vec::new()));
///
/// let fetch = {
///     let (ex, log) = (ex.clone(), log.clone());
///     move |_: &mut (), ctx: AwaitContext<LoopExecutor>| -> Resumption<&'static str> {
///         reenter!(co = ctx; {
///             0 => { suspend!(co, 1, post_with(&ex, || "fetched", ctx.clone())); }
///             1 => {
///                 log.lock().unwrap().push("x done");
///                 Ok(Step::Complete(co.outcome::<&'static str>()?))
///             }
///         })
///     }
/// };
/// let report = {
///     let log = log.clone();
///     move |v: &'static str| log.lock().unwrap().push(v)
/// };
///
/// Launcher::on(&ex, chain(fetch, report)).call(()).unwrap();
/// assert!(log.lock().unwrap().is_empty());
///
/// scheduler.run().unwrap();
/// assert_eq!(*log.lock().unwrap(), vec!["x done", "fetched"]);
/// ```
pub fn chain<F, C>(func: F, follow: C) -> Chain<F, C> {
    Chain {
        func,
        follow: Some(follow),
    }
}

impl<E, A, F, C> Governed<E, A> for Chain<F, C>
where
    E: Executor,
    F: Governed<E, A>,
    C: FnOnce(F::Output) + Send + 'static,
{
    type Output = ();

    fn resume(&mut self, args: &mut A, ctx: AwaitContext<E>) -> Resumption<()> {
        match self.func.resume(args, ctx.clone())? {
            Step::Yielded(at) => Ok(Step::Yielded(at)),
            Step::Complete(value) => {
                // bodies that never opened a reenter block still end here
                ctx.finish();
                debug_assert!(ctx.is_complete());
                match self.follow.take() {
                    Some(follow) => follow(value),
                    None => tracing::warn!("chained body finished twice"),
                }
                Ok(Step::Complete(()))
            }
        }
    }

    fn associated_executor(&self) -> Option<E> {
        self.func.associated_executor()
    }
}
