//! Context handles, completion tokens, and the handler that resumes a frame.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::coroutine::Reenter;
use crate::error::{Error, ErrorSlot, Result};
use crate::executor::{ContextId, Executor, Task};
use crate::frame::Resume;
use crate::outcome::{Arity, Lead, Signature};

/// Receives the completion of an asynchronous operation.
///
/// The returned `Result` carries failures raised while handling the
/// completion (for an [`AwaitHandler`], by the resumed body) back to whoever
/// ran it, usually an executor task.
pub trait CompletionHandler<S: Signature>: Send + 'static {
    fn complete(self, args: S::Args) -> Result<()>;
}

impl<S, F> CompletionHandler<S> for F
where
    S: Signature,
    F: FnOnce(S::Args) + Send + 'static,
{
    fn complete(self, args: S::Args) -> Result<()> {
        self(args);
        Ok(())
    }
}

impl<S, L, R> CompletionHandler<S> for either::Either<L, R>
where
    S: Signature,
    L: CompletionHandler<S>,
    R: CompletionHandler<S>,
{
    fn complete(self, args: S::Args) -> Result<()> {
        match self {
            either::Either::Left(l) => l.complete(args),
            either::Either::Right(r) => r.complete(args),
        }
    }
}

/// What an asynchronous initiation accepts as its trailing argument.
///
/// The token is turned into the handler that will receive the completion,
/// plus the value the initiating call itself returns.
pub trait CompletionToken<S: Signature> {
    type Handler: CompletionHandler<S>;
    type Output;

    fn into_completion(self) -> (Self::Handler, Self::Output);
}

impl<S, F> CompletionToken<S> for F
where
    S: Signature,
    F: FnOnce(S::Args) + Send + 'static,
{
    type Handler = F;
    type Output = ();

    fn into_completion(self) -> (F, ()) {
        (self, ())
    }
}

/// Zero-sized marker returned by an initiation given an [`AwaitContext`].
///
/// It names the outcome type the body will read back once resumed; it has
/// no runtime content.
pub struct Awaitable<T>(PhantomData<fn() -> T>);

impl<T> Awaitable<T> {
    pub(crate) fn new() -> Self {
        Awaitable(PhantomData)
    }
}

impl<T> fmt::Debug for Awaitable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Awaitable<{}>", std::any::type_name::<T>())
    }
}

/// Handle passed to every pass of a governed body.
///
/// It references the body's frame and the executor driving it. Passing a
/// clone as the completion token of an asynchronous operation parks the
/// frame until that operation completes.
pub struct AwaitContext<E> {
    executor: E,
    frame: Arc<dyn Resume>,
    redirect: Option<ErrorSlot>,
}

impl<E: Executor> AwaitContext<E> {
    pub(crate) fn new(executor: E, frame: Arc<dyn Resume>) -> Self {
        AwaitContext {
            executor,
            frame,
            redirect: None,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Opens the jump table for this pass. Used by
    /// [`reenter!`](crate::reenter).
    pub fn reenter(&self) -> Reenter<'_> {
        self.frame.state().reenter()
    }

    /// The frame's current resumption position.
    pub fn position(&self) -> i32 {
        self.frame.state().position()
    }

    /// Returns `true` once the frame reached its terminal state.
    pub fn is_complete(&self) -> bool {
        self.frame.state().is_complete()
    }

    /// A copy of this context that, for the next suspension only, writes a
    /// failing error code into `slot` instead of raising it.
    pub fn redirect(&self, slot: &ErrorSlot) -> Self {
        AwaitContext {
            executor: self.executor.clone(),
            frame: Arc::clone(&self.frame),
            redirect: Some(slot.clone()),
        }
    }

    pub(crate) fn finish(&self) {
        self.frame.state().terminate();
    }
}

impl<E: Executor> Clone for AwaitContext<E> {
    fn clone(&self) -> Self {
        AwaitContext {
            executor: self.executor.clone(),
            frame: Arc::clone(&self.frame),
            redirect: self.redirect.clone(),
        }
    }
}

impl<E: Executor> fmt::Debug for AwaitContext<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwaitContext")
            .field("context", &self.executor.context_id())
            .field("position", &self.position())
            .field("redirect", &self.redirect.is_some())
            .finish()
    }
}

impl<E: Executor, S: Signature> CompletionToken<S> for AwaitContext<E> {
    type Handler = AwaitHandler<E, S>;
    type Output = Awaitable<S::Outcome>;

    fn into_completion(self) -> (AwaitHandler<E, S>, Awaitable<S::Outcome>) {
        let state = self.frame.state();
        state.clear_outcome();
        state.install_redirect(self.redirect);
        let handler = AwaitHandler {
            executor: self.executor,
            frame: self.frame,
            _signature: PhantomData,
        };
        (handler, Awaitable::new())
    }
}

/// Completion handler that stores an operation's outcome into its frame and
/// resumes the frame's body.
pub struct AwaitHandler<E, S> {
    executor: E,
    frame: Arc<dyn Resume>,
    _signature: PhantomData<fn() -> S>,
}

impl<E: Executor, S> AwaitHandler<E, S> {
    /// The executor of the frame this handler resumes.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// An executor for the work an operation schedules before completing.
    ///
    /// Tasks run through it on the frame's executor. A task that fails does
    /// not surface from the executor's run call; its failure is raised in the
    /// body when this handler resumes it.
    pub fn work_executor(&self) -> FrameExecutor<E> {
        FrameExecutor {
            executor: self.executor.clone(),
            frame: Arc::clone(&self.frame),
        }
    }
}

/// The executor returned by [`AwaitHandler::work_executor`].
///
/// Failures of its tasks go to the awaiting frame. They only reach the
/// underlying executor when the frame already holds a failure or has
/// finished.
pub struct FrameExecutor<E> {
    executor: E,
    frame: Arc<dyn Resume>,
}

impl<E: Executor> FrameExecutor<E> {
    fn wrap(&self, task: Task) -> Task {
        let frame = Arc::clone(&self.frame);
        Box::new(move || match task() {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::debug!(error = %err, "operation work failed");
                frame.state().offer_pending(err)
            }
        })
    }
}

impl<E: Executor> Clone for FrameExecutor<E> {
    fn clone(&self) -> Self {
        FrameExecutor {
            executor: self.executor.clone(),
            frame: Arc::clone(&self.frame),
        }
    }
}

impl<E: Executor> fmt::Debug for FrameExecutor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameExecutor")
            .field("context", &self.executor.context_id())
            .field("position", &self.frame.state().position())
            .finish()
    }
}

impl<E: Executor> Executor for FrameExecutor<E> {
    type Work = E::Work;

    fn make_work(&self) -> E::Work {
        self.executor.make_work()
    }

    fn post(&self, task: Task) {
        self.executor.post(self.wrap(task));
    }

    fn dispatch(&self, task: Task) {
        self.executor.dispatch(self.wrap(task));
    }

    fn context_id(&self) -> ContextId {
        self.executor.context_id()
    }
}

impl<E: Executor, S: Signature> CompletionHandler<S> for AwaitHandler<E, S> {
    fn complete(self, args: S::Args) -> Result<()> {
        let state = self.frame.state();
        let redirect = state.take_redirect();
        let (lead, outcome) = S::split(args);
        match lead {
            Lead::None => {}
            Lead::Code(code) => match redirect {
                Some(slot) => slot.set(code),
                None if code.is_err() => state.set_pending(Error::Operation(code)),
                None => {}
            },
            Lead::Error(Some(err)) => state.set_pending(err),
            Lead::Error(None) => {}
        }
        if S::ARITY != Arity::None {
            state.store_outcome(Box::new(outcome));
        }
        Arc::clone(&self.frame).resume()
    }
}
