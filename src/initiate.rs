//! Asynchronous operations built on an executor.
//!
//! Each helper schedules a closure on an executor and completes the given
//! completion token with the closure's result. With a plain closure as the
//! token they behave like callback APIs; with an
//! [`AwaitContext`](crate::AwaitContext) they return the
//! [`Awaitable`](crate::Awaitable) a governed body suspends on.
//!
//! The helpers hold a work token on the executor until the completion has
//! been delivered.

use crate::context::{CompletionHandler, CompletionToken};
use crate::error::{Error, ErrorCode};
use crate::executor::Executor;
use crate::outcome::{Plain, WithCode, WithError};

/// Runs `work` later on `executor` and completes `token` with its value.
///
/// ```rust
/// use await_context::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let scheduler = LoopScheduler::new();
/// let got = Arc::new(Mutex::new(0));
///
/// let sink = got.clone();
/// post_with(&scheduler.executor(), || 6 * 7, move |(v,): (i32,)| *sink.lock().unwrap() = v);
///
/// scheduler.run().unwrap();
/// assert_eq!(*got.lock().unwrap(), 42);
/// ```
pub fn post_with<E, W, R, T>(executor: &E, work: W, token: T) -> T::Output
where
    E: Executor,
    W: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
    T: CompletionToken<Plain<(R,)>>,
{
    let (handler, output) = token.into_completion();
    let guard = executor.make_work();
    executor.post(Box::new(move || {
        let _guard = guard;
        handler.complete((work(),))
    }));
    output
}

/// Like [`post_with`], but runs `work` inline when already inside
/// `executor`.
pub fn dispatch_with<E, W, R, T>(executor: &E, work: W, token: T) -> T::Output
where
    E: Executor,
    W: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
    T: CompletionToken<Plain<(R,)>>,
{
    let (handler, output) = token.into_completion();
    let guard = executor.make_work();
    executor.dispatch(Box::new(move || {
        let _guard = guard;
        handler.complete((work(),))
    }));
    output
}

/// Runs a fallible `work` on `executor` and completes `token` through the
/// error-code convention. A failed run completes with the code and
/// `R::default()`.
pub fn try_post_with<E, W, R, T>(executor: &E, work: W, token: T) -> T::Output
where
    E: Executor,
    W: FnOnce() -> Result<R, ErrorCode> + Send + 'static,
    R: Default + Send + 'static,
    T: CompletionToken<WithCode<(R,)>>,
{
    let (handler, output) = token.into_completion();
    let guard = executor.make_work();
    executor.post(Box::new(move || {
        let _guard = guard;
        let args = match work() {
            Ok(value) => (ErrorCode::success(), value),
            Err(code) => (code, R::default()),
        };
        handler.complete(args)
    }));
    output
}

/// Runs a fallible `work` on `executor` and completes `token` through the
/// error-indicator convention.
pub fn post_catching<E, W, R, T>(executor: &E, work: W, token: T) -> T::Output
where
    E: Executor,
    W: FnOnce() -> Result<R, Error> + Send + 'static,
    R: Default + Send + 'static,
    T: CompletionToken<WithError<(R,)>>,
{
    let (handler, output) = token.into_completion();
    let guard = executor.make_work();
    executor.post(Box::new(move || {
        let _guard = guard;
        let args = match work() {
            Ok(value) => (None, value),
            Err(err) => (Some(err), R::default()),
        };
        handler.complete(args)
    }));
    output
}
