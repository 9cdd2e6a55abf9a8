//! Core trait for direct-style asynchronous functions.
//!
//! A [`Governed`] function is called once per pass: first when it is
//! launched, then again every time the operation it is parked on completes.
//! Locals do not survive a suspension; state that must outlive one lives in
//! the captured arguments `A`, which the frame keeps between passes.
//!
//! # Examples
//!
//! ```rust
//! use await_context::prelude::*;
//!
//! // A body with no suspension finishes on its first pass.
//! let body = |n: &mut u32, ctx: AwaitContext<InlineExecutor>| -> Resumption<u32> {
//!     reenter!(co = ctx; {
//!         0 => { Ok(Step::Complete(*n * 2)) }
//!     })
//! };
//!
//! let step = Launcher::on(&InlineExecutor::new(), body).call(21).unwrap();
//! assert_eq!(step.unwrap_complete(), 42);
//! ```

use crate::Resumption;
use crate::compose::{Chain, chain};
use crate::context::AwaitContext;
use crate::executor::Executor;

/// A function written in direct style against an [`AwaitContext`].
///
/// Each call to `resume` either parks the body at a suspension point or
/// finishes it with `Output`. Blanket-implemented for closures of shape
/// `FnMut(&mut A, AwaitContext<E>) -> Resumption<R>`.
pub trait Governed<E, A>: Send + 'static {
    /// Final value of the body
    type Output;

    /// Runs the body from its current resumption position.
    fn resume(&mut self, args: &mut A, ctx: AwaitContext<E>) -> Resumption<Self::Output>;

    /// The executor this function wants to run on, if it declares one.
    fn associated_executor(&self) -> Option<E> {
        None
    }

    /// Runs `follow` with the final value once the body finishes.
    ///
    /// ```rust
    /// use await_context::prelude::*;
    /// use std::sync::{Arc, Mutex};
    ///
    /// let seen = Arc::new(Mutex::new(None));
    /// let body = |n: &mut u8, ctx: AwaitContext<InlineExecutor>| -> Resumption<u8> {
    ///     reenter!(co = ctx; { 0 => { Ok(Step::Complete(*n + 1)) } })
    /// };
    /// let chained = {
    ///     let seen = seen.clone();
    ///     body.then(move |v| *seen.lock().unwrap() = Some(v))
    /// };
    ///
    /// Launcher::on(&InlineExecutor::new(), chained).call(1).unwrap();
    /// assert_eq!(*seen.lock().unwrap(), Some(2));
    /// ```
    fn then<C>(self, follow: C) -> Chain<Self, C>
    where
        Self: Sized,
        C: FnOnce(Self::Output) + Send + 'static,
    {
        chain(self, follow)
    }

    fn boxed(self) -> Box<dyn Governed<E, A, Output = Self::Output>>
    where
        Self: Sized,
    {
        Box::new(self)
    }
}

impl<E, A, R, F> Governed<E, A> for F
where
    E: Executor,
    F: FnMut(&mut A, AwaitContext<E>) -> Resumption<R> + Send + 'static,
{
    type Output = R;

    fn resume(&mut self, args: &mut A, ctx: AwaitContext<E>) -> Resumption<R> {
        self(args, ctx)
    }
}

impl<E, A, R> Governed<E, A> for Box<dyn Governed<E, A, Output = R>>
where
    E: 'static,
    A: 'static,
    R: 'static,
{
    type Output = R;

    fn resume(&mut self, args: &mut A, ctx: AwaitContext<E>) -> Resumption<R> {
        (**self).resume(args, ctx)
    }

    fn associated_executor(&self) -> Option<E> {
        (**self).associated_executor()
    }
}

/// Picks one of two bodies up front; the choice holds for every pass.
impl<E, A, L, R> Governed<E, A> for either::Either<L, R>
where
    L: Governed<E, A>,
    R: Governed<E, A, Output = L::Output>,
{
    type Output = L::Output;

    fn resume(&mut self, args: &mut A, ctx: AwaitContext<E>) -> Resumption<Self::Output> {
        match self {
            either::Either::Left(l) => l.resume(args, ctx),
            either::Either::Right(r) => r.resume(args, ctx),
        }
    }

    fn associated_executor(&self) -> Option<E> {
        match self {
            either::Either::Left(l) => l.associated_executor(),
            either::Either::Right(r) => r.associated_executor(),
        }
    }
}
