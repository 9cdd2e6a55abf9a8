//! Resumption state and the re-entry protocol.
//!
//! A governed body is an ordinary function that is called again from the top
//! every time one of its suspensions completes. [`Coroutine`] remembers where
//! the body left off, and [`Reenter`] turns that position into a jump table:
//! the body matches on [`Reenter::position`], each arm being the code that
//! runs between two suspension points.
//!
//! The [`reenter!`](crate::reenter) and [`suspend!`](crate::suspend) macros
//! write that jump table:
//!
//! ```rust
//! use await_context::prelude::*;
//!
//! let scheduler = LoopScheduler::new();
//! let ex = scheduler.executor();
//!
//! let body = {
//!     let ex = ex.clone();
//!     move |total: &mut u32, ctx: AwaitContext<LoopExecutor>| -> Resumption<u32> {
//!         reenter!(co = ctx; {
//!             0 => {
//!                 suspend!(co, 1, post_with(&ex, || 40_u32, ctx.clone()));
//!             }
//!             1 => {
//!                 *total = co.outcome::<u32>()? + 2;
//!                 Ok(Step::Complete(*total))
//!             }
//!         })
//!     }
//! };
//!
//! let first = Launcher::on(&ex, body).call(0).unwrap();
//! assert!(first.is_yielded());
//! scheduler.run().unwrap();
//! ```

use std::any::{Any, type_name};

use crate::error::{Error, Result};
use crate::frame::FrameState;
use crate::step::{Step, Suspended};

/// Position of a suspended body: `0` before the first pass, a suspension
/// label while parked, [`Coroutine::TERMINAL`] once finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coroutine {
    value: i32,
}

impl Coroutine {
    pub const START: i32 = 0;
    pub const TERMINAL: i32 = -1;

    pub const fn new() -> Self {
        Coroutine { value: Self::START }
    }

    pub const fn position(&self) -> i32 {
        self.value
    }

    pub const fn is_complete(&self) -> bool {
        self.value == Self::TERMINAL
    }

    /// Moves to suspension `label`.
    ///
    /// Labels only ever increase within one frame; moving backwards, or out
    /// of the terminal state, is a bug in the governed body.
    pub(crate) fn advance(&mut self, label: i32) {
        debug_assert!(!self.is_complete(), "advanced a finished coroutine");
        debug_assert!(
            label > self.value,
            "suspension label {label} does not follow {}",
            self.value
        );
        self.value = label;
    }

    pub(crate) fn terminate(&mut self) {
        self.value = Self::TERMINAL;
    }
}

/// Scope guard for one pass through a governed body.
///
/// Created at the top of the body. Unless the pass ends by parking at a
/// suspension point ([`Reenter::enter`]), dropping the guard forces the
/// frame into its terminal state, whether the body returned normally,
/// returned early, or propagated an error with `?`.
pub struct Reenter<'a> {
    state: &'a FrameState,
    position: i32,
    modified: bool,
}

impl<'a> Reenter<'a> {
    pub(crate) fn new(state: &'a FrameState) -> Self {
        let position = state.position();
        Reenter {
            state,
            position,
            modified: false,
        }
    }

    /// The label this pass re-enters at, `0` on the first pass.
    pub fn position(&self) -> i32 {
        self.position
    }

    /// Returns the failure delivered by the completion that resumed this
    /// pass, consuming it.
    pub fn rethrow(&self) -> Result<()> {
        match self.state.take_pending() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Records `label` as the suspension this pass is about to park at.
    ///
    /// Must be called before the awaited operation is initiated, so that a
    /// completion racing the rest of this pass already sees the new label.
    pub fn enter(&mut self, label: i32) {
        self.state.advance(label);
        self.position = label;
        self.modified = true;
        tracing::trace!(label, "suspending");
    }

    /// The value to return from the body once the awaited operation has been
    /// initiated.
    pub fn suspended<T, R>(&self, awaitable: crate::Awaitable<T>) -> Result<Step<Suspended, R>> {
        let _ = awaitable;
        Ok(Step::Yielded(Suspended::at(self.position)))
    }

    /// Takes the value stored by the completion that resumed this pass.
    ///
    /// `T` must be the outcome type of the awaited operation's signature:
    /// `()` for no values, the value itself for one, a tuple for several.
    pub fn outcome<T: Any + Send>(&self) -> Result<T> {
        match self.state.take_outcome() {
            Some(stored) => stored.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
                tracing::warn!(expected = type_name::<T>(), "outcome type mismatch");
                Error::OutcomeMismatch {
                    expected: type_name::<T>(),
                }
            }),
            None => {
                // completions with no values store nothing
                let unit: Box<dyn Any> = Box::new(());
                unit.downcast::<T>()
                    .map(|boxed| *boxed)
                    .map_err(|_| Error::MissingOutcome)
            }
        }
    }

    /// The failure for a position no arm of the jump table handles.
    pub fn unknown_label(&self) -> Error {
        tracing::warn!(label = self.position, "no arm for suspension label");
        Error::UnknownLabel(self.position)
    }

    /// Takes a multi-value outcome and converts it into a named shape.
    ///
    /// ```rust
    /// use await_context::prelude::*;
    /// use std::sync::{Arc, Mutex};
    ///
    /// #[derive(Debug, PartialEq)]
    /// struct Read {
    ///     len: usize,
    ///     eof: bool,
    /// }
    ///
    /// impl From<(usize, bool)> for Read {
    ///     fn from((len, eof): (usize, bool)) -> Self {
    ///         Read { len, eof }
    ///     }
    /// }
    ///
    /// let ex = InlineExecutor::new();
    /// let got = Arc::new(Mutex::new(None));
    ///
    /// let body = {
    ///     let (ex, got) = (ex.clone(), got.clone());
    ///     move |_: &mut (), ctx: AwaitContext<InlineExecutor>| -> Resumption<()> {
    ///         reenter!(co = ctx; {
    ///             0 => { suspend!(co, 1, post_with(&ex, || (12_usize, true), ctx.clone())); }
    ///             1 => {
    ///                 let read: Read = co.outcome_into::<(usize, bool), _>()?;
    ///                 *got.lock().unwrap() = Some(read);
    ///                 Ok(Step::Complete(()))
    ///             }
    ///         })
    ///     }
    /// };
    ///
    /// Launcher::on(&ex, body).call(()).unwrap();
    /// assert_eq!(*got.lock().unwrap(), Some(Read { len: 12, eof: true }));
    /// ```
    pub fn outcome_into<U, T>(&self) -> Result<T>
    where
        U: Any + Send,
        T: From<U>,
    {
        self.outcome::<U>().map(T::from)
    }
}

impl Drop for Reenter<'_> {
    fn drop(&mut self) {
        if !self.modified {
            self.state.terminate();
        }
    }
}

/// Opens a governed block: a jump table over the frame's resumption state.
///
/// Each arm is labelled with an integer literal. Arm `0` runs on the first
/// pass; every other arm runs when the suspension with that label completes.
/// Before any arm runs, a failure delivered by that completion is returned
/// with `?`. An unknown label yields [`Error::UnknownLabel`].
///
/// The macro evaluates to the arm's value, so the arms must produce a
/// [`Resumption`](crate::Resumption) (or diverge through
/// [`suspend!`](crate::suspend)).
#[macro_export]
macro_rules! reenter {
    ($co:ident = $ctx:expr; { $($label:literal => $body:block)* }) => {{
        #[allow(unused_mut)]
        let mut $co = $ctx.reenter();
        $co.rethrow()?;
        match $co.position() {
            $($label => $body)*
            _ => return ::core::result::Result::Err($co.unknown_label()),
        }
    }};
}

/// Parks the body at suspension `label` while `op` runs.
///
/// The label is recorded first, then `op` (an asynchronous initiation given
/// an [`AwaitContext`](crate::AwaitContext) as its completion token) is
/// evaluated, then the body returns. Execution continues in the arm
/// labelled `label` once the operation completes.
#[macro_export]
macro_rules! suspend {
    ($co:ident, $label:literal, $op:expr) => {{
        $co.enter($label);
        let awaitable = $op;
        return $co.suspended(awaitable);
    }};
}
